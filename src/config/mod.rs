// src/config/mod.rs

//! Flow definition loading and validation.
//!
//! - `model.rs` is the TOML-backed data model.
//! - `loader.rs` reads a definition from disk or a string.
//! - `validate.rs` turns a raw definition into a checked [`FlowFile`].

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, parse_str};
pub use model::{
    FlowFile, FlowSection, LinkConfig, RawFlowFile, RepeatOnErrorConfig, RepeatWhileConfig,
    TaskConfig,
};
