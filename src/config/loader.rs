// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::config::model::{FlowFile, RawFlowFile};
use crate::errors::Result;

/// Load a flow definition and return the raw, unvalidated model.
///
/// This only performs TOML deserialization. Use [`load_and_validate`] to
/// also check link endpoints, conditions and acyclicity.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawFlowFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    parse_str(&contents)
}

/// Parse a flow definition from TOML text.
pub fn parse_str(contents: &str) -> Result<RawFlowFile> {
    let flow: RawFlowFile = toml::from_str(contents)?;
    Ok(flow)
}

/// Load a flow definition from path and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<FlowFile> {
    let raw = load_from_path(&path)?;
    FlowFile::try_from(raw)
}
