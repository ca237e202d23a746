// tests/cli_args.rs

use clap::Parser;
use linkflow::cli::{CliArgs, LogLevel};

#[test]
fn defaults_to_flow_toml_in_working_directory() {
    let args = CliArgs::try_parse_from(["linkflow"]).unwrap();
    assert_eq!(args.flow, "Flow.toml");
    assert_eq!(args.log_level, None);
    assert!(!args.dry_run);
}

#[test]
fn short_flags_select_flow_and_level() {
    let args =
        CliArgs::try_parse_from(["linkflow", "-f", "flows/release.toml", "-l", "debug"]).unwrap();
    assert_eq!(args.flow, "flows/release.toml");
    assert_eq!(args.log_level, Some(LogLevel::Debug));
}

#[test]
fn unknown_level_is_rejected() {
    assert!(CliArgs::try_parse_from(["linkflow", "--log-level", "loud"]).is_err());
}
