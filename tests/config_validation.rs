// tests/config_validation.rs

use std::error::Error;
use std::io::Write;

use tempfile::NamedTempFile;

use linkflow::config::{load_and_validate, parse_str, FlowFile};
use linkflow::errors::FlowError;
use linkflow::model::LinkType;
use linkflow_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

fn validate(toml: &str) -> Result<FlowFile, FlowError> {
    FlowFile::try_from(parse_str(toml)?)
}

fn config_error(toml: &str) -> String {
    match validate(toml) {
        Err(FlowError::Config(msg)) => msg,
        other => panic!("expected config error, got {other:?}"),
    }
}

#[test]
fn loads_flow_from_disk() -> TestResult {
    init_tracing();

    let mut file = NamedTempFile::new()?;
    writeln!(
        file,
        r#"
[flow]
name = "nightly"

[task.build]
cmd = "make"
retriable_exit_codes = [75]
repeat_on_error = {{ count = 2, interval_ms = 100 }}

[task.test]
cmd = "make test"
repeat_while = {{ condition = "FLAKY", count = 3 }}

[[link]]
from = "build"
to = "test"
type = "expression"
condition = "!FAILED"
"#
    )?;

    let flow = load_and_validate(file.path())?;

    assert_eq!(flow.flow.name, "nightly");
    assert_eq!(flow.task.len(), 2);
    assert_eq!(flow.task["build"].retriable_exit_codes, vec![75]);
    assert_eq!(flow.task["test"].repeat_while.as_ref().map(|r| r.count), Some(3));
    assert_eq!(flow.link[0].link_type, LinkType::Expression);

    let task = flow.task["build"].to_task("build");
    let policy = task.repeat.on_error.expect("on_error policy");
    assert_eq!(policy.count, 2);
    assert_eq!(policy.interval.as_millis(), 100);

    Ok(())
}

#[test]
fn link_type_defaults_to_normal() -> TestResult {
    let flow = validate(
        r#"
[task.a]
cmd = "true"
[task.b]
cmd = "true"
[[link]]
from = "a"
to = "b"
"#,
    )?;
    assert_eq!(flow.link[0].link_type, LinkType::Normal);
    Ok(())
}

#[test]
fn missing_file_is_io_error() {
    let err = load_and_validate("/definitely/not/here/Flow.toml").unwrap_err();
    assert!(matches!(err, FlowError::Io(_)));
}

#[test]
fn unknown_link_type_is_toml_error() {
    let err = parse_str(
        r#"
[task.a]
cmd = "true"
[[link]]
from = "a"
to = "a"
type = "sometimes"
"#,
    )
    .unwrap_err();
    assert!(matches!(err, FlowError::Toml(_)));
}

#[test]
fn rejects_empty_flow() {
    assert!(config_error("").contains("at least one"));
}

#[test]
fn rejects_empty_command() {
    let msg = config_error(
        r#"
[task.a]
cmd = "  "
"#,
    );
    assert!(msg.contains("empty `cmd`"), "{msg}");
}

#[test]
fn rejects_unknown_link_endpoint() {
    let msg = config_error(
        r#"
[task.a]
cmd = "true"
[[link]]
from = "a"
to = "ghost"
"#,
    );
    assert!(msg.contains("unknown task 'ghost'"), "{msg}");
}

#[test]
fn rejects_self_link() {
    let msg = config_error(
        r#"
[task.a]
cmd = "true"
[[link]]
from = "a"
to = "a"
"#,
    );
    assert!(msg.contains("itself"), "{msg}");
}

#[test]
fn expression_link_requires_condition() {
    let msg = config_error(
        r#"
[task.a]
cmd = "true"
[task.b]
cmd = "true"
[[link]]
from = "a"
to = "b"
type = "expression"
"#,
    );
    assert!(msg.contains("needs a `condition`"), "{msg}");
}

#[test]
fn condition_only_allowed_on_expression_links() {
    let msg = config_error(
        r#"
[task.a]
cmd = "true"
[task.b]
cmd = "true"
[[link]]
from = "a"
to = "b"
type = "otherwise"
condition = "x"
"#,
    );
    assert!(msg.contains("cannot have a `condition`"), "{msg}");
}

#[test]
fn at_most_one_otherwise_link_per_task() {
    let msg = config_error(
        r#"
[task.a]
cmd = "true"
[task.b]
cmd = "true"
[task.c]
cmd = "true"
[[link]]
from = "a"
to = "b"
type = "otherwise"
[[link]]
from = "a"
to = "c"
type = "otherwise"
"#,
    );
    assert!(msg.contains("more than one otherwise"), "{msg}");
}

#[test]
fn rejects_invalid_condition_regex() {
    let msg = config_error(
        r#"
[task.a]
cmd = "true"
expect_stdout = "(unclosed"
"#,
    );
    assert!(msg.contains("expect_stdout"), "{msg}");
}

#[test]
fn rejects_empty_repeat_while_condition() {
    let msg = config_error(
        r#"
[task.a]
cmd = "true"
repeat_while = { condition = "" }
"#,
    );
    assert!(msg.contains("repeat_while.condition"), "{msg}");
}

#[test]
fn rejects_cycles() {
    let err = validate(
        r#"
[task.a]
cmd = "true"
[task.b]
cmd = "true"
[[link]]
from = "a"
to = "b"
[[link]]
from = "b"
to = "a"
type = "error"
"#,
    )
    .unwrap_err();
    assert!(matches!(err, FlowError::DagCycle(_)));
}
