//! Integration tests for the build driver and config discovery.

use pyaot_cli::config::{PyaotConfig, CONFIG_FILE};
use pyaot_cli::driver::{run, BuildRequest, DriverError};
use std::path::PathBuf;

// =============================================================================
// Helpers
// =============================================================================

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("pyaot_test_driver").join(name);
    // Clean up from any prior run
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_source(dir: &std::path::Path, name: &str, src: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, src).unwrap();
    path
}

const ADD: &str = "\
def add(a: int64, b: int64) -> int64:
    return poke64(a, a * b + 2)
";

// =============================================================================
// Driver
// =============================================================================

#[test]
fn compiles_to_default_output_path() {
    let dir = temp_dir("default_output");
    let input = write_source(&dir, "add.py", ADD);
    let request = BuildRequest::new(&input);
    let written = run(&request, &mut Vec::new()).unwrap();
    assert_eq!(written, dir.join("add.o"));
    let bytes = std::fs::read(&written).unwrap();
    assert!(bytes.len() > 16);
}

#[test]
fn dumps_every_stage() {
    let dir = temp_dir("dumps");
    let input = write_source(&dir, "add.py", ADD);
    let request = BuildRequest {
        show_syntax: true,
        show_ir: true,
        show_clif: true,
        ..BuildRequest::new(&input)
    };
    let mut out = Vec::new();
    run(&request, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("FunctionDef"), "{text}");
    assert!(text.contains("Poke"), "{text}");
    assert!(text.contains("store"), "{text}");
}

#[test]
fn json_dump_of_ir_is_valid_json() {
    let dir = temp_dir("json");
    let input = write_source(&dir, "add.py", ADD);
    let request = BuildRequest { show_ir: true, json: true, ..BuildRequest::new(&input) };
    let mut out = Vec::new();
    run(&request, &mut out).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert!(value["body"].is_array());
}

#[test]
fn failed_compile_writes_no_object() {
    let dir = temp_dir("failure");
    let input = write_source(&dir, "bad.py", "def f() -> None:\n    poke7(0, 1)\n");
    let request = BuildRequest::new(&input);
    let err = run(&request, &mut Vec::new()).unwrap_err();
    assert!(matches!(err, DriverError::Compile(_)), "{err}");
    assert!(!dir.join("bad.o").exists());

    let input = write_source(&dir, "late.py", "def f() -> int64:\n    return g()\n");
    let err = run(&BuildRequest::new(&input), &mut Vec::new()).unwrap_err();
    assert!(matches!(err, DriverError::Codegen(_)), "{err}");
    assert!(!dir.join("late.o").exists());
}

#[test]
fn missing_input_is_read_error() {
    let dir = temp_dir("missing");
    let err = run(&BuildRequest::new(dir.join("nope.py")), &mut Vec::new()).unwrap_err();
    assert!(matches!(err, DriverError::Read { .. }));
}

// =============================================================================
// Config discovery
// =============================================================================

#[test]
fn config_found_in_ancestor_directory() {
    let dir = temp_dir("discover");
    std::fs::write(dir.join(CONFIG_FILE), "[diagnostics]\nshow_clif = true\n").unwrap();
    let nested = dir.join("a").join("b");
    std::fs::create_dir_all(&nested).unwrap();
    let (path, cfg) = PyaotConfig::discover(&nested).unwrap().unwrap();
    assert_eq!(path, dir.join(CONFIG_FILE));
    assert!(cfg.diagnostics.show_clif);
}

#[test]
fn invalid_config_reports_path() {
    let dir = temp_dir("invalid_config");
    let path = dir.join(CONFIG_FILE);
    std::fs::write(&path, "[build\n").unwrap();
    let err = PyaotConfig::load(Some(&path)).unwrap_err();
    assert!(err.to_string().contains(CONFIG_FILE));
}
