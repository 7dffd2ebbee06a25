mod common;

use clap::Parser;
use rstest::rstest;
use serde_json::Value;
use tempfile::tempdir;

use common::scenario_hive;
use regview::cli::args::Cli;
use regview::cli::commands::execute_command;
use regview::exitcode;

#[ctor::ctor]
fn init() {
    regview::util::testing::init_test_setup();
}

#[rstest]
fn test_load_missing_hive_reports_and_writes_nothing() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out.json");

    let cli = Cli::try_parse_from([
        "regview",
        "--load",
        "missing.hiv",
        "--output",
        out.to_str().unwrap(),
    ])
    .unwrap();

    let err = execute_command(&cli).unwrap_err();
    assert_eq!(err.exit_code(), exitcode::NOINPUT);
    assert!(err.to_string().contains("missing.hiv"));
    assert!(!out.exists(), "no output may be written on failure");
}

#[rstest]
fn test_offline_export_end_to_end() {
    let dir = tempdir().unwrap();
    let hive_path = dir.path().join("test.hiv");
    let out = dir.path().join("out.json");
    std::fs::write(&hive_path, scenario_hive()).unwrap();

    let cli = Cli::try_parse_from([
        "regview",
        "--load",
        hive_path.to_str().unwrap(),
        "--output",
        out.to_str().unwrap(),
    ])
    .unwrap();
    execute_command(&cli).unwrap();

    let doc: Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(doc["name"], "ROOT");
    assert_eq!(doc["subkeys"][0]["values"]["Flags"], "01ff");
}

#[rstest]
fn test_corrupt_hive_maps_to_data_error() {
    let dir = tempdir().unwrap();
    let hive_path = dir.path().join("junk.hiv");
    std::fs::write(&hive_path, vec![0u8; 8192]).unwrap();

    let cli =
        Cli::try_parse_from(["regview", "--load", hive_path.to_str().unwrap()]).unwrap();
    let err = execute_command(&cli).unwrap_err();
    assert_eq!(err.exit_code(), exitcode::DATAERR);
}

#[rstest]
fn test_no_mode_prints_usage_and_succeeds() {
    let cli = Cli::try_parse_from(["regview"]).unwrap();
    assert!(execute_command(&cli).is_ok());
}

#[rstest]
fn test_flag_parsing() {
    let cli = Cli::try_parse_from(["regview", "--live", "-dd"]).unwrap();
    assert!(cli.live);
    assert_eq!(cli.debug, 2);
    assert!(cli.load.is_none());
    assert!(cli.output.is_none());

    let cli = Cli::try_parse_from(["regview", "--load", "sam.hiv"]).unwrap();
    assert!(!cli.live);
    assert_eq!(cli.load.as_deref(), Some("sam.hiv"));
}
