// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use taxii_logging::{CliLogLevel, CliLoggingArgs, LogFormat, LogTarget};

// The global subscriber can only be installed once per test binary, so this
// file holds a single test.
#[test]
fn json_logs_are_appended_to_configured_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let configured = dir.path().join("log").join("taxii.log");

    let args = CliLoggingArgs {
        log_level: Some(CliLogLevel::Debug),
        log_format: Some(LogFormat::Json),
        ..Default::default()
    };
    let target = args.init("file-output", Some(&configured)).expect("logging initialises");
    assert_eq!(target, LogTarget::File(configured.clone()));

    tracing::info!(collection_id = "col-1", "served objects");

    let content = std::fs::read_to_string(&configured).expect("log file exists");
    let line = content.lines().last().expect("one log line");
    let record: serde_json::Value = serde_json::from_str(line).expect("JSON log line");
    assert_eq!(record["fields"]["message"], "served objects");
    assert_eq!(record["fields"]["collection_id"], "col-1");
    assert_eq!(record["level"], "INFO");
}
