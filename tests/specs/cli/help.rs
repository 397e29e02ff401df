// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Argument handling specs

use crate::prelude::*;

#[test]
fn help_shows_positionals() {
    cli()
        .args(&["--help"])
        .passes()
        .stdout_has("Usage:")
        .stdout_has("<METADATA_DIR>")
        .stdout_has("<RUN_FILE>");
}

#[test]
fn version_shows_package_version() {
    cli().args(&["--version"]).passes().stdout_has("0.2.0");
}

#[test]
fn no_arguments_is_a_usage_error() {
    cli().fails_with(2).stderr_has("Usage:");
}

#[test]
fn four_arguments_is_a_usage_error() {
    cli().args(&["split.sh", "stage", "meta", "files"]).fails_with(2);
}

#[test]
fn unknown_runner_is_rejected() {
    let ps = Pipestance::new();
    let stage = ps.stage("noop", "exit 0");
    ps.adapter("chunk", &stage).fails_with(1).stderr_has("chunk");
    assert!(ps.entry("log").is_none());
}
