// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Heartbeat specs

use crate::prelude::*;

#[test]
fn heartbeat_marker_is_touched_during_a_long_stage() {
    let ps = Pipestance::new();
    let stage = ps.stage("sort", "cat > /dev/null; sleep 2; echo '{\"chunks\": []}'");

    ps.adapter("split", &stage).env("SA_HEARTBEAT_SECS", "1").passes();

    assert!(ps.has_marker("split_heartbeat"));
}
