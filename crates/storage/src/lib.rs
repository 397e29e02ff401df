// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sa-storage: Metadata journal for the stage adapter
//!
//! Every journal entry is one file under the metadata directory. Content is
//! replaced by writing a sibling temp file and renaming it into place, so a
//! watcher polling the directory never sees a half-written value. Each write
//! also touches a freshness marker whose mtime tells the watcher the entry
//! changed.

mod atomic;
mod entry;
mod journal;

pub use atomic::{tmp_path, write_atomic};
pub use entry::{Entry, METADATA_PREFIX};
pub use journal::{Journal, JournalError};
