// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Journal store: one file per entry plus a freshness marker per entry.

use parking_lot::Mutex;
use sa_core::{Clock, RunTag, SystemClock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::atomic::write_atomic;
use crate::entry::Entry;

/// Errors from the journal write path. Reads never fail.
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to serialize {entry}: {source}")]
    Serialize {
        entry: Entry,
        #[source]
        source: serde_json::Error,
    },
}

/// Metadata journal for one adapter run.
///
/// Content files live at `<dir>/_<entry>`; freshness markers live at
/// `<run_file>.<key>` where the key is namespaced by the run tag. The marker's
/// mtime is what an external watcher polls, its content is a timestamp.
///
/// The journal is shared between the main flow and the heartbeat task; the
/// two never write the same entry.
pub struct Journal {
    dir: PathBuf,
    files_dir: PathBuf,
    run_file: PathBuf,
    tag: RunTag,
    clock: Arc<dyn Clock>,
    /// Marker keys already touched by this process.
    touched: Mutex<HashSet<String>>,
}

impl Journal {
    pub fn new(
        dir: impl Into<PathBuf>,
        files_dir: impl Into<PathBuf>,
        run_file: impl Into<PathBuf>,
        tag: RunTag,
    ) -> Self {
        Self {
            dir: dir.into(),
            files_dir: files_dir.into(),
            run_file: run_file.into(),
            tag,
            clock: Arc::new(SystemClock),
            touched: Mutex::new(HashSet::new()),
        }
    }

    /// Replace the clock used for timestamps (tests use a fake clock).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn files_dir(&self) -> &Path {
        &self.files_dir
    }

    pub fn run_tag(&self) -> &RunTag {
        &self.tag
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Current time in journal timestamp format.
    pub fn timestamp(&self) -> String {
        self.clock.timestamp()
    }

    /// Path of the content file for `entry`.
    pub fn make_path(&self, entry: Entry) -> PathBuf {
        self.dir.join(entry.file_name())
    }

    /// Path of the freshness marker for `entry`.
    pub fn marker_path(&self, entry: Entry) -> PathBuf {
        let mut path = OsString::from(self.run_file.as_os_str());
        path.push(".");
        path.push(self.tag.marker_key(entry.as_str()));
        PathBuf::from(path)
    }

    pub fn exists(&self, entry: Entry) -> bool {
        self.make_path(entry).exists()
    }

    /// Raw text of an entry, or `None` when it cannot be read.
    pub fn read_raw(&self, entry: Entry) -> Option<String> {
        std::fs::read_to_string(self.make_path(entry)).ok()
    }

    /// Parsed JSON of an entry.
    ///
    /// An absent, unreadable or corrupt entry yields an empty object; the
    /// caller detects it by the absence of expected keys. Absent entries are
    /// logged at debug level, corrupt ones at error level.
    pub fn read(&self, entry: Entry) -> Value {
        let path = self.make_path(entry);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(entry = %entry, "journal entry absent");
                return empty_object();
            }
            Err(e) => {
                tracing::error!(entry = %entry, error = %e, "failed to read journal entry");
                return empty_object();
            }
        };
        match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(
                    entry = %entry,
                    path = %path.display(),
                    error = %e,
                    "corrupt journal entry, using empty object"
                );
                empty_object()
            }
        }
    }

    /// Typed read. A value of the wrong shape falls back to `T::default()`.
    pub fn read_as<T: DeserializeOwned + Default>(&self, entry: Entry) -> T {
        match serde_json::from_value(self.read(entry)) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(entry = %entry, error = %e, "unexpected journal entry shape");
                T::default()
            }
        }
    }

    /// Serialize `value` as indented JSON and replace the entry.
    pub fn write<T: Serialize + ?Sized>(
        &self,
        entry: Entry,
        value: &T,
    ) -> Result<(), JournalError> {
        let mut buf = Vec::new();
        let mut ser =
            serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        value
            .serialize(&mut ser)
            .map_err(|source| JournalError::Serialize { entry, source })?;
        self.write_bytes(entry, &buf)
    }

    /// Replace the entry with verbatim text.
    pub fn write_raw(&self, entry: Entry, text: &str) -> Result<(), JournalError> {
        self.write_bytes(entry, text.as_bytes())
    }

    /// Replace the entry with opaque bytes.
    pub fn write_bytes(&self, entry: Entry, bytes: &[u8]) -> Result<(), JournalError> {
        let path = self.make_path(entry);
        write_atomic(&path, bytes).map_err(|source| JournalError::Io { path, source })?;
        self.update_journal(entry, false)?;
        Ok(())
    }

    /// Replace the entry with the current timestamp.
    pub fn write_time(&self, entry: Entry) -> Result<(), JournalError> {
        let now = self.timestamp();
        self.write_raw(entry, &now)
    }

    /// Append `line` plus a newline to the entry.
    pub fn append(&self, entry: Entry, line: &str) -> Result<(), JournalError> {
        let path = self.make_path(entry);
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .and_then(|mut file| writeln!(file, "{}", line));
        result.map_err(|source| JournalError::Io { path, source })?;
        self.update_journal(entry, false)?;
        Ok(())
    }

    /// Append `<timestamp> [<level>] <message>` to the log entry.
    pub fn log(&self, level: &str, message: &str) -> Result<(), JournalError> {
        let line = format!("{} [{}] {}", self.timestamp(), level, message);
        self.append(Entry::Log, &line)
    }

    /// Append a stage alarm.
    pub fn alarm(&self, message: &str) -> Result<(), JournalError> {
        self.append(Entry::Alarm, message)
    }

    /// Touch the freshness marker for `entry`.
    ///
    /// Without `force` the marker is written at most once per process per key.
    /// Returns whether the marker was written. The timestamp goes to a temp
    /// file that is renamed over the marker, so the marker is never observed
    /// half-written.
    pub fn update_journal(&self, entry: Entry, force: bool) -> Result<bool, JournalError> {
        let key = self.tag.marker_key(entry.as_str());
        if !force && self.touched.lock().contains(&key) {
            return Ok(false);
        }
        let path = self.marker_path(entry);
        write_atomic(&path, self.timestamp().as_bytes())
            .map_err(|source| JournalError::Io { path, source })?;
        self.touched.lock().insert(key);
        Ok(true)
    }
}

impl std::fmt::Debug for Journal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Journal")
            .field("dir", &self.dir)
            .field("files_dir", &self.files_dir)
            .field("run_file", &self.run_file)
            .field("tag", &self.tag)
            .finish_non_exhaustive()
    }
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

#[cfg(test)]
#[path = "journal_tests.rs"]
mod tests;
