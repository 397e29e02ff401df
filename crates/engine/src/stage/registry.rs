// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resolving a stage-code location to a [`Stage`].

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use super::exec::ExecStage;
use super::Stage;
use crate::error::AdapterError;

/// Resolves the stage-code argument of an invocation.
pub trait StageLoader {
    fn load(&self, location: &str) -> Result<Arc<dyn Stage>, AdapterError>;
}

/// Stages linked into the adapter binary, by name.
///
/// Lookup order: the exact location, then the location's file stem, then an
/// executable stage at that path.
#[derive(Default, Clone)]
pub struct StageRegistry {
    stages: HashMap<String, Arc<dyn Stage>>,
}

impl StageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, stage: impl Stage + 'static) -> &mut Self {
        self.stages.insert(name.into(), Arc::new(stage));
        self
    }

    /// Builder form of [`StageRegistry::register`].
    pub fn with(mut self, name: impl Into<String>, stage: impl Stage + 'static) -> Self {
        self.register(name, stage);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Stage>> {
        self.stages.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.stages.keys().map(String::as_str)
    }
}

impl StageLoader for StageRegistry {
    fn load(&self, location: &str) -> Result<Arc<dyn Stage>, AdapterError> {
        if let Some(stage) = self.get(location) {
            return Ok(stage);
        }
        let path = Path::new(location);
        if let Some(stage) = path.file_stem().and_then(|s| s.to_str()).and_then(|s| self.get(s)) {
            tracing::debug!(location, "resolved registered stage by file stem");
            return Ok(stage);
        }
        if path.is_file() {
            tracing::debug!(location, "using executable stage");
            return Ok(Arc::new(ExecStage::new(path)));
        }
        Err(AdapterError::StageNotFound(location.to_string()))
    }
}

impl std::fmt::Debug for StageRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("StageRegistry").field("stages", &names).finish()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
