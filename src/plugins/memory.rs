// src/plugins/memory.rs

//! A plugin that remembers how it was called. Used to observe the dispatcher in tests.

use super::{Plugin, PluginError, PluginResult, expand_permutations};
use crate::core::context::ExecutionContext;
use crate::core::pattern::Pattern;
use crate::core::task::{Task, Tasks};
use crate::core::variables::VariablesMap;
use crate::models::FleetingOptions;
use std::sync::{Arc, Mutex};

/// One recorded invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryRecord {
    pub plugin: String,
    pub task: Task,
    pub variables: VariablesMap,
    pub patterns: Vec<Pattern>,
}

/// Shared log of invocations, handed to one or more [`MemoryPlugin`]s.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecorder {
    records: Arc<Mutex<Vec<MemoryRecord>>>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, record: MemoryRecord) {
        match self.records.lock() {
            Ok(mut records) => records.push(record),
            Err(poisoned) => poisoned.into_inner().push(record),
        }
    }

    /// A snapshot of every invocation so far, oldest first.
    pub fn records(&self) -> Vec<MemoryRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MemoryPlugin {
    name: String,
    recorder: MemoryRecorder,
    fail: bool,
}

impl MemoryPlugin {
    /// A recording plugin registered as `memory`.
    pub fn new(recorder: MemoryRecorder) -> Self {
        Self::named("memory", recorder)
    }

    /// A recording plugin registered under a custom name.
    pub fn named(name: impl Into<String>, recorder: MemoryRecorder) -> Self {
        Self {
            name: name.into(),
            recorder,
            fail: false,
        }
    }

    /// A plugin that records its invocation and then reports failure.
    pub fn failing(name: impl Into<String>, recorder: MemoryRecorder) -> Self {
        Self {
            fail: true,
            ..Self::named(name, recorder)
        }
    }
}

impl Plugin for MemoryPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn summary(&self) -> &str {
        "Records every invocation (testing only)"
    }

    fn default_configuration(&self, _options: &FleetingOptions) -> PluginResult<VariablesMap> {
        Ok(VariablesMap::new(self.name.clone()))
    }

    fn apply(
        &self,
        task: &Task,
        variables: &VariablesMap,
        patterns: &[Pattern],
        _context: &ExecutionContext<'_>,
    ) -> PluginResult<Tasks> {
        self.recorder.push(MemoryRecord {
            plugin: self.name.clone(),
            task: task.clone(),
            variables: variables.clone(),
            patterns: patterns.to_vec(),
        });
        if self.fail {
            return Err(PluginError::Failed(format!("'{}' was told to fail", self.name)));
        }
        Ok(expand_permutations(task, patterns))
    }
}
