//! # Plugins
//!
//! A plugin turns a base [`Task`] plus its merged configuration and the active
//! patterns into zero or more concrete tasks. Plugins never mutate the task they
//! receive: every produced task starts with the arguments of the input task.
//!
//! ## Modules
//!
//! - **`appliers`**: reusable option appliers (jobs, build dir, verbosity, ...) and
//!   [`StrategyPlugin`], a plugin assembled from a binary name and a list of appliers.
//!   `make`, `ninja` and `scons` are built this way.
//! - **`bootstrap`**, **`command_line`**, **`selector`**, **`valgrind`**, **`cppcheck`**,
//!   **`clang_tidy`**, **`clang_static_analyzer`**, **`pmd`**, **`lcov`**: the other built-ins.
//! - **`memory`**: a plugin that records its invocations, for tests.

use crate::core::context::ExecutionContext;
use crate::core::dispatcher::DispatchError;
use crate::core::pattern::{Pattern, PatternCombination};
use crate::core::permutator::Permutator;
use crate::core::settings::SettingsError;
use crate::core::task::{Task, Tasks};
use crate::core::variables::VariablesMap;
use crate::models::FleetingOptions;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

pub mod appliers;
pub mod bootstrap;
pub mod clang_static_analyzer;
pub mod clang_tidy;
pub mod command_line;
pub mod cppcheck;
pub mod lcov;
pub mod memory;
pub mod pmd;
pub mod selector;
pub mod valgrind;

pub use appliers::StrategyPlugin;

#[derive(Error, Debug)]
pub enum PluginError {
    #[error("Could not find the '{key}' setting for command '{command}' in the '{plugin}' settings")]
    MissingSetting {
        plugin: String,
        command: String,
        key: String,
    },

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Dispatch(#[from] Box<DispatchError>),

    #[error("{0}")]
    Failed(String),
}

pub type PluginResult<T> = Result<T, PluginError>;

/// The capability every plugin exposes to the dispatcher.
pub trait Plugin: Send + Sync {
    /// Stable identifier used for settings lookups and command resolution.
    fn name(&self) -> &str;

    /// One line shown by `--list-plugins`.
    fn summary(&self) -> &str;

    /// The plugin's own settings, seeded from the fleeting options.
    fn default_configuration(&self, options: &FleetingOptions) -> PluginResult<VariablesMap>;

    /// Produces the tasks for `task`, one per permutation of `patterns`.
    fn apply(
        &self,
        task: &Task,
        variables: &VariablesMap,
        patterns: &[Pattern],
        context: &ExecutionContext<'_>,
    ) -> PluginResult<Tasks>;
}

impl fmt::Debug for dyn Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin").field("name", &self.name()).finish()
    }
}

/// Substitutes `task` once per combination of `patterns`, keeping permutation order.
///
/// Zero patterns still produce exactly one task.
pub fn expand_permutations(task: &Task, patterns: &[Pattern]) -> Tasks {
    let combinations: Vec<PatternCombination> = Permutator::from_patterns(patterns).collect();
    combinations
        .par_iter()
        .map(|combination| task.substitute(combination))
        .collect()
}

/// The command a plugin's settings are scoped to.
pub fn scoped_command<'c>(plugin: &'c dyn Plugin, context: &'c ExecutionContext<'_>) -> &'c str {
    context.initial_command().unwrap_or_else(|| plugin.name())
}

// --- REGISTRY ---

/// The plugins available to a run, keyed by name.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: BTreeMap<String, Box<dyn Plugin>>,
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.plugins.keys()).finish()
    }
}

impl PluginRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in plugin.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(appliers::make()));
        registry.register(Box::new(appliers::ninja()));
        registry.register(Box::new(appliers::scons()));
        registry.register(Box::new(bootstrap::Bootstrap));
        registry.register(Box::new(command_line::CommandLineCommand));
        registry.register(Box::new(selector::Selector));
        registry.register(Box::new(valgrind::Valgrind));
        registry.register(Box::new(cppcheck::Cppcheck));
        registry.register(Box::new(clang_tidy::ClangTidy));
        registry.register(Box::new(clang_static_analyzer::ClangStaticAnalyzer));
        registry.register(Box::new(pmd::Pmd));
        registry.register(Box::new(lcov::Lcov));
        registry
    }

    /// Adds `plugin`, replacing any plugin registered under the same name.
    pub fn register(&mut self, plugin: Box<dyn Plugin>) {
        let name = plugin.name().to_string();
        if self.plugins.insert(name.clone(), plugin).is_some() {
            log::debug!("Plugin '{}' was replaced", name);
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Plugin> {
        self.plugins.get(name).map(|p| p.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }

    /// Every plugin, ordered by name.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Plugin> {
        self.plugins.values().map(|p| p.as_ref())
    }
}
