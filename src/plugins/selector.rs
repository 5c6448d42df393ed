// src/plugins/selector.rs

use super::appliers::missing;
use super::{Plugin, PluginError, PluginResult, scoped_command};
use crate::constants::PATTERNS_KEY;
use crate::core::context::ExecutionContext;
use crate::core::dispatcher::resolve_commands;
use crate::core::pattern::Pattern;
use crate::core::task::{Task, Tasks};
use crate::core::variables::VariablesMap;
use crate::models::FleetingOptions;

/// Runs the commands named by the values of its patterns.
///
/// With `patterns: [TARGET]` and `TARGET` defaulting to `[build, test]`,
/// selecting `--target test` on the command line runs only `test`.
#[derive(Debug, Clone, Copy)]
pub struct Selector;

impl Plugin for Selector {
    fn name(&self) -> &str {
        "selector"
    }

    fn summary(&self) -> &str {
        "Run the commands selected through pattern values"
    }

    fn default_configuration(&self, _options: &FleetingOptions) -> PluginResult<VariablesMap> {
        Ok(VariablesMap::new(self.name()))
    }

    fn apply(
        &self,
        task: &Task,
        variables: &VariablesMap,
        patterns: &[Pattern],
        context: &ExecutionContext<'_>,
    ) -> PluginResult<Tasks> {
        let command = scoped_command(self, context);
        if !variables.contains(&[PATTERNS_KEY]) {
            return Err(missing(self.name(), command, PATTERNS_KEY));
        }

        let selected: Vec<String> = patterns
            .iter()
            .flat_map(|p| p.values().iter().cloned())
            .collect();
        log::debug!("Selector for '{}' runs {:?}", command, selected);

        resolve_commands(&selected, task, &context.scoped_to(command))
            .map_err(|e| PluginError::Dispatch(Box::new(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::test_utils::{Fixture, pattern};

    #[test]
    fn test_selects_commands_from_pattern_values() {
        let mut fixture = Fixture::new();
        fixture.settings.add(&["selector", "patterns"], "TARGET").unwrap();
        fixture.settings.add(&["one"], "command-line-command").unwrap();
        fixture.settings.add(&["command-line-command", "one", "command-line"], "first").unwrap();
        fixture.settings.add(&["two"], "command-line-command").unwrap();
        fixture.settings.add(&["command-line-command", "two", "command-line"], "second").unwrap();

        let tasks = fixture
            .apply(&Selector, &Task::new(), &[pattern("TARGET", &["two", "one"])])
            .unwrap();

        assert_eq!(tasks, vec![Task::from_args(["second"]), Task::from_args(["first"])]);
    }

    #[test]
    fn test_requires_patterns_key() {
        let fixture = Fixture::new();
        let result = fixture.apply(&Selector, &Task::new(), &[]);
        assert!(matches!(result, Err(PluginError::MissingSetting { .. })));
    }

    #[test]
    fn test_unknown_selection_fails() {
        let mut fixture = Fixture::new();
        fixture.settings.add(&["selector", "patterns"], "TARGET").unwrap();
        let result = fixture.apply(&Selector, &Task::new(), &[pattern("TARGET", &["ghost"])]);
        assert!(matches!(result, Err(PluginError::Dispatch(_))));
    }
}
