// src/plugins/valgrind.rs

use super::appliers::{CommandLine, OptionApplier, Verbosity, missing};
use super::{Plugin, PluginError, PluginResult, expand_permutations, scoped_command};
use crate::constants::RUN_COMMAND_KEY;
use crate::core::context::ExecutionContext;
use crate::core::dispatcher::resolve_commands;
use crate::core::pattern::Pattern;
use crate::core::task::{Task, Tasks};
use crate::core::variables::VariablesMap;
use crate::models::FleetingOptions;

const TOOL_KEY: &str = "tool";

/// Runs the `run-command` commands under valgrind.
#[derive(Debug, Clone, Copy)]
pub struct Valgrind;

impl Plugin for Valgrind {
    fn name(&self) -> &str {
        "valgrind"
    }

    fn summary(&self) -> &str {
        "Run commands under valgrind"
    }

    fn default_configuration(&self, options: &FleetingOptions) -> PluginResult<VariablesMap> {
        let mut defaults = VariablesMap::new(self.name());
        Verbosity("--verbose").add_defaults(&mut defaults, options)?;
        Ok(defaults)
    }

    fn apply(
        &self,
        task: &Task,
        variables: &VariablesMap,
        patterns: &[Pattern],
        context: &ExecutionContext<'_>,
    ) -> PluginResult<Tasks> {
        let command = scoped_command(self, context);
        let run_command = variables
            .get_as::<Vec<String>, _>(&[RUN_COMMAND_KEY])?
            .ok_or_else(|| missing(self.name(), command, RUN_COMMAND_KEY))?;

        let mut valgrind = task.clone();
        valgrind.append("valgrind");
        if let Some(tool) = variables.get_as::<String, _>(&[TOOL_KEY])?
            && !tool.is_empty()
        {
            valgrind.append(format!("--tool={}", tool));
        }
        Verbosity("--verbose").apply(&mut valgrind, variables)?;
        CommandLine.apply(&mut valgrind, variables)?;

        let nested = context.scoped_to(command);
        let mut tasks = Tasks::new();
        for prefix in expand_permutations(&valgrind, patterns) {
            let resolved = resolve_commands(&run_command, &prefix, &nested)
                .map_err(|e| PluginError::Dispatch(Box::new(e)))?;
            tasks.extend(resolved);
        }
        Ok(tasks)
    }
}
