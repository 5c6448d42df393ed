// src/plugins/command_line.rs

use super::appliers::{Environment, OptionApplier, WorkingDirectory, missing};
use super::{Plugin, PluginResult, expand_permutations, scoped_command};
use crate::constants::COMMAND_LINE_KEY;
use crate::core::context::ExecutionContext;
use crate::core::pattern::Pattern;
use crate::core::task::{Task, Tasks};
use crate::core::variables::VariablesMap;
use crate::models::FleetingOptions;

/// Runs arbitrary command lines taken from the settings.
///
/// `command-line` is either a single argument list, or a map of named argument
/// lists that each become a separate task, in declaration order.
#[derive(Debug, Clone, Copy)]
pub struct CommandLineCommand;

impl Plugin for CommandLineCommand {
    fn name(&self) -> &str {
        "command-line-command"
    }

    fn summary(&self) -> &str {
        "Run the command lines configured in the settings"
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
        let lines = command_lines(variables);
        if lines.is_empty() {
            return Err(missing(self.name(), scoped_command(self, context), COMMAND_LINE_KEY));
        }

        let mut base = task.clone();
        Environment.apply(&mut base, variables)?;
        WorkingDirectory.apply(&mut base, variables)?;

        let mut tasks = Tasks::new();
        for line in lines {
            let mut command = base.clone();
            command.append_all(line);
            tasks.extend(expand_permutations(&command, patterns));
        }
        Ok(tasks)
    }
}

/// The configured command lines: one per named entry, or the single list.
fn command_lines(variables: &VariablesMap) -> Vec<Vec<String>> {
    let Some(node) = variables.child(COMMAND_LINE_KEY) else {
        return Vec::new();
    };
    if node.children().iter().any(|c| c.has_children()) {
        node.children()
            .iter()
            .filter_map(|named| named.values())
            .collect()
    } else {
        node.values().into_iter().collect()
    }
}
