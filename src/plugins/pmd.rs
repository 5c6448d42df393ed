// src/plugins/pmd.rs

use super::appliers::{CommandLine, OptionApplier, Verbosity, missing};
use super::{Plugin, PluginResult, expand_permutations, scoped_command};
use crate::core::context::ExecutionContext;
use crate::core::pattern::Pattern;
use crate::core::task::{Task, Tasks};
use crate::core::variables::VariablesMap;
use crate::models::FleetingOptions;

const EXEC_KEY: &str = "exec";
const TOOL_KEY: &str = "tool";
const MINIMUM_TOKENS_KEY: &str = "minimum-tokens";
const FILES_KEY: &str = "files";
const LANGUAGE_KEY: &str = "language";

/// Runs one of the PMD source analyzers (`pmd`, `cpd`, ...).
#[derive(Debug, Clone, Copy)]
pub struct Pmd;

impl Plugin for Pmd {
    fn name(&self) -> &str {
        "pmd"
    }

    fn summary(&self) -> &str {
        "Run a PMD source code analyzer"
    }

    fn default_configuration(&self, options: &FleetingOptions) -> PluginResult<VariablesMap> {
        let mut defaults = VariablesMap::new(self.name());
        Verbosity("-verbose").add_defaults(&mut defaults, options)?;
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
        let exec = variables
            .get_as::<String, _>(&[EXEC_KEY])?
            .ok_or_else(|| missing(self.name(), command, EXEC_KEY))?;
        let tool = variables
            .get_as::<String, _>(&[TOOL_KEY])?
            .ok_or_else(|| missing(self.name(), command, TOOL_KEY))?;

        let mut pmd = task.clone();
        pmd.append(exec);
        pmd.append(tool.as_str());
        if tool == "cpd" {
            if let Some(tokens) = variables.get_as::<u32, _>(&[MINIMUM_TOKENS_KEY])? {
                pmd.append_all(["--minimum-tokens".to_string(), tokens.to_string()]);
            }
            for file in variables.get_as_or::<Vec<String>, _>(&[FILES_KEY], Vec::new())? {
                pmd.append_all(["--files".to_string(), file]);
            }
        }
        if let Some(language) = variables.get_as::<String, _>(&[LANGUAGE_KEY])? {
            pmd.append_all(["--language".to_string(), language]);
        }
        Verbosity("-verbose").apply(&mut pmd, variables)?;
        CommandLine.apply(&mut pmd, variables)?;

        Ok(expand_permutations(&pmd, patterns))
    }
}
