// src/plugins/clang_tidy.rs

use super::appliers::{CommandLine, OptionApplier};
use super::{Plugin, PluginResult, expand_permutations};
use crate::core::context::ExecutionContext;
use crate::core::pattern::Pattern;
use crate::core::task::{Task, Tasks};
use crate::core::variables::VariablesMap;
use crate::models::FleetingOptions;

const SOURCES_KEY: &str = "sources";
const CHECKS_KEY: &str = "checks";
const WARNING_AS_ERROR_KEY: &str = "warning-as-errors";

#[derive(Debug, Clone, Copy)]
pub struct ClangTidy;

impl ClangTidy {
    /// `-warnings-as-errors=` value; the single value `all` means every enabled check.
    fn warnings_as_errors(warnings: &[String], checks: &[String]) -> String {
        match warnings {
            [only] if only == "all" => checks.join(","),
            _ => warnings.join(","),
        }
    }
}

impl Plugin for ClangTidy {
    fn name(&self) -> &str {
        "clang-tidy"
    }

    fn summary(&self) -> &str {
        "Run the clang-tidy linter"
    }

    fn default_configuration(&self, _options: &FleetingOptions) -> PluginResult<VariablesMap> {
        let mut defaults = VariablesMap::new(self.name());
        defaults.add(&[SOURCES_KEY], "*.cpp")?;
        Ok(defaults)
    }

    fn apply(
        &self,
        task: &Task,
        variables: &VariablesMap,
        patterns: &[Pattern],
        _context: &ExecutionContext<'_>,
    ) -> PluginResult<Tasks> {
        let checks = variables.get_as_or::<Vec<String>, _>(&[CHECKS_KEY], Vec::new())?;

        let mut tidy = task.clone();
        tidy.append("clang-tidy");
        if !checks.is_empty() {
            tidy.append(format!("-checks={}", checks.join(",")));
        }
        if let Some(warnings) = variables.get_as::<Vec<String>, _>(&[WARNING_AS_ERROR_KEY])? {
            let listed = Self::warnings_as_errors(&warnings, &checks);
            if !listed.is_empty() {
                tidy.append(format!("-warnings-as-errors={}", listed));
            }
        }
        CommandLine.apply(&mut tidy, variables)?;
        tidy.append_all(variables.get_as_or::<Vec<String>, _>(&[SOURCES_KEY], vec!["*.cpp".to_string()])?);

        Ok(expand_permutations(&tidy, patterns))
    }
}
