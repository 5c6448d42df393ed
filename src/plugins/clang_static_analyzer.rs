// src/plugins/clang_static_analyzer.rs

use super::appliers::{CommandLine, OptionApplier, Verbosity, missing};
use super::{Plugin, PluginError, PluginResult, scoped_command};
use crate::core::context::ExecutionContext;
use crate::core::dispatcher::resolve_commands;
use crate::core::pattern::Pattern;
use crate::core::task::{Task, Tasks};
use crate::core::variables::VariablesMap;
use crate::models::FleetingOptions;

const BUILD_COMMAND_KEY: &str = "build-command";

/// Wraps the `build-command` commands in `scan-build`.
#[derive(Debug, Clone, Copy)]
pub struct ClangStaticAnalyzer;

impl Plugin for ClangStaticAnalyzer {
    fn name(&self) -> &str {
        "clang-static-analyzer"
    }

    fn summary(&self) -> &str {
        "Run a build under the clang static analyzer (scan-build)"
    }

    fn default_configuration(&self, options: &FleetingOptions) -> PluginResult<VariablesMap> {
        let mut defaults = VariablesMap::new(self.name());
        Verbosity("-v").add_defaults(&mut defaults, options)?;
        Ok(defaults)
    }

    fn apply(
        &self,
        task: &Task,
        variables: &VariablesMap,
        _patterns: &[Pattern],
        context: &ExecutionContext<'_>,
    ) -> PluginResult<Tasks> {
        let command = scoped_command(self, context);
        let build_command = variables
            .get_as::<Vec<String>, _>(&[BUILD_COMMAND_KEY])?
            .ok_or_else(|| missing(self.name(), command, BUILD_COMMAND_KEY))?;

        let mut scan = task.clone();
        scan.append("scan-build");
        CommandLine.apply(&mut scan, variables)?;
        Verbosity("-v").apply(&mut scan, variables)?;

        // The wrapped build commands expand their own patterns.
        resolve_commands(&build_command, &scan, &context.scoped_to(command))
            .map_err(|e| PluginError::Dispatch(Box::new(e)))
    }
}
