// src/plugins/bootstrap.rs

use super::appliers::{CommandLine, Environment, OptionApplier};
use super::{Plugin, PluginResult, expand_permutations};
use crate::constants::{BUILD_DIR_KEY, COMMAND_LINE_KEY};
use crate::core::context::ExecutionContext;
use crate::core::pattern::Pattern;
use crate::core::task::{Task, Tasks};
use crate::core::variables::VariablesMap;
use crate::models::FleetingOptions;
use std::path::{Path, PathBuf};

const FILENAME_KEY: &str = "filename";
const DEFAULT_FILENAME: &str = "bootstrap.sh";

/// Runs a bootstrap script from inside the build directory.
#[derive(Debug, Clone, Copy)]
pub struct Bootstrap;

impl Plugin for Bootstrap {
    fn name(&self) -> &str {
        "bootstrap"
    }

    fn summary(&self) -> &str {
        "Run a bootstrap script in the build directory"
    }

    fn default_configuration(&self, _options: &FleetingOptions) -> PluginResult<VariablesMap> {
        let mut defaults = VariablesMap::new(self.name());
        defaults.add(&[BUILD_DIR_KEY], ".")?;
        defaults.add(&[FILENAME_KEY], DEFAULT_FILENAME)?;
        defaults.ensure_path(&[COMMAND_LINE_KEY])?;
        Ok(defaults)
    }

    fn apply(
        &self,
        task: &Task,
        variables: &VariablesMap,
        patterns: &[Pattern],
        _context: &ExecutionContext<'_>,
    ) -> PluginResult<Tasks> {
        let filename = variables.get_as_or(&[FILENAME_KEY], PathBuf::from(DEFAULT_FILENAME))?;
        // A bare script name would be looked up in PATH instead of the build dir.
        let script = if filename.is_relative() {
            Path::new(".").join(filename)
        } else {
            filename
        };

        let mut bootstrap = task.clone();
        bootstrap.append(script.to_string_lossy());
        CommandLine.apply(&mut bootstrap, variables)?;
        Environment.apply(&mut bootstrap, variables)?;
        bootstrap.set_working_directory(variables.get_as_or(&[BUILD_DIR_KEY], PathBuf::from("."))?);

        Ok(expand_permutations(&bootstrap, patterns))
    }
}
