// src/plugins/cppcheck.rs

use super::appliers::{CommandLine, OptionApplier, Verbosity};
use super::{Plugin, PluginResult, expand_permutations};
use crate::core::context::ExecutionContext;
use crate::core::pattern::Pattern;
use crate::core::task::{Task, Tasks};
use crate::core::variables::VariablesMap;
use crate::models::FleetingOptions;

const ENABLE_CHECKS_KEY: &str = "enable-checks";
const SRC_DIR_KEY: &str = "src-dir";
const TARGET_PATH_KEY: &str = "target-path";

#[derive(Debug, Clone, Copy)]
pub struct Cppcheck;

impl Plugin for Cppcheck {
    fn name(&self) -> &str {
        "cppcheck"
    }

    fn summary(&self) -> &str {
        "Run the cppcheck static analyzer"
    }

    fn default_configuration(&self, options: &FleetingOptions) -> PluginResult<VariablesMap> {
        let mut defaults = VariablesMap::new(self.name());
        defaults.add(&[ENABLE_CHECKS_KEY], "all")?;
        defaults.add(&[SRC_DIR_KEY], ".")?;
        Verbosity("--verbose").add_defaults(&mut defaults, options)?;
        Ok(defaults)
    }

    fn apply(
        &self,
        task: &Task,
        variables: &VariablesMap,
        patterns: &[Pattern],
        _context: &ExecutionContext<'_>,
    ) -> PluginResult<Tasks> {
        let checks = variables.get_as_or::<Vec<String>, _>(&[ENABLE_CHECKS_KEY], vec!["all".to_string()])?;
        let src_dir = variables.get_as_or(&[SRC_DIR_KEY], ".".to_string())?;
        let target = variables.get_as_or(&[TARGET_PATH_KEY], String::new())?;

        let mut cppcheck = task.clone();
        cppcheck.append("cppcheck");
        cppcheck.append(format!("--enable={}", checks.join(",")));
        Verbosity("--verbose").apply(&mut cppcheck, variables)?;
        CommandLine.apply(&mut cppcheck, variables)?;
        if target.is_empty() {
            cppcheck.append(src_dir);
        } else {
            cppcheck.append(format!("{}/{}", src_dir, target));
        }

        Ok(expand_permutations(&cppcheck, patterns))
    }
}
