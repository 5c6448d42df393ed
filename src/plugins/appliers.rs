// src/plugins/appliers.rs

//! Small, composable pieces that each translate one configuration concern
//! (jobs, build directory, verbosity, ...) into task arguments, and the
//! [`StrategyPlugin`] that runs a list of them after a binary name.

use super::{Plugin, PluginError, PluginResult, expand_permutations};
use crate::constants::{
    BUILD_DIR_KEY, COMMAND_LINE_KEY, ENVIRONMENT_KEY, JOBS_KEY, VERBOSITY_KEY, WORKING_DIR_KEY,
};
use crate::core::context::ExecutionContext;
use crate::core::pattern::Pattern;
use crate::core::settings::SettingsResult;
use crate::core::task::{Task, Tasks};
use crate::core::variables::VariablesMap;
use crate::models::FleetingOptions;
use std::fmt;
use std::path::PathBuf;

/// Contributes defaults and arguments for one configuration concern.
pub trait OptionApplier: Send + Sync + fmt::Debug {
    /// Seeds the defaults this applier reads. Most appliers have none.
    fn add_defaults(&self, _defaults: &mut VariablesMap, _options: &FleetingOptions) -> SettingsResult<()> {
        Ok(())
    }

    fn apply(&self, task: &mut Task, variables: &VariablesMap) -> PluginResult<()>;
}

/// Whether a tool takes GNU style long options or short ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagStyle {
    Long,
    Short,
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

// --- APPLIERS ---

/// `--jobs N` or `-j N`, seeded from the fleeting job count.
#[derive(Debug, Clone, Copy)]
pub struct Jobs(pub FlagStyle);

impl OptionApplier for Jobs {
    fn add_defaults(&self, defaults: &mut VariablesMap, options: &FleetingOptions) -> SettingsResult<()> {
        defaults.add(&[JOBS_KEY], options.jobs.to_string())
    }

    fn apply(&self, task: &mut Task, variables: &VariablesMap) -> PluginResult<()> {
        if let Some(jobs) = variables.get_as::<u32, _>(&[JOBS_KEY])? {
            let flag = match self.0 {
                FlagStyle::Long => "--jobs",
                FlagStyle::Short => "-j",
            };
            task.append_all([flag.to_string(), jobs.to_string()]);
        }
        Ok(())
    }
}

/// `--directory=<dir>` or `-C <dir>`, only when a build dir is configured.
#[derive(Debug, Clone, Copy)]
pub struct BuildDir(pub FlagStyle);

impl OptionApplier for BuildDir {
    fn apply(&self, task: &mut Task, variables: &VariablesMap) -> PluginResult<()> {
        let dir = variables.get_as::<String, _>(&[BUILD_DIR_KEY])?.unwrap_or_default();
        if dir.is_empty() {
            return Ok(());
        }
        match self.0 {
            FlagStyle::Long => task.append(format!("--directory={}", dir)),
            FlagStyle::Short => task.append_all(["-C".to_string(), dir]),
        }
        Ok(())
    }
}

/// Appends `flag` when `verbose` is on; defaults to the fleeting verbosity.
#[derive(Debug, Clone, Copy)]
pub struct Verbosity(pub &'static str);

impl OptionApplier for Verbosity {
    fn add_defaults(&self, defaults: &mut VariablesMap, options: &FleetingOptions) -> SettingsResult<()> {
        defaults.add(&[VERBOSITY_KEY], yes_no(options.verbose))
    }

    fn apply(&self, task: &mut Task, variables: &VariablesMap) -> PluginResult<()> {
        if variables.get_as_or(&[VERBOSITY_KEY], false)? {
            task.append(self.0);
        }
        Ok(())
    }
}

/// Appends the `command-line` values verbatim.
#[derive(Debug, Clone, Copy)]
pub struct CommandLine;

impl OptionApplier for CommandLine {
    fn apply(&self, task: &mut Task, variables: &VariablesMap) -> PluginResult<()> {
        task.append_all(variables.get_as_or::<Vec<String>, _>(&[COMMAND_LINE_KEY], Vec::new())?);
        Ok(())
    }
}

/// Adds every `environment` entry to the task's environment.
#[derive(Debug, Clone, Copy)]
pub struct Environment;

impl OptionApplier for Environment {
    fn apply(&self, task: &mut Task, variables: &VariablesMap) -> PluginResult<()> {
        task.extend_environment(environment(variables)?);
        Ok(())
    }
}

/// Reads the `environment` map of a configuration.
pub fn environment(variables: &VariablesMap) -> PluginResult<Vec<(String, String)>> {
    let Some(node) = variables.child(ENVIRONMENT_KEY) else {
        return Ok(Vec::new());
    };
    node.children()
        .iter()
        .map(|entry| -> PluginResult<(String, String)> {
            let value = entry.get_as_or::<String, &str>(&[], String::new())?;
            Ok((entry.key().to_string(), value))
        })
        .collect()
}

/// Sets the task's working directory from `working-dir`.
#[derive(Debug, Clone, Copy)]
pub struct WorkingDirectory;

impl OptionApplier for WorkingDirectory {
    fn apply(&self, task: &mut Task, variables: &VariablesMap) -> PluginResult<()> {
        if let Some(dir) = variables.get_as::<PathBuf, _>(&[WORKING_DIR_KEY])? {
            task.set_working_directory(dir);
        }
        Ok(())
    }
}

// --- STRATEGY PLUGIN ---

/// A plugin made of a binary name followed by a sequence of appliers.
#[derive(Debug)]
pub struct StrategyPlugin {
    name: &'static str,
    summary: &'static str,
    binary: &'static str,
    appliers: Vec<Box<dyn OptionApplier>>,
}

impl StrategyPlugin {
    pub fn new(
        name: &'static str,
        summary: &'static str,
        binary: &'static str,
        appliers: Vec<Box<dyn OptionApplier>>,
    ) -> Self {
        Self {
            name,
            summary,
            binary,
            appliers,
        }
    }

    /// Runs every applier on a copy of `task` with the binary appended.
    pub fn build(&self, task: &Task, variables: &VariablesMap) -> PluginResult<Task> {
        let mut built = task.clone();
        built.append(self.binary);
        for applier in &self.appliers {
            applier.apply(&mut built, variables)?;
        }
        Ok(built)
    }
}

impl Plugin for StrategyPlugin {
    fn name(&self) -> &str {
        self.name
    }

    fn summary(&self) -> &str {
        self.summary
    }

    fn default_configuration(&self, options: &FleetingOptions) -> PluginResult<VariablesMap> {
        let mut defaults = VariablesMap::new(self.name);
        for applier in &self.appliers {
            applier.add_defaults(&mut defaults, options)?;
        }
        Ok(defaults)
    }

    fn apply(
        &self,
        task: &Task,
        variables: &VariablesMap,
        patterns: &[Pattern],
        _context: &ExecutionContext<'_>,
    ) -> PluginResult<Tasks> {
        let built = self.build(task, variables)?;
        Ok(expand_permutations(&built, patterns))
    }
}

/// The appliers shared by every build system plugin.
fn build_system(style: FlagStyle, verbose_flag: &'static str) -> Vec<Box<dyn OptionApplier>> {
    vec![
        Box::new(BuildDir(style)),
        Box::new(Jobs(style)),
        Box::new(Verbosity(verbose_flag)),
        Box::new(CommandLine),
        Box::new(Environment),
        Box::new(WorkingDirectory),
    ]
}

pub fn make() -> StrategyPlugin {
    StrategyPlugin::new("make", "Build with GNU make", "make", build_system(FlagStyle::Long, "--debug"))
}

pub fn ninja() -> StrategyPlugin {
    StrategyPlugin::new("ninja", "Build with ninja", "ninja", build_system(FlagStyle::Short, "-v"))
}

pub fn scons() -> StrategyPlugin {
    StrategyPlugin::new(
        "scons",
        "Build with SCons",
        "scons",
        build_system(FlagStyle::Long, "--debug=explain"),
    )
}

/// Error for a required setting that is absent.
pub(crate) fn missing(plugin: &str, command: &str, key: &str) -> PluginError {
    PluginError::MissingSetting {
        plugin: plugin.to_string(),
        command: command.to_string(),
        key: key.to_string(),
    }
}
