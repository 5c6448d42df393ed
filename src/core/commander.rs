// src/core/commander.rs

//! # Commander
//!
//! Drives one run: validates the requested top-level commands against the
//! `commands` section, registers the predefined patterns, and resolves each
//! command in turn. A failing command is reported on its own and does not stop
//! its siblings, except for a failed process when keep-going is off.

use super::context::ExecutionContext;
use super::dispatcher::{DispatchError, execute_command};
use super::pattern::{Pattern, PatternError, PatternsHandler};
use super::settings::SettingsNode;
use super::task::Task;
use crate::constants::{COMMANDS_KEY, ROOT_DIR_PATTERN_KEY, WORKING_DIR_PATTERN_KEY};
use crate::models::FleetingOptions;
use crate::plugins::PluginRegistry;
use crate::system::executor::{ExecutionError, Executor};
use colored::Colorize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommanderError {
    #[error("You must define at least one command")]
    NoCommands,

    #[error("'{0}' is an undefined command; add it to the 'commands' section of the settings file")]
    UndefinedCommand(String),

    #[error("{failed} of {total} command(s) failed")]
    CommandsFailed { failed: usize, total: usize },

    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

pub type CommanderResult<T> = Result<T, CommanderError>;

/// The directories a run is anchored to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunDirectories {
    /// The directory containing the settings file. Tasks start here.
    pub root_dir: PathBuf,
    /// The directory the program was started from.
    pub working_dir: PathBuf,
}

#[derive(Debug)]
pub struct Commander<'a> {
    options: &'a FleetingOptions,
    settings: &'a SettingsNode,
    patterns: PatternsHandler,
    plugins: &'a PluginRegistry,
    directories: RunDirectories,
}

impl<'a> Commander<'a> {
    pub fn new(
        options: &'a FleetingOptions,
        settings: &'a SettingsNode,
        patterns: PatternsHandler,
        plugins: &'a PluginRegistry,
        directories: RunDirectories,
    ) -> CommanderResult<Self> {
        let mut commander = Self {
            options,
            settings,
            patterns,
            plugins,
            directories,
        };
        commander.register_predefined_patterns()?;
        Ok(commander)
    }

    pub fn patterns(&self) -> &PatternsHandler {
        &self.patterns
    }

    fn register_predefined_patterns(&mut self) -> CommanderResult<()> {
        for (key, dir) in [
            (WORKING_DIR_PATTERN_KEY, &self.directories.working_dir),
            (ROOT_DIR_PATTERN_KEY, &self.directories.root_dir),
        ] {
            let value = dir.display().to_string();
            self.patterns.add_pattern(Pattern::new(key, vec![value], None, None)?);
        }
        Ok(())
    }

    /// Checks that every requested command is listed under `commands`.
    pub fn validate(&self) -> CommanderResult<()> {
        if self.options.commands.is_empty() {
            return Err(CommanderError::NoCommands);
        }
        let defined = self.settings.get_or(&[COMMANDS_KEY], Vec::new());
        match self.options.commands.iter().find(|c| !defined.contains(c)) {
            Some(undefined) => Err(CommanderError::UndefinedCommand(undefined.clone())),
            None => Ok(()),
        }
    }

    /// Validates and then resolves every requested command, forwarding tasks to `executor`.
    pub fn run(&self, executor: &mut dyn Executor) -> CommanderResult<()> {
        self.validate()?;

        let context = ExecutionContext::new(self.options, self.settings, &self.patterns, self.plugins);
        let mut base = Task::new();
        base.set_working_directory(self.directories.root_dir.clone());

        let total = self.options.commands.len();
        let mut failed = 0;
        for command in &self.options.commands {
            log::info!("Executing command '{}'", command);
            match execute_command(command, &base, &context, executor) {
                Ok(()) => log::debug!("Command '{}' succeeded", command),
                Err(DispatchError::Execution(ExecutionError::Cancelled)) => {
                    return Err(CommanderError::Execution(ExecutionError::Cancelled));
                }
                Err(e) => {
                    failed += 1;
                    report(command, &e);
                    if matches!(e, DispatchError::Execution(_)) && !self.options.keep_going {
                        log::debug!("Stopping after the failed process of '{}'", command);
                        break;
                    }
                }
            }
        }

        executor.finish()?;
        if failed > 0 {
            return Err(CommanderError::CommandsFailed { failed, total });
        }
        Ok(())
    }
}

fn report(command: &str, error: &DispatchError) {
    eprintln!("{} {}: {}", "Error in".red().bold(), command.cyan(), error);
}

/// The description of every configured command, in settings order.
pub fn configured_commands(settings: &SettingsNode) -> Vec<(String, Option<String>)> {
    let Some(section) = settings.child(COMMANDS_KEY) else {
        return Vec::new();
    };
    section
        .children()
        .iter()
        .map(|entry| {
            let description = entry.values().map(|values| values.join(" "));
            (entry.key().to_string(), description)
        })
        .collect()
}
