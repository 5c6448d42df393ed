// src/core/dispatcher.rs

//! # Command Dispatcher
//!
//! Resolves a command name into tasks. A name is either a registered plugin,
//! which is applied with its merged configuration, or a settings key whose
//! values are further command names, resolved recursively one level deeper.
//!
//! Tasks are handed to the [`Executor`] as soon as the plugin that produced
//! them succeeds. The first failure stops the remaining commands of the list;
//! tasks already handed over stay handed over.

use super::context::ExecutionContext;
use super::pattern::Pattern;
use super::settings::SettingsError;
use super::task::{Task, Tasks};
use super::variables::{VariablesMap, merge_scoped};
use crate::constants::PATTERNS_KEY;
use crate::plugins::{Plugin, PluginError, scoped_command};
use crate::system::executor::{ExecutionError, Executor};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Could not find a command or plugin called '{0}'")]
    UnknownCommand(String),

    #[error("Cyclic command definition: {}", .0.join(" -> "))]
    CyclicCommand(Vec<String>),

    #[error("Pattern '{pattern}' selected by '{plugin}' is not registered")]
    UnregisteredPattern { plugin: String, pattern: String },

    #[error("Invalid configuration for '{plugin}': {source}")]
    Settings {
        plugin: String,
        #[source]
        source: SettingsError,
    },

    #[error("Plugin '{plugin}' failed: {source}")]
    Plugin {
        plugin: String,
        #[source]
        source: PluginError,
    },

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

pub type DispatchResult<T> = Result<T, DispatchError>;

// --- PUBLIC API ---

/// Resolves every command of `commands`, in order, on top of `task`.
pub fn execute_commands<S: AsRef<str>>(
    commands: &[S],
    task: &Task,
    context: &ExecutionContext<'_>,
    executor: &mut dyn Executor,
) -> DispatchResult<()> {
    for command in commands {
        execute_command(command.as_ref(), task, context, executor)?;
    }
    Ok(())
}

/// Resolves a single command name on top of `task`.
pub fn execute_command(
    command: &str,
    task: &Task,
    context: &ExecutionContext<'_>,
    executor: &mut dyn Executor,
) -> DispatchResult<()> {
    if let Some(plugin) = context.plugins().get(command) {
        let tasks = apply_plugin(plugin, task, context)?;
        log::debug!("Plugin '{}' produced {} task(s)", command, tasks.len());
        for produced in &tasks {
            executor.execute(produced)?;
        }
        return Ok(());
    }

    let sub_commands = context
        .settings()
        .get(&[command])
        .ok_or_else(|| DispatchError::UnknownCommand(command.to_string()))?;
    let nested = context.descend(command)?;
    log::debug!("Resolving '{}' as {:?}", command, sub_commands);
    execute_commands(sub_commands.as_slice(), task, &nested, executor)
}

/// Resolves `commands` and returns the tasks instead of executing them.
pub fn resolve_commands<S: AsRef<str>>(
    commands: &[S],
    task: &Task,
    context: &ExecutionContext<'_>,
) -> DispatchResult<Tasks> {
    let mut collected = Tasks::new();
    execute_commands(commands, task, context, &mut collected)?;
    Ok(collected)
}

// --- RESOLUTION STEPS ---

/// Merges the configuration of `plugin`, selects its patterns and applies it once.
fn apply_plugin(plugin: &dyn Plugin, task: &Task, context: &ExecutionContext<'_>) -> DispatchResult<Tasks> {
    let name = plugin.name();
    let context = &context.enter(name)?;
    let variables = plugin_variables(plugin, context)?;
    let patterns = active_patterns(name, &variables, context)?;
    log::trace!(
        "Applying '{}' for '{}' with patterns {:?}",
        name,
        scoped_command(plugin, context),
        patterns.iter().map(Pattern::key).collect::<Vec<_>>()
    );

    plugin
        .apply(task, &variables, &patterns, context)
        .map_err(|source| DispatchError::Plugin {
            plugin: name.to_string(),
            source,
        })
}

/// Defaults, overlaid by `[plugin]`, overlaid by `[plugin, initial command]`.
pub fn plugin_variables(plugin: &dyn Plugin, context: &ExecutionContext<'_>) -> DispatchResult<VariablesMap> {
    let defaults = plugin
        .default_configuration(context.options())
        .map_err(|source| DispatchError::Plugin {
            plugin: plugin.name().to_string(),
            source,
        })?;
    Ok(merge_scoped(
        defaults,
        context.settings(),
        plugin.name(),
        scoped_command(plugin, context),
    ))
}

/// Looks up the patterns selected by the `patterns` setting of a plugin.
///
/// Unregistered keys are skipped with a warning, or rejected when strict patterns are on.
pub fn active_patterns(
    plugin: &str,
    variables: &VariablesMap,
    context: &ExecutionContext<'_>,
) -> DispatchResult<Vec<Pattern>> {
    let keys = variables
        .get_as::<Vec<String>, _>(&[PATTERNS_KEY])
        .map_err(|source| DispatchError::Settings {
            plugin: plugin.to_string(),
            source,
        })?
        .unwrap_or_default();

    let mut active = Vec::with_capacity(keys.len());
    for key in keys {
        match context.patterns().get_pattern(&key) {
            Some(pattern) => active.push(pattern.clone()),
            None if context.options().strict_patterns => {
                return Err(DispatchError::UnregisteredPattern {
                    plugin: plugin.to_string(),
                    pattern: key,
                });
            }
            None => log::warn!("Pattern '{}' used by '{}' is not registered; ignoring it", key, plugin),
        }
    }
    Ok(active)
}

// MARK: --- UNIT TESTS ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::memory::{MemoryPlugin, MemoryRecorder};
    use crate::plugins::test_utils::{Fixture, pattern, strings};

    fn args(tasks: &[Task]) -> Vec<Vec<String>> {
        tasks.iter().map(|t| t.args().to_vec()).collect()
    }

    #[test]
    fn test_unknown_command_fails_without_tasks() {
        let fixture = Fixture::new();
        let mut collected = Tasks::new();

        let result = execute_commands(&["nope"], &Task::new(), &fixture.context(), &mut collected);

        assert!(matches!(result, Err(DispatchError::UnknownCommand(ref c)) if c == "nope"));
        assert!(collected.is_empty());
    }

    #[test]
    fn test_command_with_empty_value_list_is_unknown() {
        let mut fixture = Fixture::new();
        fixture.settings.ensure_path(&["empty"]).unwrap();

        let result = resolve_commands(&["empty"], &Task::new(), &fixture.context());
        assert!(matches!(result, Err(DispatchError::UnknownCommand(_))));
    }

    #[test]
    fn test_end_to_end_make_with_jobs() {
        let mut fixture = Fixture::new();
        fixture.settings.add(&["commands"], "build").unwrap();
        fixture.settings.add(&["build"], "make").unwrap();

        let tasks = resolve_commands(&["build"], &Task::new(), &fixture.context()).unwrap();

        assert_eq!(args(&tasks), vec![strings(&["make", "--jobs", "8"])]);
    }

    #[test]
    fn test_fail_fast_keeps_tasks_of_earlier_commands() {
        let recorder = MemoryRecorder::new();
        let mut fixture = Fixture::new();
        fixture.plugins.register(Box::new(MemoryPlugin::named("first", recorder.clone())));
        fixture.plugins.register(Box::new(MemoryPlugin::failing("second", recorder.clone())));
        fixture.plugins.register(Box::new(MemoryPlugin::named("third", recorder.clone())));
        fixture.settings.add_values(&["build"], ["first", "second", "third"]).unwrap();

        let mut collected = Tasks::new();
        let base = Task::from_args(["base"]);
        let result = execute_commands(&["build"], &base, &fixture.context(), &mut collected);

        assert!(matches!(result, Err(DispatchError::Plugin { ref plugin, .. }) if plugin == "second"));
        assert_eq!(collected, vec![base]);
        let invoked: Vec<String> = recorder.records().into_iter().map(|r| r.plugin).collect();
        assert_eq!(invoked, ["first", "second"]);
    }

    #[test]
    fn test_sub_commands_scope_settings_to_initial_command() {
        let recorder = MemoryRecorder::new();
        let mut fixture = Fixture::new();
        fixture.plugins.register(Box::new(MemoryPlugin::new(recorder.clone())));
        fixture.settings.add_values(&["build"], ["memory"]).unwrap();
        fixture.settings.add_values(&["test"], ["memory"]).unwrap();
        fixture.settings.add(&["memory", "flavour"], "general").unwrap();
        fixture.settings.add(&["memory", "build", "flavour"], "specific").unwrap();

        resolve_commands(&["build", "test"], &Task::new(), &fixture.context()).unwrap();

        let flavours: Vec<Option<String>> = recorder
            .records()
            .iter()
            .map(|r| r.variables.get_as::<String, _>(&["flavour"]).unwrap())
            .collect();
        assert_eq!(flavours, [Some("specific".to_string()), Some("general".to_string())]);
    }

    #[test]
    fn test_patterns_expand_and_unknown_keys_are_skipped() {
        let mut fixture = Fixture::new();
        fixture.patterns.add_pattern(pattern("MODE", &["debug", "release"]));
        fixture.settings.add_values(&["build"], ["command-line-command"]).unwrap();
        fixture
            .settings
            .add_values(&["command-line-command", "command-line"], ["echo", "{MODE}", "{ARCH}"])
            .unwrap();
        fixture
            .settings
            .add_values(&["command-line-command", "patterns"], ["MODE", "ARCH"])
            .unwrap();

        let tasks = resolve_commands(&["build"], &Task::new(), &fixture.context()).unwrap();

        assert_eq!(
            args(&tasks),
            vec![strings(&["echo", "debug", "{ARCH}"]), strings(&["echo", "release", "{ARCH}"])]
        );
    }

    #[test]
    fn test_strict_patterns_abort() {
        let mut fixture = Fixture::new();
        fixture.options.strict_patterns = true;
        fixture.settings.add(&["make", "patterns"], "ARCH").unwrap();

        let result = resolve_commands(&["make"], &Task::new(), &fixture.context());
        assert!(matches!(result, Err(DispatchError::UnregisteredPattern { ref pattern, .. }) if pattern == "ARCH"));
    }

    #[test]
    fn test_cyclic_commands_are_detected() {
        let mut fixture = Fixture::new();
        fixture.settings.add(&["a"], "b").unwrap();
        fixture.settings.add(&["b"], "a").unwrap();

        let result = resolve_commands(&["a"], &Task::new(), &fixture.context());
        match result {
            Err(DispatchError::CyclicCommand(chain)) => assert_eq!(chain, ["a", "b", "a"]),
            other => panic!("expected a cycle error, got {:?}", other),
        }
    }

    #[test]
    fn test_plugin_wrapping_itself_is_a_cycle() {
        let mut fixture = Fixture::new();
        fixture.settings.add(&["valgrind", "run-command"], "valgrind").unwrap();

        let error = resolve_commands(&["valgrind"], &Task::new(), &fixture.context()).unwrap_err();
        assert!(
            error.to_string().contains("Cyclic command definition: valgrind -> valgrind"),
            "unexpected error: {}",
            error
        );
    }

    #[test]
    fn test_plugins_selecting_each_other_are_a_cycle() {
        let mut fixture = Fixture::new();
        fixture.patterns.add_pattern(pattern("TARGET", &["memcheck"]));
        fixture.settings.add(&["selector", "patterns"], "TARGET").unwrap();
        fixture.settings.add(&["memcheck"], "valgrind").unwrap();
        fixture.settings.add(&["valgrind", "run-command"], "selector").unwrap();

        let error = resolve_commands(&["selector"], &Task::new(), &fixture.context()).unwrap_err();
        assert!(error.to_string().contains("selector -> memcheck -> valgrind -> selector"), "{}", error);
    }

    #[test]
    fn test_wrapping_plugin_may_run_the_same_command_twice() {
        let mut fixture = Fixture::new();
        fixture.settings.add_values(&["valgrind", "run-command"], ["make", "make"]).unwrap();

        let tasks = resolve_commands(&["valgrind", "valgrind"], &Task::new(), &fixture.context()).unwrap();
        assert_eq!(tasks.len(), 4);
    }

    #[test]
    fn test_repeated_sub_commands_are_not_cycles() {
        let mut fixture = Fixture::new();
        fixture.settings.add_values(&["all"], ["build", "build"]).unwrap();
        fixture.settings.add(&["build"], "make").unwrap();

        let tasks = resolve_commands(&["all"], &Task::new(), &fixture.context()).unwrap();
        assert_eq!(tasks.len(), 2);
    }
}
