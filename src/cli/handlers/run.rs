// src/cli/handlers/run.rs

use crate::{
    CancellationToken,
    cli::{EarlyOptions, apply_overrides, parse_full},
    core::{
        commander::{Commander, RunDirectories},
        config_loader::{load_settings_file, resolve_settings_file},
        pattern::PatternsHandler,
    },
    plugins::PluginRegistry,
    system::executor::{Executor, ImmediateExecutor, ReportingExecutor},
};
use anyhow::{Context, Result};
use colored::*;
use std::env;
use std::ffi::OsString;

/// Main entry point for running commands.
///
/// Loads the settings file, parses the full command line against its patterns
/// and resolves every requested command.
pub fn handle(args: &[OsString], early: &EarlyOptions, cancellation_token: &CancellationToken) -> Result<()> {
    let mut reporter = ReportingExecutor::new();
    if run_with(args, early, cancellation_token, &mut reporter)? {
        println!("{}", format!("{} task(s) would run", reporter.reported()).dimmed());
    }
    Ok(())
}

/// Does the work of [`handle`], sending dry-run tasks to `dry_run`.
///
/// Returns whether this was a dry run.
fn run_with(
    args: &[OsString],
    early: &EarlyOptions,
    cancellation_token: &CancellationToken,
    dry_run: &mut dyn Executor,
) -> Result<bool> {
    let working_dir = env::current_dir().context("Could not determine the current directory")?;

    // 1. Settings first: they define the pattern flags of the full parse.
    let loaded = resolve_settings_file(early.settings_file.as_deref(), &working_dir)
        .and_then(|file| load_settings_file(&file));
    let (settings, mut patterns) = match &loaded {
        Ok(loaded) => (Some(&loaded.settings), loaded.patterns.clone()),
        Err(_) => (None, PatternsHandler::new()),
    };

    // 2. Full parse. Help and usage errors end the process here.
    let (cli, overrides) = parse_full(args, &patterns, settings).unwrap_or_else(|e| e.exit());
    let loaded = loaded.context("Could not load the settings file")?;
    apply_overrides(&mut patterns, overrides);
    let options = cli.fleeting_options();
    log::debug!("Fleeting options: {:?}", options);

    // 3. Resolve and execute.
    let registry = PluginRegistry::with_builtins();
    let directories = RunDirectories {
        root_dir: loaded.root_dir.clone(),
        working_dir,
    };
    let commander = Commander::new(&options, &loaded.settings, patterns, &registry, directories)?;

    if options.dry_run {
        commander.run(dry_run)?;
    } else {
        let mut executor = ImmediateExecutor::new(options.keep_going, cancellation_token.clone());
        commander.run(&mut executor)?;
    }
    Ok(options.dry_run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::task::Task;
    use std::fs;
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;
    use tempfile::tempdir;

    const SETTINGS: &str = r#"
commands:
  build: Build the project
build: make
patterns:
  MODE:
    default-values: [debug, release]
    long-option: mode
make:
  build-dir: build/{MODE}
  patterns: MODE
"#;

    fn args(settings_file: &str, rest: &[&str]) -> Vec<OsString> {
        ["exec-helper", "-s", settings_file]
            .iter()
            .chain(rest)
            .map(OsString::from)
            .collect()
    }

    #[test]
    fn test_dry_run_resolves_commands() {
        let dir = tempdir().unwrap();
        let file = dir.path().join(".exec-helper");
        fs::write(&file, SETTINGS).unwrap();
        let file = file.display().to_string();
        let token = Arc::new(AtomicBool::new(false));

        let early = EarlyOptions {
            settings_file: Some(file.clone()),
            ..EarlyOptions::default()
        };
        let mut collected: Vec<Task> = Vec::new();
        let dry = run_with(
            &args(&file, &["--dry-run", "-j", "3", "build", "--mode", "release"]),
            &early,
            &token,
            &mut collected,
        )
        .unwrap();

        assert!(dry);
        assert_eq!(collected.len(), 1);
        let task = collected.first().unwrap();
        assert_eq!(task.args(), ["make", "--directory=build/release", "--jobs", "3"]);
        assert_eq!(task.working_dir(), Some(dunce::canonicalize(dir.path()).unwrap().as_path()));
    }

    #[test]
    fn test_dry_run_expands_default_pattern_values() {
        let dir = tempdir().unwrap();
        let file = dir.path().join(".exec-helper");
        fs::write(&file, SETTINGS).unwrap();
        let file = file.display().to_string();
        let token = Arc::new(AtomicBool::new(false));

        let early = EarlyOptions {
            settings_file: Some(file.clone()),
            ..EarlyOptions::default()
        };
        let mut collected: Vec<Task> = Vec::new();
        run_with(&args(&file, &["-n", "-j", "2", "build"]), &early, &token, &mut collected).unwrap();

        let dirs: Vec<&str> = collected
            .iter()
            .filter_map(|t| t.args().get(1).map(String::as_str))
            .collect();
        assert_eq!(dirs, ["--directory=build/debug", "--directory=build/release"]);
    }

    #[test]
    fn test_undefined_command_fails() {
        let dir = tempdir().unwrap();
        let file = dir.path().join(".exec-helper");
        fs::write(&file, SETTINGS).unwrap();
        let file = file.display().to_string();
        let token = Arc::new(AtomicBool::new(false));

        let early = EarlyOptions {
            settings_file: Some(file.clone()),
            ..EarlyOptions::default()
        };
        let error = handle(&args(&file, &["--dry-run", "deploy"]), &early, &token).unwrap_err();
        assert!(error.to_string().contains("undefined command"));
    }

    #[test]
    fn test_missing_settings_file_is_reported() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("absent.yml").display().to_string();
        let token = Arc::new(AtomicBool::new(false));

        let early = EarlyOptions {
            settings_file: Some(file.clone()),
            ..EarlyOptions::default()
        };
        let error = handle(&args(&file, &["build"]), &early, &token).unwrap_err();
        assert!(error.to_string().contains("Could not load the settings file"));
    }
}
