// src/cli/mod.rs

//! # Command Line
//!
//! The static flags are declared with the derive API. Patterns that declare a
//! `short-option` or `long-option` get a flag of their own, appended with the
//! builder API once the settings file is known. This takes two passes: a
//! tolerant scan that only looks for the settings file and the log level, and
//! the full clap parse.

use crate::core::commander::configured_commands;
use crate::core::pattern::PatternsHandler;
use crate::core::settings::SettingsNode;
use crate::models::{FleetingOptions, LogLevel, parse_jobs};
use clap::{Arg, ArgAction, ArgMatches, CommandFactory, FromArgMatches, Parser, ValueEnum};
use colored::Colorize;
use std::ffi::OsString;

pub mod handlers;

const PATTERN_ID_PREFIX: &str = "pattern:";

/// exec-helper: run the commands of a `.exec-helper` settings file.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(
    name = "exec-helper",
    author,
    version,
    about,
    long_about = None,
    styles = clap::builder::Styles::styled()
        .header(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .usage(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .literal(clap::builder::styling::AnsiColor::Cyan.on_default().bold())
        .placeholder(clap::builder::styling::AnsiColor::Green.on_default()),
)]
pub struct Cli {
    /// Turn on the verbose flags of the tools that are run
    #[arg(short, long)]
    pub verbose: bool,

    /// Print the tasks instead of running them
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Keep running tasks after one of them failed
    #[arg(short, long)]
    pub keep_going: bool,

    /// Number of jobs passed to the tools: a positive number or 'auto'
    #[arg(short, long, value_name = "N", value_parser = parse_jobs, default_value = "auto")]
    pub jobs: u32,

    /// Use this settings file instead of searching for '.exec-helper'
    #[arg(short, long, value_name = "PATH")]
    pub settings_file: Option<String>,

    /// How much exec-helper itself logs
    #[arg(short = 'd', long, value_enum, value_name = "LEVEL", default_value_t = LogLevel::default())]
    pub log_level: LogLevel,

    /// List the available plugins and exit
    #[arg(long)]
    pub list_plugins: bool,

    /// Fail when a plugin selects a pattern that is not registered
    #[arg(long)]
    pub strict_patterns: bool,

    /// The commands to run, as listed in the 'commands' section
    #[arg(value_name = "COMMANDS")]
    pub commands: Vec<String>,
}

impl Cli {
    /// The per-run options handed to the core.
    pub fn fleeting_options(&self) -> FleetingOptions {
        FleetingOptions {
            verbose: self.verbose,
            dry_run: self.dry_run,
            keep_going: self.keep_going,
            jobs: self.jobs,
            log_level: self.log_level,
            list_plugins: self.list_plugins,
            strict_patterns: self.strict_patterns,
            commands: self.commands.clone(),
        }
    }
}

/// What the first, tolerant pass extracts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EarlyOptions {
    pub settings_file: Option<String>,
    pub log_level: LogLevel,
    pub list_plugins: bool,
}

/// A pattern flag given on the command line, with the values that replace its defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternOverride {
    pub key: String,
    pub values: Vec<String>,
}

// --- FIRST PASS ---

/// Reads the flags needed before the settings file is loaded.
///
/// Pattern flags are not known yet, so this is a plain scan rather than a clap
/// parse: everything but the settings file, the log level and `--list-plugins`
/// is skipped, and invalid values are left for the full parse to report.
pub fn parse_early<I, T>(args: I) -> EarlyOptions
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let args: Vec<String> = args
        .into_iter()
        .skip(1)
        .map(|arg| arg.into().to_string_lossy().into_owned())
        .collect();

    let mut early = EarlyOptions::default();
    let mut rest = args.iter();
    while let Some(arg) = rest.next() {
        if arg == "--" {
            break;
        }
        if arg == "--list-plugins" {
            early.list_plugins = true;
        } else if let Some(value) = flag_value(arg, 's', "settings-file", &mut rest) {
            early.settings_file = Some(value);
        } else if let Some(value) = flag_value(arg, 'd', "log-level", &mut rest)
            && let Ok(level) = <LogLevel as ValueEnum>::from_str(&value, true)
        {
            early.log_level = level;
        }
    }
    early
}

/// The value of `arg` when it is the given flag: `-sX`, `-s=X`, `-s X`, `--long=X` or `--long X`.
fn flag_value<'a, R>(arg: &str, short: char, long: &str, rest: &mut R) -> Option<String>
where
    R: Iterator<Item = &'a String>,
{
    if let Some(tail) = arg.strip_prefix("--") {
        let tail = tail.strip_prefix(long)?;
        if tail.is_empty() {
            return rest.next().cloned();
        }
        return tail.strip_prefix('=').map(str::to_string);
    }
    let tail = arg.strip_prefix('-')?.strip_prefix(short)?;
    if tail.is_empty() {
        return rest.next().cloned();
    }
    Some(tail.strip_prefix('=').unwrap_or(tail).to_string())
}

// --- SECOND PASS ---

/// The full command: static flags, one flag per optioned pattern and the configured commands.
pub fn build_command(patterns: &PatternsHandler, settings: Option<&SettingsNode>) -> clap::Command {
    let mut command = Cli::command();
    for arg in pattern_args(&command, patterns) {
        command = command.arg(arg);
    }
    if let Some(settings) = settings {
        command = command.after_help(commands_help(settings));
    }
    command
}

fn pattern_args(command: &clap::Command, patterns: &PatternsHandler) -> Vec<Arg> {
    let taken_shorts: Vec<char> = command.get_arguments().filter_map(Arg::get_short).collect();
    let taken_longs: Vec<String> = command
        .get_arguments()
        .filter_map(Arg::get_long)
        .map(str::to_string)
        .collect();

    let mut args = Vec::new();
    for pattern in patterns {
        let mut short = pattern.short_option();
        let mut long = pattern.long_option().map(str::to_string);
        if let Some(c) = short
            && (taken_shorts.contains(&c) || c == 'h' || c == 'V')
        {
            log::warn!("Short option '-{}' of pattern '{}' is already taken; ignoring it", c, pattern.key());
            short = None;
        }
        if let Some(l) = &long
            && (taken_longs.contains(l) || l == "help" || l == "version")
        {
            log::warn!("Long option '--{}' of pattern '{}' is already taken; ignoring it", l, pattern.key());
            long = None;
        }
        if short.is_none() && long.is_none() {
            continue;
        }

        let mut arg = Arg::new(format!("{}{}", PATTERN_ID_PREFIX, pattern.key()))
            .num_args(1..)
            .action(ArgAction::Append)
            .value_name(pattern.key().to_string())
            .help(format!("Values for the {} pattern [default: {}]", pattern.key(), pattern.values().join(", ")));
        if let Some(c) = short {
            arg = arg.short(c);
        }
        if let Some(l) = long {
            arg = arg.long(l);
        }
        args.push(arg);
    }
    args
}

fn commands_help(settings: &SettingsNode) -> String {
    let commands = configured_commands(settings);
    if commands.is_empty() {
        return format!("{}\n  (none)", "Configured commands:".yellow().bold());
    }
    let width = commands.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    let mut help = format!("{}", "Configured commands:".yellow().bold());
    for (name, description) in commands {
        help.push_str(&format!(
            "\n  {}  {}",
            format!("{:<width$}", name).cyan(),
            description.unwrap_or_default()
        ));
    }
    help
}

/// Parses `args` against the full command.
///
/// Help, version and usage errors come back as `clap::Error` for the caller to `exit()` on.
pub fn parse_full<I, T>(
    args: I,
    patterns: &PatternsHandler,
    settings: Option<&SettingsNode>,
) -> Result<(Cli, Vec<PatternOverride>), clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = build_command(patterns, settings).try_get_matches_from(args)?;
    let cli = Cli::from_arg_matches(&matches)?;
    Ok((cli, pattern_overrides(&matches, patterns)))
}

fn pattern_overrides(matches: &ArgMatches, patterns: &PatternsHandler) -> Vec<PatternOverride> {
    patterns
        .iter()
        .filter_map(|pattern| {
            let id = format!("{}{}", PATTERN_ID_PREFIX, pattern.key());
            let values: Vec<String> = matches.try_get_many::<String>(&id).ok()??.cloned().collect();
            Some(PatternOverride {
                key: pattern.key().to_string(),
                values,
            })
        })
        .collect()
}

/// Replaces the values of every overridden pattern.
pub fn apply_overrides(patterns: &mut PatternsHandler, overrides: Vec<PatternOverride>) {
    for PatternOverride { key, values } in overrides {
        let Some(pattern) = patterns.get_pattern_mut(&key) else {
            continue;
        };
        match pattern.set_values(values) {
            Ok(()) => log::debug!("Pattern '{}' overridden from the command line", key),
            Err(e) => log::warn!("Ignoring command line values of pattern '{}': {}", key, e),
        }
    }
}

// MARK: --- UNIT TESTS ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pattern::Pattern;

    fn patterns() -> PatternsHandler {
        let mut patterns = PatternsHandler::new();
        let strings = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        patterns.add_pattern(
            Pattern::new("MODE", strings(&["debug", "release"]), Some('m'), Some("mode".to_string())).unwrap(),
        );
        patterns.add_pattern(Pattern::new("ARCH", strings(&["x86"]), None, Some("arch".to_string())).unwrap());
        // '-v' belongs to --verbose
        patterns.add_pattern(Pattern::new("VARIANT", strings(&["a"]), Some('v'), None).unwrap());
        patterns
    }

    #[test]
    fn test_early_pass_ignores_unknown_flags() {
        let early = parse_early(["exec-helper", "--mode", "debug", "-s", "custom.yml", "-d", "debug", "build"]);
        assert_eq!(early.settings_file.as_deref(), Some("custom.yml"));
        assert_eq!(early.log_level, LogLevel::Debug);
        assert!(!early.list_plugins);

        let early = parse_early(["exec-helper", "--help", "--list-plugins"]);
        assert!(early.list_plugins);
    }

    #[test]
    fn test_early_pass_flag_spellings() {
        let early = parse_early(["exec-helper", "-m", "release", "--settings-file=a.yml", "-dtrace"]);
        assert_eq!(early.settings_file.as_deref(), Some("a.yml"));
        assert_eq!(early.log_level, LogLevel::Trace);

        let early = parse_early(["exec-helper", "-s=b.yml", "--log-level", "INFO", "--strict-patterns"]);
        assert_eq!(early.settings_file.as_deref(), Some("b.yml"));
        assert_eq!(early.log_level, LogLevel::Info);
    }

    #[test]
    fn test_early_pass_stops_at_double_dash_and_keeps_bad_levels_default() {
        let early = parse_early(["exec-helper", "-d", "loud", "--", "-s", "late.yml"]);
        assert_eq!(early.settings_file, None);
        assert_eq!(early.log_level, LogLevel::default());
    }

    #[test]
    fn test_static_flags() {
        let (cli, overrides) =
            parse_full(["exec-helper", "-v", "-n", "-k", "-j", "3", "--strict-patterns", "build", "test"], &patterns(), None)
                .unwrap();
        let options = cli.fleeting_options();
        assert!(options.verbose && options.dry_run && options.keep_going && options.strict_patterns);
        assert_eq!(options.jobs, 3);
        assert_eq!(options.commands, ["build", "test"]);
        assert!(overrides.is_empty());
    }

    #[test]
    fn test_zero_jobs_is_rejected() {
        assert!(parse_full(["exec-helper", "--jobs", "0", "build"], &patterns(), None).is_err());
    }

    #[test]
    fn test_pattern_flags_override_defaults() {
        let mut handler = patterns();
        let (cli, overrides) =
            parse_full(["exec-helper", "build", "--mode", "release", "--arch", "arm", "riscv"], &handler, None).unwrap();
        assert_eq!(cli.commands, ["build"]);

        apply_overrides(&mut handler, overrides);
        assert_eq!(handler.get_pattern("MODE").unwrap().values(), ["release"]);
        assert_eq!(handler.get_pattern("ARCH").unwrap().values(), ["arm", "riscv"]);
    }

    #[test]
    fn test_taken_short_option_is_skipped() {
        let command = build_command(&patterns(), None);
        let variant = format!("{}VARIANT", PATTERN_ID_PREFIX);
        assert!(command.get_arguments().all(|a| a.get_id().as_str() != variant));
        assert!(command.get_arguments().any(|a| a.get_short() == Some('m')));
    }

    #[test]
    fn test_help_lists_configured_commands() {
        let mut settings = SettingsNode::new("exec-helper");
        settings.add(&["commands", "build"], "Build it").unwrap();
        colored::control::set_override(false);
        let help = build_command(&PatternsHandler::new(), Some(&settings)).render_help().to_string();
        assert!(help.contains("Configured commands:"));
        assert!(help.contains("build  Build it"));
    }
}
