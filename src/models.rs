// src/models.rs

use clap::ValueEnum;
use std::num::NonZeroUsize;

// --- FLEETING OPTIONS ---
// Per-invocation settings supplied by the command line. They seed plugin
// defaults but never change how the orchestrator itself runs.

/// How much `exec-helper` itself logs.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    None,
    Error,
    #[default]
    Warning,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> log::LevelFilter {
        match self {
            Self::None => log::LevelFilter::Off,
            Self::Error => log::LevelFilter::Error,
            Self::Warning => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetingOptions {
    pub verbose: bool,
    pub dry_run: bool,
    pub keep_going: bool,
    /// Number of jobs forwarded to the tools; always at least one.
    pub jobs: u32,
    pub log_level: LogLevel,
    pub list_plugins: bool,
    /// Abort instead of warning when a plugin selects an unregistered pattern.
    pub strict_patterns: bool,
    pub commands: Vec<String>,
}

impl Default for FleetingOptions {
    fn default() -> Self {
        Self {
            verbose: false,
            dry_run: false,
            keep_going: false,
            jobs: auto_jobs(),
            log_level: LogLevel::default(),
            list_plugins: false,
            strict_patterns: false,
            commands: Vec::new(),
        }
    }
}

/// The number of jobs used for `--jobs auto`.
pub fn auto_jobs() -> u32 {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .ok()
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(1)
}

/// Parses the value of `--jobs`: `auto` or a positive number.
pub fn parse_jobs(value: &str) -> Result<u32, String> {
    if value.eq_ignore_ascii_case("auto") {
        return Ok(auto_jobs());
    }
    match value.parse::<u32>() {
        Ok(0) => Err("the number of jobs must be at least 1".to_string()),
        Ok(jobs) => Ok(jobs),
        Err(_) => Err(format!("'{}' is neither 'auto' nor a number", value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_jobs() {
        assert_eq!(parse_jobs("8"), Ok(8));
        assert_eq!(parse_jobs("auto"), Ok(auto_jobs()));
        assert!(parse_jobs("0").is_err());
        assert!(parse_jobs("-2").is_err());
        assert!(parse_jobs("lots").is_err());
        assert!(auto_jobs() >= 1);
    }

    #[test]
    fn test_log_level_maps_to_filter() {
        assert_eq!(LogLevel::default().as_filter(), log::LevelFilter::Warn);
        assert_eq!(LogLevel::None.as_filter(), log::LevelFilter::Off);
        assert_eq!(LogLevel::Trace.as_filter(), log::LevelFilter::Trace);
    }
}
