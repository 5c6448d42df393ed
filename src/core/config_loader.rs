// src/core/config_loader.rs

//! # Config Loader
//!
//! Finds the `.exec-helper` settings file, parses its YAML into a [`SettingsNode`]
//! tree and splits the inline `patterns` section off into a [`PatternsHandler`].

use super::pattern::PatternsHandler;
use super::settings::{SettingsError, SettingsNode};
use crate::constants::{PATTERNS_KEY, ROOT_KEY, SETTINGS_FILENAME};
use serde_yaml::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read settings file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML in '{path}': {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Unsupported settings entry at '{0}'")]
    Unsupported(String),

    #[error("Could not find a '.exec-helper' settings file in '{0}', its parents or the home directory")]
    NotFound(String),

    #[error("Settings file '{0}' does not exist")]
    MissingFile(String),

    #[error("Could not expand path '{path}': {reason}")]
    Expansion { path: String, reason: String },

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Everything read from one settings file.
#[derive(Debug, Clone)]
pub struct LoadedSettings {
    pub settings: SettingsNode,
    pub patterns: PatternsHandler,
    /// The canonical path of the settings file.
    pub file: PathBuf,
    /// The directory containing the settings file.
    pub root_dir: PathBuf,
}

// --- DISCOVERY ---

/// Searches `start_dir` and each of its parents for a settings file, then the home directory.
pub fn find_settings_file(start_dir: &Path) -> Option<PathBuf> {
    let candidate = start_dir
        .ancestors()
        .map(|dir| dir.join(SETTINGS_FILENAME))
        .chain(dirs::home_dir().map(|home| home.join(SETTINGS_FILENAME)))
        .find(|path| path.is_file())?;
    log::debug!("Found settings file at '{}'", candidate.display());
    Some(candidate)
}

/// Picks the settings file for a run: `explicit` when given, else the discovered one.
///
/// The result is canonical.
pub fn resolve_settings_file(explicit: Option<&str>, start_dir: &Path) -> ConfigResult<PathBuf> {
    let path = match explicit {
        Some(raw) => {
            let expanded = shellexpand::full(raw).map_err(|e| ConfigError::Expansion {
                path: raw.to_string(),
                reason: e.to_string(),
            })?;
            let path = PathBuf::from(expanded.into_owned());
            let path = if path.is_relative() { start_dir.join(path) } else { path };
            if !path.is_file() {
                return Err(ConfigError::MissingFile(path.display().to_string()));
            }
            path
        }
        None => find_settings_file(start_dir)
            .ok_or_else(|| ConfigError::NotFound(start_dir.display().to_string()))?,
    };

    dunce::canonicalize(&path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })
}

// --- PARSING ---

/// Reads and parses the settings file at `path`, extracting its inline patterns.
pub fn load_settings_file(path: &Path) -> ConfigResult<LoadedSettings> {
    let display = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: display.clone(),
        source,
    })?;
    let mut settings = parse_settings(&content).map_err(|e| match e {
        ConfigError::Yaml { source, .. } => ConfigError::Yaml {
            path: display.clone(),
            source,
        },
        other => other,
    })?;
    let patterns = extract_patterns(&mut settings);

    let file = path.to_path_buf();
    let root_dir = file.parent().map(Path::to_path_buf).unwrap_or_default();
    log::debug!(
        "Loaded {} top-level setting(s) and {} pattern(s) from '{}'",
        settings.children().len(),
        patterns.iter().count(),
        display
    );
    Ok(LoadedSettings {
        settings,
        patterns,
        file,
        root_dir,
    })
}

/// Parses YAML text into a settings tree rooted at `exec-helper`.
pub fn parse_settings(content: &str) -> ConfigResult<SettingsNode> {
    let document: Value = serde_yaml::from_str(content).map_err(|source| ConfigError::Yaml {
        path: "<inline>".to_string(),
        source,
    })?;
    let mut root = SettingsNode::new(ROOT_KEY);
    let mut path = Vec::new();
    add_value(&mut root, &mut path, &document)?;
    Ok(root)
}

fn add_value(node: &mut SettingsNode, path: &mut Vec<String>, value: &Value) -> ConfigResult<()> {
    match value {
        Value::Null => Ok(()),
        Value::Mapping(mapping) => {
            for (key, child) in mapping {
                let key = scalar_text(key).ok_or_else(|| ConfigError::Unsupported(path.join(".")))?;
                path.push(key);
                node.ensure_path(path.as_slice())?;
                add_value(node, path, child)?;
                path.pop();
            }
            Ok(())
        }
        Value::Sequence(items) => items.iter().try_for_each(|item| add_value(node, path, item)),
        Value::Tagged(tagged) => add_value(node, path, &tagged.value),
        scalar => {
            let text = scalar_text(scalar).ok_or_else(|| ConfigError::Unsupported(path.join(".")))?;
            Ok(node.add(path.as_slice(), text)?)
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Moves the `patterns` section of `settings` into a [`PatternsHandler`].
///
/// Invalid definitions are skipped with a warning.
pub fn extract_patterns(settings: &mut SettingsNode) -> PatternsHandler {
    let mut handler = PatternsHandler::new();
    if let Some(section) = settings.child(PATTERNS_KEY) {
        for definition in section.children() {
            match PatternsHandler::to_pattern(definition.key(), definition) {
                Ok(pattern) => handler.add_pattern(pattern),
                Err(e) => log::warn!("Ignoring pattern '{}': {}", definition.key(), e),
            }
        }
    }
    settings.clear(&[PATTERNS_KEY]);
    handler
}

// MARK: --- UNIT TESTS ---
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SAMPLE: &str = r#"
commands:
  build: Build the project
  test: Run the tests
build:
  - make
test: [make, command-line-command]
patterns:
  MODE:
    default-values: [debug, release]
    short-option: m
    long-option: mode
  BROKEN:
    short-option: b
make:
  jobs: 4
  verbose: yes
  debug: true
command-line-command:
  test:
    command-line: [ctest, --output-on-failure]
"#;

    #[test]
    fn test_parse_builds_tree() {
        let settings = parse_settings(SAMPLE).unwrap();
        assert_eq!(settings.key(), "exec-helper");
        assert_eq!(settings.get(&["commands"]).unwrap(), ["build", "test"]);
        assert_eq!(settings.get(&["commands", "build"]).unwrap(), ["Build the project"]);
        assert_eq!(settings.get(&["build"]).unwrap(), ["make"]);
        assert_eq!(settings.get(&["test"]).unwrap(), ["make", "command-line-command"]);
        assert_eq!(settings.get(&["make", "jobs"]).unwrap(), ["4"]);
        assert_eq!(settings.get(&["make", "verbose"]).unwrap(), ["yes"]);
        assert_eq!(settings.get(&["make", "debug"]).unwrap(), ["true"]);
        assert_eq!(
            settings.get(&["command-line-command", "test", "command-line"]).unwrap(),
            ["ctest", "--output-on-failure"]
        );
    }

    #[test]
    fn test_null_and_empty_documents() {
        let settings = parse_settings("").unwrap();
        assert!(!settings.has_children());

        let settings = parse_settings("commands:\n  build:\n").unwrap();
        assert_eq!(settings.get(&["commands"]).unwrap(), ["build"]);
        assert!(settings.get(&["commands", "build"]).is_none());
    }

    #[test]
    fn test_invalid_yaml_is_reported() {
        assert!(matches!(parse_settings("a: [b"), Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn test_extract_patterns_skips_invalid_and_clears_section() {
        let mut settings = parse_settings(SAMPLE).unwrap();
        let patterns = extract_patterns(&mut settings);

        let mode = patterns.get_pattern("MODE").unwrap();
        assert_eq!(mode.values(), ["debug", "release"]);
        assert_eq!(mode.short_option(), Some('m'));
        assert_eq!(mode.long_option(), Some("mode"));
        assert!(!patterns.contains("BROKEN"));
        assert!(!settings.contains(&["patterns"]));
    }

    #[test]
    fn test_discovery_walks_up_parents() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join(SETTINGS_FILENAME), SAMPLE).unwrap();

        let found = resolve_settings_file(None, &nested).unwrap();
        assert_eq!(found, dunce::canonicalize(dir.path().join(SETTINGS_FILENAME)).unwrap());

        let loaded = load_settings_file(&found).unwrap();
        assert_eq!(loaded.root_dir, dunce::canonicalize(dir.path()).unwrap());
        assert!(loaded.patterns.contains("MODE"));
    }

    #[test]
    fn test_explicit_settings_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("custom.yml"), "commands: [build]\n").unwrap();

        let found = resolve_settings_file(Some("custom.yml"), dir.path()).unwrap();
        assert!(found.ends_with("custom.yml"));

        assert!(matches!(
            resolve_settings_file(Some("missing.yml"), dir.path()),
            Err(ConfigError::MissingFile(_))
        ));
    }
}
