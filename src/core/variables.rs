// src/core/variables.rs

//! Typed access to plugin configuration and the override-precedence lookup
//! shared by the dispatcher and the plugins.

use super::settings::{SettingsError, SettingsNode, SettingsResult, display_path};
use std::path::PathBuf;

/// The merged configuration of one plugin invocation. Its key is the plugin name.
pub type VariablesMap = SettingsNode;

/// A type that can be read from the values stored under a settings key.
pub trait SettingValue: Sized {
    /// Human readable name of the type, used in cast errors.
    const EXPECTED: &'static str;

    /// Converts the raw values. `None` means the values do not fit the type.
    fn from_values(values: &[String]) -> Option<Self>;
}

impl SettingValue for String {
    const EXPECTED: &'static str = "a string";

    /// The last value wins when a scalar setting was given more than once.
    fn from_values(values: &[String]) -> Option<Self> {
        values.last().cloned()
    }
}

impl SettingValue for bool {
    const EXPECTED: &'static str = "a yes/no value";

    fn from_values(values: &[String]) -> Option<Self> {
        match values.last()?.to_ascii_lowercase().as_str() {
            "yes" | "true" | "1" | "on" => Some(true),
            "no" | "false" | "0" | "off" => Some(false),
            _ => None,
        }
    }
}

impl SettingValue for u32 {
    const EXPECTED: &'static str = "a non-negative number";

    fn from_values(values: &[String]) -> Option<Self> {
        values.last()?.trim().parse().ok()
    }
}

impl SettingValue for char {
    const EXPECTED: &'static str = "a single character";

    fn from_values(values: &[String]) -> Option<Self> {
        let mut chars = values.last()?.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(c),
            _ => None,
        }
    }
}

impl SettingValue for PathBuf {
    const EXPECTED: &'static str = "a path";

    fn from_values(values: &[String]) -> Option<Self> {
        values.last().map(PathBuf::from)
    }
}

impl SettingValue for Vec<String> {
    const EXPECTED: &'static str = "a list of strings";

    fn from_values(values: &[String]) -> Option<Self> {
        Some(values.to_vec())
    }
}

impl SettingsNode {
    /// Reads the values at `path` as `T`.
    ///
    /// Returns `Ok(None)` when nothing is stored there and an error when the
    /// stored values cannot be interpreted as `T`.
    pub fn get_as<T: SettingValue, K: AsRef<str>>(&self, path: &[K]) -> SettingsResult<Option<T>> {
        let Some(values) = self.get(path) else {
            return Ok(None);
        };
        T::from_values(&values)
            .map(Some)
            .ok_or_else(|| SettingsError::Cast {
                path: display_path(path),
                values,
                expected: T::EXPECTED,
            })
    }

    /// Like [`get_as`](Self::get_as), falling back to `default` when the key is missing.
    pub fn get_as_or<T: SettingValue, K: AsRef<str>>(&self, path: &[K], default: T) -> SettingsResult<T> {
        Ok(self.get_as(path)?.unwrap_or(default))
    }
}

// --- Override precedence ---

/// Finds `key` under the first of `candidates` that defines it.
///
/// Candidates are ordered from most specific to most general, e.g.
/// `[["make", "build"], ["make"]]`. Returns `None` if no candidate defines the key.
pub fn lookup_scoped<'a>(
    settings: &'a SettingsNode,
    candidates: &[Vec<String>],
    key: &str,
) -> Option<&'a SettingsNode> {
    candidates
        .iter()
        .filter_map(|path| settings.child_at(path.as_slice()))
        .find_map(|scope| scope.child(key))
}

/// Builds the configuration of `plugin` as invoked for `initial_command`.
///
/// Starts from the plugin's defaults, overlays the general `[plugin]` section
/// and then the specific `[plugin, initial_command]` section. Each overlay
/// replaces values key by key, so defaults that neither section mentions survive.
pub fn merge_scoped(
    defaults: VariablesMap,
    settings: &SettingsNode,
    plugin: &str,
    initial_command: &str,
) -> VariablesMap {
    let mut merged = defaults;
    for scope in [vec![plugin], vec![plugin, initial_command]] {
        if let Some(section) = settings.child_at(scope.as_slice()) {
            log::trace!("Merging settings of '{}' into '{}'", display_path(scope.as_slice()), plugin);
            merged.overwrite(section);
        }
    }
    merged
}
