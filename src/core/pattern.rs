// src/core/pattern.rs

//! Named substitution axes (`{COMPILER}`, `{MODE}`, ...) and their registry.

use super::settings::{SettingsError, SettingsResult};
use super::variables::VariablesMap;
use crate::constants::{DEFAULT_VALUES_KEY, LONG_OPTION_KEY, SHORT_OPTION_KEY};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("Pattern '{0}' must define at least one value")]
    NoValues(String),

    #[error("Pattern '{key}' has an invalid definition: {source}")]
    InvalidDefinition {
        key: String,
        #[source]
        source: SettingsError,
    },
}

/// The key identifying a pattern, e.g. `COMPILER`.
pub type PatternKey = String;

/// One concrete assignment of a single value to every active pattern key.
pub type PatternCombination = BTreeMap<PatternKey, String>;

/// A named axis of substitutable values with optional CLI aliases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    key: PatternKey,
    values: Vec<String>,
    short_option: Option<char>,
    long_option: Option<String>,
}

impl Pattern {
    /// Creates a pattern. A pattern without values is rejected.
    pub fn new(
        key: impl Into<PatternKey>,
        values: Vec<String>,
        short_option: Option<char>,
        long_option: Option<String>,
    ) -> Result<Self, PatternError> {
        let key = key.into();
        if values.is_empty() {
            return Err(PatternError::NoValues(key));
        }
        Ok(Self {
            key,
            values,
            short_option,
            long_option,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn short_option(&self) -> Option<char> {
        self.short_option
    }

    pub fn long_option(&self) -> Option<&str> {
        self.long_option.as_deref()
    }

    /// Replaces the values, e.g. with the ones given on the command line.
    pub fn set_values(&mut self, values: Vec<String>) -> Result<(), PatternError> {
        if values.is_empty() {
            return Err(PatternError::NoValues(self.key.clone()));
        }
        self.values = values;
        Ok(())
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}: ", self.key)?;
        if let Some(short) = self.short_option {
            write!(f, "short option: {}, ", short)?;
        }
        if let Some(long) = &self.long_option {
            write!(f, "long option: {}, ", long)?;
        }
        write!(f, "values: {{")?;
        for value in &self.values {
            write!(f, "{};", value)?;
        }
        write!(f, "}}}}")
    }
}

/// Registry of every pattern known to a run, keyed by pattern key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternsHandler {
    patterns: BTreeMap<PatternKey, Pattern>,
}

impl PatternsHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `pattern`. Re-registering a key replaces the earlier pattern.
    pub fn add_pattern(&mut self, pattern: Pattern) {
        if let Some(previous) = self.patterns.insert(pattern.key.clone(), pattern) {
            log::debug!("Pattern '{}' was registered again; the last definition wins", previous.key);
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.patterns.contains_key(key)
    }

    pub fn get_pattern(&self, key: &str) -> Option<&Pattern> {
        self.patterns.get(key)
    }

    pub fn get_pattern_mut(&mut self, key: &str) -> Option<&mut Pattern> {
        self.patterns.get_mut(key)
    }

    /// All registered patterns, ordered by key.
    pub fn iter(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns.values()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// An empty configuration skeleton for a pattern called `key`.
    pub fn default_pattern_map(key: &str) -> VariablesMap {
        VariablesMap::new(key)
    }

    /// Converts the settings representation of a pattern into a [`Pattern`].
    ///
    /// `variables` holds `default-values`, and optionally `short-option` and `long-option`.
    pub fn to_pattern(key: &str, variables: &VariablesMap) -> Result<Pattern, PatternError> {
        let invalid = |source| PatternError::InvalidDefinition {
            key: key.to_string(),
            source,
        };
        let values = variables
            .get_as::<Vec<String>, _>(&[DEFAULT_VALUES_KEY])
            .map_err(invalid)?
            .unwrap_or_default();
        let short_option = variables
            .get_as::<char, _>(&[SHORT_OPTION_KEY])
            .map_err(invalid)?;
        let long_option = variables
            .get_as::<String, _>(&[LONG_OPTION_KEY])
            .map_err(invalid)?;
        Pattern::new(key, values, short_option, long_option)
    }

    /// Converts a [`Pattern`] back into its settings representation.
    pub fn to_variables_map(pattern: &Pattern) -> SettingsResult<VariablesMap> {
        let mut map = Self::default_pattern_map(pattern.key());
        map.add_values(&[DEFAULT_VALUES_KEY], pattern.values().iter().cloned())?;
        if let Some(short) = pattern.short_option() {
            map.add(&[SHORT_OPTION_KEY], short.to_string())?;
        }
        if let Some(long) = pattern.long_option() {
            map.add(&[LONG_OPTION_KEY], long)?;
        }
        Ok(map)
    }
}

impl<'a> IntoIterator for &'a PatternsHandler {
    type Item = &'a Pattern;
    type IntoIter = std::collections::btree_map::Values<'a, PatternKey, Pattern>;

    fn into_iter(self) -> Self::IntoIter {
        self.patterns.values()
    }
}

// MARK: --- UNIT TESTS ---
#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_pattern_requires_values() {
        let result = Pattern::new("COMPILER", vec![], None, None);
        assert_eq!(result, Err(PatternError::NoValues("COMPILER".to_string())));

        let mut pattern = Pattern::new("COMPILER", strings(&["gcc"]), Some('c'), None).unwrap();
        assert!(pattern.set_values(vec![]).is_err());
        assert_eq!(pattern.values(), strings(&["gcc"]).as_slice());
    }

    #[test]
    fn test_last_registration_wins() {
        let mut handler = PatternsHandler::new();
        handler.add_pattern(Pattern::new("MODE", strings(&["debug"]), None, None).unwrap());
        handler.add_pattern(Pattern::new("MODE", strings(&["release"]), None, None).unwrap());

        assert!(handler.contains("MODE"));
        assert!(!handler.contains("ARCH"));
        assert_eq!(handler.iter().count(), 1);
        assert_eq!(
            handler.get_pattern("MODE").map(Pattern::values),
            Some(strings(&["release"]).as_slice())
        );
    }

    #[test]
    fn test_to_pattern_reads_inline_definition() {
        let mut map = PatternsHandler::default_pattern_map("COMPILER");
        map.add_values(&["default-values"], ["gcc", "clang"]).unwrap();
        map.add(&["short-option"], "c").unwrap();
        map.add(&["long-option"], "compiler").unwrap();

        let pattern = PatternsHandler::to_pattern("COMPILER", &map).unwrap();
        let expected = Pattern::new(
            "COMPILER",
            strings(&["gcc", "clang"]),
            Some('c'),
            Some("compiler".to_string()),
        )
        .unwrap();
        assert_eq!(pattern, expected);
        assert_eq!(PatternsHandler::to_variables_map(&pattern).unwrap(), map);
    }

    #[test]
    fn test_to_pattern_rejects_bad_definitions() {
        let empty = PatternsHandler::default_pattern_map("EMPTY");
        assert!(matches!(
            PatternsHandler::to_pattern("EMPTY", &empty),
            Err(PatternError::NoValues(_))
        ));

        let mut long_short = PatternsHandler::default_pattern_map("X");
        long_short.add(&["default-values"], "a").unwrap();
        long_short.add(&["short-option"], "xy").unwrap();
        assert!(matches!(
            PatternsHandler::to_pattern("X", &long_short),
            Err(PatternError::InvalidDefinition { .. })
        ));
    }

    #[test]
    fn test_display() {
        let pattern = Pattern::new("K", strings(&["a", "b"]), Some('k'), Some("key".to_string())).unwrap();
        assert_eq!(pattern.to_string(), "{K: short option: k, long option: key, values: {a;b;}}");
    }
}
