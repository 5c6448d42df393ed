// src/core/task.rs

//! One prospective process invocation: arguments, environment overlay and
//! working directory.

use super::pattern::PatternCombination;
use crate::constants::PWD_ENV;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

lazy_static! {
    // Matches `{KEY}`; the key itself may not contain braces or whitespace.
    static ref PLACEHOLDER_RE: Regex = Regex::new(r"\{([^{}\s]+)\}").unwrap();
}

/// An ordered list of tasks, in the order they must run.
pub type Tasks = Vec<Task>;

/// Environment variable overrides. Later writes to the same key win.
pub type EnvironmentCollection = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Task {
    args: Vec<String>,
    env: EnvironmentCollection,
    working_dir: Option<PathBuf>,
}

impl Task {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a task from an initial argument list.
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut task = Self::new();
        task.append_all(args);
        task
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn env(&self) -> &EnvironmentCollection {
        &self.env
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    pub fn append(&mut self, arg: impl Into<String>) {
        self.args.push(arg.into());
    }

    pub fn append_all<I, S>(&mut self, args: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
    }

    pub fn append_to_environment(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.env.insert(key.into(), value.into());
    }

    pub fn extend_environment<I>(&mut self, env: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.env.extend(env);
    }

    /// Sets the working directory and mirrors it into `PWD`.
    pub fn set_working_directory(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        self.env
            .insert(PWD_ENV.to_string(), path.to_string_lossy().into_owned());
        self.working_dir = Some(path);
    }

    /// Returns a copy of this task with every `{KEY}` bound in `combination` replaced.
    ///
    /// Placeholders for keys the combination does not bind are left untouched, so
    /// several layers can each fill in their own axes. Substituted values are
    /// never scanned again.
    pub fn substitute(&self, combination: &PatternCombination) -> Self {
        if combination.is_empty() {
            return self.clone();
        }

        let args = self
            .args
            .iter()
            .map(|arg| replace_placeholders(arg, combination))
            .collect();
        let env = self
            .env
            .iter()
            .map(|(k, v)| (k.clone(), replace_placeholders(v, combination)))
            .collect();
        let working_dir = self
            .working_dir
            .as_ref()
            .map(|dir| PathBuf::from(replace_placeholders(&dir.to_string_lossy(), combination)));

        Self {
            args,
            env,
            working_dir,
        }
    }
}

/// Replaces the placeholders of `text` that `combination` binds.
pub fn replace_placeholders(text: &str, combination: &PatternCombination) -> String {
    PLACEHOLDER_RE
        .replace_all(text, |caps: &Captures<'_>| {
            let whole = caps.get(0).map_or("", |m| m.as_str());
            caps.get(1)
                .and_then(|key| combination.get(key.as_str()))
                .map_or_else(|| whole.to_string(), Clone::clone)
        })
        .into_owned()
}

/// Renders the arguments separated by single spaces.
impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.args.join(" "))
    }
}
