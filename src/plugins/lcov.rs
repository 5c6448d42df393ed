// src/plugins/lcov.rs

//! Coverage collection around a `run-command`: optionally reset the counters,
//! run the wrapped commands, capture, strip excluded paths and render html.

use super::appliers::missing;
use super::{Plugin, PluginError, PluginResult, scoped_command};
use crate::constants::{COMMAND_LINE_KEY, RUN_COMMAND_KEY};
use crate::core::context::ExecutionContext;
use crate::core::dispatcher::resolve_commands;
use crate::core::pattern::Pattern;
use crate::core::permutator::Permutator;
use crate::core::task::{Task, Tasks};
use crate::core::variables::VariablesMap;
use crate::models::FleetingOptions;

const LCOV: &str = "lcov";
const INFO_FILE_KEY: &str = "info-file";
const BASE_DIRECTORY_KEY: &str = "base-directory";
const DIRECTORY_KEY: &str = "directory";
const ZERO_COUNTERS_KEY: &str = "zero-counters";
const EXCLUDES_KEY: &str = "excludes";
const GEN_HTML_KEY: &str = "gen-html";
const GEN_HTML_OUTPUT_KEY: &str = "gen-html-output";
const GEN_HTML_TITLE_KEY: &str = "gen-html-title";
const GEN_HTML_COMMAND_LINE_KEY: &str = "gen-html-command-line";

#[derive(Debug, Clone, Copy)]
pub struct Lcov;

/// The resolved lcov settings, shared by every step.
struct Steps {
    zero_counters: Option<Task>,
    capture: Task,
    exclude: Option<Task>,
    gen_html: Option<Task>,
}

impl Steps {
    fn build(task: &Task, variables: &VariablesMap) -> PluginResult<Self> {
        let string = |key: &str| -> PluginResult<String> {
            Ok(variables.get_as_or::<String, _>(&[key], String::new())?)
        };
        let info_file = string(INFO_FILE_KEY)?;
        let base_directory = string(BASE_DIRECTORY_KEY)?;
        let directory = string(DIRECTORY_KEY)?;
        let command_line = variables.get_as_or::<Vec<String>, _>(&[COMMAND_LINE_KEY], Vec::new())?;

        let lcov_task = |tail: &[&str]| {
            let mut step = task.clone();
            step.append_all([
                LCOV.to_string(),
                "--base-directory".to_string(),
                base_directory.clone(),
                "--directory".to_string(),
                directory.clone(),
            ]);
            step.append_all(tail.iter().map(|s| s.to_string()));
            step.append_all(command_line.clone());
            step
        };

        let zero_counters = variables
            .get_as_or(&[ZERO_COUNTERS_KEY], false)?
            .then(|| lcov_task(&["--zerocounters"]));
        let capture = lcov_task(&["--capture", "--output", info_file.as_str()]);

        let excludes = variables.get_as_or::<Vec<String>, _>(&[EXCLUDES_KEY], Vec::new())?;
        let exclude = (!excludes.is_empty()).then(|| {
            let mut step = task.clone();
            step.append_all([LCOV.to_string(), "--remove".to_string(), info_file.clone()]);
            step.append_all(excludes.iter().map(|e| format!("\"{}\"", e)));
            step.append_all(["--output-file".to_string(), info_file.clone()]);
            step.append_all(command_line.clone());
            step
        });

        let gen_html = if variables.get_as_or(&[GEN_HTML_KEY], false)? {
            let mut step = task.clone();
            step.append_all([
                "genhtml".to_string(),
                "--output-directory".to_string(),
                string(GEN_HTML_OUTPUT_KEY)?,
                "--title".to_string(),
                string(GEN_HTML_TITLE_KEY)?,
                info_file.clone(),
            ]);
            step.append_all(variables.get_as_or::<Vec<String>, _>(&[GEN_HTML_COMMAND_LINE_KEY], Vec::new())?);
            Some(step)
        } else {
            None
        };

        Ok(Self {
            zero_counters,
            capture,
            exclude,
            gen_html,
        })
    }
}

impl Plugin for Lcov {
    fn name(&self) -> &str {
        "lcov"
    }

    fn summary(&self) -> &str {
        "Collect code coverage around a command with lcov"
    }

    fn default_configuration(&self, _options: &FleetingOptions) -> PluginResult<VariablesMap> {
        let mut defaults = VariablesMap::new(self.name());
        defaults.add(&[INFO_FILE_KEY], "lcov-plugin.info")?;
        defaults.add(&[BASE_DIRECTORY_KEY], ".")?;
        defaults.add(&[DIRECTORY_KEY], ".")?;
        defaults.add(&[ZERO_COUNTERS_KEY], "no")?;
        defaults.add(&[GEN_HTML_KEY], "no")?;
        defaults.add(&[GEN_HTML_OUTPUT_KEY], ".")?;
        defaults.add(&[GEN_HTML_TITLE_KEY], "Hello")?;
        Ok(defaults)
    }

    fn apply(
        &self,
        task: &Task,
        variables: &VariablesMap,
        patterns: &[Pattern],
        context: &ExecutionContext<'_>,
    ) -> PluginResult<Tasks> {
        let command = scoped_command(self, context);
        let run_command = variables
            .get_as::<Vec<String>, _>(&[RUN_COMMAND_KEY])?
            .ok_or_else(|| missing(self.name(), command, RUN_COMMAND_KEY))?;
        let steps = Steps::build(task, variables)?;
        let nested = context.scoped_to(command);

        let mut tasks = Tasks::new();
        for combination in Permutator::from_patterns(patterns) {
            let single = |step: &Task| step.substitute(&combination);
            if let Some(zero) = &steps.zero_counters {
                tasks.push(single(zero));
            }
            tasks.extend(
                resolve_commands(&run_command, task, &nested).map_err(|e| PluginError::Dispatch(Box::new(e)))?,
            );
            tasks.push(single(&steps.capture));
            if let Some(exclude) = &steps.exclude {
                tasks.push(single(exclude));
            }
            if let Some(gen_html) = &steps.gen_html {
                tasks.push(single(gen_html));
            }
        }
        Ok(tasks)
    }
}
