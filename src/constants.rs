// src/constants.rs

/// The default name of the settings file, searched upwards from the working directory.
pub const SETTINGS_FILENAME: &str = ".exec-helper";

/// The key of the root node of every settings tree.
pub const ROOT_KEY: &str = "exec-helper";

/// The settings key listing the commands a user may invoke.
pub const COMMANDS_KEY: &str = "commands";

/// The settings key holding inline pattern definitions, and the plugin key selecting patterns.
pub const PATTERNS_KEY: &str = "patterns";

// --- Inline pattern definition keys ---

/// The key listing the default values of an inline pattern.
pub const DEFAULT_VALUES_KEY: &str = "default-values";
/// The key holding the single-character CLI alias of an inline pattern.
pub const SHORT_OPTION_KEY: &str = "short-option";
/// The key holding the long CLI alias of an inline pattern.
pub const LONG_OPTION_KEY: &str = "long-option";

// --- Predefined patterns ---

/// Pattern bound to the directory `exec-helper` was started from.
pub const WORKING_DIR_PATTERN_KEY: &str = "EH_WORKING_DIR";
/// Pattern bound to the directory containing the settings file.
pub const ROOT_DIR_PATTERN_KEY: &str = "EH_ROOT_DIR";

// --- Common plugin configuration keys ---

/// Yes/no switch enabling the verbose flags of a tool.
pub const VERBOSITY_KEY: &str = "verbose";
/// Number of jobs forwarded to tools that build in parallel.
pub const JOBS_KEY: &str = "jobs";
/// Directory a build tool runs its build in.
pub const BUILD_DIR_KEY: &str = "build-dir";
/// Extra arguments appended verbatim to a tool invocation.
pub const COMMAND_LINE_KEY: &str = "command-line";
/// Environment variables added to every task of a plugin.
pub const ENVIRONMENT_KEY: &str = "environment";
/// Working directory of the tasks generated by a plugin.
pub const WORKING_DIR_KEY: &str = "working-dir";
/// Command(s) resolved on top of a wrapping tool such as valgrind or lcov.
pub const RUN_COMMAND_KEY: &str = "run-command";

/// Environment variable mirroring the working directory of a task.
pub const PWD_ENV: &str = "PWD";
