// src/core/mod.rs

//! # Core
//!
//! The resolution engine: the settings tree, patterns and their permutations,
//! tasks, and the dispatcher that turns command names into tasks.

pub mod commander;
pub mod config_loader;
pub mod context;
pub mod dispatcher;
pub mod pattern;
pub mod permutator;
pub mod settings;
pub mod task;
pub mod variables;
