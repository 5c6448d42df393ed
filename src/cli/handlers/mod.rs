// src/cli/handlers/mod.rs

// One module per mode of the binary.

pub mod list_plugins;
pub mod run;
