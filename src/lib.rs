use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// Set to `true` to ask running tasks to stop.
pub type CancellationToken = Arc<AtomicBool>;

pub mod cli;
pub mod constants;
pub mod core;
pub mod models;
pub mod plugins;
pub mod system;
