// src/bin/exec-helper.rs

use anyhow::Result;
use exec_helper::{
    CancellationToken,
    cli::{self, EarlyOptions, handlers},
    core::commander::CommanderError,
    plugins::PluginRegistry,
    system::executor::ExecutionError,
};
use colored::*;
use std::env;
use std::ffi::OsString;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// The main entry point of `exec-helper`.
/// It sets up logging from the early arguments, dispatches to the right handler
/// and performs centralized error handling.
fn main() {
    let cancellation_token = Arc::new(AtomicBool::new(false));
    let args: Vec<OsString> = env::args_os().collect();
    let early = cli::parse_early(&args);

    // RUST_LOG, when set, wins over --log-level.
    env_logger::Builder::new()
        .filter_level(early.log_level.as_filter())
        .parse_default_env()
        .init();

    let handler_token = Arc::clone(&cancellation_token);
    if let Err(e) = ctrlc::set_handler(move || handler_token.store(true, Ordering::Relaxed)) {
        log::warn!("Could not install the Ctrl+C handler: {}", e);
    }

    if let Err(e) = run_cli(&args, &early, &cancellation_token) {
        if let Some(CommanderError::Execution(ExecutionError::Cancelled)) = e.downcast_ref::<CommanderError>() {
            std::process::exit(130);
        }

        eprintln!("\n{}: {:#}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run_cli(args: &[OsString], early: &EarlyOptions, cancellation_token: &CancellationToken) -> Result<()> {
    log::debug!("Early options: {:?}", early);

    if early.list_plugins {
        handlers::list_plugins::handle(&PluginRegistry::with_builtins());
        return Ok(());
    }
    handlers::run::handle(args, early, cancellation_token)
}
