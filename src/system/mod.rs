//! # System Interaction Layer
//!
//! The boundary between resolved tasks and the operating system.
//!
//! ## Modules
//!
//! - **`executor`**: runs tasks as child processes, honours `Ctrl+C` cancellation and
//!   keep-going, or only reports them in dry-run mode.

pub mod executor;
