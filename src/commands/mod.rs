//! Module registry and runner.
//!
//! ## Files
//! - `modules.rs` — the fixed module table and the service dispatcher.
//! - `runner.rs` — full, prompted and single-module execution.
//!
//! ## Principles
//! - Resolve the run mode before any prompt.
//! - Delegate business logic to `services/*`.
//! - A module failure ends the run.

pub mod modules;
pub mod runner;

pub use modules::{module_listing, Installer, ModuleExecutor, ModuleId};
pub use runner::{run_modules, RunMode};
