//! Service layer containing the installer steps and their side-effect helpers.
//!
//! ## Service map
//! - `setup.rs` — version/parent-dir collection and install dir creation.
//! - `host_tools.rs` — required tool check and utility installation recipes.
//! - `selector.rs` — container engine choice and docker socket access.
//! - `fetcher.rs` — bundle URL resolution and downloads.
//! - `expander.rs` — outer tar extraction and inner zstd decompression.
//! - `loader.rs` — `load` of every image archive.
//! - `registry.rs` — per-backend inputs, login and ECR provisioning.
//! - `publisher.rs` — backend state machine and the shared retag/push loop.
//! - `materializer.rs` — values template selection and copy.
//!
//! ## Capabilities
//! - `exec.rs` — `CommandRunner` and the process-backed runner.
//! - `archive.rs` — `Archiver` over tar/gzip/zstd.
//! - `prompt.rs` — `Prompter` and menu helpers.
//! - `engine.rs` — engine commands on top of a `CommandRunner`.
//! - `toolbox.rs` — the bundle of capabilities handed to every step.
//!
//! ## Conventions
//! - Collect input first, then act on typed values.
//! - Every step states whether a failure is fatal, skipped or isolated per item.
//! - Secrets travel on stdin only.

pub mod archive;
pub mod config;
pub mod engine;
pub mod exec;
pub mod expander;
pub mod fetcher;
pub mod host_tools;
pub mod loader;
pub mod logging;
pub mod materializer;
pub mod prompt;
pub mod publisher;
pub mod registry;
pub mod selector;
pub mod setup;
pub mod toolbox;

#[cfg(test)]
pub mod testing;
