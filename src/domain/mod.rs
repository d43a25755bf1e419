//! Shared data model layer (structs/constants only).
//!
//! ## Purpose
//! - Keep install-wide types in one place so every module agrees on names.
//! - Avoid cyclic imports between services.
//!
//! ## Files
//! - `models.rs` — install context, binaries, engines, registry targets, image refs.
//! - `constants.rs` — fixed tables (module-independent defaults, auxiliary repos).
//! - `errors.rs` — typed failures that callers discriminate with `downcast_ref`.
//!
//! ## Rule of thumb
//! Domain types should be data-only: no filesystem/network side effects.

pub mod constants;
pub mod errors;
pub mod models;
