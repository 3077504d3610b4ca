//! # vcache-cli — Server Binary Support
//!
//! Everything `vcache` does before and after the router runs:
//!
//! - [`config`]: flags, the JSON config file, and their merge rules.
//! - [`logging`]: `tracing-subscriber` installation.
//! - [`server`]: store construction, serving until shutdown, and the
//!   retrying store drain afterwards.
//!
//! ## Crate Policy
//!
//! - Protocol behavior lives in `vcache-api`; storage in `vcache-core`.
//! - `main.rs` only wires signals and exit codes around [`server::run`].

pub mod config;
pub mod logging;
pub mod server;
