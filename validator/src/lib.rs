//! Distribution bundle validator library.
//!
//! This crate fetches a freshly built distribution bundle, installs it with
//! the tooling of its packaging format, starts the services, probes the HTTP
//! API, and tears everything down again. It is used by the
//! `bundle-validator` CLI binary and can be driven programmatically with
//! substituted collaborators for testing.
//!
//! # Modules
//!
//! - [`artifact`] - Artifact location, retrieval, and extraction
//! - [`cli`] - Command-line argument definitions
//! - [`distribution`] - Projects, packaging formats, platforms, and architectures
//! - [`error`] - Stage-identifying error types
//! - [`executor`] - OS command execution for package and service managers
//! - [`logging`] - Stderr subscriber bridging the `log` facade
//! - [`output`] - Operator-facing output and dry-run formatting
//! - [`pipeline`] - The lifecycle stages and their runner
//! - [`probe`] - Authenticated HTTP probes
//! - [`process`] - Service processes launched from extracted archives
//! - [`readiness`] - Bounded readiness polling
//! - [`run_config`] - The per-invocation run configuration
//! - [`strategy`] - Per-format lifecycle implementations
//! - [`suite`] - The API verification suite

pub mod artifact;
pub mod cli;
pub mod distribution;
pub mod error;
pub mod executor;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod probe;
pub mod process;
pub mod readiness;
pub mod run_config;
pub mod strategy;
pub mod suite;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
