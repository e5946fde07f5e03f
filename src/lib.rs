//! bootproxy is a boot configuration rewriting proxy.
//!
//! It receives a watch companion app's boot request, forwards it to the
//! upstream boot API, points the store webviews in the returned document at
//! an alternate store, and hands the rewritten JSON back. Documents it
//! cannot decode are passed through untouched.
//!
//! # Architecture
//!
//! - [`cli`] -- Command-line argument parsing with clap derive macros.
//! - [`cmd`] -- Subcommand dispatch and execution (run, init, validate, health).
//! - [`config`] -- Configuration model, validation, and file sources behind
//!   the [`ConfigSource`](config::ConfigSource) trait.
//! - [`error`] -- Startup errors and request-scoped boot errors using `thiserror`.
//! - [`health`] -- `GET /health` endpoint handler returning runtime diagnostics.
//! - [`logging`] -- Structured tracing setup with JSON and pretty-print output.
//! - [`proxy`] -- The boot handler: request parsing, upstream call, document
//!   rewrite.
//! - [`server`] -- Axum server setup, shared application state, HTTP client, and
//!   graceful shutdown.
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `yaml` | YAML config file support _(enabled by default)_ |
//! | `json` | JSON config file support |
//! | `toml` | TOML config file support |
//! | `sentry-integration` | Sentry error tracking |
//! | `file-backends` | All file format backends |
//! | `full` | All features |

#![allow(clippy::missing_errors_doc)]

pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod proxy;
pub mod server;

#[cfg(feature = "sentry-integration")]
pub mod sentry_integration;
