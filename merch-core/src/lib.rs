//! Core shared library for the merchandising services.
//!
//! Exposes the primitives every crate in the workspace depends on: the
//! common error type, environment-driven configuration and logging setup.

pub mod config;
pub mod errors;
pub mod logging;

pub use config::{Environment, ServiceConfig};
pub use errors::{ConfigError, MerchError, Result as CoreResult};
