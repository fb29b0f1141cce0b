//! Docsage Core — error taxonomy and environment-sourced configuration.

pub mod config;
pub mod error;

pub use config::{RetrievalConfig, ServerConfig};
pub use error::{Error, Result};
