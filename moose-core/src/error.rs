//! Core error type shared by every Moose subsystem.
//!
//! A flat enum, a manual
//! `Display`, and a manual `std::error::Error` — no `thiserror`.

/// Errors that can arise from config resolution, registry lookups, or
/// broker/OLAP client construction. HTTP-specific errors live in
/// `moose-gateway::error::GatewayError`, which wraps this type.
#[derive(Debug)]
pub enum CoreError {
    /// A requested resource (table, topic, API, workflow, ...) was not
    /// found in the registry.
    NotFound(String),
    /// A configuration key was missing or malformed.
    Config(String),
    /// Broker client construction or connection failed.
    Broker(String),
    /// OLAP client construction or connection failed.
    Olap(String),
    /// A value failed structural validation (e.g. topic name affixes).
    Validation(String),
    /// Anything else.
    Internal(String),
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoreError::NotFound(msg) => write!(f, "not found: {msg}"),
            CoreError::Config(msg) => write!(f, "config error: {msg}"),
            CoreError::Broker(msg) => write!(f, "broker error: {msg}"),
            CoreError::Olap(msg) => write!(f, "olap error: {msg}"),
            CoreError::Validation(msg) => write!(f, "validation error: {msg}"),
            CoreError::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        CoreError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Validation(err.to_string())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
