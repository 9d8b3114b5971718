use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod service_config;
pub mod wire;

pub use service_config::{HedgingPolicy, RetryPolicy, ServiceConfig};
pub use wire::WireFormat;

pub const MAX_NAME_SIZE: usize = 1_024;

/// Error types for greeter operations
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GreetError {
    /// The server declined the call with 503; safe to retry or hedge.
    #[error("Greeter unavailable: {0}")]
    Unavailable(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {0}: {1}")]
    Http(u16, String),

    #[error("Call exceeded deadline of {0} ms")]
    Timeout(u64),

    #[error("Wire format error: {0}")]
    WireFormat(String),

    #[error("Name exceeds maximum size of {0} bytes")]
    NameTooLarge(usize),

    #[error("Invalid service config: {0}")]
    InvalidConfig(String),
}

/// JSON error envelope returned by the server for all error responses
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Unary greeting request: the name to greet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelloRequest {
    pub name: String,
}

/// Unary greeting reply: `hello <name>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelloReply {
    pub message: String,
}

/// Result type for greeter operations
pub type Result<T> = std::result::Result<T, GreetError>;
