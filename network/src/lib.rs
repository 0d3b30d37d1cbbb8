// Everything that talks to the rig: the motors vocabulary, the HTTP gateway behind a retrying
// client, and the file based gateways used to replay or record a session.

pub mod client;
pub mod gateway;
pub mod motors;
pub mod replay;

use thiserror::Error;

pub use client::{HttpTransport, ResilientClient, Response, RetryPolicy, Transport};
pub use gateway::{Gateway, HttpGateway};
pub use motors::{MotorsDirection, MotorsStatus};
pub use replay::{RecordingGateway, ReplayGateway};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("request {path} failed after {attempts} attempts: {last_error}")]
    Exhausted {
        path: String,
        attempts: u32,
        last_error: TransportError,
    },
    #[error("invalid payload from {path}: {reason}")]
    InvalidPayload { path: String, reason: String },
    #[error("unknown motors status {0:?}")]
    UnknownMotorsStatus(String),
    #[error("gateway client error: {0}")]
    Client(String),
    #[error("storage error on {path}: {reason}")]
    Storage { path: String, reason: String },
}

/// Why one attempt at the gateway failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("timed out: {0}")]
    Timeout(String),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout(e.to_string())
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else {
            TransportError::Request(e.to_string())
        }
    }
}
