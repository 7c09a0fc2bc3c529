//! Error types for the wheelspin client

use crate::types::{Operation, PlayerId};
use thiserror::Error;
use wheelspin_runtime::StoreError;

/// Failures of the HTTP transport itself
///
/// A response that arrived with a 2xx status is never a `TransportError`,
/// even when its envelope carries an application error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The HTTP client could not be constructed
    #[error("could not build HTTP client: {0}")]
    Client(String),

    /// The request could not complete (connection refused, reset, ...)
    #[error("request to {route} failed: {message}")]
    RequestFailed {
        /// Method and path of the request
        route: &'static str,
        /// Underlying error text
        message: String,
    },

    /// No response within the configured request timeout
    #[error("request to {route} timed out")]
    Timeout {
        /// Method and path of the request
        route: &'static str,
    },

    /// The server answered with a non-success status
    #[error("{route} responded with status {status}: {message}")]
    Status {
        /// Method and path of the request
        route: &'static str,
        /// HTTP status code
        status: u16,
        /// The `error` field of the body when present, otherwise the raw body
        message: String,
    },

    /// The response body was not the expected envelope
    #[error("could not decode response from {route}: {message}")]
    Decode {
        /// Method and path of the request
        route: &'static str,
        /// Decoder error text
        message: String,
    },
}

/// Outcome of a gateway call that did not produce a domain value
///
/// The `Display` text is what failure actions carry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The transport could not deliver a response
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    /// The response carried a non-empty `error` field; the text is the server's
    #[error("{0}")]
    Application(String),

    /// The request was rejected before reaching the transport
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The resolver returned a winner outside the submitted pool
    #[error("invalid spin result: winner {winner} is not among participants [{participants}]")]
    InvalidSpin {
        /// The returned winner
        winner: PlayerId,
        /// The submitted participant ids, comma separated
        participants: String,
    },

    /// The resolver echoed a pool other than the one submitted
    #[error("invalid spin result: participants [{returned}] differ from submitted [{submitted}]")]
    PoolMismatch {
        /// The submitted participant ids, comma separated
        submitted: String,
        /// The participant ids in the result, comma separated
        returned: String,
    },

    /// A success envelope without the payload it should carry
    #[error("malformed response: missing {0}")]
    MissingPayload(&'static str),
}

/// Invalid client configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A duration variable was not a positive whole number of seconds
    #[error("{var} must be a positive number of seconds, got {value:?}")]
    InvalidDuration {
        /// Variable name
        var: &'static str,
        /// The rejected value
        value: String,
    },

    /// The base URL has no http or https scheme
    #[error("base URL must start with http:// or https://, got {0:?}")]
    InvalidBaseUrl(String),
}

/// Failure to drive an intent to its outcome
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The store rejected the intent or timed out waiting for its effects
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Effects finished but no outcome for the operation was observed
    #[error("{0} finished without an outcome")]
    Unsettled(Operation),
}
