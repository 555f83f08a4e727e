//! Error types for the store API client.
//!
//! # Design
//! Each failure class gets its own enum so callers can tell apart problems
//! that happen at construction (`ConfigError`), while preparing a request
//! (`ParamError`, `SigningError`, serialization) and on the wire
//! (`TransportError`). `ApiError` is the umbrella returned by the request
//! methods; transport failures are carried through it untouched.

use thiserror::Error;

/// Raised synchronously while building a `ClientConfig`. Never raised later.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required option (`url`, `consumerKey`, `consumerSecret`) is absent or empty.
    #[error("{0} is required")]
    MissingOption(&'static str),

    /// The base URL is not an absolute URL with a host.
    #[error("invalid url '{0}'")]
    InvalidUrl(String),

    /// An optional setting carries a value the client cannot use.
    #[error("invalid value for {option}: {reason}")]
    InvalidOption { option: &'static str, reason: String },

    /// Options could not be loaded from file or environment.
    #[error("configuration error: {0}")]
    Figment(#[from] Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

/// A request parameter could not be represented as a flat query entry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParamError {
    /// Only one level of nesting (`key[prop]`) is supported.
    #[error("parameter '{key}' nests deeper than one level")]
    TooDeep { key: String },

    /// The top-level JSON value handed over as parameters was not an object.
    #[error("parameters must be a JSON object")]
    NotAnObject,
}

/// The HMAC primitive or the system clock failed while signing.
#[derive(Debug, Error)]
pub enum SigningError {
    #[error("signing key rejected by HMAC-SHA256")]
    InvalidKey,

    #[error("system clock is before the Unix epoch")]
    Clock,
}

/// Failures surfaced by the HTTP transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network, TLS, timeout or protocol failure.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a status the transport treats as a failure.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// A transport-specific failure that has no richer representation.
    #[error("transport error: {0}")]
    Other(String),
}

/// Errors returned by the client request methods.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Param(#[from] ParamError),

    #[error(transparent)]
    Signing(#[from] SigningError),

    /// The request body could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ApiError {
    /// Status code carried by a transport status failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport(TransportError::Status { status, .. }) => Some(*status),
            Self::Transport(TransportError::Request(err)) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
