//! Error types for request building and dispatch.
//!
//! # Design
//! Every fallible operation returns a single `PartyError`. The variants map
//! one-to-one onto the places a request can fail: encoding the body, local or
//! response-body I/O, constructing the outbound request, and the transport
//! round-trip. Non-2xx statuses are not errors; they come back as data in
//! `Response`.

use thiserror::Error;

use crate::transport::TransportError;

pub type Result<T> = std::result::Result<T, PartyError>;

/// Errors returned by `RequestBuilder` configuration calls and `dispatch`.
#[derive(Debug, Error)]
pub enum PartyError {
    /// The body value could not be represented in the declared content type.
    #[error("cannot encode request body as {content_type}: {message}")]
    Encoding {
        content_type: String,
        message: String,
    },

    /// A local file could not be read, or the response body could not be
    /// drained.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// The method/URL pair does not form a valid request.
    #[error("invalid request: {0}")]
    RequestConstruction(String),

    /// The transport failed before a response was received.
    #[error("transport failure: {0}")]
    Network(#[source] TransportError),
}

impl PartyError {
    pub(crate) fn encoding(content_type: &str, err: impl std::fmt::Display) -> Self {
        PartyError::Encoding {
            content_type: content_type.to_string(),
            message: err.to_string(),
        }
    }

    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        PartyError::Io {
            context: context.into(),
            source,
        }
    }
}
