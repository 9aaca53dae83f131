//! The transport seam: whatever actually puts an `HttpRequest` on the wire.
//!
//! # Design
//! The dispatcher never opens sockets itself. It hands a finished
//! `HttpRequest` to a `Transport` and drains the body stream it gets back.
//! Retries, TLS, pooling and deadlines all belong to the transport; one
//! transport is meant to be shared by many builders.
//!
//! `UreqTransport` is the blocking implementation used by default. Tests
//! substitute their own `Transport` to inspect outbound requests.

use std::fmt;
use std::io::Read;
use std::sync::Arc;

use crate::http::HttpRequest;

/// Error reported by a transport: DNS, connect, TLS, timeout and the like.
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// Status line and headers of a response whose body has not been read yet.
pub struct TransportResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Box<dyn Read>,
}

impl fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Executes one HTTP round-trip.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<TransportResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest) -> Result<TransportResponse, TransportError> {
        (**self).execute(request)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn execute(&self, request: &HttpRequest) -> Result<TransportResponse, TransportError> {
        (**self).execute(request)
    }
}

/// Blocking transport backed by a `ureq::Agent`.
///
/// The agent is cheap to clone and pools connections internally, so a single
/// `UreqTransport` can serve every request in a program. Non-2xx statuses are
/// returned as responses, not errors.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }

    /// Use a caller-configured agent, e.g. one with a global timeout.
    ///
    /// The agent should be built with `http_status_as_error(false)`;
    /// otherwise 4xx/5xx responses surface as `PartyError::Network`.
    pub fn with_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport").finish_non_exhaustive()
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<TransportResponse, TransportError> {
        let mut builder = ureq::http::Request::builder()
            .method(request.method.as_str())
            .uri(request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = if request.body.is_empty() {
            self.agent.run(builder.body(())?)?
        } else {
            self.agent.run(builder.body(request.body.as_slice())?)?
        };

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.into_body().into_reader();

        Ok(TransportResponse {
            status,
            headers,
            body: Box::new(body),
        })
    }
}
