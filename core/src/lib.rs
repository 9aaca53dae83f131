//! Generic outbound HTTP request builder.
//!
//! # Overview
//! A `RequestBuilder` accumulates method, URL, headers, query parameters,
//! basic-auth credentials and a body, then `dispatch` issues exactly one
//! request through an injected `Transport` and returns a normalized
//! `Response`.
//!
//! # Design
//! - Body encoding is selected from the declared `Content-Type` through the
//!   closed `BodyEncoding` enum (JSON, XML, URL-encoded form, multipart).
//! - Request materialization (`build_request`) is free of I/O; only the
//!   transport touches the network, so tests swap in a recording transport.
//! - `UreqTransport` is the blocking default. Timeouts and pooling are
//!   configured on its `ureq::Agent`, never by this crate.
//! - Every fallible call returns `PartyError`; non-2xx statuses are data.

pub mod builder;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod mime;
pub mod multipart;
pub mod transport;

pub use builder::{BasicAuth, Body, RequestBuilder};
pub use dispatch::execute;
pub use error::{PartyError, Result};
pub use http::{HttpMethod, HttpRequest, Response};
pub use mime::*;
pub use multipart::{MultipartBody, MultipartForm};
pub use transport::{Transport, TransportError, TransportResponse, UreqTransport};
