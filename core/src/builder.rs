//! Incremental request configuration.
//!
//! # Design
//! `RequestBuilder` owns all request state and performs no I/O. Configuration
//! calls take `&mut self` and hand the builder back for chaining; fallible
//! calls return `Result<&mut Self>` and leave the state untouched when they
//! fail. The builder is single-owner and not meant to be shared across
//! threads while it is being configured. `dispatch` (see `dispatch.rs`) turns
//! it into exactly one outbound request.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::http::HttpMethod;
use crate::mime::{BodyEncoding, CONTENT_TYPE, MIME_JSON};
use crate::multipart::{MultipartBody, MultipartForm};

/// The body a request will carry. Setting a new body replaces the old one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Body {
    #[default]
    Empty,
    Bytes(Vec<u8>),
    Multipart(MultipartBody),
}

/// A single basic-auth credential pair.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Accumulates method, URL, headers, query, credentials and body for one
/// request.
///
/// ```no_run
/// use party_core::{HttpMethod, RequestBuilder, UreqTransport, MIME_JSON};
///
/// let transport = UreqTransport::new();
/// let response = RequestBuilder::new(HttpMethod::Post, "http://localhost:3000/items")
///     .set_header(MIME_JSON, [("X-Trace", "1")])
///     .set_request_body(&serde_json::json!({ "name": "a" }))?
///     .dispatch(&transport)?;
/// println!("{} {}", response.status, response.body);
/// # Ok::<(), party_core::PartyError>(())
/// ```
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    pub(crate) method: HttpMethod,
    pub(crate) url: String,
    pub(crate) headers: BTreeMap<String, String>,
    pub(crate) query_params: Option<BTreeMap<String, String>>,
    pub(crate) basic_auth: Option<BasicAuth>,
    pub(crate) body: Body,
}

impl RequestBuilder {
    /// The URL is not validated until dispatch.
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: BTreeMap::new(),
            query_params: None,
            basic_auth: None,
            body: Body::Empty,
        }
    }

    /// Merge `headers` into the accumulated headers, then declare the content
    /// type. A non-empty `content_type` always wins; an empty one leaves an
    /// existing `Content-Type` alone and otherwise defaults to JSON.
    ///
    /// Header names compare case-insensitively: a later `x-a` replaces an
    /// earlier `X-A`, and the later spelling is kept.
    pub fn set_header<I, K, V>(&mut self, content_type: &str, headers: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in headers {
            self.insert_header(name.into(), value.into());
        }
        if !content_type.is_empty() {
            self.insert_header(CONTENT_TYPE.to_string(), content_type.to_string());
        } else if self.content_type().is_none() {
            self.insert_header(CONTENT_TYPE.to_string(), MIME_JSON.to_string());
        }
        self
    }

    fn insert_header(&mut self, name: String, value: String) {
        self.headers.retain(|k, _| !k.eq_ignore_ascii_case(&name));
        self.headers.insert(name, value);
    }

    /// Replace the query parameters appended at dispatch.
    pub fn set_query_param<I, K, V>(&mut self, params: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query_params = Some(
            params
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Replace the basic-auth credential.
    pub fn set_basic_auth(
        &mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> &mut Self {
        self.basic_auth = Some(BasicAuth {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    /// Serialize `value` according to the declared `Content-Type`.
    ///
    /// Under a multipart content type this is a no-op; use `set_form_data`.
    pub fn set_request_body<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<&mut Self> {
        let encoding = BodyEncoding::from_content_type(self.content_type());
        if let Some(bytes) = encoding.encode(value)? {
            self.body = Body::Bytes(bytes);
        }
        Ok(self)
    }

    /// Use `body` verbatim, whatever the declared content type.
    pub fn set_request_body_str(&mut self, body: impl Into<String>) -> &mut Self {
        self.body = Body::Bytes(body.into().into_bytes());
        self
    }

    /// Build a `multipart/form-data` body from files and text fields.
    ///
    /// `files` maps field names to paths; each file is read fully and closed
    /// before the next is opened. Parts are written in field-name order,
    /// files first. At dispatch the multipart `Content-Type` replaces any
    /// declared one.
    pub fn set_form_data<F, K, P, T, N, V>(&mut self, files: F, fields: T) -> Result<&mut Self>
    where
        F: IntoIterator<Item = (K, P)>,
        K: Into<String>,
        P: AsRef<Path>,
        T: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<String>,
    {
        let files: BTreeMap<String, P> = files.into_iter().map(|(k, p)| (k.into(), p)).collect();
        let fields: BTreeMap<String, String> = fields
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let mut form = MultipartForm::new();
        for (name, path) in &files {
            form.add_file(name, path)?;
        }
        for (name, value) in &fields {
            form.add_text(name, value);
        }
        self.body = Body::Multipart(form.finish());
        Ok(self)
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn query_params(&self) -> Option<&BTreeMap<String, String>> {
        self.query_params.as_ref()
    }

    pub fn basic_auth(&self) -> Option<&BasicAuth> {
        self.basic_auth.as_ref()
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    /// The declared content type. `Content-Type` is matched exactly first,
    /// then case-insensitively.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .or_else(|| {
                self.headers
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(CONTENT_TYPE))
                    .map(|(_, v)| v)
            })
            .map(String::as_str)
    }
}
