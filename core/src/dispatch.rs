//! Turning a configured `RequestBuilder` into one outbound request.
//!
//! # Design
//! Dispatch is split the same way the I/O boundary is: `build_request` is a
//! pure function of builder state (URL parsing, query merge, header and auth
//! application) and `dispatch` hands its output to a `Transport` and drains
//! the response. Failures surface at the step where they happen; a
//! `Response` is only returned once the whole body has been read.

use std::io::Read;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{debug, warn};
use url::Url;

use crate::builder::{Body, RequestBuilder};
use crate::error::{PartyError, Result};
use crate::http::{HttpRequest, Response};
use crate::mime::{CONTENT_TYPE, MIME_JSON};
use crate::transport::{Transport, TransportResponse};

const AUTHORIZATION: &str = "Authorization";

impl RequestBuilder {
    /// Materialize the outbound request without performing any I/O.
    ///
    /// Fails with `RequestConstruction` if the URL does not parse.
    pub fn build_request(&self) -> Result<HttpRequest> {
        let mut url = Url::parse(&self.url)
            .map_err(|e| PartyError::RequestConstruction(format!("{}: {e}", self.url)))?;
        if let Some(params) = &self.query_params {
            merge_query(&mut url, params.iter());
        }

        let (body, multipart_type) = match &self.body {
            Body::Empty => (Vec::new(), None),
            Body::Bytes(bytes) => (bytes.clone(), None),
            Body::Multipart(form) => (form.bytes.clone(), Some(form.content_type.clone())),
        };

        let mut headers: Vec<(String, String)> = self
            .headers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        match multipart_type {
            Some(content_type) => {
                remove_header(&mut headers, CONTENT_TYPE);
                headers.push((CONTENT_TYPE.to_string(), content_type));
            }
            None if !body.is_empty() && self.content_type().is_none() => {
                headers.push((CONTENT_TYPE.to_string(), MIME_JSON.to_string()));
            }
            None => {}
        }

        if let Some(auth) = &self.basic_auth {
            let token = STANDARD.encode(format!("{}:{}", auth.username, auth.password));
            remove_header(&mut headers, AUTHORIZATION);
            headers.push((AUTHORIZATION.to_string(), format!("Basic {token}")));
        }

        Ok(HttpRequest {
            method: self.method,
            url: url.into(),
            headers,
            body,
        })
    }

    /// Build the request, execute it on `transport` and read the response.
    ///
    /// Non-2xx statuses are returned as a normal `Response`. Nothing stops a
    /// builder from being dispatched twice, but each call sends a fresh
    /// request built from the same state.
    pub fn dispatch<T: Transport + ?Sized>(&self, transport: &T) -> Result<Response> {
        let request = self.build_request()?;
        execute(transport, &request)
    }
}

/// Run `request` on `transport` and drain the response body.
pub fn execute<T: Transport + ?Sized>(transport: &T, request: &HttpRequest) -> Result<Response> {
    let url = loggable_url(&request.url);
    debug!(method = %request.method, %url, bytes = request.body.len(), "dispatching request");

    let TransportResponse {
        status,
        headers,
        mut body,
    } = transport.execute(request).map_err(|e| {
        warn!(method = %request.method, %url, error = %e, "transport failed");
        PartyError::Network(e)
    })?;

    let mut bytes = Vec::new();
    body.read_to_end(&mut bytes)
        .map_err(|e| PartyError::io("read response body", e))?;
    debug!(status, bytes = bytes.len(), "received response");

    Ok(Response {
        status,
        headers,
        body: String::from_utf8_lossy(&bytes).into_owned(),
    })
}

/// Append `params` to the URL's query and re-serialize it sorted by key.
/// Existing values are kept; a repeated key gains an extra value.
fn merge_query<'a>(url: &mut Url, params: impl Iterator<Item = (&'a String, &'a String)>) {
    let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    pairs.extend(params.map(|(k, v)| (k.clone(), v.clone())));
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    if pairs.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(pairs);
    }
}

/// The URL without userinfo, query or fragment, for log events.
fn loggable_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) => {
            // Only fails for URLs that cannot carry credentials.
            let _ = url.set_username("");
            let _ = url.set_password(None);
            url.set_query(None);
            url.set_fragment(None);
            url.into()
        }
        Err(_) => "<invalid url>".to_string(),
    }
}

fn remove_header(headers: &mut Vec<(String, String)>, name: &str) {
    headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
}
