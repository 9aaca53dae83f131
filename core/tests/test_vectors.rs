//! Verify body encoding and request materialization against JSON test
//! vectors stored in `test-vectors/`.
//!
//! Comparing bodies as exact strings is deliberate here: key order and
//! escaping are part of the wire contract for form bodies.

use std::collections::BTreeMap;

use party_core::{Body, HttpMethod, PartyError, RequestBuilder};

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    s.parse()
        .unwrap_or_else(|_| panic!("unknown method: {s}"))
}

fn string_map(value: &serde_json::Value) -> BTreeMap<String, String> {
    serde_json::from_value(value.clone()).unwrap()
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

#[test]
fn encoding_test_vectors() {
    let raw = include_str!("../../test-vectors/encoding.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let content_type = case["content_type"].as_str().unwrap();

        let mut builder = RequestBuilder::new(HttpMethod::Post, "http://example.test/");
        if !content_type.is_empty() {
            builder.set_header(content_type, Vec::<(String, String)>::new());
        }
        let result = builder.set_request_body(&case["input"]).map(|_| ());

        if let Some(expected_error) = case.get("expected_error") {
            let err = result.unwrap_err();
            match expected_error.as_str().unwrap() {
                "Encoding" => assert!(
                    matches!(err, PartyError::Encoding { .. }),
                    "{name}: expected Encoding, got {err:?}"
                ),
                other => panic!("{name}: unknown expected_error: {other}"),
            }
            assert_eq!(builder.body(), &Body::Empty, "{name}: body should be untouched");
            continue;
        }

        result.unwrap_or_else(|e| panic!("{name}: {e}"));
        match case["expected_body"].as_str() {
            Some(expected) => assert_eq!(
                builder.body(),
                &Body::Bytes(expected.as_bytes().to_vec()),
                "{name}: body"
            ),
            None => assert_eq!(builder.body(), &Body::Empty, "{name}: body"),
        }
    }
}

// ---------------------------------------------------------------------------
// Request materialization
// ---------------------------------------------------------------------------

#[test]
fn request_test_vectors() {
    let raw = include_str!("../../test-vectors/requests.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let method = parse_method(case["method"].as_str().unwrap());
        let mut builder = RequestBuilder::new(method, case["url"].as_str().unwrap());

        if case.get("content_type").is_some() || case.get("headers").is_some() {
            let headers = case.get("headers").map(string_map).unwrap_or_default();
            builder.set_header(case["content_type"].as_str().unwrap_or(""), headers);
        }
        if let Some(query) = case.get("query") {
            builder.set_query_param(string_map(query));
        }
        if let Some(auth) = case.get("basic_auth") {
            builder.set_basic_auth(
                auth[0].as_str().unwrap(),
                auth[1].as_str().unwrap(),
            );
        }
        if let Some(body) = case.get("body_str") {
            builder.set_request_body_str(body.as_str().unwrap());
        }

        let req = builder.build_request().unwrap();
        let expected = &case["expected_request"];
        assert_eq!(req.method, method, "{name}: method");
        assert_eq!(req.url, expected["url"].as_str().unwrap(), "{name}: url");

        let expected_headers: Vec<(String, String)> = expected["headers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|h| {
                let arr = h.as_array().unwrap();
                (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
            })
            .collect();
        assert_eq!(req.headers, expected_headers, "{name}: headers");
        assert_eq!(
            req.body,
            expected["body"].as_str().unwrap().as_bytes(),
            "{name}: body"
        );
    }
}
