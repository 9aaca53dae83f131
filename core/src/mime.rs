//! Content-type constants and the body-encoding policy keyed on them.
//!
//! # Design
//! The declared `Content-Type` is the only input to body encoding. It is
//! resolved once into a closed `BodyEncoding` so the policy is exhaustive
//! and can be tested without a builder. Only JSON, XML and URL-encoded forms
//! have serializers; every other media type is accepted as a header value
//! and falls back to JSON when a structured body is set.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::error::{PartyError, Result};

pub const CONTENT_TYPE: &str = "Content-Type";

pub const MIME_JSON: &str = "application/json";
pub const MIME_HTML: &str = "text/html";
pub const MIME_XML: &str = "application/xml";
pub const MIME_XML2: &str = "text/xml";
pub const MIME_PLAIN: &str = "text/plain";
pub const MIME_POST_FORM: &str = "application/x-www-form-urlencoded";
pub const MIME_MULTIPART_POST_FORM: &str = "multipart/form-data";
pub const MIME_PROTOBUF: &str = "application/x-protobuf";
pub const MIME_MSGPACK: &str = "application/x-msgpack";
pub const MIME_MSGPACK2: &str = "application/msgpack";
pub const MIME_YAML: &str = "application/x-yaml";

/// How `RequestBuilder::set_request_body` serializes a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyEncoding {
    Json,
    Xml,
    FormUrlEncoded,
    /// Multipart bodies are assembled by `set_form_data`; encoding is a no-op.
    Multipart,
}

impl BodyEncoding {
    /// Select the encoding for a declared content type. Parameters such as
    /// `charset` are ignored; unset and unrecognized types select JSON.
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        let essence = content_type
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_ascii_lowercase())
            .unwrap_or_default();

        match essence.as_str() {
            MIME_XML | MIME_XML2 => BodyEncoding::Xml,
            MIME_POST_FORM => BodyEncoding::FormUrlEncoded,
            MIME_MULTIPART_POST_FORM => BodyEncoding::Multipart,
            _ => BodyEncoding::Json,
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            BodyEncoding::Json => MIME_JSON,
            BodyEncoding::Xml => MIME_XML,
            BodyEncoding::FormUrlEncoded => MIME_POST_FORM,
            BodyEncoding::Multipart => MIME_MULTIPART_POST_FORM,
        }
    }

    /// Serialize `value`. Returns `Ok(None)` for `Multipart`, which leaves the
    /// current body untouched.
    pub fn encode<T: Serialize + ?Sized>(self, value: &T) -> Result<Option<Vec<u8>>> {
        let bytes = match self {
            BodyEncoding::Json => {
                serde_json::to_vec(value).map_err(|e| PartyError::encoding(self.mime(), e))?
            }
            BodyEncoding::Xml => quick_xml::se::to_string(value)
                .map(String::into_bytes)
                .map_err(|e| PartyError::encoding(self.mime(), e))?,
            BodyEncoding::FormUrlEncoded => encode_form(value)?.into_bytes(),
            BodyEncoding::Multipart => return Ok(None),
        };
        debug!(encoding = ?self, bytes = bytes.len(), "encoded request body");
        Ok(Some(bytes))
    }
}

/// Flatten `value` into string pairs and percent-encode them, keys ascending.
///
/// Any serializable value is accepted as long as it becomes a JSON object
/// whose values are all strings.
fn encode_form<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let json = serde_json::to_value(value).map_err(|e| PartyError::encoding(MIME_POST_FORM, e))?;
    let fields: BTreeMap<String, String> =
        serde_json::from_value(json).map_err(|e| PartyError::encoding(MIME_POST_FORM, e))?;
    serde_urlencoded::to_string(&fields).map_err(|e| PartyError::encoding(MIME_POST_FORM, e))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use proptest::prelude::*;
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Item {
        name: String,
        count: u32,
    }

    #[test]
    fn selects_encoding_from_content_type() {
        assert_eq!(BodyEncoding::from_content_type(None), BodyEncoding::Json);
        assert_eq!(BodyEncoding::from_content_type(Some("")), BodyEncoding::Json);
        assert_eq!(BodyEncoding::from_content_type(Some(MIME_JSON)), BodyEncoding::Json);
        assert_eq!(BodyEncoding::from_content_type(Some(MIME_XML)), BodyEncoding::Xml);
        assert_eq!(BodyEncoding::from_content_type(Some(MIME_XML2)), BodyEncoding::Xml);
        assert_eq!(
            BodyEncoding::from_content_type(Some(MIME_POST_FORM)),
            BodyEncoding::FormUrlEncoded
        );
        assert_eq!(
            BodyEncoding::from_content_type(Some(MIME_MULTIPART_POST_FORM)),
            BodyEncoding::Multipart
        );
    }

    #[test]
    fn recognized_types_without_serializer_fall_back_to_json() {
        for ct in [MIME_HTML, MIME_PLAIN, MIME_PROTOBUF, MIME_MSGPACK, MIME_MSGPACK2, MIME_YAML] {
            assert_eq!(BodyEncoding::from_content_type(Some(ct)), BodyEncoding::Json, "{ct}");
        }
        assert_eq!(
            BodyEncoding::from_content_type(Some("application/vnd.custom")),
            BodyEncoding::Json
        );
    }

    #[test]
    fn parameters_and_case_are_ignored() {
        assert_eq!(
            BodyEncoding::from_content_type(Some("Application/XML; charset=utf-8")),
            BodyEncoding::Xml
        );
        assert_eq!(
            BodyEncoding::from_content_type(Some("multipart/form-data; boundary=abc")),
            BodyEncoding::Multipart
        );
    }

    #[test]
    fn json_encoding_roundtrips() {
        let item = Item {
            name: "shoe".to_string(),
            count: 2,
        };
        let bytes = BodyEncoding::Json.encode(&item).unwrap().unwrap();
        let back: Item = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn xml_encoding_roundtrips() {
        let item = Item {
            name: "shoe".to_string(),
            count: 2,
        };
        let bytes = BodyEncoding::Xml.encode(&item).unwrap().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("<Item>"), "{text}");
        let back: Item = quick_xml::de::from_str(&text).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn form_encoding_sorts_keys_and_escapes() {
        let mut fields = HashMap::new();
        fields.insert("b", "x y");
        fields.insert("a", "1&2");
        let bytes = BodyEncoding::FormUrlEncoded.encode(&fields).unwrap().unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "a=1%262&b=x+y");
    }

    #[test]
    fn form_encoding_rejects_non_string_values() {
        let item = Item {
            name: "shoe".to_string(),
            count: 2,
        };
        let err = BodyEncoding::FormUrlEncoded.encode(&item).unwrap_err();
        assert!(
            matches!(err, PartyError::Encoding { ref content_type, .. } if content_type == MIME_POST_FORM)
        );
    }

    #[test]
    fn form_encoding_rejects_non_map_values() {
        let err = BodyEncoding::FormUrlEncoded.encode(&vec!["a", "b"]).unwrap_err();
        assert!(matches!(err, PartyError::Encoding { .. }));
    }

    #[test]
    fn multipart_encoding_is_a_no_op() {
        assert!(BodyEncoding::Multipart.encode(&"ignored").unwrap().is_none());
    }

    proptest! {
        #[test]
        fn form_encoding_roundtrips(
            fields in proptest::collection::btree_map("[a-z_]{1,8}", "\\PC{0,12}", 0..6)
        ) {
            let bytes = BodyEncoding::FormUrlEncoded.encode(&fields).unwrap().unwrap();
            let back: BTreeMap<String, String> = serde_urlencoded::from_bytes(&bytes).unwrap();
            prop_assert_eq!(back, fields);
        }

        #[test]
        fn json_encoding_roundtrips_strings(name in "\\PC{0,24}", count in any::<u32>()) {
            let item = Item { name, count };
            let bytes = BodyEncoding::Json.encode(&item).unwrap().unwrap();
            let back: Item = serde_json::from_slice(&bytes).unwrap();
            prop_assert_eq!(back, item);
        }

        // The XML reader trims text, so names start and end with a visible char.
        #[test]
        fn xml_encoding_roundtrips_strings(
            name in r#"[A-Za-z0-9&<>"'.,!?-]([A-Za-z0-9&<>"' .,!?-]{0,22}[A-Za-z0-9&<>"'.,!?-])?"#,
            count in any::<u32>(),
        ) {
            let item = Item { name, count };
            let bytes = BodyEncoding::Xml.encode(&item).unwrap().unwrap();
            let back: Item = quick_xml::de::from_str(std::str::from_utf8(&bytes).unwrap()).unwrap();
            prop_assert_eq!(back, item);
        }
    }
}
