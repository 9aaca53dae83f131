//! In-memory `multipart/form-data` body writer.
//!
//! # Design
//! Parts are appended to a single byte buffer as they are added, so the
//! finished body is ready to send without a second pass. A file is opened,
//! copied and closed inside `add_file`; the handle never outlives the call,
//! whether the copy succeeds or not. A failed `add_file` rolls the buffer back
//! to where it was before the part started.

use std::fs::File;
use std::io;
use std::path::Path;

use tracing::debug;
use uuid::Uuid;

use crate::error::{PartyError, Result};
use crate::mime::MIME_MULTIPART_POST_FORM;

const FILE_PART_CONTENT_TYPE: &str = "application/octet-stream";

/// A multipart form under construction.
#[derive(Debug, Clone)]
pub struct MultipartForm {
    boundary: String,
    buf: Vec<u8>,
    parts: usize,
}

/// A finished multipart body and the `Content-Type` value that describes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartBody {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartForm {
    /// Start a form with a random boundary.
    pub fn new() -> Self {
        Self::with_boundary(format!("party-{}", Uuid::new_v4().simple()))
    }

    /// Start a form with a fixed boundary. The boundary must not occur in any
    /// part's content.
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            buf: Vec::new(),
            parts: 0,
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn content_type(&self) -> String {
        format!("{MIME_MULTIPART_POST_FORM}; boundary={}", self.boundary)
    }

    /// Append a plain form field.
    pub fn add_text(&mut self, name: &str, value: &str) -> &mut Self {
        self.begin_part(&format!(
            "Content-Disposition: form-data; name=\"{}\"\r\n",
            escape_quotes(name)
        ));
        self.buf.extend_from_slice(value.as_bytes());
        self
    }

    /// Append the contents of the file at `path` as a file part named `name`.
    /// The part's filename is the base name of `path`.
    pub fn add_file(&mut self, name: &str, path: impl AsRef<Path>) -> Result<&mut Self> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();

        let start = self.buf.len();
        let parts = self.parts;
        self.begin_part(&format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
             Content-Type: {FILE_PART_CONTENT_TYPE}\r\n",
            escape_quotes(name),
            escape_quotes(&filename)
        ));

        if let Err(err) = copy_file(path, &mut self.buf) {
            self.buf.truncate(start);
            self.parts = parts;
            return Err(err);
        }
        Ok(self)
    }

    /// Write the closing delimiter and return the body.
    pub fn finish(mut self) -> MultipartBody {
        if self.parts > 0 {
            self.buf.extend_from_slice(b"\r\n");
        }
        self.buf
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        debug!(parts = self.parts, bytes = self.buf.len(), "finished multipart form");
        MultipartBody {
            content_type: self.content_type(),
            bytes: self.buf,
        }
    }

    fn begin_part(&mut self, headers: &str) {
        if self.parts > 0 {
            self.buf.extend_from_slice(b"\r\n");
        }
        self.buf
            .extend_from_slice(format!("--{}\r\n{headers}\r\n", self.boundary).as_bytes());
        self.parts += 1;
    }
}

fn copy_file(path: &Path, out: &mut Vec<u8>) -> Result<()> {
    let mut file =
        File::open(path).map_err(|e| PartyError::io(format!("open {}", path.display()), e))?;
    io::copy(&mut file, out).map_err(|e| PartyError::io(format!("read {}", path.display()), e))?;
    Ok(())
}

fn escape_quotes(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
