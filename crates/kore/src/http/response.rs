//! Parsed outbound response.

use std::borrow::Cow;

use serde::de::DeserializeOwned;

use super::HttpError;
use super::exchange::RawResponse;

/// Response split into status, header block and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    status: u16,
    header: String,
    body: Vec<u8>,
}

impl HttpResponse {
    /// Builds a response from its parts.
    #[must_use]
    pub fn new(status: u16, header: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            header: header.into(),
            body: body.into(),
        }
    }

    pub(super) fn from_raw(exchanged: RawResponse) -> Self {
        let RawResponse {
            status,
            mut raw,
            header_size,
        } = exchanged;
        let body = raw.split_off(header_size.min(raw.len()));
        Self {
            status,
            header: String::from_utf8_lossy(&raw).into_owned(),
            body,
        }
    }

    /// Status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Complete header block, status line included.
    #[must_use]
    pub fn header(&self) -> &str {
        &self.header
    }

    /// First value of the header `name`, compared case-insensitively.
    ///
    /// The value ends at the first whitespace character.
    #[must_use]
    pub fn header_line(&self, name: &str) -> Option<&str> {
        self.header.lines().find_map(|line| {
            let (key, rest) = line.split_once(':')?;
            if !key.trim().eq_ignore_ascii_case(name) {
                return None;
            }
            let value = rest.trim_start();
            let end = value.find(char::is_whitespace).unwrap_or(value.len());
            value.get(..end)
        })
    }

    /// Raw body bytes.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body as text, with invalid UTF-8 replaced.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Body decoded as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Json`] when the body is not valid JSON for `T`.
    pub fn json_body<T: DeserializeOwned>(&self) -> Result<T, HttpError> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    fn sample() -> HttpResponse {
        let header = "HTTP/1.1 201 Created\r\ncontent-type: application/json; charset=utf-8\r\nX-Trace: abc 123\r\n\r\n";
        let body = br#"{"id":7}"#;
        let mut raw = header.as_bytes().to_vec();
        raw.extend_from_slice(body);
        HttpResponse::from_raw(RawResponse {
            status: 201,
            raw,
            header_size: header.len(),
        })
    }

    #[test]
    fn splits_header_block_from_body() {
        let response = sample();
        assert_eq!(response.status(), 201);
        assert!(response.header().starts_with("HTTP/1.1 201 Created"));
        assert_eq!(response.text(), r#"{"id":7}"#);
    }

    #[test]
    fn header_lookup_is_case_insensitive_and_stops_at_whitespace() {
        let response = sample();
        assert_eq!(response.header_line("Content-Type"), Some("application/json;"));
        assert_eq!(response.header_line("x-trace"), Some("abc"));
        assert_eq!(response.header_line("Missing"), None);
    }

    #[test]
    fn decodes_json_bodies() {
        let value: Value = sample().json_body().expect("json body");
        assert_eq!(value, json!({"id": 7}));
        let broken = HttpResponse::new(200, "", "not json");
        assert!(broken.json_body::<Value>().is_err());
    }
}
