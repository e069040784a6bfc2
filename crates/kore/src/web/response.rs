//! Outbound web response and its CGI serialisation.

use std::io::{self, Write};

/// An outbound web response.
///
/// The status stays unset until a handler or an error path picks one, so
/// error handling can tell an explicit status apart from the default 200.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    status: Option<u16>,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Response {
    /// Empty response with no explicit status.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty response with `status`.
    #[must_use]
    pub fn with_status(status: u16) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Status code, 200 unless one was set.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status.unwrap_or(200)
    }

    /// Whether a status was set explicitly.
    #[must_use]
    pub const fn has_explicit_status(&self) -> bool {
        self.status.is_some()
    }

    /// Sets the status code.
    pub const fn set_status(&mut self, status: u16) {
        self.status = Some(status);
    }

    /// Sets header `name`, replacing any earlier value of the same name.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers
            .retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
        self.headers.push((name.to_owned(), value.into()));
    }

    /// Header `name`, compared case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Headers in insertion order.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Replaces the body.
    pub fn set_body(&mut self, body: impl Into<Vec<u8>>) {
        self.body = body.into();
    }

    /// Appends to the body.
    pub fn append_body(&mut self, chunk: &[u8]) {
        self.body.extend_from_slice(chunk);
    }

    /// Body bytes.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body as text, with invalid UTF-8 replaced.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Writes the response in CGI form: a `Status:` line, the headers, a
    /// blank line, then the body.
    ///
    /// # Errors
    ///
    /// Returns the I/O error raised by `out`.
    pub fn write_cgi(&self, out: &mut impl Write) -> io::Result<()> {
        let status = self.status();
        match reason_phrase(status) {
            "" => write!(out, "Status: {status}\r\n")?,
            reason => write!(out, "Status: {status} {reason}\r\n")?,
        }
        for (name, value) in &self.headers {
            write!(out, "{name}: {value}\r\n")?;
        }
        out.write_all(b"\r\n")?;
        out.write_all(&self.body)?;
        out.flush()
    }
}

const fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "",
    }
}
