//! Transport seam for outbound HTTP requests and its `ureq` implementation.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use strum::{Display, EnumString};
use thiserror::Error;

/// HTTP verbs issued by [`HttpClient`](super::HttpClient).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Method {
    /// `GET`, parameters travel in the query string.
    Get,
    /// `POST`.
    Post,
    /// `PUT`.
    Put,
    /// `PATCH`.
    Patch,
    /// `DELETE`.
    Delete,
}

impl Method {
    /// Upper-case verb.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

/// Basic-auth credentials parsed from `user:password`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    user: String,
    password: String,
}

impl Credentials {
    /// Creates credentials from their parts.
    #[must_use]
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }

    /// Parses `user:password`. A missing colon yields an empty password.
    #[must_use]
    pub fn parse(userpwd: &str) -> Self {
        userpwd.split_once(':').map_or_else(
            || Self::new(userpwd, ""),
            |(user, password)| Self::new(user, password),
        )
    }

    /// User name.
    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Value of the `Authorization` header.
    #[must_use]
    pub fn authorization(&self) -> String {
        let token = STANDARD.encode(format!("{}:{}", self.user, self.password));
        format!("Basic {token}")
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A fully prepared request handed to an [`Exchange`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    /// Verb to issue.
    pub method: Method,
    /// Target URL, query string included.
    pub url: String,
    /// Header pairs in send order.
    pub headers: Vec<(String, String)>,
    /// Encoded body for verbs that carry one.
    pub body: Option<Vec<u8>>,
}

/// Raw bytes returned by an [`Exchange`]: header block followed by body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// Status code.
    pub status: u16,
    /// Header block and body, concatenated.
    pub raw: Vec<u8>,
    /// Length of the header block within `raw`.
    pub header_size: usize,
}

/// Failure to obtain any response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ExchangeFailure(pub String);

/// Transport seam issuing one request and returning the raw response.
pub trait Exchange {
    /// Sends `request` and waits for the complete response.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeFailure`] when no response could be obtained.
    fn exchange(&self, request: &OutboundRequest) -> Result<RawResponse, ExchangeFailure>;
}

/// Blocking transport with TLS certificate verification disabled, no
/// client-side timeout and no redirect following. Bodies are read in full
/// whatever their size.
#[derive(Debug)]
pub struct UreqExchange {
    agent: ureq::Agent,
}

impl UreqExchange {
    /// Builds the transport.
    #[must_use]
    pub fn new() -> Self {
        let config = ureq::Agent::config_builder()
            .tls_config(
                ureq::tls::TlsConfig::builder()
                    .disable_verification(true)
                    .build(),
            )
            .http_status_as_error(false)
            .max_redirects(0)
            .build();
        Self {
            agent: config.into(),
        }
    }
}

impl Default for UreqExchange {
    fn default() -> Self {
        Self::new()
    }
}

impl Exchange for UreqExchange {
    fn exchange(&self, request: &OutboundRequest) -> Result<RawResponse, ExchangeFailure> {
        let mut builder = ureq::http::Request::builder()
            .method(request.method.as_str())
            .uri(request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let mut response = if let Some(body) = &request.body {
            let req = builder.body(body.clone()).map_err(failure)?;
            self.agent.run(req).map_err(failure)?
        } else {
            let req = builder.body(()).map_err(failure)?;
            self.agent.run(req).map_err(failure)?
        };

        let mut raw = format!("{:?} {}\r\n", response.version(), response.status()).into_bytes();
        for (name, value) in response.headers() {
            raw.extend_from_slice(name.as_str().as_bytes());
            raw.extend_from_slice(b": ");
            raw.extend_from_slice(value.as_bytes());
            raw.extend_from_slice(b"\r\n");
        }
        raw.extend_from_slice(b"\r\n");
        let header_size = raw.len();

        let body = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()
            .map_err(failure)?;
        raw.extend_from_slice(&body);
        Ok(RawResponse {
            status: response.status().as_u16(),
            raw,
            header_size,
        })
    }
}

fn failure(error: impl fmt::Display) -> ExchangeFailure {
    ExchangeFailure(error.to_string())
}
