//! Verb-per-method HTTP client over an [`Exchange`] transport.
//!
//! Parameters are a JSON value. The client picks the query string, a form
//! body or a JSON body from the verb and the headers, and logs each call.

use std::time::Instant;

use serde_json::Value;
use tracing::{debug, error};
use url::Url;

use super::exchange::{Credentials, Exchange, Method, OutboundRequest, UreqExchange};
use super::query::{build_query, url_add_query};
use super::{HTTP_TARGET, HttpError, HttpResponse};

/// Outbound HTTP client with one method per verb.
///
/// `params` is a JSON object (or array). GET sends it as a query string; the
/// other verbs send it as a form-urlencoded body, or as JSON when a
/// `Content-Type: application/json` header is present.
#[derive(Debug)]
pub struct HttpClient<E = UreqExchange> {
    exchange: E,
}

impl HttpClient {
    /// Client over the default blocking transport.
    #[must_use]
    pub fn new() -> Self {
        Self::with_exchange(UreqExchange::new())
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Exchange> HttpClient<E> {
    /// Client over a caller-supplied transport.
    #[must_use]
    pub const fn with_exchange(exchange: E) -> Self {
        Self { exchange }
    }

    /// Sends a GET request.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::communicate`].
    pub fn get(
        &self,
        url: &str,
        params: &Value,
        headers: &[(&str, &str)],
        credentials: Option<&Credentials>,
    ) -> Result<HttpResponse, HttpError> {
        self.communicate(Method::Get, url, params, headers, credentials)
    }

    /// Sends a POST request.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::communicate`].
    pub fn post(
        &self,
        url: &str,
        params: &Value,
        headers: &[(&str, &str)],
        credentials: Option<&Credentials>,
    ) -> Result<HttpResponse, HttpError> {
        self.communicate(Method::Post, url, params, headers, credentials)
    }

    /// Sends a PUT request.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::communicate`].
    pub fn put(
        &self,
        url: &str,
        params: &Value,
        headers: &[(&str, &str)],
        credentials: Option<&Credentials>,
    ) -> Result<HttpResponse, HttpError> {
        self.communicate(Method::Put, url, params, headers, credentials)
    }

    /// Sends a PATCH request.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::communicate`].
    pub fn patch(
        &self,
        url: &str,
        params: &Value,
        headers: &[(&str, &str)],
        credentials: Option<&Credentials>,
    ) -> Result<HttpResponse, HttpError> {
        self.communicate(Method::Patch, url, params, headers, credentials)
    }

    /// Sends a DELETE request.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::communicate`].
    pub fn delete(
        &self,
        url: &str,
        params: &Value,
        headers: &[(&str, &str)],
        credentials: Option<&Credentials>,
    ) -> Result<HttpResponse, HttpError> {
        self.communicate(Method::Delete, url, params, headers, credentials)
    }

    /// Encodes and sends one request, then splits the response.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::InvalidUrl`] before sending when `url` is blank or
    /// unparsable, [`HttpError::Json`] when a JSON body cannot be encoded, and
    /// [`HttpError::Exchange`] when no response is obtained.
    pub fn communicate(
        &self,
        method: Method,
        url: &str,
        params: &Value,
        headers: &[(&str, &str)],
        credentials: Option<&Credentials>,
    ) -> Result<HttpResponse, HttpError> {
        if url.trim().is_empty() {
            return Err(HttpError::invalid_url(url, "url is blank"));
        }
        Url::parse(url).map_err(|error| HttpError::invalid_url(url, error.to_string()))?;

        let request = build_request(method, url, params, headers, credentials)?;
        let started = Instant::now();
        let outcome = self.exchange.exchange(&request);
        let secs = started.elapsed().as_secs_f64();

        match outcome {
            Ok(raw) => {
                debug!(target: HTTP_TARGET, "[{url}][{}][{secs:.6}sec]", raw.status);
                Ok(HttpResponse::from_raw(raw))
            }
            Err(failure) => {
                debug!(target: HTTP_TARGET, "[{url}][0][{secs:.6}sec]");
                error!(target: HTTP_TARGET, dump = %failure, "Acquisition failed[0]");
                Err(HttpError::Exchange {
                    url: url.to_owned(),
                    reason: failure.to_string(),
                })
            }
        }
    }
}

fn build_request(
    method: Method,
    url: &str,
    params: &Value,
    headers: &[(&str, &str)],
    credentials: Option<&Credentials>,
) -> Result<OutboundRequest, HttpError> {
    let mut header_pairs: Vec<(String, String)> = headers
        .iter()
        .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
        .collect();
    if let Some(auth) = credentials {
        header_pairs.push((String::from("Authorization"), auth.authorization()));
    }

    let (target, body) = match method {
        Method::Get => (url_add_query(url, params), None),
        Method::Post | Method::Put | Method::Patch | Method::Delete => {
            let body = if wants_json(headers) {
                serde_json::to_vec(params)?
            } else {
                build_query(params).into_bytes()
            };
            (url.to_owned(), Some(body))
        }
    };

    Ok(OutboundRequest {
        method,
        url: target,
        headers: header_pairs,
        body,
    })
}

fn wants_json(headers: &[(&str, &str)]) -> bool {
    headers.iter().any(|(name, value)| {
        name.eq_ignore_ascii_case("content-type")
            && value
                .trim_start()
                .to_ascii_lowercase()
                .starts_with("application/json")
    })
}
