//! Inbound web request, built directly or from a CGI environment.

use std::collections::BTreeMap;
use std::io::{self, Read};

use serde::de::DeserializeOwned;
use url::form_urlencoded;

/// An inbound web request.
///
/// Headers are stored under their CGI names (`HTTP_X_REQUEST_ID`), so
/// [`Request::header`] accepts either spelling of a header name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    method: String,
    uri: String,
    query: BTreeMap<String, String>,
    post: BTreeMap<String, String>,
    cookies: BTreeMap<String, String>,
    headers: BTreeMap<String, String>,
    body: Vec<u8>,
}

impl Request {
    /// Creates a request for `method` and `uri`; the query string of `uri`
    /// populates the query parameters.
    #[must_use]
    pub fn new(method: &str, uri: &str) -> Self {
        let query = uri
            .split_once('?')
            .map(|(_, query)| parse_pairs(query))
            .unwrap_or_default();
        Self {
            method: method.to_ascii_uppercase(),
            uri: uri.to_owned(),
            query,
            ..Self::default()
        }
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(header_key(name), value.into());
        self
    }

    /// Adds a cookie.
    #[must_use]
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    /// Sets the raw body. A form-urlencoded content type also fills the
    /// post parameters.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        if self.is_form() {
            self.post = parse_pairs(&String::from_utf8_lossy(&self.body));
        }
        self
    }

    /// Builds a request from CGI variables and the request body.
    ///
    /// Reads `REQUEST_METHOD`, `REQUEST_URI` (or `PATH_INFO` plus
    /// `QUERY_STRING`), `HTTP_COOKIE`, every `HTTP_*` variable, and
    /// `CONTENT_TYPE`/`CONTENT_LENGTH`.
    #[must_use]
    pub fn from_cgi<I, K, V>(variables: I, body: Vec<u8>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: BTreeMap<String, String> = variables
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        let method = vars.get("REQUEST_METHOD").map_or("GET", String::as_str);
        let uri = vars.get("REQUEST_URI").cloned().unwrap_or_else(|| {
            let path = vars.get("PATH_INFO").map_or("/", String::as_str);
            vars.get("QUERY_STRING")
                .filter(|query| !query.is_empty())
                .map_or_else(|| path.to_owned(), |query| format!("{path}?{query}"))
        });

        let mut request = Self::new(method, &uri);
        if let Some(query) = vars.get("QUERY_STRING") {
            request.query = parse_pairs(query);
        }
        if let Some(cookie) = vars.get("HTTP_COOKIE") {
            request.cookies = parse_cookies(cookie);
        }
        for (key, value) in &vars {
            if key.starts_with("HTTP_") {
                request.headers.insert(key.clone(), value.clone());
            } else if key == "CONTENT_TYPE" || key == "CONTENT_LENGTH" {
                request.headers.insert(format!("HTTP_{key}"), value.clone());
            }
        }
        request.with_body(body)
    }

    /// Builds a request from the process environment and `stdin`.
    ///
    /// # Errors
    ///
    /// Returns the I/O error raised while reading the body.
    pub fn from_cgi_env(stdin: impl Read) -> io::Result<Self> {
        let vars: Vec<(String, String)> = std::env::vars().collect();
        let length = vars
            .iter()
            .find(|(key, _)| key == "CONTENT_LENGTH")
            .and_then(|(_, value)| value.trim().parse::<u64>().ok())
            .unwrap_or(0);
        let mut body = Vec::new();
        stdin.take(length).read_to_end(&mut body)?;
        Ok(Self::from_cgi(vars, body))
    }

    /// Upper-case HTTP method.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Request URI as received, query string included.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Query parameter `key`.
    #[must_use]
    pub fn query(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    /// All query parameters.
    #[must_use]
    pub const fn queries(&self) -> &BTreeMap<String, String> {
        &self.query
    }

    /// Form parameter `key`.
    #[must_use]
    pub fn post(&self, key: &str) -> Option<&str> {
        self.post.get(key).map(String::as_str)
    }

    /// All form parameters.
    #[must_use]
    pub const fn posts(&self) -> &BTreeMap<String, String> {
        &self.post
    }

    /// Cookie `key`.
    #[must_use]
    pub fn cookie(&self, key: &str) -> Option<&str> {
        self.cookies.get(key).map(String::as_str)
    }

    /// All cookies.
    #[must_use]
    pub const fn cookies(&self) -> &BTreeMap<String, String> {
        &self.cookies
    }

    /// Header `name`, as `X-Request-Id` or `HTTP_X_REQUEST_ID`.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&header_key(name)).map(String::as_str)
    }

    /// All headers keyed by CGI name.
    #[must_use]
    pub const fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Raw body.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body decoded as JSON.
    ///
    /// # Errors
    ///
    /// Returns the decoding error when the body is not valid JSON for `T`.
    pub fn json_body<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    fn is_form(&self) -> bool {
        self.header("Content-Type").is_some_and(|value| {
            value
                .to_ascii_lowercase()
                .starts_with("application/x-www-form-urlencoded")
        })
    }
}

fn header_key(name: &str) -> String {
    let upper = name.to_ascii_uppercase().replace('-', "_");
    if upper.starts_with("HTTP_") {
        upper
    } else {
        format!("HTTP_{upper}")
    }
}

fn parse_pairs(input: &str) -> BTreeMap<String, String> {
    form_urlencoded::parse(input.as_bytes())
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect()
}

fn parse_cookies(header: &str) -> BTreeMap<String, String> {
    header
        .split(';')
        .filter_map(|pair| {
            let (raw_name, value) = pair.split_once('=')?;
            let name = raw_name.trim();
            (!name.is_empty()).then(|| (name.to_owned(), value.trim().to_owned()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    fn cgi_request() -> Request {
        Request::from_cgi(
            [
                ("REQUEST_METHOD", "post"),
                ("REQUEST_URI", "/shop/items?page=2"),
                ("QUERY_STRING", "page=2&sort=name"),
                ("HTTP_COOKIE", "session=abc; theme=dark"),
                ("HTTP_X_REQUEST_ID", "r-1"),
                ("CONTENT_TYPE", "application/x-www-form-urlencoded"),
                ("SERVER_NAME", "localhost"),
            ],
            b"title=hello+world&qty=3".to_vec(),
        )
    }

    #[test]
    fn cgi_variables_populate_request() {
        let request = cgi_request();
        assert_eq!(request.method(), "POST");
        assert_eq!(request.uri(), "/shop/items?page=2");
        assert_eq!(request.query("sort"), Some("name"));
        assert_eq!(request.cookie("theme"), Some("dark"));
        assert_eq!(request.post("title"), Some("hello world"));
        assert_eq!(request.posts().len(), 2);
    }

    #[test]
    fn headers_accept_either_spelling() {
        let request = cgi_request();
        assert_eq!(request.header("X-Request-Id"), Some("r-1"));
        assert_eq!(request.header("HTTP_X_REQUEST_ID"), Some("r-1"));
        assert_eq!(request.header("x-missing"), None);
        assert!(!request.headers().contains_key("SERVER_NAME"));
    }

    #[test]
    fn uri_falls_back_to_path_info() {
        let request = Request::from_cgi(
            [("PATH_INFO", "/a/b"), ("QUERY_STRING", "x=1")],
            Vec::new(),
        );
        assert_eq!(request.method(), "GET");
        assert_eq!(request.uri(), "/a/b?x=1");
    }

    #[test]
    fn json_bodies_decode() {
        let request = Request::new("PUT", "/items/1").with_body(r#"{"qty": 4}"#);
        let value: Value = request.json_body().expect("json body");
        assert_eq!(value, json!({"qty": 4}));
        assert!(request.posts().is_empty());
    }

    #[test]
    fn cgi_env_reads_content_length_bytes() {
        let request = Request::from_cgi_env(&b"abc"[..]).expect("read body");
        assert!(request.body().len() <= 3);
    }
}
