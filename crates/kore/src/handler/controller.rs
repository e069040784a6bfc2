//! The [`Controller`] trait and the context a controller run sees.
//!
//! The context owns the response under construction, so hooks and the
//! action write into the same status, headers and body.

use std::collections::BTreeMap;

use kore_config::{DEFAULT_MODULE_NAME, LogLevel};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::app::App;
use crate::dispatch::HandlerId;
use crate::web::{Request, Response, ViewError};

/// A web handler.
///
/// Only [`Controller::action`] is required. The other methods are hooks
/// with framework defaults.
pub trait Controller {
    /// Handles the request.
    ///
    /// # Errors
    ///
    /// Any error is logged and passed to [`Controller::handle_error`].
    fn action(&mut self, ctx: &mut ControllerContext<'_>) -> anyhow::Result<()>;

    /// Log file name used while this controller runs.
    fn module_name(&self) -> &str {
        DEFAULT_MODULE_NAME
    }

    /// Minimum severity written while this controller runs.
    fn log_level(&self) -> LogLevel {
        LogLevel::Debug
    }

    /// Runs before [`Controller::action`].
    ///
    /// # Errors
    ///
    /// An error skips the action and reaches [`Controller::handle_error`].
    fn pre_action(&mut self, _ctx: &mut ControllerContext<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Handles an error raised by the pre-hook or the action.
    ///
    /// The default answers 500 unless the controller already chose a status.
    fn handle_error(&mut self, ctx: &mut ControllerContext<'_>, _error: &anyhow::Error) {
        if !ctx.response().has_explicit_status() {
            ctx.response_mut().set_status(500);
        }
    }
}

/// Request data and response state for one controller run.
#[derive(Debug)]
pub struct ControllerContext<'a> {
    app: &'a App,
    request: &'a Request,
    identifier: HandlerId,
    args: Vec<String>,
    response: Response,
}

impl<'a> ControllerContext<'a> {
    /// Binds a resolved controller to its request.
    #[must_use]
    pub fn new(app: &'a App, request: &'a Request, identifier: HandlerId, args: Vec<String>) -> Self {
        Self {
            app,
            request,
            identifier,
            args,
            response: Response::new(),
        }
    }

    /// Application context.
    #[must_use]
    pub const fn app(&self) -> &'a App {
        self.app
    }

    /// Inbound request.
    #[must_use]
    pub const fn request(&self) -> &'a Request {
        self.request
    }

    /// Resolved controller identifier.
    #[must_use]
    pub const fn identifier(&self) -> &HandlerId {
        &self.identifier
    }

    /// HTTP method.
    #[must_use]
    pub fn method(&self) -> &'a str {
        self.request.method()
    }

    /// Path argument at `index`.
    #[must_use]
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    /// Path argument at `index`, or `default`.
    #[must_use]
    pub fn arg_or<'s>(&'s self, index: usize, default: &'s str) -> &'s str {
        self.arg(index).unwrap_or(default)
    }

    /// Path segments left over after the controller matched.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Query parameter `key`.
    #[must_use]
    pub fn query(&self, key: &str) -> Option<&'a str> {
        self.request.query(key)
    }

    /// Query parameter `key`, or `default`.
    #[must_use]
    pub fn query_or<'s>(&'s self, key: &str, default: &'s str) -> &'s str {
        self.query(key).unwrap_or(default)
    }

    /// All query parameters.
    #[must_use]
    pub fn queries(&self) -> &'a BTreeMap<String, String> {
        self.request.queries()
    }

    /// Form parameter `key`.
    #[must_use]
    pub fn post(&self, key: &str) -> Option<&'a str> {
        self.request.post(key)
    }

    /// Form parameter `key`, or `default`.
    #[must_use]
    pub fn post_or<'s>(&'s self, key: &str, default: &'s str) -> &'s str {
        self.post(key).unwrap_or(default)
    }

    /// All form parameters.
    #[must_use]
    pub fn posts(&self) -> &'a BTreeMap<String, String> {
        self.request.posts()
    }

    /// Cookie `key`.
    #[must_use]
    pub fn cookie(&self, key: &str) -> Option<&'a str> {
        self.request.cookie(key)
    }

    /// Cookie `key`, or `default`.
    #[must_use]
    pub fn cookie_or<'s>(&'s self, key: &str, default: &'s str) -> &'s str {
        self.cookie(key).unwrap_or(default)
    }

    /// All cookies.
    #[must_use]
    pub fn cookies(&self) -> &'a BTreeMap<String, String> {
        self.request.cookies()
    }

    /// Header `name`, as `X-Request-Id` or `HTTP_X_REQUEST_ID`.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&'a str> {
        self.request.header(name)
    }

    /// Header `name`, or `default`.
    #[must_use]
    pub fn header_or<'s>(&'s self, name: &str, default: &'s str) -> &'s str {
        self.header(name).unwrap_or(default)
    }

    /// All headers keyed by CGI name.
    #[must_use]
    pub fn headers(&self) -> &'a BTreeMap<String, String> {
        self.request.headers()
    }

    /// Raw request body.
    #[must_use]
    pub fn body(&self) -> &'a [u8] {
        self.request.body()
    }

    /// Request body decoded as JSON.
    ///
    /// # Errors
    ///
    /// Returns the decoding error when the body is not valid JSON for `T`.
    pub fn json_body<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        self.request.json_body()
    }

    /// Sets the status and raw body.
    pub fn respond(&mut self, status: u16, body: impl Into<Vec<u8>>) {
        self.response.set_status(status);
        self.response.set_body(body);
    }

    /// Responds with `data` encoded as JSON.
    ///
    /// # Errors
    ///
    /// Returns the encoding error; the response is left untouched.
    pub fn respond_json<T: Serialize + ?Sized>(
        &mut self,
        data: &T,
        status: u16,
    ) -> Result<(), serde_json::Error> {
        let body = serde_json::to_vec(data)?;
        self.response.set_header("Content-Type", "application/json");
        self.respond(status, body);
        Ok(())
    }

    /// Responds with the rendered view `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError`] when the view cannot be rendered.
    pub fn respond_view(
        &mut self,
        name: &str,
        data: &serde_json::Value,
        status: u16,
    ) -> Result<(), ViewError> {
        let html = self.extract_view(name, data)?;
        self.respond(status, html);
        Ok(())
    }

    /// Renders the view `name` without touching the response.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError`] when the view cannot be rendered.
    pub fn extract_view(&self, name: &str, data: &serde_json::Value) -> Result<String, ViewError> {
        self.app.views().render(name, data)
    }

    /// Redirects to `url` with 302.
    pub fn redirect(&mut self, url: &str) {
        self.redirect_with(url, 302);
    }

    /// Redirects to `url` with `status`.
    pub fn redirect_with(&mut self, url: &str, status: u16) {
        self.response.set_status(status);
        self.response.set_header("Location", url);
    }

    /// Response built so far.
    #[must_use]
    pub const fn response(&self) -> &Response {
        &self.response
    }

    /// Mutable access to the response.
    pub const fn response_mut(&mut self) -> &mut Response {
        &mut self.response
    }

    /// Consumes the context, returning the response.
    #[must_use]
    pub fn into_response(self) -> Response {
        self.response
    }
}
