//! Web routing: request paths to controllers.

use std::fmt;

use kore_config::{DEFAULT_CONTROLLER, Settings};
use percent_encoding::percent_decode_str;
use tracing::debug;

use super::identifier::{HandlerId, SEPARATOR};
use super::registry::Registry;
use super::DISPATCH_TARGET;
use crate::app::App;
use crate::handler::{Controller, ControllerContext, run_controller};
use crate::web::{Request, Response};

/// Namespace root for controllers.
pub const CONTROLLERS_ROOT: &str = "controllers";

/// Controller factories keyed under [`CONTROLLERS_ROOT`].
pub type ControllerRegistry = Registry<dyn Controller>;

type NotFound = Box<dyn Fn(&Request)>;

/// A resolved handler and the segments left over after its prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Matched handler.
    pub identifier: HandlerId,
    /// Unmatched trailing segments, in order.
    pub args: Vec<String>,
}

/// Routes request paths to controllers.
///
/// The path is split into segments and each prefix, shortest first, is
/// tried against the registry. The first registered prefix wins and the
/// remaining segments become positional arguments.
pub struct WebRouter {
    controllers: ControllerRegistry,
    base_path: String,
    default_controller: String,
    not_found: Option<NotFound>,
}

impl WebRouter {
    /// Router over `controllers` with no base path and the `index` default.
    #[must_use]
    pub fn new(controllers: ControllerRegistry) -> Self {
        Self {
            controllers,
            base_path: String::new(),
            default_controller: DEFAULT_CONTROLLER.to_owned(),
            not_found: None,
        }
    }

    /// Router configured from the base path and default controller settings.
    #[must_use]
    pub fn from_settings(controllers: ControllerRegistry, settings: &Settings) -> Self {
        let mut router =
            Self::new(controllers).with_default_controller(&settings.default_controller);
        if let Some(base) = settings.base_path.as_deref() {
            router = router.with_base_path(base);
        }
        router
    }

    /// Strips `base` from incoming paths.
    #[must_use]
    pub fn with_base_path(mut self, base: &str) -> Self {
        base.trim_matches('/').clone_into(&mut self.base_path);
        self
    }

    /// Controller used when the path is empty.
    #[must_use]
    pub fn with_default_controller(mut self, name: &str) -> Self {
        self.default_controller = name.replace('/', SEPARATOR);
        self
    }

    /// Callback invoked before a 404 response.
    #[must_use]
    pub fn with_not_found<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Request) + 'static,
    {
        self.not_found = Some(Box::new(callback));
        self
    }

    /// Registered controllers.
    #[must_use]
    pub const fn controllers(&self) -> &ControllerRegistry {
        &self.controllers
    }

    /// Strips the query string, percent-decodes, trims `/` and removes the
    /// base path when the path equals it or continues with `/`.
    #[must_use]
    pub fn normalise_path(&self, uri: &str) -> String {
        let path = uri.split_once('?').map_or(uri, |(path, _)| path);
        let decoded = percent_decode_str(path).decode_utf8_lossy();
        let trimmed = decoded.trim_matches('/');
        if self.base_path.is_empty() {
            return trimmed.to_owned();
        }
        if trimmed == self.base_path {
            return String::new();
        }
        trimmed
            .strip_prefix(self.base_path.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .map_or(trimmed, |rest| rest.trim_matches('/'))
            .to_owned()
    }

    /// Resolves `uri` to a registered controller.
    #[must_use]
    pub fn resolve(&self, uri: &str) -> Option<Resolution> {
        let path = self.normalise_path(uri);
        let segments: Vec<&str> = path.split('/').collect();
        (1..=segments.len()).find_map(|matched| {
            let (head, tail) = segments.split_at(matched);
            let identifier = match head {
                [""] => HandlerId::new(self.controllers.root(), &self.default_controller),
                _ => HandlerId::from_segments(self.controllers.root(), head),
            };
            self.controllers.contains(&identifier).then(|| Resolution {
                identifier,
                args: tail.iter().map(|segment| (*segment).to_owned()).collect(),
            })
        })
    }

    /// Resolves and runs the controller for `request`.
    ///
    /// Unmatched paths call the not-found callback and answer 404 with an
    /// empty body.
    pub fn dispatch(&self, app: &App, request: &Request) -> Response {
        let resolved = self.resolve(request.uri()).and_then(|resolution| {
            let controller = self.controllers.build(&resolution.identifier)?;
            Some((resolution, controller))
        });
        let Some((resolution, mut controller)) = resolved else {
            debug!(target: DISPATCH_TARGET, uri = request.uri(), "no controller matched");
            if let Some(callback) = &self.not_found {
                callback(request);
            }
            return Response::with_status(404);
        };

        debug!(
            target: DISPATCH_TARGET,
            controller = resolution.identifier.as_str(),
            args = ?resolution.args,
            "routing request"
        );
        let mut ctx = ControllerContext::new(app, request, resolution.identifier, resolution.args);
        run_controller(controller.as_mut(), &mut ctx);
        ctx.into_response()
    }
}

impl fmt::Debug for WebRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebRouter")
            .field("controllers", &self.controllers)
            .field("base_path", &self.base_path)
            .field("default_controller", &self.default_controller)
            .field("not_found", &self.not_found.is_some())
            .finish()
    }
}
