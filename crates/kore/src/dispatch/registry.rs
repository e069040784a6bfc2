//! Name-to-factory tables shared by both routers.

use std::collections::BTreeMap;
use std::fmt;

use super::identifier::HandlerId;

type Factory<T> = Box<dyn Fn() -> Box<T>>;

/// Factories keyed by handler identifier under one namespace root.
///
/// Handlers are registered by their name relative to the root
/// (`"path1::mock"` or `"path1/mock"`) and built fresh for every dispatch.
pub struct Registry<T: ?Sized> {
    root: &'static str,
    factories: BTreeMap<HandlerId, Factory<T>>,
}

impl<T: ?Sized> Registry<T> {
    /// Empty registry under `root`.
    #[must_use]
    pub const fn new(root: &'static str) -> Self {
        Self {
            root,
            factories: BTreeMap::new(),
        }
    }

    /// Namespace root.
    #[must_use]
    pub const fn root(&self) -> &'static str {
        self.root
    }

    /// Registers `factory` under `name`, replacing an earlier registration.
    pub fn register<F>(&mut self, name: &str, factory: F) -> &mut Self
    where
        F: Fn() -> Box<T> + 'static,
    {
        let relative = name.trim_matches('/').replace('/', "::");
        self.factories
            .insert(HandlerId::new(self.root, &relative), Box::new(factory));
        self
    }

    /// Builder form of [`Registry::register`].
    #[must_use]
    pub fn with<F>(mut self, name: &str, factory: F) -> Self
    where
        F: Fn() -> Box<T> + 'static,
    {
        self.register(name, factory);
        self
    }

    /// Whether `id` is registered.
    #[must_use]
    pub fn contains(&self, id: &HandlerId) -> bool {
        self.factories.contains_key(id)
    }

    /// Builds a fresh handler for `id`.
    #[must_use]
    pub fn build(&self, id: &HandlerId) -> Option<Box<T>> {
        self.factories.get(id).map(|factory| factory())
    }

    /// Registered identifiers in order.
    pub fn identifiers(&self) -> impl Iterator<Item = &HandlerId> {
        self.factories.keys()
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl<T: ?Sized> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("root", &self.root)
            .field("handlers", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}
