//! Namespaced handler identifiers.

use std::fmt;

/// Separator between namespace segments of a handler identifier.
pub const SEPARATOR: &str = "::";

/// Fully-qualified handler identifier such as `controllers::path1::mock`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(String);

impl HandlerId {
    /// Joins `root` and `name`; `name` may itself contain separators.
    #[must_use]
    pub fn new(root: &str, name: &str) -> Self {
        Self(format!("{root}{SEPARATOR}{name}"))
    }

    /// Joins `root` with route segments.
    #[must_use]
    pub fn from_segments<S: AsRef<str>>(root: &str, segments: &[S]) -> Self {
        let joined = segments
            .iter()
            .map(|segment| segment.as_ref())
            .collect::<Vec<&str>>()
            .join(SEPARATOR);
        Self::new(root, &joined)
    }

    /// Full identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last namespace segment.
    #[must_use]
    pub fn leaf(&self) -> &str {
        self.0.rsplit(SEPARATOR).next().unwrap_or(&self.0)
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for HandlerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("commands", "mock_command", "commands::mock_command", "mock_command")]
    #[case("commands", "db::migrate", "commands::db::migrate", "migrate")]
    #[case("controllers", "index", "controllers::index", "index")]
    fn joins_root_and_name(
        #[case] root: &str,
        #[case] name: &str,
        #[case] expected: &str,
        #[case] leaf: &str,
    ) {
        let id = HandlerId::new(root, name);
        assert_eq!(id.as_str(), expected);
        assert_eq!(id.leaf(), leaf);
    }

    #[test]
    fn joins_route_segments() {
        let id = HandlerId::from_segments("controllers", &["path1", "mock"]);
        assert_eq!(id.to_string(), "controllers::path1::mock");
    }
}
