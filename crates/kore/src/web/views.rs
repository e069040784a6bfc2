//! File-based view templates with `{{ key }}` placeholders.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use kore_config::lookup_dotted;
use serde_json::Value;
use thiserror::Error;

/// Errors raised while rendering a view.
#[derive(Debug, Error)]
pub enum ViewError {
    /// The view name escapes the views directory.
    #[error("invalid view name '{name}'")]
    InvalidName {
        /// Name as given.
        name: String,
    },
    /// The template file could not be read.
    #[error("unable to read view {path}: {source}")]
    Read {
        /// Template path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A placeholder was opened and never closed.
    #[error("unterminated placeholder in view '{name}'")]
    Unterminated {
        /// View name.
        name: String,
    },
}

/// File-based templates under the views directory.
///
/// `{{ key }}` and `{{ a.b }}` placeholders are replaced by values from the
/// data map. Strings are HTML-escaped; missing and null values render empty;
/// other values render as compact JSON.
#[derive(Debug, Clone)]
pub struct Views {
    dir: Utf8PathBuf,
}

impl Views {
    /// Views rooted at `dir`.
    #[must_use]
    pub fn new(dir: impl Into<Utf8PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Views directory.
    #[must_use]
    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    /// Renders `views/<name>.html` with `data`.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError`] when the name is invalid, the file cannot be
    /// read, or a placeholder is unterminated.
    pub fn render(&self, name: &str, data: &Value) -> Result<String, ViewError> {
        if name.is_empty() || name.starts_with('/') || name.split('/').any(|part| part == "..") {
            return Err(ViewError::InvalidName {
                name: name.to_owned(),
            });
        }
        let path = self.dir.join(format!("{name}.html"));
        let template = fs::read_to_string(&path).map_err(|source| ViewError::Read {
            path: path.clone(),
            source,
        })?;
        substitute(&template, data).ok_or_else(|| ViewError::Unterminated {
            name: name.to_owned(),
        })
    }
}

fn substitute(template: &str, data: &Value) -> Option<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        let (before, opening) = rest.split_at(start);
        out.push_str(before);
        let inner = opening.get(2..)?;
        let end = inner.find("}}")?;
        let key = inner.get(..end)?.trim();
        out.push_str(&render_value(lookup_dotted(data, key)));
        rest = inner.get(end + 2..)?;
    }
    out.push_str(rest);
    Some(out)
}

fn render_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => escape_html(text),
        Some(other) => escape_html(&other.to_string()),
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    #[fixture]
    fn layout() -> (TempDir, Views) {
        let dir = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 path");
        fs::create_dir_all(root.join("mail")).expect("create views");
        fs::write(
            root.join("greeting.html"),
            "<p>Hello {{ user.name }}, you have {{count}} items{{ missing }}</p>",
        )
        .expect("write view");
        fs::write(root.join("mail/footer.html"), "-- {{ sender }}").expect("write view");
        fs::write(root.join("broken.html"), "{{ oops").expect("write view");
        (dir, Views::new(root))
    }

    #[rstest]
    fn substitutes_dotted_placeholders(layout: (TempDir, Views)) {
        let (_dir, views) = layout;
        let html = views
            .render("greeting", &json!({"user": {"name": "<Ann>"}, "count": 3}))
            .expect("render");
        assert_eq!(html, "<p>Hello &lt;Ann&gt;, you have 3 items</p>");
    }

    #[rstest]
    fn renders_nested_view_names(layout: (TempDir, Views)) {
        let (_dir, views) = layout;
        let text = views
            .render("mail/footer", &json!({"sender": "ops"}))
            .expect("render");
        assert_eq!(text, "-- ops");
    }

    #[rstest]
    #[case("../secret")]
    #[case("/etc/passwd")]
    #[case("")]
    fn rejects_names_outside_views(layout: (TempDir, Views), #[case] name: &str) {
        let (_dir, views) = layout;
        let err = views.render(name, &json!({})).expect_err("invalid");
        assert!(matches!(err, ViewError::InvalidName { .. }));
    }

    #[rstest]
    fn reports_missing_and_unterminated_views(layout: (TempDir, Views)) {
        let (_dir, views) = layout;
        assert!(matches!(
            views.render("absent", &json!({})),
            Err(ViewError::Read { .. })
        ));
        assert!(matches!(
            views.render("broken", &json!({})),
            Err(ViewError::Unterminated { .. })
        ));
    }
}
