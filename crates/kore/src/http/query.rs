//! Form-urlencoded query strings from JSON parameters.

use serde_json::Value;
use url::form_urlencoded;

/// Encodes `params` as a form-urlencoded query string.
///
/// Nested objects and arrays flatten to `key[sub]=v` and `key[0]=v`. Booleans
/// encode as `1`/`0` and nulls are skipped. A scalar at the top level has no
/// key and encodes to an empty string.
#[must_use]
pub fn build_query(params: &Value) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    match params {
        Value::Object(map) => {
            for (key, value) in map {
                append(&mut serializer, key, value);
            }
        }
        Value::Array(items) => {
            for (index, value) in items.iter().enumerate() {
                append(&mut serializer, &index.to_string(), value);
            }
        }
        _ => {}
    }
    serializer.finish()
}

/// Appends `params` to `url` as a query string, using `?` or `&` as needed.
///
/// Returns `url` unchanged when `params` encodes to nothing.
#[must_use]
pub fn url_add_query(url: &str, params: &Value) -> String {
    let query = build_query(params);
    if query.is_empty() {
        return url.to_owned();
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{query}")
}

fn append(serializer: &mut form_urlencoded::Serializer<'_, String>, key: &str, value: &Value) {
    match value {
        Value::Null => {}
        Value::Bool(flag) => {
            serializer.append_pair(key, if *flag { "1" } else { "0" });
        }
        Value::Number(number) => {
            serializer.append_pair(key, &number.to_string());
        }
        Value::String(text) => {
            serializer.append_pair(key, text);
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                append(serializer, &format!("{key}[{index}]"), item);
            }
        }
        Value::Object(map) => {
            for (sub, item) in map {
                append(serializer, &format!("{key}[{sub}]"), item);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[test]
    fn encodes_flat_pairs_in_order() {
        assert_eq!(build_query(&json!({"a": 1, "b": "x y"})), "a=1&b=x+y");
    }

    #[test]
    fn keeps_insertion_order_of_object_keys() {
        assert_eq!(build_query(&json!({"title": "hi", "tags": ["x"]})), "title=hi&tags%5B0%5D=x");
    }

    #[test]
    fn flattens_nested_values_with_brackets() {
        let query = build_query(&json!({"f": {"g": [true, false]}, "n": null}));
        assert_eq!(query, "f%5Bg%5D%5B0%5D=1&f%5Bg%5D%5B1%5D=0");
    }

    #[rstest]
    #[case("http://h/p", "http://h/p?a=1")]
    #[case("http://h/p?z=9", "http://h/p?z=9&a=1")]
    fn picks_separator_from_url(#[case] url: &str, #[case] expected: &str) {
        assert_eq!(url_add_query(url, &json!({"a": 1})), expected);
    }

    #[test]
    fn empty_params_leave_url_alone() {
        assert_eq!(url_add_query("http://h/p", &json!({})), "http://h/p");
    }
}
