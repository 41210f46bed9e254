//! Ordered query parameters.

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

/// An ordered multimap of query parameters, as produced by a filter form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    pairs: Vec<(String, String)>,
}

impl SearchParams {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(name, value)` pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            pairs: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Parse a query string, with or without a leading `?`.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self {
            pairs: form_urlencoded::parse(query.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect(),
        }
    }

    /// Serialize without a leading `?`.
    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter())
            .finish()
    }

    /// Drop parameters whose value is empty. An empty filter value means
    /// "unset" and must not reach a URL or a history entry.
    pub fn strip_empty(mut self) -> Self {
        self.pairs.retain(|(_, v)| !v.trim().is_empty());
        self
    }

    /// First value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// All values for `name`.
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Append a pair.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((name.into(), value.into()));
    }

    /// Replace every value of `name` with a single value.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.pairs.iter().position(|(k, _)| k == name) {
            Some(first) => {
                self.pairs[first].1 = value;
                let mut seen = false;
                self.pairs.retain(|(k, _)| {
                    if k != name {
                        return true;
                    }
                    let keep = !seen;
                    seen = true;
                    keep
                });
            }
            None => self.pairs.push((name.to_string(), value)),
        }
    }

    /// Remove every value of `name`.
    pub fn remove(&mut self, name: &str) {
        self.pairs.retain(|(k, _)| k != name);
    }

    /// Remove one `(name, value)` pair.
    pub fn remove_pair(&mut self, name: &str, value: &str) {
        self.pairs.retain(|(k, v)| !(k == name && v == value));
    }

    /// Whether `name` is present.
    pub fn contains(&self, name: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == name)
    }

    /// Iterate pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether there are no pairs.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl std::fmt::Display for SearchParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

/// Join a path and a parameter set into `path?query` (no `?` when empty).
pub fn join_path_query(path: &str, params: &SearchParams) -> String {
    if params.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_empty() {
        let params = SearchParams::from_pairs([
            ("filter.v.option.color", "Red"),
            ("filter.v.price.gte", ""),
            ("filter.v.price.lte", " "),
        ])
        .strip_empty();
        assert_eq!(params.to_query_string(), "filter.v.option.color=Red");
    }

    #[test]
    fn test_parse_and_roundtrip_order() {
        let params = SearchParams::parse("?a=1&b=two+words&a=3");
        assert_eq!(params.get_all("a"), vec!["1", "3"]);
        assert_eq!(params.get("b"), Some("two words"));
        assert_eq!(params.to_query_string(), "a=1&b=two+words&a=3");
    }

    #[test]
    fn test_set_replaces_all_values() {
        let mut params = SearchParams::parse("sort_by=a&x=1&sort_by=b");
        params.set("sort_by", "price-ascending");
        assert_eq!(params.to_query_string(), "sort_by=price-ascending&x=1");
    }

    #[test]
    fn test_join_path_query() {
        assert_eq!(join_path_query("/collections/x", &SearchParams::new()), "/collections/x");
        let params = SearchParams::from_pairs([("page", "2")]);
        assert_eq!(join_path_query("/collections/x", &params), "/collections/x?page=2");
    }
}
