//! Section render request URLs.

use theme_core::{join_path_query, SearchParams};

/// Builds `path?params&section_id=...` or `path?params&sections=a,b` URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionRequest {
    path: String,
    params: SearchParams,
}

impl SectionRequest {
    /// Request for `path` (query string allowed; it is merged).
    pub fn new(path: &str) -> Self {
        match path.split_once('?') {
            Some((path, query)) => Self {
                path: path.to_string(),
                params: SearchParams::parse(query),
            },
            None => Self {
                path: path.to_string(),
                params: SearchParams::new(),
            },
        }
    }

    /// Merge parameters.
    pub fn with_params(mut self, params: &SearchParams) -> Self {
        for (k, v) in params.iter() {
            self.params.append(k, v);
        }
        self
    }

    /// URL for a single raw-HTML section render.
    pub fn section_id(mut self, section_id: &str) -> String {
        self.params.set("section_id", section_id);
        join_path_query(&self.path, &self.params)
    }

    /// URL for a JSON multi-section render.
    pub fn sections(mut self, keys: &[&str]) -> String {
        self.params.set("sections", keys.join(","));
        join_path_query(&self.path, &self.params)
    }

    /// URL without any section parameter (the address bar form).
    pub fn page_url(&self) -> String {
        join_path_query(&self.path, &self.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_id_url() {
        let params = SearchParams::from_pairs([("filter.v.option.color", "Red")]);
        let url = SectionRequest::new("/collections/x")
            .with_params(&params)
            .section_id("template--main__product-grid");
        assert_eq!(
            url,
            "/collections/x?filter.v.option.color=Red&section_id=template--main__product-grid"
        );
    }

    #[test]
    fn test_existing_query_is_kept() {
        let url = SectionRequest::new("/collections/x?page=2").section_id("main");
        assert_eq!(url, "/collections/x?page=2&section_id=main");
    }

    #[test]
    fn test_sections_url() {
        let url = SectionRequest::new("/").sections(&["cart-drawer", "cart-icon-bubble"]);
        assert_eq!(url, "/?sections=cart-drawer%2Ccart-icon-bubble");
    }
}
