//! Fetched section payloads.

use std::collections::HashMap;

use theme_core::ThemeError;
use theme_dom::{Document, NodeId, Selector};

use crate::section::SectionDescriptor;

/// A response body parsed once into detached documents.
#[derive(Debug, Clone)]
pub enum SectionPayload {
    /// Raw HTML from a `section_id=` render or a full page.
    Html(Document),
    /// JSON map of section key to HTML from a `sections=` render. Keys the
    /// server returned as `null` are absent.
    Sections(HashMap<String, Document>),
}

impl SectionPayload {
    /// Parse a raw HTML body.
    pub fn from_html(html: &str) -> Self {
        SectionPayload::Html(Document::parse(html))
    }

    /// Parse a `sections=` JSON body.
    pub fn from_sections_json(json: &str) -> Result<Self, ThemeError> {
        let raw: HashMap<String, Option<String>> = serde_json::from_str(json)?;
        Ok(Self::from_sections(
            raw.into_iter().filter_map(|(k, v)| v.map(|html| (k, html))),
        ))
    }

    /// Build from an already-decoded section map.
    pub fn from_sections(sections: impl IntoIterator<Item = (String, String)>) -> Self {
        SectionPayload::Sections(
            sections
                .into_iter()
                .map(|(key, html)| (key, Document::parse(&html)))
                .collect(),
        )
    }

    /// Parse a body of either shape. A body that looks like a JSON object
    /// is decoded as a section map; anything else is HTML.
    pub fn parse(body: &str) -> Result<Self, ThemeError> {
        if body.trim_start().starts_with('{') {
            Self::from_sections_json(body)
        } else {
            Ok(Self::from_html(body))
        }
    }

    /// Document holding the descriptor's section, if present.
    pub fn document_for(&self, descriptor: &SectionDescriptor) -> Option<&Document> {
        match self {
            SectionPayload::Html(doc) => Some(doc),
            SectionPayload::Sections(map) => map.get(&descriptor.section_key),
        }
    }

    /// Locate the descriptor's source element.
    pub fn find(
        &self,
        descriptor: &SectionDescriptor,
    ) -> Result<Option<(&Document, NodeId)>, ThemeError> {
        let selector = Selector::parse(&descriptor.selector)?;
        Ok(self.document_for(descriptor).and_then(|doc| {
            doc.query_selector(doc.root(), &selector)
                .map(|node| (doc, node))
        }))
    }

    /// Locate an arbitrary element in the primary document.
    pub fn select_first(&self, selector: &str) -> Result<Option<(&Document, NodeId)>, ThemeError> {
        let selector = Selector::parse(selector)?;
        let docs: Vec<&Document> = match self {
            SectionPayload::Html(doc) => vec![doc],
            SectionPayload::Sections(map) => map.values().collect(),
        };
        Ok(docs.into_iter().find_map(|doc| {
            doc.query_selector(doc.root(), &selector)
                .map(|node| (doc, node))
        }))
    }
}
