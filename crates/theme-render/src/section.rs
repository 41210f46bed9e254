//! Section descriptors.

use serde::{Deserialize, Serialize};

/// Declares which part of a fetched payload maps to which live element.
///
/// Immutable for the lifetime of one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionDescriptor {
    /// Id of the live DOM element to update.
    pub id: String,
    /// Server render key (`sections=` JSON key).
    pub section_key: String,
    /// Selector locating the source element inside the fetched fragment.
    pub selector: String,
}

impl SectionDescriptor {
    /// Descriptor whose source element carries the same id as the target.
    pub fn new(id: impl Into<String>, section_key: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            selector: format!("#{}", id),
            id,
            section_key: section_key.into(),
        }
    }

    /// Use a different selector for the source element.
    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = selector.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_selector_is_id() {
        let d = SectionDescriptor::new("cart-icon-bubble", "cart-icon-bubble");
        assert_eq!(d.selector, "#cart-icon-bubble");
        let d = d.with_selector(".shopify-section");
        assert_eq!(d.selector, ".shopify-section");
    }
}
