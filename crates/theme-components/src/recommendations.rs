//! Product recommendations loaded after the page.

use std::rc::Rc;

use theme_core::selectors::{ATTR_URL, RECOMMENDATIONS, RECOMMENDATIONS_ITEMS};
use theme_core::ThemeError;
use theme_dom::NodeId;
use theme_fetch::{OperationKey, RequestCoordinator};
use theme_observability::ComponentLogger;
use theme_render::SectionPayload;

use crate::context::{SharedDocument, ThemeContext};
use crate::deferred::DeferredLoader;

const OPERATION: OperationKey = "recommendations";

/// Result of `ProductRecommendations::load`.
#[derive(Debug, Clone, PartialEq)]
pub enum RecommendationsOutcome {
    /// Products were rendered into the element.
    Rendered,
    /// The response had no products; the element was removed.
    Removed,
    Cancelled,
    /// The request failed. The element is left as it was.
    Failed(ThemeError),
}

/// A `<product-recommendations>` element that fills itself from its
/// `data-url`.
pub struct ProductRecommendations {
    ctx: ThemeContext,
    doc: SharedDocument,
    node: NodeId,
    deferred: Option<Rc<DeferredLoader>>,
    coordinator: RequestCoordinator,
    logger: ComponentLogger,
}

impl ProductRecommendations {
    pub fn new(ctx: ThemeContext, doc: SharedDocument, node: NodeId) -> Self {
        Self {
            logger: ctx.logger("recommendations"),
            ctx,
            doc,
            node,
            deferred: None,
            coordinator: RequestCoordinator::new(),
        }
    }

    /// Register lazy media in rendered products with `deferred`.
    pub fn with_deferred(mut self, deferred: Rc<DeferredLoader>) -> Self {
        self.deferred = Some(deferred);
        self
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub async fn load(&self) -> RecommendationsOutcome {
        let url = {
            let doc = self.doc.borrow();
            doc.attr(self.node, ATTR_URL).map(String::from)
        };
        let Some(url) = url else {
            self.remove();
            return RecommendationsOutcome::Removed;
        };

        let session = self.coordinator.start_operation(OPERATION, url.as_str());
        let result = session.fetch_text(self.ctx.fetcher.as_ref()).await;
        self.coordinator.end_operation(OPERATION, &session);

        match result {
            Ok(body) if session.is_current() => match self.render(&body) {
                Ok(true) => RecommendationsOutcome::Rendered,
                Ok(false) => {
                    self.logger.debug_with("no recommendations, removing", &[("url", &url)]);
                    self.remove();
                    RecommendationsOutcome::Removed
                }
                Err(e) => {
                    self.logger.warn_with("could not render recommendations", &[("error", &e)]);
                    RecommendationsOutcome::Failed(e)
                }
            },
            Ok(_) => RecommendationsOutcome::Cancelled,
            Err(e) if e.is_cancellation() => RecommendationsOutcome::Cancelled,
            Err(e) => {
                self.logger
                    .warn_with("recommendations request failed", &[("url", &url), ("error", &e)]);
                RecommendationsOutcome::Failed(e)
            }
        }
    }

    /// Copy the fetched section in. Returns false when it has no products.
    fn render(&self, body: &str) -> Result<bool, ThemeError> {
        let payload = SectionPayload::parse(body)?;
        let Some((source_doc, source)) = payload.select_first(RECOMMENDATIONS)? else {
            return Ok(false);
        };
        let has_items = source_doc
            .select(source, RECOMMENDATIONS_ITEMS)?
            .into_iter()
            .any(|items| !source_doc.element_children(items).is_empty());
        if !has_items {
            return Ok(false);
        }

        let mut doc = self.doc.borrow_mut();
        if !doc.is_attached(self.node) {
            return Err(ThemeError::MissingSection(RECOMMENDATIONS.to_string()));
        }
        doc.import_children(self.node, source_doc, source);
        if let Some(deferred) = &self.deferred {
            deferred.scan(&mut doc, self.node)?;
        }
        Ok(true)
    }

    fn remove(&self) {
        self.doc.borrow_mut().remove(self.node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::context::share;
    use theme_core::{ThemeConfig, ThemeSettings};
    use theme_dom::Document;
    use theme_fetch::ReplayFetcher;

    const URL: &str = "/recommendations/products?product_id=7&section_id=related";

    fn setup(body: &str) -> (SharedDocument, ProductRecommendations) {
        let doc = share(Document::parse(&format!(
            r#"<main><product-recommendations id="related" data-url="{URL}"></product-recommendations></main>"#
        )));
        let fetcher = Rc::new(ReplayFetcher::new());
        fetcher.respond(URL, body);
        let ctx = ThemeContext::new(ThemeConfig::new(ThemeSettings::default(), 1200), fetcher);
        let node = doc.borrow().get_element_by_id("related").unwrap();
        let component = ProductRecommendations::new(ctx, doc.clone(), node);
        (doc, component)
    }

    #[tokio::test]
    async fn test_renders_products() {
        let (doc, component) = setup(
            r#"<product-recommendations id="related">
                <ul data-recommendations-items><li class="card">Mug</li></ul>
            </product-recommendations>"#,
        );
        assert_eq!(component.load().await, RecommendationsOutcome::Rendered);
        let d = doc.borrow();
        let node = d.get_element_by_id("related").unwrap();
        assert!(d.text_content(node).contains("Mug"));
    }

    #[tokio::test]
    async fn test_empty_response_removes_element() {
        let (doc, component) = setup(
            r#"<product-recommendations id="related"><ul data-recommendations-items></ul></product-recommendations>"#,
        );
        assert_eq!(component.load().await, RecommendationsOutcome::Removed);
        assert!(doc.borrow().get_element_by_id("related").is_none());
    }
}
