//! Shared fixtures for the component integration tests.

#![allow(dead_code)]

use std::rc::Rc;

use theme_components::{share, MemoryHistory, SharedDocument, StorefrontPage, ThemeContext};
use theme_core::{ThemeConfig, ThemeSettings, Timings};
use theme_dom::{Document, NodeId};
use theme_fetch::ReplayFetcher;

pub const COLLECTION: &str = "/collections/x";
pub const SECTION: &str = "main-collection";
pub const RED: &str = "filter.v.option.color=Red";
pub const BLUE: &str = "filter.v.option.color=Blue";
pub const PAGE_TWO: &str = "/collections/x?page=2&section_id=main-collection";

/// A collection page: header, menu, facets with a secondary sort control,
/// grid with pagination, cart drawer, quick-add overlay and a recommendations block.
pub fn collection_page() -> String {
    format!(
        r#"<html><body>
        <header id="SiteHeader"><button id="menu-toggle" data-menu-toggle>Menu</button></header>
        <div id="MenuDrawer"><a id="menu-home" href="/">Home</a></div>
        {form}
        <select id="SortBy-secondary" name="sort_by">
            <option value="">Featured</option>
            <option value="price-ascending">Price, low to high</option>
        </select>
        <div id="ProductCount">2 products</div>
        <div id="ProductGridContainer" class="collection" data-section-id="{SECTION}">
            <ul id="product-grid" class="grid grid--4-col">
                <li data-result-item><a href="/products/a">A</a></li>
                <li data-result-item><a href="/products/b">B</a></li>
            </ul>
            <nav id="Pagination" data-is-more-results data-next-url="/collections/x?page=2">
                <button id="load-more" data-load-more>Load more</button>
            </nav>
        </div>
        <p data-pagination-only>Showing 2 of 5</p>
        {cart}
        <div id="QuickAdd-Modal"><button id="quick-add-close" data-modal-close>Close</button></div>
        <product-recommendations id="related" data-url="/recommendations/products?product_id=7&amp;section_id=related"></product-recommendations>
        </body></html>"#,
        form = facets_form(false),
        cart = cart_drawer(&["Mug"]),
    )
}

fn facets_form(red_checked: bool) -> String {
    let (checked, active) = if red_checked {
        (" checked", r#"<a id="remove-red" data-facet-remove href="/collections/x">Red</a>"#)
    } else {
        ("", "")
    };
    format!(
        r#"<form id="FacetFiltersForm">
            {active}
            <details id="Facet-color" data-facet-group>
                <summary id="Facet-color-summary">Color</summary>
                <input type="checkbox" id="Filter-Color-Red" name="filter.v.option.color" value="Red"{checked}>
                <input type="checkbox" id="Filter-Color-Blue" name="filter.v.option.color" value="Blue">
            </details>
        </form>"#
    )
}

/// Body of a `section_id` render of the collection grid.
pub fn results_section(products: &[&str], more: bool, red_checked: bool) -> String {
    let items: String = products
        .iter()
        .map(|p| format!(r#"<li data-result-item><a href="/products/{p}">{p}</a></li>"#))
        .collect();
    let pagination = if more {
        r#"<nav id="Pagination" data-is-more-results data-next-url="/collections/x?page=3"><button data-load-more>Load more</button></nav>"#
    } else {
        r#"<nav id="Pagination"></nav>"#
    };
    format!(
        r#"<div id="shopify-section-{SECTION}">
            {form}
            <div id="ProductCount">{count} products</div>
            <div id="ProductGridContainer" data-section-id="{SECTION}">
                <ul id="product-grid" class="grid">{items}</ul>
                {pagination}
            </div>
        </div>"#,
        form = facets_form(red_checked),
        count = products.len(),
    )
}

pub fn cart_drawer(items: &[&str]) -> String {
    let lines: String = items
        .iter()
        .map(|i| format!(r#"<li data-cart-item>{i}</li>"#))
        .collect();
    format!(
        r#"<div id="CartDrawer">
            <button id="cart-close" data-cart-close>Close</button>
            <ul id="CartDrawer-CartItems">{lines}</ul>
            <div id="CartDrawer-Footer">
                <input type="checkbox" id="CartDrawer-Terms">
                <p id="CartDrawer-TermsNotice" hidden></p>
                <button id="checkout" data-cart-checkout>Check out</button>
            </div>
        </div>
        <span id="cart-icon-bubble">{count}</span>"#,
        count = items.len(),
    )
}

/// Filter request URL for `query` (empty for the unfiltered page).
pub fn filter_url(query: &str) -> String {
    if query.is_empty() {
        format!("{COLLECTION}?section_id={SECTION}")
    } else {
        format!("{COLLECTION}?{query}&section_id={SECTION}")
    }
}

/// Context with zero-length transitions.
pub fn context(fetcher: &Rc<ReplayFetcher>) -> ThemeContext {
    let settings = ThemeSettings {
        timings: Timings::immediate(),
        ..ThemeSettings::default()
    };
    ThemeContext::new(ThemeConfig::new(settings, 375), fetcher.clone())
}

pub struct Harness {
    pub fetcher: Rc<ReplayFetcher>,
    pub history: Rc<MemoryHistory>,
    pub doc: SharedDocument,
    pub page: StorefrontPage,
}

impl Harness {
    pub fn collection() -> Self {
        Self::with_context(context)
    }

    pub fn with_context(make: impl FnOnce(&Rc<ReplayFetcher>) -> ThemeContext) -> Self {
        let fetcher = Rc::new(ReplayFetcher::new());
        fetcher.respond(&filter_url(""), results_section(&["A", "B"], true, false));
        fetcher.respond(&filter_url(RED), results_section(&["A"], false, true));
        fetcher.respond(&filter_url(BLUE), results_section(&["B"], false, false));

        let history = Rc::new(MemoryHistory::new(COLLECTION));
        let doc = share(Document::parse(&collection_page()));
        let page = StorefrontPage::mount(make(&fetcher), doc.clone(), history.clone())
            .expect("collection page mounts");
        Self {
            fetcher,
            history,
            doc,
            page,
        }
    }

    pub fn node(&self, id: &str) -> NodeId {
        self.doc
            .borrow()
            .get_element_by_id(id)
            .unwrap_or_else(|| panic!("no #{id}"))
    }

    pub fn exists(&self, id: &str) -> bool {
        self.doc.borrow().get_element_by_id(id).is_some()
    }

    pub fn text(&self, id: &str) -> String {
        let doc = self.doc.borrow();
        doc.text_content(self.node(id)).trim().to_string()
    }

    pub fn result_titles(&self) -> Vec<String> {
        let doc = self.doc.borrow();
        let root = doc.root();
        doc.select(root, "[data-result-item]")
            .expect("valid selector")
            .into_iter()
            .map(|n| doc.text_content(n).trim().to_string())
            .collect()
    }

    pub fn body_html(&self) -> String {
        let doc = self.doc.borrow();
        let root = doc.root();
        let body = doc.select_first(root, "body").expect("valid selector").expect("body");
        doc.inner_html(body)
    }

    /// Tick or untick a checkbox the way a shopper would.
    pub fn check(&self, id: &str, on: bool) -> NodeId {
        let node = self.node(id);
        self.doc.borrow_mut().set_checked(node, on);
        node
    }
}
