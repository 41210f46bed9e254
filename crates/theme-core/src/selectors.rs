//! Markup contract with the server-rendered sections.
//!
//! These ids, classes and attributes are API surface: renaming one on the
//! server side breaks the component that reads it.

// Facet filtering
pub const FACETS_FORM_ID: &str = "FacetFiltersForm";
pub const RESULTS_CONTAINER_ID: &str = "ProductGridContainer";
pub const PRODUCT_GRID_ID: &str = "product-grid";
pub const PRODUCT_COUNT_ID: &str = "ProductCount";
pub const SORT_SECONDARY_ID: &str = "SortBy-secondary";
pub const SORT_PARAM: &str = "sort_by";
pub const FACET_GROUP: &str = "details[data-facet-group]";
pub const FACET_REMOVE: &str = "a[data-facet-remove]";
pub const FACET_CLEAR_ALL: &str = "a[data-facet-clear]";
pub const FACET_GROUP_SUMMARY: &str = "details[data-facet-group] > summary";
pub const ATTR_SECTION_ID: &str = "data-section-id";
pub const LOADING_CLASS: &str = "loading";

// Pagination
pub const PAGINATION_ID: &str = "Pagination";
pub const RESULT_ITEM: &str = "[data-result-item]";
pub const LOAD_MORE: &str = "[data-load-more]";
pub const ATTR_MORE_RESULTS: &str = "data-is-more-results";
pub const ATTR_NEXT_URL: &str = "data-next-url";
pub const PAGINATION_ONLY: &str = "[data-pagination-only]";

/// Elements that only make sense while the section with this id exists.
pub const ATTR_ONLY_WITH: &str = "data-only-with";

// Cart drawer
pub const CART_DRAWER_ID: &str = "CartDrawer";
pub const CART_ICON_BUBBLE_ID: &str = "cart-icon-bubble";
pub const CART_DRAWER_SECTION: &str = "cart-drawer";
pub const CART_ICON_BUBBLE_SECTION: &str = "cart-icon-bubble";
pub const CART_ITEMS_ID: &str = "CartDrawer-CartItems";
pub const CART_FOOTER_ID: &str = "CartDrawer-Footer";
pub const CART_TERMS_ID: &str = "CartDrawer-Terms";
pub const CART_TERMS_NOTICE_ID: &str = "CartDrawer-TermsNotice";
pub const SHIPPING_CALCULATOR_ID: &str = "CartDrawer-ShippingCalculator";
pub const CART_ITEM: &str = "[data-cart-item]";
pub const CART_CLOSE: &str = "[data-cart-close]";
pub const CART_CHECKOUT: &str = "[data-cart-checkout]";
pub const ATTR_SCRIPT: &str = "data-script";
pub const ATTR_SUPPRESS_GRANULAR: &str = "data-suppress-granular";
pub const EMPTY_CLASS: &str = "is-empty";
pub const ACTIVE_CLASS: &str = "active";
pub const BODY_LOCK_CLASS: &str = "overflow-hidden";

// Modals and overlays
pub const QUICK_ADD_MODAL_ID: &str = "QuickAdd-Modal";
pub const ATTR_OPEN: &str = "open";
pub const MODAL_CLOSE: &str = "[data-modal-close]";

// Navigation
pub const MENU_DRAWER_ID: &str = "MenuDrawer";
pub const MENU_TOGGLE: &str = "[data-menu-toggle]";
pub const HEADER_ID: &str = "SiteHeader";
pub const HEADER_HIDDEN_CLASS: &str = "header--hidden";
pub const HEADER_STICKY_CLASS: &str = "header--sticky";

// Deferred media
pub const LAZY_IMAGE: &str = "img[data-src]";
pub const DEFERRED_MEDIA: &str = "deferred-media";
pub const ATTR_LOADED: &str = "data-loaded";

// Recommendations
pub const RECOMMENDATIONS: &str = "product-recommendations";
pub const RECOMMENDATIONS_ITEMS: &str = "[data-recommendations-items]";
pub const ATTR_URL: &str = "data-url";

// Slider
pub const SLIDER: &str = "slider-component";
pub const SLIDE: &str = "[data-slide]";
pub const SLIDER_PREV: &str = "[data-slider-prev]";
pub const SLIDER_NEXT: &str = "[data-slider-next]";
pub const SLIDER_COUNTER: &str = "[data-slider-counter]";
pub const ATTR_PER_VIEW: &str = "data-per-view";
