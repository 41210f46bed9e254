//! Facet filtering across the full page.

mod common;

use common::{filter_url, results_section, Harness, BLUE, COLLECTION, RED};
use theme_components::{BrowserHistory, Component, DomEvent, FilterOutcome};
use theme_core::{SearchParams, ThemeEvent};
use theme_dom::Rect;

#[tokio::test]
async fn test_checking_a_filter_replaces_results_and_url() {
    let h = Harness::collection();
    let (_sub, events) = h.page.context().bus.record();
    let red = h.check("Filter-Color-Red", true);

    assert!(h.page.dispatch(DomEvent::change(red)).await);

    assert_eq!(h.fetcher.requests(), vec![format!("{COLLECTION}?{RED}&section_id=main-collection")]);
    assert_eq!(h.result_titles(), vec!["A"]);
    assert_eq!(h.text("ProductCount"), "1 products");
    assert_eq!(h.history.current_url(), format!("{COLLECTION}?{RED}"));
    assert_eq!(h.history.push_count(), 1);
    assert!(events.borrow().contains(&ThemeEvent::FiltersUpdated {
        search_params: RED.to_string()
    }));

    let doc = h.doc.borrow();
    let container = doc.get_element_by_id("ProductGridContainer").unwrap();
    assert!(!doc.has_class(container, "loading"));
    assert_eq!(doc.focused(), doc.get_element_by_id("Filter-Color-Red"));
}

#[tokio::test]
async fn test_only_the_last_of_rapid_changes_applies() {
    let h = Harness::collection();
    let facets = h.page.facets().unwrap();
    let gate = h.fetcher.gate(&filter_url(RED));

    let first = facets.apply_filters(SearchParams::parse(RED), None, true);
    let second = async {
        let outcome = facets.apply_filters(SearchParams::parse(BLUE), None, true).await;
        // The superseded response arrives after the newer one.
        gate.release();
        outcome
    };
    let (first, second) = futures::join!(first, second);

    assert_eq!(first, FilterOutcome::Cancelled);
    assert_eq!(second, FilterOutcome::Applied);
    assert_eq!(h.result_titles(), vec!["B"]);
    assert_eq!(h.history.push_count(), 1);
    assert_eq!(h.history.current_url(), format!("{COLLECTION}?{BLUE}"));
}

#[tokio::test]
async fn test_applying_the_same_params_twice_is_idempotent() {
    let h = Harness::collection();
    let facets = h.page.facets().unwrap();

    facets.apply_filters(SearchParams::parse(RED), None, false).await;
    let once = h.body_html();
    facets.apply_filters(SearchParams::parse(RED), None, false).await;

    assert_eq!(h.body_html(), once);
}

#[tokio::test]
async fn test_history_round_trip_does_not_push() {
    let h = Harness::collection();
    let red = h.check("Filter-Color-Red", true);
    h.page.dispatch(DomEvent::change(red)).await;
    assert_eq!(h.history.push_count(), 1);

    let popped = h.history.back().expect("an entry to go back to");
    assert_eq!(h.page.on_popstate(popped).await, Some(FilterOutcome::Applied));
    assert_eq!(h.result_titles(), vec!["A", "B"]);
    assert_eq!(h.history.current_url(), COLLECTION);

    let popped = h.history.forward().expect("an entry to go forward to");
    let state = popped.clone().expect("pushed entries carry state");
    assert_eq!(state.params().to_query_string(), RED);
    h.page.on_popstate(popped).await;

    assert_eq!(h.result_titles(), vec!["A"]);
    assert_eq!(h.history.push_count(), 1);
}

#[tokio::test]
async fn test_expanded_groups_and_grid_layout_survive_apply() {
    let h = Harness::collection();
    let summary = h.node("Facet-color-summary");
    assert!(h.page.dispatch(DomEvent::click(summary)).await);
    assert!(h.page.facets().unwrap().expansion().contains("Facet-color"));

    h.page
        .facets()
        .unwrap()
        .apply_filters(SearchParams::parse(BLUE), None, true)
        .await;

    let doc = h.doc.borrow();
    let group = doc.get_element_by_id("Facet-color").unwrap();
    assert!(doc.has_attr(group, "open"));
    let grid = doc.get_element_by_id("product-grid").unwrap();
    assert_eq!(doc.attr(grid, "class"), Some("grid grid--4-col"));
}

#[tokio::test]
async fn test_failed_request_leaves_results_alone() {
    let h = Harness::collection();
    let facets = h.page.facets().unwrap();
    let before = h.body_html();

    let outcome = facets
        .apply_filters(SearchParams::parse("filter.v.option.color=Green"), None, true)
        .await;

    assert!(matches!(outcome, FilterOutcome::Failed(_)));
    assert_eq!(h.body_html(), before);
    assert_eq!(h.history.push_count(), 0);
}

#[tokio::test]
async fn test_bindings_follow_swapped_nodes() {
    let h = Harness::collection();
    let red = h.check("Filter-Color-Red", true);
    h.page.dispatch(DomEvent::change(red)).await;

    assert_eq!(h.page.stale_binding_count(), 0);

    // The swapped-in checkbox still reaches the controller.
    let blue = h.check("Filter-Color-Blue", true);
    h.check("Filter-Color-Red", false);
    assert!(h.page.dispatch(DomEvent::change(blue)).await);
    assert_eq!(h.result_titles(), vec!["B"]);
}

#[tokio::test]
async fn test_secondary_sort_is_folded_into_the_request() {
    let h = Harness::collection();
    let sorted = format!("{RED}&sort_by=price-ascending");
    h.fetcher.respond(&filter_url(&sorted), results_section(&["A"], false, true));
    let sort = h.node("SortBy-secondary");
    h.doc.borrow_mut().select_option(sort, "price-ascending");
    let red = h.check("Filter-Color-Red", true);

    assert!(h.page.dispatch(DomEvent::change(red)).await);

    assert_eq!(
        h.fetcher.requests(),
        vec!["/collections/x?filter.v.option.color=Red&sort_by=price-ascending&section_id=main-collection"]
    );
    assert_eq!(h.history.current_url(), format!("{COLLECTION}?{sorted}"));
    assert_eq!(h.result_titles(), vec!["A"]);
}

#[tokio::test]
async fn test_changing_the_secondary_sort_refetches() {
    let h = Harness::collection();
    h.fetcher.respond(
        &filter_url("sort_by=price-ascending"),
        results_section(&["B", "A"], false, false),
    );
    let sort = h.node("SortBy-secondary");
    h.doc.borrow_mut().select_option(sort, "price-ascending");

    assert!(h.page.dispatch(DomEvent::change(sort)).await);

    assert_eq!(h.result_titles(), vec!["B", "A"]);
    assert_eq!(h.history.current_url(), format!("{COLLECTION}?sort_by=price-ascending"));
}

#[tokio::test]
async fn test_clear_all_drops_filters_but_keeps_sort() {
    let h = Harness::collection();
    h.fetcher.respond(
        &filter_url("sort_by=price-ascending"),
        results_section(&["A", "B"], true, false),
    );
    let facets = h.page.facets().unwrap();
    let sort = h.node("SortBy-secondary");
    h.doc.borrow_mut().select_option(sort, "price-ascending");
    facets.apply_filters(SearchParams::parse(RED), None, true).await;
    assert!(h.doc.borrow().has_attr(h.node("Filter-Color-Red"), "checked"));

    assert_eq!(facets.clear_all().await, FilterOutcome::Applied);

    assert_eq!(
        h.fetcher.requests().last().map(String::as_str),
        Some("/collections/x?sort_by=price-ascending&section_id=main-collection")
    );
    assert_eq!(h.result_titles(), vec!["A", "B"]);
    assert_eq!(h.history.current_url(), format!("{COLLECTION}?sort_by=price-ascending"));
    assert!(!h.doc.borrow().has_attr(h.node("Filter-Color-Red"), "checked"));
}

#[tokio::test]
async fn test_remove_filter_drops_only_that_value() {
    let h = Harness::collection();
    h.check("Filter-Color-Red", true);
    h.check("Filter-Color-Blue", true);

    let outcome = h
        .page
        .facets()
        .unwrap()
        .remove_filter("filter.v.option.color", "Red")
        .await;

    assert_eq!(outcome, FilterOutcome::Applied);
    assert_eq!(h.fetcher.requests(), vec![filter_url(BLUE)]);
    assert_eq!(h.result_titles(), vec!["B"]);
    assert_eq!(h.history.current_url(), format!("{COLLECTION}?{BLUE}"));
}

#[tokio::test]
async fn test_navigate_applies_the_link_query() {
    let h = Harness::collection();
    let outcome = h
        .page
        .facets()
        .unwrap()
        .navigate(&format!("{COLLECTION}?{BLUE}"))
        .await;

    assert_eq!(outcome, FilterOutcome::Applied);
    assert_eq!(h.fetcher.requests(), vec![filter_url(BLUE)]);
    assert_eq!(h.result_titles(), vec!["B"]);
    assert_eq!(h.history.push_count(), 1);
}

#[tokio::test]
async fn test_clicking_an_active_filter_link_navigates() {
    let h = Harness::collection();
    let red = h.check("Filter-Color-Red", true);
    h.page.dispatch(DomEvent::change(red)).await;
    assert_eq!(h.result_titles(), vec!["A"]);

    // The link arrived with the swapped form.
    let link = h.node("remove-red");
    assert!(h.page.dispatch(DomEvent::click(link)).await);

    assert_eq!(h.fetcher.requests().last(), Some(&filter_url("")));
    assert_eq!(h.result_titles(), vec!["A", "B"]);
    assert_eq!(h.history.current_url(), COLLECTION);
    assert_eq!(h.history.push_count(), 2);
}

fn lay_out(h: &Harness, results_top: f64) {
    {
        let mut doc = h.doc.borrow_mut();
        let header = doc.get_element_by_id("SiteHeader").unwrap();
        doc.set_rect(header, Rect::new(0.0, 80.0));
        let results = doc.get_element_by_id("ProductGridContainer").unwrap();
        doc.set_rect(results, Rect::new(results_top, 2000.0));
        doc.set_viewport_height(800.0);
    }
    h.page.header().unwrap().measure();
}

#[tokio::test]
async fn test_scroll_returns_to_results_below_visible_header() {
    let h = Harness::collection();
    lay_out(&h, 600.0);
    h.page.on_scroll(1200.0);
    h.page.on_scroll(900.0);
    assert!(!h.page.header().unwrap().is_hidden());

    h.page
        .facets()
        .unwrap()
        .apply_filters(SearchParams::parse(RED), None, true)
        .await;

    assert_eq!(h.doc.borrow().viewport().scroll_y, 520.0);
}

#[tokio::test]
async fn test_scroll_ignores_hidden_header_and_never_moves_down() {
    let h = Harness::collection();
    lay_out(&h, 600.0);
    let facets = h.page.facets().unwrap();

    h.page.on_scroll(1200.0);
    assert!(h.page.header().unwrap().is_hidden());
    facets.apply_filters(SearchParams::parse(RED), None, true).await;
    assert_eq!(h.doc.borrow().viewport().scroll_y, 600.0);

    h.page.on_scroll(100.0);
    facets.apply_filters(SearchParams::parse(BLUE), None, true).await;
    assert_eq!(h.doc.borrow().viewport().scroll_y, 100.0);
}

#[tokio::test]
async fn test_repeated_identical_applies_reuse_arena_slots() {
    let h = Harness::collection();
    let facets = h.page.facets().unwrap();

    let mut lens = Vec::new();
    for _ in 0..5 {
        facets.apply_filters(SearchParams::parse(RED), None, false).await;
        lens.push(h.doc.borrow().arena_len());
    }

    assert!(lens.iter().all(|&len| len == lens[0]), "arena grew: {lens:?}");
}

#[tokio::test]
async fn test_bindings_are_rebuilt_after_each_swap() {
    let h = Harness::collection();
    let facets = h.page.facets().unwrap();
    let before = facets.binding_count();
    assert!(before > 0);

    facets.apply_filters(SearchParams::parse(BLUE), None, true).await;
    assert_eq!(facets.binding_count(), before);

    facets
        .apply_filters(SearchParams::parse("filter.v.option.color=Green"), None, true)
        .await;
    assert_eq!(facets.binding_count(), before);
    assert_eq!(h.page.stale_binding_count(), 0);
}
