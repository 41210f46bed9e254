//! Load-more pagination against the collection fixture.

mod common;

use common::{results_section, Harness, PAGE_TWO, RED};
use theme_components::{Component, DomEvent, LoadOutcome, PaginationState};
use theme_core::{SearchParams, ThemeEvent};

#[tokio::test]
async fn test_last_page_removes_pagination_for_good() {
    let h = Harness::collection();
    h.fetcher.respond(PAGE_TWO, results_section(&["C", "D"], false, false));
    let pagination = h.page.pagination().unwrap();

    let load_more = h.node("load-more");
    assert!(h.page.dispatch(DomEvent::click(load_more)).await);

    assert_eq!(h.result_titles(), vec!["A", "B", "C", "D"]);
    assert!(pagination.is_exhausted());
    assert!(!h.exists("Pagination"));
    assert!(!h.body_html().contains("data-pagination-only"));

    assert_eq!(pagination.load_more().await, LoadOutcome::Skipped);
    assert_eq!(h.fetcher.request_count(PAGE_TWO), 1);
    assert_eq!(pagination.binding_count(), 0);
}

#[tokio::test]
async fn test_intermediate_page_advances_next_url() {
    let h = Harness::collection();
    h.fetcher.respond(PAGE_TWO, results_section(&["C"], true, false));
    let (_sub, events) = h.page.context().bus.record();
    let pagination = h.page.pagination().unwrap();

    assert_eq!(
        pagination.load_more().await,
        LoadOutcome::Appended {
            count: 1,
            exhausted: false
        }
    );
    assert_eq!(pagination.state(), PaginationState::Idle);

    let doc = h.doc.borrow();
    let nav = doc.get_element_by_id("Pagination").unwrap();
    assert_eq!(doc.attr(nav, "data-next-url"), Some("/collections/x?page=3"));
    assert_eq!(*events.borrow(), vec![ThemeEvent::ResultsAppended { count: 1 }]);
}

#[tokio::test]
async fn test_result_click_aborts_pending_page() {
    let h = Harness::collection();
    h.fetcher.respond(PAGE_TWO, results_section(&["C"], true, false));
    let gate = h.fetcher.gate(PAGE_TWO);
    let pagination = h.page.pagination().unwrap();
    let product = {
        let doc = h.doc.borrow();
        let root = doc.root();
        doc.select_first(root, "a[href='/products/a']").unwrap().unwrap()
    };

    let load = pagination.load_more();
    let click = async {
        assert!(h.page.dispatch(DomEvent::click(product)).await);
        gate.release();
    };
    let (outcome, ()) = futures::join!(load, click);

    assert_eq!(outcome, LoadOutcome::Cancelled);
    assert_eq!(h.result_titles(), vec!["A", "B"]);
    assert_eq!(pagination.state(), PaginationState::Idle);
    assert!(h.exists("Pagination"));
}

#[tokio::test]
async fn test_loading_pauses_while_filters_apply() {
    let h = Harness::collection();
    let gate = h.fetcher.gate(&common::filter_url(RED));
    let facets = h.page.facets().unwrap();
    let pagination = h.page.pagination().unwrap();

    let filter = facets.apply_filters(SearchParams::parse(RED), None, true);
    let load = async {
        let outcome = pagination.load_more().await;
        gate.release();
        outcome
    };
    let (_, outcome) = futures::join!(filter, load);

    assert_eq!(outcome, LoadOutcome::Skipped);
    assert_eq!(h.fetcher.request_count(PAGE_TWO), 0);
}

#[tokio::test]
async fn test_filter_change_resets_exhausted_pagination() {
    let h = Harness::collection();
    h.fetcher.respond(PAGE_TWO, results_section(&["C"], false, false));
    let pagination = h.page.pagination().unwrap();
    pagination.load_more().await;
    assert!(pagination.is_exhausted());

    let facets = h.page.facets().unwrap();
    facets.apply_filters(SearchParams::new(), None, true).await;
    h.page.process_events().await;

    assert_eq!(pagination.state(), PaginationState::Idle);
    assert!(h.exists("Pagination"));
    assert_eq!(h.page.stale_binding_count(), 0);
}

#[tokio::test]
async fn test_auto_load_runs_until_exhausted() {
    let h = Harness::collection();
    h.fetcher.respond(PAGE_TWO, results_section(&["C"], false, false));
    let (_visible, rx) = tokio::sync::watch::channel(true);

    let pages = h.page.pagination().unwrap().run_auto_load(rx).await;

    assert_eq!(pages, 1);
    assert_eq!(h.result_titles(), vec!["A", "B", "C"]);
}

#[tokio::test]
async fn test_auto_load_stops_when_visibility_closes() {
    let h = Harness::collection();
    let (visible, rx) = tokio::sync::watch::channel(false);
    drop(visible);

    assert_eq!(h.page.pagination().unwrap().run_auto_load(rx).await, 0);
    assert_eq!(h.fetcher.request_count(PAGE_TWO), 0);
}
