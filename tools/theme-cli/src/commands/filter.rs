//! Apply filters to a collection page the way the facets form would.

use anyhow::{bail, Result};
use serde_json::json;
use theme_components::{BrowserHistory, FilterOutcome};
use theme_core::selectors::{PRODUCT_COUNT_ID, PRODUCT_GRID_ID};
use theme_core::SearchParams;

use super::{mount_page, parse_pairs, FilterArgs};
use crate::context::Context;
use crate::output::outcome_badge;

/// Run the filter command.
pub async fn run(args: FilterArgs, ctx: &Context) -> Result<()> {
    let fetcher = ctx.fetcher()?;
    let (page, history) = mount_page(ctx, fetcher, &args.path, args.width).await?;
    let Some(facets) = page.facets() else {
        bail!("{} has no facet filter form", args.path);
    };

    let params = SearchParams::from_pairs(parse_pairs(&args.params)?);
    let spinner = ctx.output.spinner("Applying filters");
    let outcome = facets.apply_filters(params, None, true).await;
    page.process_events().await;
    spinner.finish_and_clear();

    let label = match &outcome {
        FilterOutcome::Applied => "applied",
        FilterOutcome::Cancelled => "cancelled",
        FilterOutcome::Failed(_) => "failed",
    };
    let (results, count_text) = {
        let doc = page.document().borrow();
        let results = doc
            .get_element_by_id(PRODUCT_GRID_ID)
            .map(|grid| doc.element_children(grid).len())
            .unwrap_or(0);
        let count_text = doc
            .get_element_by_id(PRODUCT_COUNT_ID)
            .map(|node| doc.text_content(node).trim().to_string());
        (results, count_text)
    };
    let url = history.current_url();

    if ctx.output.is_json() {
        let logs: Vec<serde_json::Value> = ctx
            .logs()
            .entries()
            .iter()
            .filter_map(|e| serde_json::from_str(&e.to_json()).ok())
            .collect();
        ctx.output.json(&json!({
            "outcome": label,
            "url": url,
            "results": results,
            "count": count_text,
            "logs": logs,
        }));
    } else {
        ctx.output.header("Filter");
        ctx.output.kv("outcome", &outcome_badge(label));
        ctx.output.kv("url", &url);
        ctx.output.kv("results", &results.to_string());
        if let Some(text) = &count_text {
            ctx.output.kv("count", text);
        }
        if ctx.output.is_verbose() {
            for entry in ctx.logs().entries() {
                ctx.output.list_item(&entry.to_human());
            }
        }
    }

    if let Some(path) = ctx.finish()? {
        ctx.output.success(&format!("Recorded to {}", path.display()));
    }
    if let FilterOutcome::Failed(e) = outcome {
        bail!("Filter request failed: {}", e);
    }
    Ok(())
}
