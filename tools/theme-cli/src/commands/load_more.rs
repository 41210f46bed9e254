//! Walk a collection's pages through the pagination controller.

use anyhow::{bail, Result};
use serde_json::json;
use theme_components::LoadOutcome;

use super::{mount_page, LoadMoreArgs};
use crate::context::Context;
use crate::output::outcome_badge;

/// Run the load-more command.
pub async fn run(args: LoadMoreArgs, ctx: &Context) -> Result<()> {
    let fetcher = ctx.fetcher()?;
    let (page, _history) = mount_page(ctx, fetcher, &args.path, args.width).await?;
    let Some(pagination) = page.pagination() else {
        bail!("{} has no pagination", args.path);
    };

    let progress = ctx.output.pages(args.max_pages, "loading");
    let mut pages = 0u64;
    let mut appended = 0usize;
    let last = loop {
        if pages >= args.max_pages {
            break "skipped";
        }
        match pagination.load_more().await {
            LoadOutcome::Appended { count, exhausted } => {
                pages += 1;
                appended += count;
                progress.inc(1);
                progress.set_message(format!("{} items", appended));
                if exhausted {
                    break "exhausted";
                }
            }
            LoadOutcome::Exhausted => break "exhausted",
            LoadOutcome::Skipped => break "skipped",
            LoadOutcome::Cancelled => break "cancelled",
            LoadOutcome::Failed(e) => {
                progress.abandon();
                bail!("Page {} failed after {} items: {}", pages + 1, appended, e);
            }
        }
    };
    progress.finish_and_clear();

    if ctx.output.is_json() {
        ctx.output.json(&json!({
            "pages": pages,
            "appended": appended,
            "state": last,
        }));
    } else {
        ctx.output.header("Load more");
        ctx.output.kv("pages", &pages.to_string());
        ctx.output.kv("appended", &appended.to_string());
        ctx.output.kv("state", &outcome_badge(last));
    }

    if let Some(path) = ctx.finish()? {
        ctx.output.success(&format!("Recorded to {}", path.display()));
    }
    Ok(())
}
