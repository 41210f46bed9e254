//! Fetch section renders and summarize what came back.

use anyhow::{Context as _, Result};
use serde::Serialize;
use theme_render::{SectionPayload, SectionRequest};

use super::SectionsArgs;
use crate::context::Context;
use crate::output::format_bytes;

#[derive(Serialize)]
struct SectionSummary {
    key: String,
    present: bool,
    bytes: usize,
}

/// Run the sections command.
pub async fn run(args: SectionsArgs, ctx: &Context) -> Result<()> {
    let fetcher = ctx.fetcher()?;
    let keys: Vec<&str> = args.sections.iter().map(String::as_str).collect();
    let url = match keys.as_slice() {
        [single] => SectionRequest::new(&args.path).section_id(single),
        many => SectionRequest::new(&args.path).sections(many),
    };

    let spinner = ctx.output.spinner(&format!("GET {}", url));
    let response = fetcher
        .get(&url)
        .await
        .and_then(|r| r.error_for_status(&url))
        .with_context(|| format!("Failed to fetch {}", url))?;
    spinner.finish_and_clear();

    let payload = SectionPayload::parse(&response.body)?;
    let summaries: Vec<SectionSummary> = match &payload {
        SectionPayload::Html(doc) => vec![SectionSummary {
            key: keys.first().map(|k| k.to_string()).unwrap_or_default(),
            present: true,
            bytes: doc.inner_html(doc.root()).len(),
        }],
        SectionPayload::Sections(map) => keys
            .iter()
            .map(|key| match map.get(*key) {
                Some(doc) => SectionSummary {
                    key: key.to_string(),
                    present: true,
                    bytes: doc.inner_html(doc.root()).len(),
                },
                None => SectionSummary {
                    key: key.to_string(),
                    present: false,
                    bytes: 0,
                },
            })
            .collect(),
    };

    if ctx.output.is_json() {
        ctx.output.json(&summaries);
    } else {
        ctx.output.header(&url);
        for s in &summaries {
            if s.present {
                ctx.output.kv(&s.key, &format_bytes(s.bytes));
            } else {
                ctx.output.kv(&s.key, "missing");
            }
        }
    }

    if let Some(path) = ctx.finish()? {
        ctx.output.success(&format!("Recorded to {}", path.display()));
    }
    Ok(())
}
