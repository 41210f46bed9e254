//! CLI command implementations.

pub mod config;
pub mod filter;
pub mod load_more;
pub mod sections;

use std::rc::Rc;

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use theme_components::{share, MemoryHistory, StorefrontPage};
use theme_dom::Document;
use theme_fetch::Fetcher;

use crate::context::Context;

/// Arguments for the sections command.
#[derive(Args)]
pub struct SectionsArgs {
    /// Page path, e.g. `/collections/all`.
    pub path: String,

    /// Section keys to render. One key renders raw HTML, several render
    /// the JSON section map.
    #[arg(short, long, required = true)]
    pub sections: Vec<String>,
}

/// Arguments for the filter command.
#[derive(Args)]
pub struct FilterArgs {
    /// Collection or search path.
    pub path: String,

    /// Filter parameters as `name=value`, repeatable.
    #[arg(short, long = "param")]
    pub params: Vec<String>,

    /// Viewport width the page is mounted at.
    #[arg(long, default_value_t = 1200)]
    pub width: u32,
}

/// Arguments for the load-more command.
#[derive(Args)]
pub struct LoadMoreArgs {
    /// Collection or search path.
    pub path: String,

    /// Stop after this many pages.
    #[arg(short, long, default_value_t = 10)]
    pub max_pages: u64,

    /// Viewport width the page is mounted at.
    #[arg(long, default_value_t = 1200)]
    pub width: u32,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,

    /// Check the configuration for values commands would reject
    Validate,

    /// Initialize a new config file
    Init {
        /// Overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

/// Fetch `path` and mount the page's components over it. The returned
/// history starts at `path`.
pub(crate) async fn mount_page(
    ctx: &Context,
    fetcher: Rc<dyn Fetcher>,
    path: &str,
    width: u32,
) -> Result<(StorefrontPage, Rc<MemoryHistory>)> {
    let response = fetcher
        .get(path)
        .await
        .and_then(|r| r.error_for_status(path))
        .with_context(|| format!("Failed to fetch {}", path))?;
    ctx.output.debug(&format!(
        "fetched {} ({})",
        path,
        crate::output::format_bytes(response.body.len())
    ));

    let doc = share(Document::parse(&response.body));
    let history = Rc::new(MemoryHistory::new(path));
    let page = StorefrontPage::mount(ctx.theme_context(fetcher, width), doc, history.clone())
        .with_context(|| format!("Failed to mount components on {}", path))?;
    Ok((page, history))
}

/// Split `name=value` arguments.
pub(crate) fn parse_pairs(raw: &[String]) -> Result<Vec<(String, String)>> {
    raw.iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .with_context(|| format!("Expected name=value, got '{}'", pair))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pairs() {
        let pairs = parse_pairs(&["filter.v.option.color=Red".to_string(), "q=".to_string()])
            .unwrap();
        assert_eq!(pairs[0], ("filter.v.option.color".to_string(), "Red".to_string()));
        assert_eq!(pairs[1].1, "");
        assert!(parse_pairs(&["nope".to_string()]).is_err());
    }
}
