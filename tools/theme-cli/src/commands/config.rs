//! Configuration management commands.

use std::path::Path;

use anyhow::{bail, Result};

use super::{ConfigArgs, ConfigCommand};
use crate::config::generate_default_config;
use crate::context::Context;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx),
        ConfigCommand::Validate => validate_config(ctx),
        ConfigCommand::Init { force } => init_config(force, ctx),
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }
    ctx.output.header("Current Configuration");

    let store = &ctx.config.store;
    ctx.output.info("[store]");
    ctx.output.kv("base_url", &store.base_url);
    ctx.output.kv("timeout_secs", &store.timeout_secs.to_string());
    ctx.output.kv("retries", &store.retries.to_string());

    let theme = &ctx.config.theme;
    ctx.output.info("[theme.breakpoints]");
    ctx.output.kv("tablet", &theme.breakpoints.tablet.to_string());
    ctx.output.kv("desktop", &theme.breakpoints.desktop.to_string());

    ctx.output.info("[theme.timings]");
    ctx.output.kv("drawer_transition_ms", &theme.timings.drawer_transition_ms.to_string());
    ctx.output.kv("modal_transition_ms", &theme.timings.modal_transition_ms.to_string());
    ctx.output.kv(
        "quick_add_close_delay_ms",
        &theme.timings.quick_add_close_delay_ms.to_string(),
    );
    ctx.output.kv(
        "infinite_scroll_interval_ms",
        &theme.timings.infinite_scroll_interval_ms.to_string(),
    );

    ctx.output.info("[theme.routes]");
    ctx.output.kv("root", &theme.routes.root);
    ctx.output.kv("cart", &theme.routes.cart);

    ctx.output.info("[recordings]");
    ctx.output.kv("dir", &ctx.recordings_dir().display().to_string());
    Ok(())
}

fn validate_config(ctx: &Context) -> Result<()> {
    let problems = ctx.config.validate();
    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({ "valid": problems.is_empty(), "problems": problems }));
    } else {
        for problem in &problems {
            ctx.output.warn(problem);
        }
    }
    if !problems.is_empty() {
        bail!("{} configuration problem(s)", problems.len());
    }
    ctx.output.success("Configuration is valid");
    Ok(())
}

fn init_config(force: bool, ctx: &Context) -> Result<()> {
    let path = ctx.cwd.join("theme.toml");
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", display(&path));
    }
    std::fs::write(&path, generate_default_config())?;
    ctx.output.success(&format!("Wrote {}", display(&path)));
    Ok(())
}

fn display(path: &Path) -> String {
    path.display().to_string()
}
