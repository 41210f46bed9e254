//! CLI execution context.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use chrono::Utc;
use theme_components::ThemeContext;
use theme_core::ThemeConfig;
use theme_fetch::{
    FetchPolicy, Fetcher, HttpFetcher, Recording, RecordingFetcher, ReplayFetcher, RetryPolicy,
    TimeoutConfig,
};
use theme_observability::LogSink;

use crate::config::CliConfig;
use crate::output::Output;

/// Execution context for CLI commands.
pub struct Context {
    /// CLI configuration.
    pub config: CliConfig,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
    replay: Option<PathBuf>,
    record: Option<PathBuf>,
    recorder: RefCell<Option<Rc<RecordingFetcher>>>,
    logs: LogSink,
}

impl Context {
    /// Load context from config file.
    pub fn load(
        config_path: Option<&str>,
        output: Output,
        replay: Option<&str>,
        record: bool,
    ) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let config = if let Some(path) = config_path {
            CliConfig::load(path)?
        } else {
            Self::find_config(&cwd).unwrap_or_default()
        };

        let record = record.then(|| {
            let name = format!("{}.json", Utc::now().format("%Y%m%d-%H%M%S"));
            resolve_in(&cwd, &config.recordings.dir).join(name)
        });
        Ok(Self {
            replay: replay.map(|p| resolve_in(&cwd, p)),
            record,
            config,
            output,
            cwd,
            recorder: RefCell::new(None),
            logs: LogSink::new(),
        })
    }

    /// Find config file in directory tree.
    fn find_config(start: &Path) -> Option<CliConfig> {
        let config_names = ["theme.toml", ".theme.toml", "theme.json"];

        let mut current = start.to_path_buf();
        loop {
            for name in &config_names {
                let config_path = current.join(name);
                if config_path.exists() {
                    if let Ok(config) = CliConfig::load(config_path.to_str()?) {
                        return Some(config);
                    }
                }
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    /// Transport for this run: a recording when `--replay` was given,
    /// otherwise the configured store. Wrapped for capture under `--record`.
    pub fn fetcher(&self) -> Result<Rc<dyn Fetcher>> {
        let base: Rc<dyn Fetcher> = match &self.replay {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read recording: {}", path.display()))?;
                let recording = Recording::from_json(&json)
                    .with_context(|| format!("Failed to parse recording: {}", path.display()))?;
                self.output.debug(&format!(
                    "replaying {} exchanges recorded {}",
                    recording.exchanges.len(),
                    recording.recorded_at.format("%Y-%m-%d %H:%M:%S")
                ));
                Rc::new(ReplayFetcher::from_recording(&recording))
            }
            None => {
                let store = &self.config.store;
                let policy = FetchPolicy::new(
                    TimeoutConfig::from_total(Duration::from_secs(store.timeout_secs)),
                    RetryPolicy::new(store.retries),
                );
                let fetcher = HttpFetcher::with_policy(&store.base_url, policy)
                    .with_context(|| format!("Invalid store URL: {}", store.base_url))?;
                Rc::new(fetcher)
            }
        };

        if self.record.is_none() {
            return Ok(base);
        }
        let recorder = Rc::new(RecordingFetcher::new(base));
        *self.recorder.borrow_mut() = Some(Rc::clone(&recorder));
        Ok(recorder)
    }

    /// Component context at viewport `width`, logging into this run's sink.
    pub fn theme_context(&self, fetcher: Rc<dyn Fetcher>, width: u32) -> ThemeContext {
        let config = ThemeConfig::new(self.config.theme.clone(), width);
        ThemeContext::new(config, fetcher).with_log_sink(self.logs.clone())
    }

    /// Component log entries captured so far.
    pub fn logs(&self) -> &LogSink {
        &self.logs
    }

    /// Write the recording requested with `--record`, if any, into the
    /// recordings directory.
    pub fn finish(&self) -> Result<Option<PathBuf>> {
        let (Some(path), Some(recorder)) = (&self.record, self.recorder.borrow_mut().take()) else {
            return Ok(None);
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let recording = recorder.to_recording(&self.config.store.base_url);
        std::fs::write(path, recording.to_json()?)
            .with_context(|| format!("Failed to write recording: {}", path.display()))?;
        Ok(Some(path.clone()))
    }

    /// Get the recordings directory.
    pub fn recordings_dir(&self) -> PathBuf {
        self.resolve_path(&self.config.recordings.dir)
    }

    /// Resolve a path relative to the working directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        resolve_in(&self.cwd, path)
    }
}

fn resolve_in(cwd: &Path, path: &str) -> PathBuf {
    if Path::new(path).is_absolute() {
        PathBuf::from(path)
    } else {
        cwd.join(path)
    }
}
