//! Theme settings and the immutable configuration handed to components.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::breakpoint::{Breakpoint, BreakpointWatch};
use crate::error::ThemeError;

/// Display strings used by components.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StringTable {
    /// Message published when the cart drawer cannot refresh.
    #[serde(default = "default_cart_error")]
    pub cart_error: String,
    /// Notice shown when checkout is attempted without accepting terms.
    #[serde(default = "default_terms_required")]
    pub terms_required: String,
    /// Message for a failed filter request (logged, not shown).
    #[serde(default = "default_filter_error")]
    pub filter_error: String,
    /// Slider counter separator, e.g. "1 of 5".
    #[serde(default = "default_slide_counter")]
    pub slide_counter_separator: String,
}

fn default_cart_error() -> String {
    "There was an error while updating your cart. Please try again.".to_string()
}

fn default_terms_required() -> String {
    "You must agree with the terms and conditions of sales to check out.".to_string()
}

fn default_filter_error() -> String {
    "Filters could not be applied.".to_string()
}

fn default_slide_counter() -> String {
    "of".to_string()
}

impl Default for StringTable {
    fn default() -> Self {
        Self {
            cart_error: default_cart_error(),
            terms_required: default_terms_required(),
            filter_error: default_filter_error(),
            slide_counter_separator: default_slide_counter(),
        }
    }
}

/// Minimum viewport widths (px) for each breakpoint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Breakpoints {
    /// Smallest tablet width.
    #[serde(default = "default_tablet")]
    pub tablet: u32,
    /// Smallest desktop width.
    #[serde(default = "default_desktop")]
    pub desktop: u32,
}

fn default_tablet() -> u32 {
    750
}

fn default_desktop() -> u32 {
    990
}

impl Default for Breakpoints {
    fn default() -> Self {
        Self {
            tablet: default_tablet(),
            desktop: default_desktop(),
        }
    }
}

impl Breakpoints {
    /// Classify a viewport width.
    pub fn classify(&self, width: u32) -> Breakpoint {
        if width >= self.desktop {
            Breakpoint::Desktop
        } else if width >= self.tablet {
            Breakpoint::Tablet
        } else {
            Breakpoint::Mobile
        }
    }
}

/// Durations of transitions and timers, in milliseconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Timings {
    /// Drawer slide-in / slide-out.
    #[serde(default = "default_drawer_ms")]
    pub drawer_transition_ms: u64,
    /// Modal fade.
    #[serde(default = "default_modal_ms")]
    pub modal_transition_ms: u64,
    /// Pause between closing the quick-add overlay and opening the cart.
    #[serde(default = "default_quick_add_ms")]
    pub quick_add_close_delay_ms: u64,
    /// Infinite-scroll polling interval.
    #[serde(default = "default_scroll_ms")]
    pub infinite_scroll_interval_ms: u64,
}

fn default_drawer_ms() -> u64 {
    300
}

fn default_modal_ms() -> u64 {
    200
}

fn default_quick_add_ms() -> u64 {
    100
}

fn default_scroll_ms() -> u64 {
    1000
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            drawer_transition_ms: default_drawer_ms(),
            modal_transition_ms: default_modal_ms(),
            quick_add_close_delay_ms: default_quick_add_ms(),
            infinite_scroll_interval_ms: default_scroll_ms(),
        }
    }
}

impl Timings {
    /// Timings with every delay set to zero.
    pub fn immediate() -> Self {
        Self {
            drawer_transition_ms: 0,
            modal_transition_ms: 0,
            quick_add_close_delay_ms: 0,
            infinite_scroll_interval_ms: 0,
        }
    }

    pub fn drawer_transition(&self) -> Duration {
        Duration::from_millis(self.drawer_transition_ms)
    }

    pub fn modal_transition(&self) -> Duration {
        Duration::from_millis(self.modal_transition_ms)
    }

    pub fn quick_add_close_delay(&self) -> Duration {
        Duration::from_millis(self.quick_add_close_delay_ms)
    }

    pub fn infinite_scroll_interval(&self) -> Duration {
        Duration::from_millis(self.infinite_scroll_interval_ms)
    }
}

/// Host environment capabilities. Missing capabilities select the fallback
/// path (eager load instead of lazy, immediate callback instead of observed).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Capabilities {
    #[serde(default = "default_true")]
    pub intersection_observer: bool,
    #[serde(default = "default_true")]
    pub resize_observer: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            intersection_observer: true,
            resize_observer: true,
        }
    }
}

/// Storefront routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Routes {
    /// Root URL for `sections=` renders.
    #[serde(default = "default_root")]
    pub root: String,
    /// Cart page.
    #[serde(default = "default_cart")]
    pub cart: String,
}

fn default_root() -> String {
    "/".to_string()
}

fn default_cart() -> String {
    "/cart".to_string()
}

impl Default for Routes {
    fn default() -> Self {
        Self {
            root: default_root(),
            cart: default_cart(),
        }
    }
}

/// Theme settings file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThemeSettings {
    #[serde(default)]
    pub strings: StringTable,

    #[serde(default)]
    pub breakpoints: Breakpoints,

    #[serde(default)]
    pub timings: Timings,

    #[serde(default)]
    pub capabilities: Capabilities,

    #[serde(default)]
    pub routes: Routes,
}

impl ThemeSettings {
    /// Parse settings from TOML or JSON text.
    pub fn from_str_with_format(content: &str, json: bool) -> Result<Self, ThemeError> {
        if json {
            serde_json::from_str(content).map_err(|e| ThemeError::Config(e.to_string()))
        } else {
            toml::from_str(content).map_err(|e| ThemeError::Config(e.to_string()))
        }
    }

    /// Load settings from a file; `.json` files are JSON, anything else TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ThemeError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ThemeError::Config(format!("{}: {}", path.display(), e)))?;
        let json = path.extension().is_some_and(|ext| ext == "json");
        Self::from_str_with_format(&content, json)
    }
}

/// Immutable configuration passed to component constructors.
///
/// Settings never change after construction; the breakpoint is the one
/// piece of environment state that does, and it is exposed as a watch
/// channel rather than a mutable global.
#[derive(Debug)]
pub struct ThemeConfig {
    settings: ThemeSettings,
    breakpoint: BreakpointWatch,
}

impl ThemeConfig {
    /// Create a configuration for a given initial viewport width.
    pub fn new(settings: ThemeSettings, viewport_width: u32) -> Self {
        let initial = settings.breakpoints.classify(viewport_width);
        Self {
            breakpoint: BreakpointWatch::new(settings.breakpoints, initial),
            settings,
        }
    }

    /// Settings.
    pub fn settings(&self) -> &ThemeSettings {
        &self.settings
    }

    /// String table.
    pub fn strings(&self) -> &StringTable {
        &self.settings.strings
    }

    /// Timings.
    pub fn timings(&self) -> &Timings {
        &self.settings.timings
    }

    /// Capabilities.
    pub fn capabilities(&self) -> &Capabilities {
        &self.settings.capabilities
    }

    /// Routes.
    pub fn routes(&self) -> &Routes {
        &self.settings.routes
    }

    /// Breakpoint channel.
    pub fn breakpoint(&self) -> &BreakpointWatch {
        &self.breakpoint
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self::new(ThemeSettings::default(), 1280)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_defaults_fill_missing_fields() {
        let settings = ThemeSettings::from_str_with_format(
            r#"
            [timings]
            drawer_transition_ms = 0

            [strings]
            cart_error = "Cart unavailable"
            "#,
            false,
        )
        .unwrap();
        assert_eq!(settings.timings.drawer_transition_ms, 0);
        assert_eq!(settings.timings.infinite_scroll_interval_ms, 1000);
        assert_eq!(settings.strings.cart_error, "Cart unavailable");
        assert_eq!(settings.routes.cart, "/cart");
    }

    #[test]
    fn test_json_settings() {
        let settings = ThemeSettings::from_str_with_format(
            r#"{"capabilities": {"intersection_observer": false}}"#,
            true,
        )
        .unwrap();
        assert!(!settings.capabilities.intersection_observer);
        assert!(settings.capabilities.resize_observer);
    }

    #[test]
    fn test_classify_breakpoints() {
        let bp = Breakpoints::default();
        assert_eq!(bp.classify(375), Breakpoint::Mobile);
        assert_eq!(bp.classify(800), Breakpoint::Tablet);
        assert_eq!(bp.classify(990), Breakpoint::Desktop);
    }
}
