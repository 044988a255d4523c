//! Iqtisad Canvas
//!
//! A poster composer for an Arabic economic-news platform. A single
//! [`DesignState`] describes the poster; [`render`] turns it into a visual
//! tree which can be written as a live HTML preview, or exported as a PNG.
//! Headline ideas come from a remote text-generation service behind a small
//! HTTP endpoint.
//!
//! # Features
//!
//! - **raster** (default): SVG scene rasterization through `resvg`
//! - **net** (default): suggestion client, suggestion endpoint, font and
//!   remote image fetching
//!
//! # Example
//!
//! ```
//! use iqtisad_canvas::{render, DesignState, Layout};
//!
//! let state = DesignState { layout: Layout::Minimal, font_size: 40, ..Default::default() };
//! let tree = render(&state);
//! let headline = tree.root.find_class("poster-headline").unwrap();
//! assert_eq!(headline.style.get("font-size"), Some("44px"));
//! ```

use std::path::PathBuf;

pub mod error;
pub use error::{Error, Result};

pub mod assets;
pub mod controls;
pub mod editor;
pub mod export;
pub mod rendering;
pub mod state;
pub mod suggest;

// Network-facing pieces (font host, suggestion endpoint)
#[cfg(feature = "net")]
pub mod fonts;
#[cfg(feature = "net")]
pub mod server;

// Async editor facade (worker thread + detached tasks)
#[cfg(all(feature = "raster", feature = "net"))]
pub mod async_api;

#[cfg(all(feature = "raster", feature = "net"))]
pub use async_api::EditorHandle;
pub use controls::{Control, ControlPanel};
pub use editor::Editor;
pub use rendering::html::CssPolicy;
pub use rendering::{render, VisualTree};
pub use state::{DesignState, Layout, ThemeColor};

/// Stylesheet of the IBM Plex Sans Arabic family used by every template
pub const DEFAULT_FONT_CSS_URL: &str =
    "https://fonts.googleapis.com/css2?family=IBM+Plex+Sans+Arabic:wght@300;400;500;600;700&display=swap";

/// Configuration for the composer
///
/// The defaults reproduce the behaviour of the web tool: a 540×540 poster,
/// exported at twice its on-screen size with auto-scaling disabled, and
/// cache-busted image fetches.
///
/// # Examples
///
/// ```
/// let cfg = iqtisad_canvas::CanvasConfig::default();
/// assert_eq!(cfg.pixel_ratio, 2.0);
/// assert_eq!(cfg.file_prefix, "iqtisad-post");
/// ```
#[derive(Debug, Clone)]
pub struct CanvasConfig {
    /// On-screen poster size in CSS px
    pub viewport: Viewport,
    /// Supersampling multiplier applied on export
    pub pixel_ratio: f32,
    /// Keep the exact `viewport × pixel_ratio` size even past the surface limit
    pub skip_auto_scale: bool,
    /// Append a timestamp query to remote image URLs before fetching
    pub cache_bust: bool,
    /// Prefix of exported file names
    pub file_prefix: String,
    /// URL of the headline suggestion endpoint
    pub suggest_endpoint: String,
    /// Timeout for network requests in milliseconds
    pub timeout_ms: u64,
    /// Directory that root-relative asset references resolve against
    pub asset_root: PathBuf,
    /// Font stylesheet fetched and inlined at startup
    pub font_css_url: String,
    /// How custom CSS is written into the preview document
    pub css_policy: CssPolicy,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            pixel_ratio: 2.0,
            skip_auto_scale: true,
            cache_bust: true,
            file_prefix: "iqtisad-post".to_string(),
            suggest_endpoint: "http://127.0.0.1:3000/api/generate-headlines".to_string(),
            timeout_ms: 30000,
            asset_root: PathBuf::from("public"),
            font_css_url: DEFAULT_FONT_CSS_URL.to_string(),
            css_policy: CssPolicy::default(),
        }
    }
}

impl CanvasConfig {
    /// Defaults overlaid with `IQTISAD_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(url) = lookup("IQTISAD_SUGGEST_URL") {
            cfg.suggest_endpoint = url;
        }
        if let Some(root) = lookup("IQTISAD_ASSET_ROOT") {
            cfg.asset_root = PathBuf::from(root);
        }
        if let Some(prefix) = lookup("IQTISAD_FILE_PREFIX") {
            if prefix.trim().is_empty() {
                return Err(Error::ConfigError("IQTISAD_FILE_PREFIX is empty".into()));
            }
            cfg.file_prefix = prefix;
        }
        if let Some(ms) = lookup("IQTISAD_TIMEOUT_MS") {
            cfg.timeout_ms = ms
                .trim()
                .parse()
                .map_err(|_| Error::ConfigError(format!("IQTISAD_TIMEOUT_MS is not a number: '{}'", ms)))?;
        }
        if let Some(policy) = lookup("IQTISAD_CSS_POLICY") {
            cfg.css_policy = policy.parse()?;
        }
        Ok(cfg)
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms)
    }
}

/// Viewport dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 540,
            height: 540,
        }
    }
}
