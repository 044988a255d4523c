//! Web font loading.
//!
//! The font stylesheet is fetched as text and kept, so the preview document
//! can carry it inline in its head instead of linking a cross-origin sheet.
//! The faces it references are downloaded as well and handed to the
//! rasterizer. Nothing here is fatal: on any failure the poster falls back to
//! system fonts and a warning is logged.

use crate::assets;
use crate::Result;

/// Sent when fetching the stylesheet so the font host answers with TrueType
/// sources, which the rasterizer can load.
const FONT_USER_AGENT: &str = "iqtisad-canvas/0.1";

/// Stylesheet text plus the raw font files it references.
#[derive(Debug, Clone, Default)]
pub struct FontBundle {
    pub css: String,
    pub faces: Vec<Vec<u8>>,
}

impl FontBundle {
    pub fn is_empty(&self) -> bool {
        self.css.is_empty() && self.faces.is_empty()
    }
}

/// Every `url(...)` source in `css`, unquoted, in order and without repeats.
pub fn font_sources(css: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut rest = css;
    while let Some(start) = rest.find("url(") {
        rest = &rest[start + 4..];
        let Some(end) = rest.find(')') else {
            break;
        };
        let src = rest[..end].trim().trim_matches(|c| c == '"' || c == '\'').to_string();
        rest = &rest[end + 1..];
        if !src.is_empty() && !out.contains(&src) {
            out.push(src);
        }
    }
    out
}

pub async fn fetch_css(http: &reqwest::Client, url: &str) -> Result<String> {
    let resp = http.get(url).send().await?.error_for_status()?;
    Ok(resp.text().await?)
}

async fn fetch_face(http: &reqwest::Client, src: &str) -> Result<Vec<u8>> {
    if src.starts_with("data:") {
        return Ok(assets::decode_data_uri(src)?.1);
    }
    let resp = http.get(src).send().await?.error_for_status()?;
    Ok(resp.bytes().await?.to_vec())
}

/// Fetch the stylesheet at `url` and every face it lists.
pub async fn load(url: &str, timeout: std::time::Duration) -> FontBundle {
    let http = match reqwest::Client::builder()
        .user_agent(FONT_USER_AGENT)
        .timeout(timeout)
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            log::warn!("font client unavailable: {}", e);
            return FontBundle::default();
        }
    };

    let css = match fetch_css(&http, url).await {
        Ok(css) => css,
        Err(e) => {
            log::warn!("Failed to load fonts: {}", e);
            return FontBundle::default();
        }
    };

    let sources = font_sources(&css);
    let results = futures::future::join_all(sources.iter().map(|s| fetch_face(&http, s))).await;
    let mut faces = Vec::new();
    for (src, res) in sources.iter().zip(results) {
        match res {
            Ok(data) => faces.push(data),
            Err(e) => log::warn!("font face {} skipped: {}", src, e),
        }
    }
    log::info!("loaded {} of {} font faces", faces.len(), sources.len());
    FontBundle { css, faces }
}
