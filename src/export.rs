//! Export pipeline: rendered tree → PNG file.
//!
//! Every image the tree references is resolved to an embedded data URI
//! first (remote images are fetched anonymously, bundled assets are read
//! from the asset root), then the tree is laid out, painted and rasterized
//! at `viewport × pixel_ratio`. Any failure is logged and produces no file.

use chrono::{DateTime, NaiveDate, Utc};

use crate::rendering::{Element, Node, VisualTree};
use crate::Viewport;

/// Largest surface edge before auto-scaling kicks in
pub const MAX_SURFACE_EDGE: u32 = 16384;

/// `<prefix>-<unix-millis>.png`, the name export uses.
pub fn timestamped_filename(prefix: &str, unix_millis: i64) -> String {
    format!("{}-{}.png", prefix, unix_millis)
}

/// `<prefix>-YYYY-MM-DD.png`
pub fn dated_filename(prefix: &str, date: NaiveDate) -> String {
    format!("{}-{}.png", prefix, date.format("%Y-%m-%d"))
}

pub fn timestamped_filename_now(prefix: &str) -> String {
    timestamped_filename(prefix, Utc::now().timestamp_millis())
}

/// Dated name for the current UTC day.
pub fn dated_filename_now(prefix: &str) -> String {
    let now: DateTime<Utc> = Utc::now();
    dated_filename(prefix, now.date_naive())
}

/// Append a timestamp query so caches are never consulted.
pub fn cache_busted(url: &str, unix_millis: i64) -> String {
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{}{}{}", url, sep, unix_millis)
}

/// Pixel ratio actually used. With `skip_auto_scale` the requested ratio is
/// kept; otherwise it shrinks so no edge exceeds [`MAX_SURFACE_EDGE`].
pub fn effective_pixel_ratio(viewport: Viewport, ratio: f32, skip_auto_scale: bool) -> f32 {
    if skip_auto_scale {
        return ratio;
    }
    let longest = viewport.width.max(viewport.height) as f32 * ratio;
    if longest > MAX_SURFACE_EDGE as f32 {
        MAX_SURFACE_EDGE as f32 / viewport.width.max(viewport.height) as f32
    } else {
        ratio
    }
}

/// Copy of `tree` with image sources replaced through `resolve`.
pub fn with_image_sources<F>(tree: &VisualTree, resolve: F) -> VisualTree
where
    F: Fn(&str) -> Option<String>,
{
    fn walk<F: Fn(&str) -> Option<String>>(el: &mut Element, resolve: &F) {
        if el.tag == "img" {
            for (name, value) in el.attrs.iter_mut() {
                if name == "src" {
                    if let Some(v) = resolve(value) {
                        *value = v;
                    }
                }
            }
        }
        for child in el.children.iter_mut() {
            if let Node::Element(e) = child {
                walk(e, resolve);
            }
        }
    }
    let mut out = tree.clone();
    walk(&mut out.root, &resolve);
    out
}

#[cfg(all(feature = "raster", feature = "net"))]
pub use pipeline::Exporter;

#[cfg(all(feature = "raster", feature = "net"))]
mod pipeline {
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    use chrono::Utc;
    use resvg::usvg::fontdb;

    use super::{cache_busted, effective_pixel_ratio, timestamped_filename_now, with_image_sources};
    use crate::assets::{self, ImageRef};
    use crate::fonts::FontBundle;
    use crate::rendering::{raster, svg_scene, Screenshot, VisualTree};
    use crate::{CanvasConfig, Error, Result};

    /// Rasterizes rendered trees. Cheap to clone.
    #[derive(Clone)]
    pub struct Exporter {
        config: CanvasConfig,
        http: reqwest::Client,
        fonts: Arc<fontdb::Database>,
    }

    impl Exporter {
        /// The HTTP client carries no cookie store and no credentials, so
        /// cross-origin images are requested anonymously.
        pub fn new(config: CanvasConfig, fonts: &FontBundle) -> Result<Self> {
            let http = reqwest::Client::builder().timeout(config.timeout()).build()?;
            let fonts = Arc::new(raster::font_database(&fonts.faces));
            Ok(Self { config, http, fonts })
        }

        pub fn config(&self) -> &CanvasConfig {
            &self.config
        }

        async fn fetch_remote(&self, url: &str) -> Result<String> {
            let target = if self.config.cache_bust {
                cache_busted(url, Utc::now().timestamp_millis())
            } else {
                url.to_string()
            };
            log::debug!("fetching image {}", target);
            let resp = self.http.get(&target).send().await?.error_for_status()?;
            let header_mime = resp
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.split(';').next().unwrap_or("").trim().to_string())
                .filter(|v| v.starts_with("image/"));
            let bytes = resp.bytes().await?;
            let mime = header_mime.unwrap_or_else(|| assets::sniff_mime(&bytes, "application/octet-stream").to_string());
            Ok(assets::to_data_uri(&mime, &bytes))
        }

        async fn resolve_source(&self, src: &str) -> Result<String> {
            match ImageRef::classify(src) {
                ImageRef::Embedded(uri) => {
                    assets::check_embedded_image(uri)?;
                    Ok(uri.to_string())
                }
                ImageRef::Remote(url) => self
                    .fetch_remote(url)
                    .await
                    .map_err(|e| Error::AssetError(format!("{}: {}", url, e))),
                ImageRef::Local(path) => {
                    assets::read_as_data_uri(&assets::resolve_root_relative(&self.config.asset_root, path))
                }
            }
        }

        /// Resolve every image source of `tree` to a data URI, concurrently.
        pub async fn prefetch(&self, tree: &VisualTree) -> Result<HashMap<String, String>> {
            let mut sources: Vec<&str> = Vec::new();
            for src in tree.image_sources() {
                if !sources.contains(&src) {
                    sources.push(src);
                }
            }
            let results = futures::future::join_all(sources.iter().map(|s| self.resolve_source(s))).await;
            sources
                .into_iter()
                .zip(results)
                .map(|(src, res)| res.map(|uri| (src.to_string(), uri)))
                .collect()
        }

        /// Render `tree` to PNG bytes.
        pub async fn export(&self, tree: &VisualTree) -> Result<Screenshot> {
            let inlined = self.prefetch(tree).await?;
            let tree = with_image_sources(tree, |src| inlined.get(src).cloned());

            let viewport = self.config.viewport;
            let ratio = effective_pixel_ratio(viewport, self.config.pixel_ratio, self.config.skip_auto_scale);
            let fonts = self.fonts.clone();
            tokio::task::spawn_blocking(move || {
                let svg = svg_scene(&tree, viewport);
                raster::rasterize(&svg, viewport, ratio, fonts)
            })
            .await
            .map_err(|e| Error::ExportError(format!("rasterizer task failed: {}", e)))?
        }

        /// Export into `dir` under a timestamped name. Returns the written
        /// path, or `None` after logging the failure.
        pub async fn export_to_dir(&self, tree: &VisualTree, dir: &Path) -> Option<PathBuf> {
            let result = async {
                let shot = self.export(tree).await?;
                let path = dir.join(timestamped_filename_now(&self.config.file_prefix));
                save_to(&path, &shot.png_data)?;
                Ok::<_, Error>(path)
            }
            .await;
            match result {
                Ok(path) => {
                    log::info!("exported {}", path.display());
                    Some(path)
                }
                Err(e) => {
                    log::error!("Failed to export image: {}", e);
                    None
                }
            }
        }
    }

    /// Write `data` to `path` through a temporary sibling so a failed write
    /// never leaves a partial file behind.
    pub fn save_to(path: &Path, data: &[u8]) -> Result<()> {
        let tmp = path.with_extension("png.part");
        if let Err(e) = std::fs::write(&tmp, data) {
            let _ = std::fs::remove_file(&tmp);
            return Err(Error::ExportError(format!("writing {}: {}", tmp.display(), e)));
        }
        std::fs::rename(&tmp, path).map_err(|e| {
            let _ = std::fs::remove_file(&tmp);
            Error::ExportError(format!("moving into {}: {}", path.display(), e))
        })
    }
}

#[cfg(all(feature = "raster", feature = "net"))]
pub use pipeline::save_to;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::render;
    use crate::state::DesignState;

    #[test]
    fn filename_helpers_are_independent() {
        assert_eq!(timestamped_filename("iqtisad-post", 1700000000123), "iqtisad-post-1700000000123.png");
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(dated_filename("iqtisad-post", date), "iqtisad-post-2024-03-09.png");
    }

    #[test]
    fn now_variants_follow_the_patterns() {
        let ts = timestamped_filename_now("p");
        let millis = ts.strip_prefix("p-").and_then(|s| s.strip_suffix(".png")).unwrap();
        assert!(millis.parse::<i64>().unwrap() > 0);
        let dated = dated_filename_now("p");
        assert_eq!(dated.len(), "p-YYYY-MM-DD.png".len());
    }

    #[test]
    fn cache_bust_appends_query() {
        assert_eq!(cache_busted("https://x/a.png", 5), "https://x/a.png?5");
        assert_eq!(cache_busted("https://picsum.photos/800/800?business", 5), "https://picsum.photos/800/800?business&5");
    }

    #[test]
    fn auto_scale_only_when_enabled() {
        let big = Viewport { width: 10000, height: 5000 };
        assert_eq!(effective_pixel_ratio(big, 2.0, true), 2.0);
        assert!((effective_pixel_ratio(big, 2.0, false) - 1.6384).abs() < 1e-4);
        assert_eq!(effective_pixel_ratio(Viewport::default(), 2.0, false), 2.0);
    }

    #[test]
    fn image_sources_are_rewritten() {
        let tree = render(&DesignState { logo_url: Some("/logos/logo-dark.png".into()), ..Default::default() });
        let out = with_image_sources(&tree, |src| src.starts_with('/').then(|| "data:image/png;base64,AA==".to_string()));
        let sources = out.image_sources();
        assert_eq!(sources.len(), 2);
        assert!(sources.contains(&"data:image/png;base64,AA=="));
        assert!(sources.iter().any(|s| s.starts_with("https://picsum.photos")));
        assert_eq!(tree.image_sources().len(), 2);
    }
}
