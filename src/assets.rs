//! Image references: embedded data URIs and the predefined logo set.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// A logo that can be picked without uploading a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogoAsset {
    pub id: &'static str,
    pub name: &'static str,
    pub url: &'static str,
}

pub const PREDEFINED_LOGOS: [LogoAsset; 3] = [
    LogoAsset { id: "colored", name: "شعار ملون", url: "/logos/logo-colored.png" },
    LogoAsset { id: "dark", name: "شعار داكن", url: "/logos/logo-dark.png" },
    LogoAsset { id: "light", name: "شعار فاتح", url: "/logos/logo-light.png" },
];

/// What the logo picker shows for an asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogoPreview {
    Image(PathBuf),
    /// The asset could not be loaded; show the first character of its name
    Glyph(char),
}

impl LogoAsset {
    pub fn by_id(id: &str) -> Option<&'static LogoAsset> {
        PREDEFINED_LOGOS.iter().find(|l| l.id == id)
    }

    pub fn fallback_glyph(&self) -> char {
        self.name.chars().next().unwrap_or('?')
    }

    /// Resolve the picker preview against `asset_root`.
    pub fn preview(&self, asset_root: &Path) -> LogoPreview {
        let path = resolve_root_relative(asset_root, self.url);
        match std::fs::metadata(&path) {
            Ok(meta) if meta.is_file() => LogoPreview::Image(path),
            _ => {
                log::debug!("logo asset {} not available at {:?}", self.id, path);
                LogoPreview::Glyph(self.fallback_glyph())
            }
        }
    }
}

/// Classification of an image reference held in the design state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageRef<'a> {
    /// `data:` URI, usable as-is
    Embedded(&'a str),
    /// `http(s)://` URL on another origin
    Remote(&'a str),
    /// Root-relative or relative path to a bundled asset
    Local(&'a str),
}

impl<'a> ImageRef<'a> {
    pub fn classify(reference: &'a str) -> Self {
        let lower = reference.get(..8).unwrap_or(reference).to_ascii_lowercase();
        if lower.starts_with("data:") {
            ImageRef::Embedded(reference)
        } else if lower.starts_with("http://") || lower.starts_with("https://") {
            ImageRef::Remote(reference)
        } else {
            ImageRef::Local(reference)
        }
    }
}

/// Guess an image MIME type from a file name.
pub fn mime_for_path(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}

/// Sniff a MIME type from the leading bytes, falling back to `fallback`.
pub fn sniff_mime<'a>(bytes: &[u8], fallback: &'a str) -> &'a str {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        "image/png"
    } else if bytes.starts_with(&[0xff, 0xd8, 0xff]) {
        "image/jpeg"
    } else if bytes.starts_with(b"GIF8") {
        "image/gif"
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "image/webp"
    } else {
        fallback
    }
}

/// Encode raw bytes as a base64 data URI.
pub fn to_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Read a user-selected file fully into memory and embed it as a data URI.
///
/// No size or type validation is performed.
pub fn read_as_data_uri(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)
        .map_err(|e| Error::AssetError(format!("failed to read {}: {}", path.display(), e)))?;
    let mime = sniff_mime(&bytes, mime_for_path(path));
    Ok(to_data_uri(mime, &bytes))
}

/// Split a data URI into its MIME type and decoded payload.
pub fn decode_data_uri(uri: &str) -> Result<(String, Vec<u8>)> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| Error::AssetError("not a data URI".into()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| Error::AssetError("data URI has no payload".into()))?;
    let mime = meta.split(';').next().unwrap_or("").to_string();
    if meta.ends_with(";base64") {
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| Error::AssetError(format!("invalid base64 payload: {}", e)))?;
        Ok((mime, bytes))
    } else {
        Ok((mime, payload.as_bytes().to_vec()))
    }
}

/// Decode `uri` and check that its payload is an image the rasterizer can
/// read (PNG, JPEG, GIF, WebP or SVG markup).
pub fn check_embedded_image(uri: &str) -> Result<()> {
    let (mime, bytes) = decode_data_uri(uri)?;
    if !sniff_mime(&bytes, "").is_empty() {
        return Ok(());
    }
    let is_svg = mime == "image/svg+xml"
        && std::str::from_utf8(&bytes).is_ok_and(|text| text.contains("<svg"));
    if is_svg {
        return Ok(());
    }
    Err(Error::AssetError(format!(
        "embedded {} image is unreadable",
        if mime.is_empty() { "untyped" } else { mime.as_str() }
    )))
}

/// Map a root-relative reference such as `/logos/logo-dark.png` under `root`.
pub fn resolve_root_relative(root: &Path, reference: &str) -> PathBuf {
    root.join(reference.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_images_are_checked() {
        let png = to_data_uri("image/png", b"\x89PNG\r\n\x1a\nrest");
        assert!(check_embedded_image(&png).is_ok());
        let svg = format!("data:image/svg+xml,{}", "<svg xmlns='http://www.w3.org/2000/svg'/>");
        assert!(check_embedded_image(&svg).is_ok());

        assert!(matches!(
            check_embedded_image("data:image/png;base64,!!!not-base64!!!"),
            Err(Error::AssetError(_))
        ));
        assert!(check_embedded_image(&to_data_uri("image/png", b"plain text")).is_err());
        assert!(check_embedded_image("data:image/png;base64").is_err());
    }

    #[test]
    fn classify_references() {
        assert!(matches!(ImageRef::classify("data:image/png;base64,AA=="), ImageRef::Embedded(_)));
        assert!(matches!(ImageRef::classify("HTTPS://picsum.photos/800"), ImageRef::Remote(_)));
        assert!(matches!(ImageRef::classify("/logos/logo-dark.png"), ImageRef::Local(_)));
        assert!(matches!(ImageRef::classify("x"), ImageRef::Local(_)));
    }

    #[test]
    fn data_uri_roundtrip_keeps_mime() {
        let uri = to_data_uri("image/png", b"\x89PNG\r\n\x1a\nrest");
        assert!(uri.starts_with("data:image/png;base64,"));
        let (mime, bytes) = decode_data_uri(&uri).unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(&bytes[..4], b"\x89PNG");
    }

    #[test]
    fn sniffing_beats_extension() {
        assert_eq!(sniff_mime(&[0xff, 0xd8, 0xff, 0xe0], "image/png"), "image/jpeg");
        assert_eq!(sniff_mime(b"????", "image/png"), "image/png");
    }

    #[test]
    fn missing_predefined_logo_falls_back_to_glyph() {
        let dir = std::env::temp_dir().join("iqtisad-no-such-assets");
        let logo = LogoAsset::by_id("dark").unwrap();
        assert_eq!(logo.preview(&dir), LogoPreview::Glyph('ش'));
    }

    #[test]
    fn root_relative_paths_resolve_under_root() {
        let p = resolve_root_relative(Path::new("public"), "/logos/logo-light.png");
        assert_eq!(p, Path::new("public/logos/logo-light.png"));
    }
}
