/// SVG scene emission and PNG rasterization.

use super::html::escape_attr;
use super::paint::{GradientStop, ImageFilter, PaintCommand, TextAnchor};
use super::style::Rgba;
use crate::Viewport;

fn fill_attrs(color: &Rgba) -> String {
    format!("fill=\"{}\" fill-opacity=\"{}\"", color.hex(), color.clamped_alpha())
}

fn stop_markup(stop: &GradientStop) -> String {
    format!(
        "<stop offset=\"{}\" stop-color=\"{}\" stop-opacity=\"{}\"/>",
        stop.offset.clamp(0.0, 1.0),
        stop.color.hex(),
        stop.color.clamped_alpha()
    )
}

/// CSS `brightness()` then `contrast()` as two linear transfer stages
fn filter_markup(id: &str, f: &ImageFilter) -> String {
    let linear = |slope: f32, intercept: f32| {
        format!(
            "<feFuncR type=\"linear\" slope=\"{s}\" intercept=\"{i}\"/><feFuncG type=\"linear\" slope=\"{s}\" intercept=\"{i}\"/><feFuncB type=\"linear\" slope=\"{s}\" intercept=\"{i}\"/>",
            s = slope,
            i = intercept
        )
    };
    format!(
        "<filter id=\"{}\" color-interpolation-filters=\"sRGB\"><feComponentTransfer>{}</feComponentTransfer><feComponentTransfer>{}</feComponentTransfer></filter>",
        id,
        linear(f.brightness, 0.0),
        linear(f.contrast, 0.5 - 0.5 * f.contrast)
    )
}

/// Serialize a display list as a standalone SVG document sized to `viewport`.
pub fn scene_to_svg(commands: &[PaintCommand], viewport: Viewport) -> String {
    let mut defs = String::new();
    let mut body = String::new();

    for (i, cmd) in commands.iter().enumerate() {
        match cmd {
            PaintCommand::SolidRect { rect, color, radius } => {
                body.push_str(&format!(
                    "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"{}\" {}/>\n",
                    rect.x,
                    rect.y,
                    rect.width,
                    rect.height,
                    radius.min(rect.width.min(rect.height) / 2.0),
                    fill_attrs(color)
                ));
            }
            PaintCommand::GradientRect { rect, stops } => {
                let id = format!("g{}", i);
                defs.push_str(&format!(
                    "<linearGradient id=\"{}\" x1=\"0\" y1=\"1\" x2=\"0\" y2=\"0\">{}</linearGradient>\n",
                    id,
                    stops.iter().map(stop_markup).collect::<String>()
                ));
                body.push_str(&format!(
                    "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"url(#{})\"/>\n",
                    rect.x, rect.y, rect.width, rect.height, id
                ));
            }
            PaintCommand::Image { rect, href, cover, filter, radius } => {
                let mut extra = String::new();
                if let Some(f) = filter {
                    let id = format!("f{}", i);
                    defs.push_str(&filter_markup(&id, f));
                    defs.push('\n');
                    extra.push_str(&format!(" filter=\"url(#{})\"", id));
                }
                if *radius > 0.0 {
                    let id = format!("c{}", i);
                    defs.push_str(&format!(
                        "<clipPath id=\"{}\"><rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"{}\"/></clipPath>\n",
                        id, rect.x, rect.y, rect.width, rect.height, radius
                    ));
                    extra.push_str(&format!(" clip-path=\"url(#{})\"", id));
                }
                body.push_str(&format!(
                    "<image x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" preserveAspectRatio=\"xMidYMid {}\" href=\"{}\"{}/>\n",
                    rect.x,
                    rect.y,
                    rect.width,
                    rect.height,
                    if *cover { "slice" } else { "meet" },
                    escape_attr(href),
                    extra
                ));
            }
            PaintCommand::Text {
                x,
                y,
                lines,
                line_height,
                font_size,
                font_family,
                font_weight,
                color,
                anchor,
                letter_spacing,
                stroke,
            } => {
                let anchor = match anchor {
                    TextAnchor::Start => "start",
                    TextAnchor::Middle => "middle",
                    TextAnchor::End => "end",
                };
                let stroke = stroke
                    .map(|(w, c)| {
                        format!(
                            " stroke=\"{}\" stroke-opacity=\"{}\" stroke-width=\"{}\"",
                            c.hex(),
                            c.clamped_alpha(),
                            w
                        )
                    })
                    .unwrap_or_default();
                body.push_str(&format!(
                    "<text font-family=\"{}\" font-size=\"{}\" font-weight=\"{}\" letter-spacing=\"{}\" text-anchor=\"{}\" {}{}>",
                    escape_attr(font_family),
                    font_size,
                    escape_attr(font_weight),
                    letter_spacing,
                    anchor,
                    fill_attrs(color),
                    stroke
                ));
                for (n, line) in lines.iter().enumerate() {
                    body.push_str(&format!(
                        "<tspan x=\"{}\" y=\"{}\">{}</tspan>",
                        x,
                        y + n as f32 * line_height,
                        escape_attr(line)
                    ));
                }
                body.push_str("</text>\n");
            }
        }
    }

    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n<defs>\n{defs}</defs>\n<clipPath id=\"viewport\"><rect width=\"{w}\" height=\"{h}\"/></clipPath>\n<g clip-path=\"url(#viewport)\">\n{body}</g>\n</svg>\n",
        w = viewport.width,
        h = viewport.height,
        defs = defs,
        body = body
    )
}

#[cfg(feature = "raster")]
mod png {
    use std::sync::Arc;

    use resvg::tiny_skia::{Pixmap, Transform};
    use resvg::usvg::{self, fontdb};

    use crate::rendering::Screenshot;
    use crate::{Error, Result, Viewport};

    /// System fonts plus any extra font files (raw TTF/OTF bytes).
    pub fn font_database(extra: &[Vec<u8>]) -> fontdb::Database {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        for data in extra {
            db.load_font_data(data.clone());
        }
        log::debug!("font database holds {} faces", db.len());
        db
    }

    /// Rasterize `svg` at `viewport × pixel_ratio` device pixels.
    pub fn rasterize(
        svg: &str,
        viewport: Viewport,
        pixel_ratio: f32,
        fonts: Arc<fontdb::Database>,
    ) -> Result<Screenshot> {
        if !(pixel_ratio.is_finite() && pixel_ratio > 0.0) {
            return Err(Error::RenderError(format!("invalid pixel ratio {}", pixel_ratio)));
        }
        let width = (viewport.width as f32 * pixel_ratio).round() as u32;
        let height = (viewport.height as f32 * pixel_ratio).round() as u32;

        let opt = usvg::Options { fontdb: fonts, ..usvg::Options::default() };
        let tree = usvg::Tree::from_str(svg, &opt)
            .map_err(|e| Error::RenderError(format!("scene parse failed: {}", e)))?;

        let mut pixmap = Pixmap::new(width, height)
            .ok_or_else(|| Error::RenderError(format!("cannot allocate {}x{} surface", width, height)))?;
        resvg::render(&tree, Transform::from_scale(pixel_ratio, pixel_ratio), &mut pixmap.as_mut());

        let png_data = pixmap
            .encode_png()
            .map_err(|e| Error::RenderError(format!("png encoding failed: {}", e)))?;
        log::debug!("rasterized {}x{} ({} bytes)", width, height, png_data.len());
        Ok(Screenshot { width, height, png_data })
    }
}

#[cfg(feature = "raster")]
pub use png::{font_database, rasterize};
