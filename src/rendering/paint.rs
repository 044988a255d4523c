/// Paint commands built from the laid out composition.

use super::layout::{LayoutNode, Rect};
use super::style::{parse_color, parse_px, Rgba, StyledNode, StyledTree};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradientStop {
    /// 0.0 ..= 1.0
    pub offset: f32,
    pub color: Rgba,
}

/// `brightness`/`contrast` as fractions (1.0 = unchanged)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageFilter {
    pub brightness: f32,
    pub contrast: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    SolidRect {
        rect: Rect,
        color: Rgba,
        radius: f32,
    },
    /// Vertical gradient drawn from the bottom edge upward
    GradientRect {
        rect: Rect,
        stops: Vec<GradientStop>,
    },
    Image {
        rect: Rect,
        href: String,
        /// `preserveAspectRatio` keyword pair, `slice` for cover
        cover: bool,
        filter: Option<ImageFilter>,
        radius: f32,
    },
    Text {
        x: f32,
        /// Baseline of the first line
        y: f32,
        lines: Vec<String>,
        line_height: f32,
        font_size: f32,
        font_family: String,
        font_weight: String,
        color: Rgba,
        anchor: TextAnchor,
        letter_spacing: f32,
        stroke: Option<(f32, Rgba)>,
    },
}

/// Parse `linear-gradient(to top, <color> <pct>, ...)`. Other directions
/// and unparsable stops yield `None`.
pub fn parse_vertical_gradient(value: &str) -> Option<Vec<GradientStop>> {
    let inner = value.trim().strip_prefix("linear-gradient(")?.strip_suffix(')')?;
    let args = split_top_level(inner);
    let (first, rest) = args.split_first()?;
    if first.trim() != "to top" {
        return None;
    }
    rest.iter()
        .map(|stop| {
            let stop = stop.trim();
            let (color, offset) = match stop.rfind(' ') {
                Some(i) if stop[i + 1..].ends_with('%') => (&stop[..i], &stop[i + 1..]),
                _ => (stop, ""),
            };
            let offset = offset.strip_suffix('%').and_then(|o| o.parse::<f32>().ok()).unwrap_or(0.0);
            Some(GradientStop { offset: offset / 100.0, color: parse_color(color)? })
        })
        .collect()
}

fn split_top_level(s: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                out.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(&s[start..]);
    out
}

/// Parse `brightness(N%) contrast(N%)`.
pub fn parse_filter(value: &str) -> Option<ImageFilter> {
    let mut filter = ImageFilter { brightness: 1.0, contrast: 1.0 };
    let mut any = false;
    for func in value.split(')').map(str::trim).filter(|f| !f.is_empty()) {
        let (name, arg) = func.split_once('(')?;
        let arg = arg.trim();
        let amount = match arg.strip_suffix('%') {
            Some(pct) => pct.trim().parse::<f32>().ok()? / 100.0,
            None => arg.parse::<f32>().ok()?,
        };
        match name.trim() {
            "brightness" => filter.brightness = amount,
            "contrast" => filter.contrast = amount,
            _ => continue,
        }
        any = true;
    }
    any.then_some(filter)
}

fn parse_stroke(value: &str) -> Option<(f32, Rgba)> {
    let (width, color) = value.trim().split_once(' ')?;
    Some((parse_px(width)?, parse_color(color)?))
}

fn background_commands(node: &StyledNode, rect: Rect, out: &mut Vec<PaintCommand>) {
    let radius = node.get("border-radius").and_then(parse_px).unwrap_or(0.0);
    if let Some(bg) = node.get("background") {
        if let Some(stops) = parse_vertical_gradient(bg) {
            out.push(PaintCommand::GradientRect { rect, stops });
            return;
        }
        if let Some(color) = parse_color(bg) {
            out.push(PaintCommand::SolidRect { rect, color, radius });
            return;
        }
    }
    if let Some(color) = node.get("background-color").and_then(parse_color) {
        if color.a > 0.0 {
            out.push(PaintCommand::SolidRect { rect, color, radius });
        }
    }
}

fn text_command(node: &StyledNode, ln: &LayoutNode) -> Option<PaintCommand> {
    if ln.lines.is_empty() {
        return None;
    }
    let color = node.get("color").and_then(parse_color).unwrap_or(Rgba { r: 0, g: 0, b: 0, a: 1.0 });
    let font_size = node.get("font-size").and_then(parse_px).unwrap_or(16.0);
    let line_height = node
        .get("line-height")
        .and_then(|v| v.trim().parse::<f32>().ok())
        .unwrap_or(super::layout::DEFAULT_LINE_HEIGHT)
        * font_size;

    let content = ln.lb.content_rect();
    let rtl = node.get("direction") == Some("rtl");
    let (anchor, x) = match node.get("text-align") {
        Some("center") => (TextAnchor::Middle, content.x + content.width / 2.0),
        Some("left") => (TextAnchor::Start, content.x),
        Some("right") => (TextAnchor::End, content.right()),
        _ if rtl => (TextAnchor::End, content.right()),
        _ => (TextAnchor::Start, content.x),
    };
    // centre the glyph box inside the line box
    let y = content.y + (line_height - font_size) / 2.0 + font_size * 0.8;

    Some(PaintCommand::Text {
        x,
        y,
        lines: ln.lines.clone(),
        line_height,
        font_size,
        font_family: node.get("font-family").unwrap_or("sans-serif").to_string(),
        font_weight: node.get("font-weight").unwrap_or("400").to_string(),
        color,
        anchor,
        letter_spacing: node.get("letter-spacing").and_then(parse_px).unwrap_or(0.0),
        stroke: node.get("-webkit-text-stroke").and_then(parse_stroke),
    })
}

/// Turn laid out nodes into an ordered display list.
pub fn build_display_list(styled: &StyledTree, layout: &[LayoutNode]) -> Vec<PaintCommand> {
    let mut out = Vec::new();
    for ln in layout {
        let node = &styled.nodes[ln.id];
        if node.get("display") == Some("none") {
            continue;
        }
        let rect = ln.lb.rect;
        background_commands(node, rect, &mut out);

        if node.element.tag == "img" {
            if let Some(src) = node.element.get_attr("src") {
                out.push(PaintCommand::Image {
                    rect,
                    href: src.to_string(),
                    cover: node.get("object-fit") != Some("contain"),
                    filter: node.get("filter").and_then(parse_filter),
                    radius: node.get("border-radius").and_then(parse_px).unwrap_or(0.0),
                });
            }
            continue;
        }

        if let Some(text) = text_command(node, ln) {
            out.push(text);
        }
    }
    out
}
