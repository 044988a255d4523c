/// Small layout engine for the composition tree.
///
/// Supports exactly what the poster templates use: absolutely positioned
/// layers, column/row flex flow (gap, padding, `flex: 1`, `justify-content`,
/// `align-items: center`) and text wrapped at an estimated glyph advance.

use super::style::{parse_edges, parse_px, StyledNode, StyledTree};
use crate::Viewport;

/// Estimated advance of one character, as a fraction of the font size
pub const CHAR_ADVANCE: f32 = 0.55;
pub const DEFAULT_LINE_HEIGHT: f32 = 1.3;
const DEFAULT_FONT_SIZE: f32 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// Padding in CSS order: top, right, bottom, left
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoxModel {
    pub padding: [f32; 4],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutBox {
    pub rect: Rect,
    pub box_model: BoxModel,
}

impl LayoutBox {
    pub fn content_rect(&self) -> Rect {
        let [t, r, b, l] = self.box_model.padding;
        Rect {
            x: self.rect.x + l,
            y: self.rect.y + t,
            width: (self.rect.width - l - r).max(0.0),
            height: (self.rect.height - t - b).max(0.0),
        }
    }
}

/// A laid out element: its box and, for text elements, the wrapped lines.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    /// Index into [`StyledTree::nodes`]
    pub id: usize,
    pub lb: LayoutBox,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Row,
    Column,
}

struct Laid {
    height: f32,
    nodes: Vec<LayoutNode>,
}

impl Laid {
    fn translate(&mut self, dx: f32, dy: f32) {
        for n in &mut self.nodes {
            n.lb.rect.x += dx;
            n.lb.rect.y += dy;
        }
    }
}

/// Lay out the whole composition inside `viewport`. The result is in
/// document order, so painting it front to back respects stacking.
pub fn layout_composition(styled: &StyledTree, viewport: Viewport) -> Vec<LayoutNode> {
    if styled.nodes.is_empty() {
        return Vec::new();
    }
    let engine = Engine { tree: styled };
    engine
        .layout(0, viewport.width as f32, Some(viewport.height as f32))
        .nodes
}

/// Greedy word wrap. Explicit newlines always break; a word longer than
/// the line stays on its own line.
pub fn wrap_text(text: &str, max_width: f32, font_size: f32, letter_spacing: f32) -> Vec<String> {
    let advance = font_size * CHAR_ADVANCE + letter_spacing;
    let chars_per_line = if advance > 0.0 && max_width >= advance {
        // tolerance so a box sized by `text_width` fits its own text
        ((max_width + 0.01) / advance) as usize
    } else {
        1
    };

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut cur = String::new();
        for word in paragraph.split_whitespace() {
            let cur_len = cur.chars().count();
            let word_len = word.chars().count();
            if cur_len + word_len + 1 > chars_per_line && !cur.is_empty() {
                lines.push(std::mem::take(&mut cur));
                cur.push_str(word);
            } else {
                if !cur.is_empty() {
                    cur.push(' ');
                }
                cur.push_str(word);
            }
        }
        if !cur.is_empty() {
            lines.push(cur);
        }
    }
    lines
}

pub fn text_width(text: &str, font_size: f32, letter_spacing: f32) -> f32 {
    text.chars().count() as f32 * (font_size * CHAR_ADVANCE + letter_spacing)
}

struct Engine<'t, 'a> {
    tree: &'t StyledTree<'a>,
}

impl Engine<'_, '_> {
    fn node(&self, id: usize) -> &StyledNode<'_> {
        &self.tree.nodes[id]
    }

    fn px(&self, id: usize, prop: &str) -> Option<f32> {
        self.node(id).get(prop).and_then(parse_px)
    }

    fn font_size(&self, id: usize) -> f32 {
        self.px(id, "font-size").unwrap_or(DEFAULT_FONT_SIZE)
    }

    fn line_height(&self, id: usize) -> f32 {
        match self.node(id).get("line-height") {
            Some(v) if v.trim().ends_with("px") => {
                parse_px(v).map(|px| px / self.font_size(id)).unwrap_or(DEFAULT_LINE_HEIGHT)
            }
            Some(v) => v.trim().parse().unwrap_or(DEFAULT_LINE_HEIGHT),
            None => DEFAULT_LINE_HEIGHT,
        }
    }

    fn letter_spacing(&self, id: usize) -> f32 {
        self.px(id, "letter-spacing").unwrap_or(0.0)
    }

    fn padding(&self, id: usize) -> [f32; 4] {
        let mut p = self
            .node(id)
            .get("padding")
            .and_then(parse_edges)
            .unwrap_or([0.0; 4]);
        for (i, side) in ["padding-top", "padding-right", "padding-bottom", "padding-left"]
            .into_iter()
            .enumerate()
        {
            if let Some(v) = self.px(id, side) {
                p[i] = v;
            }
        }
        p
    }

    fn is_absolute(&self, id: usize) -> bool {
        self.node(id).get("position") == Some("absolute")
    }

    fn axis(&self, id: usize) -> Axis {
        let n = self.node(id);
        if n.get("display") == Some("flex") && n.get("flex-direction").unwrap_or("row") == "row" {
            Axis::Row
        } else {
            Axis::Column
        }
    }

    fn gap(&self, id: usize) -> f32 {
        self.px(id, "gap").unwrap_or(0.0)
    }

    fn grows(&self, id: usize) -> bool {
        self.node(id)
            .get("flex")
            .and_then(|v| v.split_whitespace().next())
            .and_then(|v| v.parse::<f32>().ok())
            .is_some_and(|g| g > 0.0)
    }

    fn rtl(&self, id: usize) -> bool {
        self.node(id).get("direction") == Some("rtl")
    }

    /// Inline-level elements size to their content instead of stretching.
    fn shrink_wraps(&self, id: usize) -> bool {
        matches!(self.node(id).element.tag, "span" | "img") || self.px(id, "width").is_some()
    }

    fn text_of(&self, id: usize) -> String {
        self.node(id).own_text()
    }

    fn flow_children(&self, id: usize) -> Vec<usize> {
        self.node(id)
            .children
            .iter()
            .copied()
            .filter(|c| !self.is_absolute(*c))
            .collect()
    }

    fn intrinsic_width(&self, id: usize, max: f32) -> f32 {
        if let Some(w) = self.px(id, "width") {
            return w;
        }
        let [_, r, _, l] = self.padding(id);
        let avail = (max - l - r).max(0.0);

        let text = self.text_of(id);
        let text_w = if text.trim().is_empty() {
            0.0
        } else {
            text_width(text.trim(), self.font_size(id), self.letter_spacing(id)).min(avail)
        };

        let kids = self.flow_children(id);
        let kids_w = match self.axis(id) {
            Axis::Row => {
                let sum: f32 = kids.iter().map(|c| self.intrinsic_width(*c, avail)).sum();
                sum + self.gap(id) * kids.len().saturating_sub(1) as f32
            }
            Axis::Column => kids
                .iter()
                .map(|c| self.intrinsic_width(*c, avail))
                .fold(0.0, f32::max),
        };

        (text_w.max(kids_w) + l + r).min(max.max(0.0))
    }

    fn layout(&self, id: usize, width: f32, forced_height: Option<f32>) -> Laid {
        let pad = self.padding(id);
        let content_w = (width - pad[1] - pad[3]).max(0.0);
        let inner_avail = forced_height.map(|h| (h - pad[0] - pad[2]).max(0.0));

        let text = self.text_of(id);
        let lines = if text.trim().is_empty() {
            Vec::new()
        } else {
            wrap_text(&text, content_w, self.font_size(id), self.letter_spacing(id))
        };
        let text_h = lines.len() as f32 * self.font_size(id) * self.line_height(id);

        let flow = self.flow_children(id);
        let mut placed: Vec<(usize, Laid)> = Vec::new();
        let flow_h = match self.axis(id) {
            Axis::Column => self.layout_column(id, &flow, content_w, inner_avail.map(|h| h - text_h), pad, text_h, &mut placed),
            Axis::Row => self.layout_row(id, &flow, content_w, pad, text_h, &mut placed),
        };

        let height = forced_height.unwrap_or(pad[0] + text_h + flow_h + pad[2]);

        for c in self.node(id).children.iter().copied().filter(|c| self.is_absolute(*c)) {
            placed.push((c, self.layout_absolute(c, width, height)));
        }

        // emit in document order
        let order = &self.node(id).children;
        placed.sort_by_key(|(c, _)| order.iter().position(|o| o == c).unwrap_or(usize::MAX));

        let mut nodes = vec![LayoutNode {
            id,
            lb: LayoutBox {
                rect: Rect { x: 0.0, y: 0.0, width, height },
                box_model: BoxModel { padding: pad },
            },
            lines,
        }];
        for (_, laid) in placed {
            nodes.extend(laid.nodes);
        }
        Laid { height, nodes }
    }

    #[allow(clippy::too_many_arguments)]
    fn layout_column(
        &self,
        id: usize,
        flow: &[usize],
        content_w: f32,
        avail_h: Option<f32>,
        pad: [f32; 4],
        text_h: f32,
        placed: &mut Vec<(usize, Laid)>,
    ) -> f32 {
        let gap = self.gap(id);
        let child_width = |c: usize| {
            if self.shrink_wraps(c) {
                self.intrinsic_width(c, content_w)
            } else {
                content_w
            }
        };

        let mut laid: Vec<(usize, f32, Laid)> = flow
            .iter()
            .map(|&c| {
                let w = child_width(c);
                (c, w, self.layout(c, w, self.px(c, "height")))
            })
            .collect();

        let gaps = gap * flow.len().saturating_sub(1) as f32;
        let growers = flow.iter().filter(|c| self.grows(**c)).count();
        if let (Some(avail), true) = (avail_h, growers > 0) {
            let fixed: f32 = laid.iter().filter(|(c, _, _)| !self.grows(*c)).map(|(_, _, l)| l.height).sum();
            let share = ((avail - fixed - gaps) / growers as f32).max(0.0);
            for entry in laid.iter_mut().filter(|(c, _, _)| self.grows(*c)) {
                entry.2 = self.layout(entry.0, entry.1, Some(share));
            }
        }

        let total: f32 = laid.iter().map(|(_, _, l)| l.height).sum::<f32>() + gaps;
        let offset = match (avail_h, self.node(id).get("justify-content")) {
            (Some(avail), Some("flex-end")) => avail - total,
            (Some(avail), Some("center")) => (avail - total) / 2.0,
            _ => 0.0,
        };

        let rtl = self.rtl(id);
        let mut y = pad[0] + text_h + offset;
        for (c, w, mut l) in laid {
            let x = if rtl { pad[3] + content_w - w } else { pad[3] };
            l.translate(x, y);
            y += l.height + gap;
            placed.push((c, l));
        }
        total
    }

    fn layout_row(
        &self,
        id: usize,
        flow: &[usize],
        content_w: f32,
        pad: [f32; 4],
        text_h: f32,
        placed: &mut Vec<(usize, Laid)>,
    ) -> f32 {
        if flow.is_empty() {
            return 0.0;
        }
        let gap = self.gap(id);
        let gaps = gap * (flow.len() - 1) as f32;

        let mut widths: Vec<f32> = flow
            .iter()
            .map(|&c| if self.grows(c) { 0.0 } else { self.intrinsic_width(c, content_w) })
            .collect();
        let used: f32 = widths.iter().sum::<f32>() + gaps;
        let free = (content_w - used).max(0.0);
        let growers = flow.iter().filter(|c| self.grows(**c)).count();
        if growers > 0 {
            for (w, c) in widths.iter_mut().zip(flow) {
                if self.grows(*c) {
                    *w = free / growers as f32;
                }
            }
        }

        let laid: Vec<Laid> = flow
            .iter()
            .zip(&widths)
            .map(|(&c, &w)| self.layout(c, w, self.px(c, "height")))
            .collect();
        let row_h = laid.iter().map(|l| l.height).fold(0.0, f32::max);

        let remaining = if growers > 0 { 0.0 } else { free };
        let (mut cursor, spacing) = match self.node(id).get("justify-content") {
            Some("space-between") if flow.len() > 1 => (0.0, gap + remaining / (flow.len() - 1) as f32),
            Some("center") => (remaining / 2.0, gap),
            Some("flex-end") => (remaining, gap),
            _ => (0.0, gap),
        };

        let rtl = self.rtl(id);
        let centered = self.node(id).get("align-items") == Some("center");
        for ((&c, &w), mut l) in flow.iter().zip(&widths).zip(laid) {
            let x = if rtl { pad[3] + content_w - cursor - w } else { pad[3] + cursor };
            let y = pad[0] + text_h + if centered { (row_h - l.height) / 2.0 } else { 0.0 };
            l.translate(x, y);
            cursor += w + spacing;
            placed.push((c, l));
        }
        row_h
    }

    fn layout_absolute(&self, id: usize, cb_width: f32, cb_height: f32) -> Laid {
        let inset = self.node(id).get("inset").and_then(parse_edges);
        let edge = |i: usize, prop: &str| self.px(id, prop).or(inset.map(|e| e[i]));
        let (top, right, bottom, left) = (edge(0, "top"), edge(1, "right"), edge(2, "bottom"), edge(3, "left"));

        let width = self
            .px(id, "width")
            .or(match (left, right) {
                (Some(l), Some(r)) => Some((cb_width - l - r).max(0.0)),
                _ => None,
            })
            .unwrap_or_else(|| self.intrinsic_width(id, cb_width));
        let forced_h = self.px(id, "height").or(match (top, bottom) {
            (Some(t), Some(b)) => Some((cb_height - t - b).max(0.0)),
            _ => None,
        });

        let mut laid = self.layout(id, width, forced_h);
        let x = left.unwrap_or_else(|| right.map(|r| cb_width - r - width).unwrap_or(0.0));
        let y = top.unwrap_or_else(|| bottom.map(|b| cb_height - b - laid.height).unwrap_or(0.0));
        laid.translate(x, y);
        laid
    }
}
