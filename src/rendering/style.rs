//! Style resolution for the composition tree.
//!
//! Three layers are applied in order, later layers winning: the base
//! stylesheet that gives the chrome its fixed look, the inline styles the
//! renderer computed from the design state, and finally the user's custom
//! CSS. Within a stylesheet layer rules apply in specificity order.

use std::collections::{BTreeMap, BTreeSet};

use simplecss::{AttributeOperator, PseudoClass, StyleSheet};

use super::tree::{Element, Node, VisualTree};

/// Fixed chrome of the poster. Theme-dependent colors are inline styles.
pub const BASE_CSS: &str = r#"
.poster-root { position: relative; overflow: hidden; background-color: #0f172a; color: #ffffff; direction: rtl; font-size: 16px; line-height: 1.3; }
.poster-image { position: absolute; inset: 0; object-fit: cover; }
.overlay-layout { position: absolute; inset: 0; display: flex; flex-direction: column; justify-content: flex-end; padding: 32px; }
.overlay-content { display: flex; flex-direction: column; gap: 16px; }
.category-row { display: flex; flex-direction: row; align-items: center; gap: 12px; }
.poster-category { color: #ffffff; font-size: 14px; font-weight: 700; padding: 4px 12px; border-radius: 4px; }
.category-line { width: 48px; height: 2px; }
.poster-headline { color: #ffffff; font-weight: 700; line-height: 1.3; }
.poster-footer { display: flex; flex-direction: row; justify-content: space-between; align-items: center; padding-top: 12px; }
.poster-source { color: #cbd5e1; font-size: 14px; font-weight: 500; }
.footer-tag { color: #94a3b8; font-size: 12px; }
.split-layout { position: absolute; inset: 0; display: flex; flex-direction: column; }
.split-spacer { flex: 1; }
.split-content { position: relative; display: flex; flex-direction: column; gap: 12px; padding: 28px; background-color: #ffffff; }
.split-accent-line { position: absolute; top: 0; left: 0; right: 0; height: 6px; }
.split-category { color: #ffffff; font-size: 13px; font-weight: 700; padding: 4px 10px; border-radius: 4px; }
.split-content .poster-headline { color: #0f172a; }
.split-footer { display: flex; flex-direction: row; align-items: center; gap: 12px; }
.split-logo-circle { position: relative; width: 44px; height: 44px; border-radius: 22px; background-color: #f1f5f9; }
.split-logo-image { position: absolute; inset: 0; border-radius: 22px; object-fit: cover; }
.split-logo-placeholder { position: absolute; inset: 0; color: #0f172a; font-size: 14px; font-weight: 700; text-align: center; padding-top: 12px; }
.split-source-name { color: #0f172a; font-size: 15px; font-weight: 700; }
.split-source-desc { color: #64748b; font-size: 11px; }
.minimal-layout { position: absolute; inset: 0; }
.minimal-overlay { position: absolute; inset: 0; }
.minimal-content { position: absolute; inset: 0; display: flex; flex-direction: column; justify-content: center; gap: 20px; padding: 48px; }
.minimal-accent { width: 64px; height: 6px; }
.arabic-stroke { -webkit-text-stroke: 1px #000000; }
.minimal-meta-badge { display: flex; flex-direction: row; }
.minimal-badge-content { color: #ffffff; background-color: rgba(255,255,255,0.15); font-size: 13px; padding: 6px 16px; border-radius: 999px; }
.minimal-branding { position: absolute; left: 0; right: 0; bottom: 0; height: 36px; background-color: #000000; }
.minimal-branding-text { color: #ffffff; font-size: 11px; letter-spacing: 4px; text-align: center; padding-top: 11px; }
.logo-badge-container { position: absolute; top: 24px; left: 24px; }
.logo-badge { display: flex; flex-direction: row; align-items: center; gap: 8px; padding: 6px; border-radius: 8px; background-color: rgba(255,255,255,0.92); }
.logo-badge-image { width: 96px; height: 40px; object-fit: contain; }
.logo-badge-icon { width: 32px; height: 32px; border-radius: 6px; color: #ffffff; font-size: 13px; font-weight: 700; text-align: center; padding-top: 7px; }
.logo-badge-text-stack { display: flex; flex-direction: column; }
.logo-badge-main-text { color: #0f172a; font-size: 12px; font-weight: 700; }
.logo-badge-sub-text { color: #64748b; font-size: 9px; }
"#;

const INHERITED: [&str; 9] = [
    "color",
    "direction",
    "font-family",
    "font-size",
    "font-weight",
    "letter-spacing",
    "line-height",
    "text-align",
    "-webkit-text-stroke",
];

pub type ComputedStyle = BTreeMap<String, String>;

/// One element of the flattened tree.
#[derive(Debug, Clone)]
pub struct StyledNode<'a> {
    pub element: &'a Element,
    pub parent: Option<usize>,
    pub prev_sibling: Option<usize>,
    pub children: Vec<usize>,
    pub style: ComputedStyle,
}

impl StyledNode<'_> {
    pub fn get(&self, property: &str) -> Option<&str> {
        self.style.get(property).map(String::as_str)
    }

    /// Direct text children joined together
    pub fn own_text(&self) -> String {
        self.element
            .children
            .iter()
            .filter_map(|n| match n {
                Node::Text(t) => Some(t.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }
}

/// The composition with computed styles, in pre-order. Index 0 is the root.
#[derive(Debug, Clone)]
pub struct StyledTree<'a> {
    pub nodes: Vec<StyledNode<'a>>,
}

#[derive(Clone, Copy)]
struct NodeRef<'a, 'b> {
    nodes: &'b [StyledNode<'a>],
    id: usize,
}

impl simplecss::Element for NodeRef<'_, '_> {
    fn parent_element(&self) -> Option<Self> {
        self.nodes[self.id].parent.map(|id| NodeRef { nodes: self.nodes, id })
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        self.nodes[self.id].prev_sibling.map(|id| NodeRef { nodes: self.nodes, id })
    }

    fn has_local_name(&self, name: &str) -> bool {
        self.nodes[self.id].element.tag == name
    }

    fn attribute_matches(&self, local_name: &str, operator: AttributeOperator) -> bool {
        let el = self.nodes[self.id].element;
        if local_name == "class" {
            if el.classes.is_empty() {
                return false;
            }
            return operator.matches(&el.classes.join(" "));
        }
        el.get_attr(local_name).is_some_and(|v| operator.matches(v))
    }

    fn pseudo_class_matches(&self, class: PseudoClass) -> bool {
        match class {
            PseudoClass::FirstChild => self.nodes[self.id].prev_sibling.is_none(),
            _ => false,
        }
    }
}

fn sorted_sheet(text: &str) -> StyleSheet<'_> {
    let mut sheet = StyleSheet::parse(text);
    sheet.rules.sort_by_key(|r| r.selector.specificity());
    sheet
}

/// Custom CSS carried by the tree's `<style>` children, in document order.
pub fn custom_css_text(tree: &VisualTree) -> String {
    tree.root
        .descendants()
        .into_iter()
        .filter(|e| e.tag == "style")
        .map(|e| e.text_content_raw())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Resolve every element's computed style.
pub fn resolve(tree: &VisualTree) -> StyledTree<'_> {
    let mut nodes = Vec::new();
    flatten(&tree.root, None, &mut nodes);

    let base = sorted_sheet(BASE_CSS);
    let custom_text = custom_css_text(tree);
    let custom = sorted_sheet(&custom_text);

    for id in 0..nodes.len() {
        let mut style = ComputedStyle::new();
        if let Some(parent) = nodes[id].parent {
            for prop in INHERITED {
                if let Some(v) = nodes[parent].style.get(prop) {
                    style.insert(prop.to_string(), v.clone());
                }
            }
        }

        let node_ref = NodeRef { nodes: &nodes, id };
        apply_sheet(&base, &node_ref, &mut style);
        for (p, v) in &nodes[id].element.style.0 {
            style.insert(p.clone(), v.clone());
        }
        apply_sheet(&custom, &node_ref, &mut style);

        nodes[id].style = style;
    }

    StyledTree { nodes }
}

/// Properties the custom CSS declares on each element, indexed like
/// [`StyledTree::nodes`].
pub fn custom_overrides(tree: &VisualTree) -> Vec<BTreeSet<String>> {
    let mut nodes = Vec::new();
    flatten(&tree.root, None, &mut nodes);
    let custom_text = custom_css_text(tree);
    let custom = StyleSheet::parse(&custom_text);

    (0..nodes.len())
        .map(|id| {
            let node_ref = NodeRef { nodes: &nodes, id };
            custom
                .rules
                .iter()
                .filter(|r| r.selector.matches(&node_ref))
                .flat_map(|r| r.declarations.iter().map(|d| d.name.to_string()))
                .collect()
        })
        .collect()
}

fn apply_sheet(sheet: &StyleSheet, node: &NodeRef, style: &mut ComputedStyle) {
    for rule in &sheet.rules {
        if rule.selector.matches(node) {
            for decl in &rule.declarations {
                style.insert(decl.name.to_string(), decl.value.trim().to_string());
            }
        }
    }
}

fn flatten<'a>(el: &'a Element, parent: Option<usize>, out: &mut Vec<StyledNode<'a>>) -> usize {
    let id = out.len();
    out.push(StyledNode {
        element: el,
        parent,
        prev_sibling: None,
        children: Vec::new(),
        style: ComputedStyle::new(),
    });
    let mut prev = None;
    for child in el.child_elements() {
        if child.tag == "style" {
            continue;
        }
        let child_id = flatten(child, Some(id), out);
        out[child_id].prev_sibling = prev;
        out[id].children.push(child_id);
        prev = Some(child_id);
    }
    id
}

impl<'a> StyledTree<'a> {
    /// First node (pre-order) carrying `class`
    pub fn find_class(&self, class: &str) -> Option<&StyledNode<'a>> {
        self.nodes.iter().find(|n| n.element.has_class(class))
    }
}

/// An RGBA color. Alpha is kept as parsed; painting clamps it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba { r: 0, g: 0, b: 0, a: 0.0 };

    pub fn clamped_alpha(&self) -> f64 {
        self.a.clamp(0.0, 1.0)
    }

    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Parse the subset of CSS colors the composition uses.
pub fn parse_color(value: &str) -> Option<Rgba> {
    let v = value.trim().to_ascii_lowercase();
    if let Some(hex) = v.strip_prefix('#') {
        if !hex.is_ascii() {
            return None;
        }
        let expand = |s: &str| -> Option<u8> { u8::from_str_radix(s, 16).ok() };
        return match hex.len() {
            3 => {
                let mut chans = hex.chars().map(|c| expand(&format!("{}{}", c, c)));
                Some(Rgba { r: chans.next()??, g: chans.next()??, b: chans.next()??, a: 1.0 })
            }
            6 => Some(Rgba {
                r: expand(&hex[0..2])?,
                g: expand(&hex[2..4])?,
                b: expand(&hex[4..6])?,
                a: 1.0,
            }),
            _ => None,
        };
    }
    if let Some(args) = v
        .strip_prefix("rgba(")
        .or_else(|| v.strip_prefix("rgb("))
        .and_then(|s| s.strip_suffix(')'))
    {
        let parts: Vec<&str> = args.split(',').map(str::trim).collect();
        if parts.len() < 3 {
            return None;
        }
        let chan = |s: &str| s.parse::<f64>().ok().map(|f| f.clamp(0.0, 255.0) as u8);
        let a = match parts.get(3) {
            Some(a) => a.parse::<f64>().ok()?,
            None => 1.0,
        };
        return Some(Rgba { r: chan(parts[0])?, g: chan(parts[1])?, b: chan(parts[2])?, a });
    }
    let named = match v.as_str() {
        "transparent" => Rgba::TRANSPARENT,
        "white" => Rgba { r: 255, g: 255, b: 255, a: 1.0 },
        "black" => Rgba { r: 0, g: 0, b: 0, a: 1.0 },
        "red" => Rgba { r: 255, g: 0, b: 0, a: 1.0 },
        "green" => Rgba { r: 0, g: 128, b: 0, a: 1.0 },
        "blue" => Rgba { r: 0, g: 0, b: 255, a: 1.0 },
        "yellow" => Rgba { r: 255, g: 255, b: 0, a: 1.0 },
        "orange" => Rgba { r: 255, g: 165, b: 0, a: 1.0 },
        "gold" => Rgba { r: 255, g: 215, b: 0, a: 1.0 },
        "gray" | "grey" => Rgba { r: 128, g: 128, b: 128, a: 1.0 },
        _ => return None,
    };
    Some(named)
}

/// `12px` / `12` → 12.0. Percentages and keywords yield `None`.
pub fn parse_px(value: &str) -> Option<f32> {
    let v = value.trim();
    let num = v.strip_suffix("px").unwrap_or(v).trim();
    num.parse::<f32>().ok()
}

/// CSS box shorthand (`padding`, `inset`) → (top, right, bottom, left)
pub fn parse_edges(value: &str) -> Option<[f32; 4]> {
    let vals: Vec<f32> = value.split_whitespace().map(parse_px).collect::<Option<_>>()?;
    match vals.as_slice() {
        [a] => Some([*a, *a, *a, *a]),
        [v, h] => Some([*v, *h, *v, *h]),
        [t, h, b] => Some([*t, *h, *b, *h]),
        [t, r, b, l] => Some([*t, *r, *b, *l]),
        _ => None,
    }
}
