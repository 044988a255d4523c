//! HTML serialization of the composition (the live preview document).

use std::collections::BTreeSet;

use super::style::{custom_overrides, BASE_CSS};
use super::tree::{Element, Node, VisualTree};

/// How user-supplied CSS is injected into the preview document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CssPolicy {
    /// Inject the text exactly as typed.
    Verbatim,
    /// Prefix every selector with `.poster-root`, drop at-rules and
    /// neutralise `</style` so the text cannot leave its element.
    #[default]
    Scoped,
}

impl std::str::FromStr for CssPolicy {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "verbatim" => Ok(CssPolicy::Verbatim),
            "scoped" => Ok(CssPolicy::Scoped),
            other => Err(crate::Error::ConfigError(format!("unknown css policy '{}'", other))),
        }
    }
}

/// Options for [`to_document`].
#[derive(Debug, Clone, Default)]
pub struct HtmlOptions<'a> {
    pub css_policy: CssPolicy,
    /// Raw font stylesheet text placed in the head
    pub font_css: Option<&'a str>,
    /// Poster width/height in CSS px
    pub size: Option<(u32, u32)>,
}

pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}

/// Serialize one element. `<style>` contents are written verbatim.
pub fn element_to_html(el: &Element) -> String {
    let mut writer = Writer { policy: CssPolicy::Verbatim, overrides: &[], next: 0, out: String::new() };
    writer.element(el);
    writer.out
}

/// Pre-order serializer. `next` tracks the styled-node index so each
/// element can look up the properties custom CSS takes over.
struct Writer<'a> {
    policy: CssPolicy,
    overrides: &'a [BTreeSet<String>],
    next: usize,
    out: String,
}

impl Writer<'_> {
    fn element(&mut self, el: &Element) {
        let taken = if el.tag == "style" {
            None
        } else {
            let overrides = self.overrides;
            self.next += 1;
            overrides.get(self.next - 1)
        };

        self.out.push('<');
        self.out.push_str(el.tag);
        if !el.classes.is_empty() {
            self.out.push_str(&format!(" class=\"{}\"", escape_attr(&el.classes.join(" "))));
        }
        for (name, value) in &el.attrs {
            self.out.push_str(&format!(" {}=\"{}\"", name, escape_attr(value)));
        }
        // an inline declaration would beat the custom rule in a browser
        let inline = el
            .style
            .0
            .iter()
            .filter(|(p, _)| taken.map_or(true, |t| !t.contains(p)))
            .map(|(p, v)| format!("{}: {}", p, v))
            .collect::<Vec<_>>();
        if !inline.is_empty() {
            self.out.push_str(&format!(" style=\"{}\"", escape_attr(&inline.join("; "))));
        }
        self.out.push('>');
        if el.tag == "img" {
            return;
        }
        if el.tag == "style" {
            let raw = el.text_content_raw();
            match self.policy {
                CssPolicy::Verbatim => self.out.push_str(&raw),
                CssPolicy::Scoped => self.out.push_str(&scope_css(&raw, ".poster-root")),
            }
        } else {
            for child in &el.children {
                match child {
                    Node::Text(t) => self.out.push_str(&escape_text(t)),
                    Node::Element(e) => self.element(e),
                }
            }
        }
        self.out.push_str("</");
        self.out.push_str(el.tag);
        self.out.push('>');
    }
}

/// Rewrite `css` so every rule only reaches elements inside `scope`.
///
/// Selectors that already start with the scope are left alone (they target
/// the root itself). At-rules are removed together with their blocks.
pub fn scope_css(css: &str, scope: &str) -> String {
    let css = css.replace("</", "<\\/");
    let mut out = String::new();
    let mut rest = css.as_str();

    while let Some(open) = rest.find('{') {
        // statement at-rules (`@import ...;`) end at a semicolon
        let prelude = rest[..open].rsplit(';').next().unwrap_or("").trim();
        let Some(close) = matching_brace(rest, open) else {
            break;
        };
        let body = &rest[open + 1..close];
        rest = &rest[close + 1..];

        if prelude.starts_with('@') {
            continue;
        }
        let selectors = prelude
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                if targets_scope(s, scope) {
                    s.to_string()
                } else {
                    format!("{} {}", scope, s)
                }
            })
            .collect::<Vec<_>>();
        if selectors.is_empty() {
            continue;
        }
        out.push_str(&selectors.join(", "));
        out.push_str(" {");
        out.push_str(body);
        out.push_str("}\n");
    }
    out
}

/// True when `selector` starts with the scope class itself, e.g.
/// `.poster-root`, `.poster-root>.a` or `.poster-root:hover`, but not
/// `.poster-root-x`.
fn targets_scope(selector: &str, scope: &str) -> bool {
    match selector.strip_prefix(scope) {
        Some(rest) => !rest
            .chars()
            .next()
            .is_some_and(|c| c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()),
        None => false,
    }
}

fn matching_brace(s: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s[open..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// A standalone preview document for the composition.
pub fn to_document(tree: &VisualTree, opts: &HtmlOptions) -> String {
    let overrides = custom_overrides(tree);
    let mut writer = Writer { policy: opts.css_policy, overrides: &overrides, next: 0, out: String::new() };
    writer.element(&tree.root);
    let body = writer.out;

    let size_css = opts
        .size
        .map(|(w, h)| format!(".poster-root {{ width: {}px; height: {}px; }}\n", w, h))
        .unwrap_or_default();
    // Replaced elements do not stretch from `inset` alone.
    let layout_css = "\n.poster-image, .split-logo-image { width: 100%; height: 100%; }\n";

    format!(
        "<!DOCTYPE html>\n<html lang=\"ar\" dir=\"rtl\">\n<head>\n<meta charset=\"utf-8\">\n<title>Iqtisad Canvas</title>\n{}<style>{}{}{}</style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        opts.font_css
            .map(|css| format!("<style>{}</style>\n", css.replace("</", "<\\/")))
            .unwrap_or_default(),
        BASE_CSS,
        layout_css,
        size_css,
        body
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scoping_prefixes_selectors_and_drops_at_rules() {
        let css = "@import url(x.css);\n.poster-headline, h2 { color: red }\n@media (min-width: 1px) { .a { color: blue } }\n.poster-root .poster-category { color: green }";
        let scoped = scope_css(css, ".poster-root");
        assert!(scoped.contains(".poster-root .poster-headline, .poster-root h2 { color: red }"));
        assert!(scoped.contains(".poster-root .poster-category { color: green }"));
        assert!(!scoped.contains("@media"));
        assert!(!scoped.contains("color: blue"));
    }

    #[test]
    fn selectors_on_the_root_are_not_scoped_twice() {
        let css = ".poster-root>.poster-headline { color: red }\n.poster-root:first-child, .poster-root[dir] { color: blue }\n.poster-root-x { color: green }";
        let scoped = scope_css(css, ".poster-root");
        assert!(scoped.contains(".poster-root>.poster-headline { color: red }"));
        assert!(scoped.contains(".poster-root:first-child, .poster-root[dir] { color: blue }"));
        assert!(scoped.contains(".poster-root .poster-root-x { color: green }"));
        assert!(!scoped.contains(".poster-root .poster-root>"));
    }

    #[test]
    fn scoping_neutralises_style_breakout() {
        let scoped = scope_css(".a { content: '</style><script>' }", ".poster-root");
        assert!(!scoped.contains("</style"));
    }

    #[test]
    fn text_is_escaped() {
        let el = Element::new("h2").class("poster-headline").text("<b>&");
        assert_eq!(element_to_html(&el), "<h2 class=\"poster-headline\">&lt;b&gt;&amp;</h2>");
    }

    #[test]
    fn policy_parses() {
        assert_eq!("Verbatim".parse::<CssPolicy>().unwrap(), CssPolicy::Verbatim);
        assert!("loose".parse::<CssPolicy>().is_err());
    }
}
