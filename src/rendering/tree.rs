/// DOM-like render tree produced by the composition renderer.

use sha2::{Digest, Sha256};

/// Ordered inline style declarations (`property`, `value`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InlineStyle(pub Vec<(String, String)>);

impl InlineStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, property: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        if let Some(slot) = self.0.iter_mut().find(|(p, _)| p == property) {
            slot.1 = value;
        } else {
            self.0.push((property.to_string(), value));
        }
        self
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.0.iter().find(|(p, _)| p == property).map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Serialize as the value of a `style` attribute
    pub fn to_css(&self) -> String {
        self.0
            .iter()
            .map(|(p, v)| format!("{}: {}", p, v))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: &'static str,
    pub classes: Vec<String>,
    pub style: InlineStyle,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl Element {
    pub fn new(tag: &'static str) -> Self {
        Self {
            tag,
            classes: Vec::new(),
            style: InlineStyle::new(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Add space-separated classes
    pub fn class(mut self, classes: &str) -> Self {
        self.classes.extend(classes.split_whitespace().map(str::to_string));
        self
    }

    pub fn style(mut self, property: &str, value: impl Into<String>) -> Self {
        self.style = self.style.set(property, value);
        self
    }

    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attrs.push((name.to_string(), value.into()));
        self
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub fn maybe_child(mut self, child: Option<Element>) -> Self {
        if let Some(c) = child {
            self.children.push(Node::Element(c));
        }
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }

    /// Concatenated text of this element's subtree
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    /// Direct text children only; used for `<style>` contents
    pub fn text_content_raw(&self) -> String {
        self.children
            .iter()
            .filter_map(|n| match n {
                Node::Text(t) => Some(t.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// Depth-first pre-order walk over this element and its descendants
    pub fn descendants(&self) -> Vec<&Element> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(el) = stack.pop() {
            out.push(el);
            let kids: Vec<&Element> = el.child_elements().collect();
            for k in kids.into_iter().rev() {
                stack.push(k);
            }
        }
        out
    }

    /// First descendant (or self) carrying `class`
    pub fn find_class(&self, class: &str) -> Option<&Element> {
        self.descendants().into_iter().find(|e| e.has_class(class))
    }

    pub fn find_all_class(&self, class: &str) -> Vec<&Element> {
        self.descendants().into_iter().filter(|e| e.has_class(class)).collect()
    }
}

fn collect_text(el: &Element, out: &mut String) {
    for child in &el.children {
        match child {
            Node::Text(t) => out.push_str(t),
            Node::Element(e) if e.tag != "style" => collect_text(e, out),
            Node::Element(_) => {}
        }
    }
}

/// The composition: one poster root element.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualTree {
    pub root: Element,
}

impl VisualTree {
    /// Image sources referenced anywhere in the tree, in document order
    pub fn image_sources(&self) -> Vec<&str> {
        self.root
            .descendants()
            .into_iter()
            .filter(|e| e.tag == "img")
            .filter_map(|e| e.get_attr("src"))
            .collect()
    }

    /// Content digest of the serialized tree, stable across runs
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(crate::rendering::html::element_to_html(&self.root).as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_and_queries() {
        let el = Element::new("div")
            .class("a b")
            .style("color", "red")
            .style("color", "blue")
            .child(Element::new("span").class("c").text("hi"))
            .child(Element::new("style").text(".a{}"));
        assert!(el.has_class("b"));
        assert_eq!(el.style.get("color"), Some("blue"));
        assert_eq!(el.style.0.len(), 1);
        assert_eq!(el.find_class("c").map(|e| e.text_content()), Some("hi".to_string()));
        assert_eq!(el.text_content(), "hi");
        assert_eq!(el.descendants().len(), 3);
    }
}
