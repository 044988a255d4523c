use iqtisad_canvas::rendering::html::{to_document, CssPolicy, HtmlOptions};
use iqtisad_canvas::rendering::paint::{build_display_list, PaintCommand};
use iqtisad_canvas::rendering::layout::layout_composition;
use iqtisad_canvas::rendering::style::{parse_color, resolve};
use iqtisad_canvas::rendering::svg_scene;
use iqtisad_canvas::{render, DesignState, Layout, ThemeColor, Viewport};
use scraper::{Html, Selector};

const RED_HEADLINE: &str = ".poster-headline { color: red }";

#[test]
fn custom_rule_wins_over_every_theme() {
    for theme in ThemeColor::ALL {
        for layout in Layout::ALL {
            let state = DesignState {
                theme_color: theme.hex().into(),
                layout,
                custom_css: RED_HEADLINE.into(),
                ..Default::default()
            };
            let tree = render(&state);
            let styled = resolve(&tree);
            let headline = styled.find_class("poster-headline").unwrap();
            assert_eq!(headline.get("color").and_then(parse_color).map(|c| c.hex()), Some("#ff0000".into()));
        }
    }
}

#[test]
fn custom_rule_reaches_the_painted_text() {
    let state = DesignState { custom_css: RED_HEADLINE.into(), ..Default::default() };
    let tree = render(&state);
    let styled = resolve(&tree);
    let nodes = layout_composition(&styled, Viewport::default());
    let list = build_display_list(&styled, &nodes);
    let headline = list.iter().find_map(|c| match c {
        PaintCommand::Text { lines, color, .. } if lines.join(" ") == state.headline => Some(*color),
        _ => None,
    });
    assert_eq!(headline.map(|c| c.hex()), Some("#ff0000".to_string()));
    assert!(svg_scene(&tree, Viewport::default()).contains("fill=\"#ff0000\""));
}

#[test]
fn custom_rule_overrides_generated_font_size_and_filter() {
    let state = DesignState {
        custom_css: ".poster-headline { font-size: 12px } .poster-image { filter: brightness(50%) }".into(),
        font_size: 70,
        ..Default::default()
    };
    let tree = render(&state);
    let styled = resolve(&tree);
    assert_eq!(styled.find_class("poster-headline").unwrap().get("font-size"), Some("12px"));
    assert_eq!(styled.find_class("poster-image").unwrap().get("filter"), Some("brightness(50%)"));
}

#[test]
fn scoped_policy_prefixes_and_strips() {
    let state = DesignState {
        custom_css: "@import url(https://evil.example/x.css);\nh2 { color: red }\n.a { content: '</style><script>x</script>' }".into(),
        ..Default::default()
    };
    let doc = to_document(&render(&state), &HtmlOptions::default());
    assert!(doc.contains(".poster-root h2 { color: red }"));
    assert!(!doc.contains("@import"));
    assert!(!doc.contains("</style><script>"));
}

#[test]
fn verbatim_policy_keeps_text() {
    let css = "@media (max-width: 10px) { h2 { color: red } }";
    let state = DesignState { custom_css: css.into(), ..Default::default() };
    let doc = to_document(&render(&state), &HtmlOptions { css_policy: CssPolicy::Verbatim, ..Default::default() });
    assert!(doc.contains(css));
}

fn inline_style(doc: &str, selector: &str) -> String {
    let html = Html::parse_document(doc);
    let sel = Selector::parse(selector).unwrap();
    html.select(&sel)
        .next()
        .and_then(|e| e.value().attr("style"))
        .unwrap_or_default()
        .to_string()
}

#[test]
fn preview_yields_overridden_properties_to_custom_css() {
    let state = DesignState {
        custom_css: ".poster-headline { font-size: 12px }".into(),
        font_size: 70,
        ..Default::default()
    };
    let tree = render(&state);
    assert_eq!(resolve(&tree).find_class("poster-headline").unwrap().get("font-size"), Some("12px"));

    for policy in [CssPolicy::Scoped, CssPolicy::Verbatim] {
        let doc = to_document(&tree, &HtmlOptions { css_policy: policy, ..Default::default() });
        assert!(!inline_style(&doc, ".poster-headline").contains("font-size"), "{:?}", policy);
        assert!(inline_style(&doc, ".poster-category").contains("background-color"), "{:?}", policy);
        assert!(doc.contains("font-size: 12px"));
    }

    let plain = to_document(&render(&DesignState { font_size: 70, ..Default::default() }), &HtmlOptions::default());
    assert!(inline_style(&plain, ".poster-headline").contains("font-size: 70px"));
}

#[test]
fn empty_custom_css_adds_no_style_element() {
    let tree = render(&DesignState::default());
    assert!(tree.root.descendants().iter().all(|e| e.tag != "style"));
}
