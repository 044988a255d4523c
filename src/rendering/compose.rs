//! Design state → composition tree.
//!
//! `render` is a pure function: no I/O, no clamping, no validation. Numeric
//! fields are formatted exactly as they are stored, so the overlay scrim's
//! first stop carries `overlay_opacity + 0.2` even when that exceeds 1.

use super::tree::{Element, VisualTree};
use crate::state::{DesignState, Layout};

pub const ROOT_CLASS: &str = "poster-root";
pub const HEADLINE_CLASS: &str = "poster-headline";
pub const CATEGORY_CLASS: &str = "poster-category";
pub const IMAGE_CLASS: &str = "poster-image";

pub const FONT_FAMILY: &str = "'IBM Plex Sans Arabic', sans-serif";
/// Brand tag in the overlay footer
pub const OVERLAY_BRAND_TAG: &str = "منصة المستثمر";
/// Descriptor under the source name in the split footer
pub const SPLIT_DESCRIPTOR: &str = "Economic News Platform";
pub const MINIMAL_BRAND_STRIP: &str = "I Q T I S A D — O F F I C I A L";
/// Two-letter mark used by the logo placeholders
pub const INITIALS: &str = "IQ";
pub const WORDMARK_MAIN: &str = "CANVAS";
pub const WORDMARK_SUB: &str = "NEWS";
/// Extra pixels the minimal headline gets on top of `font_size`
pub const MINIMAL_FONT_BOOST: u32 = 4;

/// Render the composition for `state`.
pub fn render(state: &DesignState) -> VisualTree {
    let custom_css = (!state.custom_css.is_empty())
        .then(|| Element::new("style").text(state.custom_css.clone()));

    let layout = match state.layout {
        Layout::Overlay => overlay_layout(state),
        Layout::Split => split_layout(state),
        Layout::Minimal => minimal_layout(state),
    };

    let root = Element::new("div")
        .class("poster-root square-aspect")
        .style("font-family", FONT_FAMILY)
        .maybe_child(custom_css)
        .maybe_child(background_image(state))
        .child(layout)
        .child(watermark(state));

    VisualTree { root }
}

pub fn image_filter(state: &DesignState) -> String {
    format!(
        "brightness({}%) contrast({}%)",
        state.image_brightness, state.image_contrast
    )
}

/// Scrim of the overlay layout. Alphas are not clamped.
pub fn overlay_gradient(opacity: f64) -> String {
    format!(
        "linear-gradient(to top, rgba(0,0,0,{}) 0%, rgba(0,0,0,{}) 40%, transparent 100%)",
        opacity + 0.2,
        opacity
    )
}

pub fn headline_font_size(state: &DesignState) -> u32 {
    match state.layout {
        Layout::Minimal => state.font_size.saturating_add(MINIMAL_FONT_BOOST),
        Layout::Overlay | Layout::Split => state.font_size,
    }
}

fn background_image(state: &DesignState) -> Option<Element> {
    let src = state.image_url.as_ref()?;
    Some(
        Element::new("img")
            .class(IMAGE_CLASS)
            .attr("src", src.clone())
            .attr("alt", "Post background")
            .attr("crossorigin", "anonymous")
            .style("filter", image_filter(state)),
    )
}

fn headline(state: &DesignState, extra_class: Option<&str>) -> Element {
    let mut el = Element::new("h2").class(HEADLINE_CLASS);
    if let Some(c) = extra_class {
        el = el.class(c);
    }
    el.style("font-size", format!("{}px", headline_font_size(state)))
        .text(state.headline.clone())
}

fn overlay_layout(state: &DesignState) -> Element {
    let category_row = Element::new("div")
        .class("category-row")
        .child(
            Element::new("span")
                .class(CATEGORY_CLASS)
                .style("background-color", state.theme_color.clone())
                .text(state.category.clone()),
        )
        .child(
            Element::new("div")
                .class("category-line")
                .style("background-color", state.theme_color.clone()),
        );

    let footer = Element::new("div")
        .class("poster-footer")
        .child(Element::new("span").class("poster-source").text(state.source.clone()))
        .child(
            Element::new("div")
                .class("footer-tag-row")
                .child(Element::new("span").class("footer-tag").text(OVERLAY_BRAND_TAG)),
        );

    Element::new("div")
        .class("overlay-layout")
        .style("background", overlay_gradient(state.overlay_opacity))
        .child(
            Element::new("div")
                .class("overlay-content")
                .child(category_row)
                .child(headline(state, None))
                .child(footer),
        )
}

fn split_layout(state: &DesignState) -> Element {
    let logo = match &state.logo_url {
        Some(url) => Element::new("img")
            .class("split-logo-image")
            .attr("src", url.clone())
            .attr("alt", "Logo"),
        None => Element::new("div").class("split-logo-placeholder").text(INITIALS),
    };

    let footer = Element::new("div")
        .class("split-footer")
        .child(Element::new("div").class("split-logo-circle").child(logo))
        .child(
            Element::new("div")
                .class("split-source")
                .child(Element::new("p").class("split-source-name").text(state.source.clone()))
                .child(Element::new("p").class("split-source-desc").text(SPLIT_DESCRIPTOR)),
        );

    let content = Element::new("div")
        .class("split-content")
        .child(
            Element::new("div")
                .class("split-accent-line")
                .style("background-color", state.theme_color.clone()),
        )
        .child(
            Element::new("div").class("split-category-wrapper").child(
                Element::new("span")
                    .class("split-category")
                    .style("background-color", state.theme_color.clone())
                    .text(state.category.clone()),
            ),
        )
        .child(headline(state, None))
        .child(footer);

    Element::new("div")
        .class("split-layout")
        .child(Element::new("div").class("split-spacer"))
        .child(content)
}

fn minimal_layout(state: &DesignState) -> Element {
    let content = Element::new("div")
        .class("minimal-content")
        .child(
            Element::new("div")
                .class("minimal-accent")
                .style("background-color", state.theme_color.clone()),
        )
        .child(headline(state, Some("arabic-stroke")))
        .child(
            Element::new("div").class("minimal-meta-badge").child(
                Element::new("span")
                    .class("minimal-badge-content")
                    .text(format!("{} • {}", state.source, state.category)),
            ),
        );

    Element::new("div")
        .class("minimal-layout")
        .child(
            Element::new("div")
                .class("minimal-overlay")
                .style("background-color", format!("rgba(0,0,0,{})", state.overlay_opacity)),
        )
        .child(content)
        .child(
            Element::new("div")
                .class("minimal-branding")
                .child(Element::new("div").class("minimal-branding-text").text(MINIMAL_BRAND_STRIP)),
        )
}

fn watermark(state: &DesignState) -> Element {
    let badge = match &state.logo_url {
        Some(url) => Element::new("div").class("logo-badge").child(
            Element::new("img")
                .class("logo-badge-image")
                .attr("src", url.clone())
                .attr("alt", "Brand Logo"),
        ),
        None => Element::new("div")
            .class("logo-badge placeholder")
            .child(
                Element::new("div")
                    .class("logo-badge-icon")
                    .style("background-color", state.theme_color.clone())
                    .text(INITIALS),
            )
            .child(
                Element::new("div")
                    .class("logo-badge-text-stack")
                    .child(Element::new("span").class("logo-badge-main-text").text(WORDMARK_MAIN))
                    .child(Element::new("span").class("logo-badge-sub-text").text(WORDMARK_SUB)),
            ),
    };

    Element::new("div").class("logo-badge-container").child(badge)
}
