//! Control panel: each widget is bound to one `DesignState` field.
//!
//! Input events arrive as [`Control`] values. [`ControlPanel::apply`] never
//! touches the current state; it returns a fresh `DesignState` with the one
//! field replaced, and range widgets clamp to their bounds so the numeric
//! fields stay inside the ranges the renderer expects.

use crate::assets::{self, LogoAsset};
use crate::state::{DesignState, Layout};
use crate::Result;
use std::path::Path;

/// A slider widget definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeControl {
    pub label: &'static str,
    pub min: i64,
    pub max: i64,
    pub unit: &'static str,
}

impl RangeControl {
    pub fn clamp(&self, value: i64) -> i64 {
        value.clamp(self.min, self.max)
    }

    /// Text shown next to the slider, e.g. `36px`
    pub fn display(&self, value: i64) -> String {
        format!("{}{}", value, self.unit)
    }
}

pub const FONT_SIZE: RangeControl = RangeControl { label: "حجم الخط", min: 20, max: 80, unit: "px" };
pub const OVERLAY_OPACITY: RangeControl =
    RangeControl { label: "شفافية الخلفية", min: 0, max: 100, unit: "%" };
pub const IMAGE_BRIGHTNESS: RangeControl =
    RangeControl { label: "إضاءة الصورة", min: 50, max: 150, unit: "%" };
pub const IMAGE_CONTRAST: RangeControl =
    RangeControl { label: "تباين الصورة", min: 50, max: 150, unit: "%" };

/// Widgets of the panel, used to describe what is currently shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Widget {
    ThemePicker,
    LayoutPicker,
    FontSize,
    OverlayOpacity,
    ImageBrightness,
    ImageContrast,
    CustomCss,
    Headline,
    Suggestions,
    ImageUpload,
    LogoPicker,
    LogoRemove,
    Category,
    Source,
}

/// A user input event.
#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    ThemeColor(String),
    Layout(Layout),
    FontSize(i64),
    /// Integer percent from the slider
    OverlayOpacityPercent(i64),
    ImageBrightness(i64),
    ImageContrast(i64),
    CustomCss(String),
    ResetCustomCss,
    Headline(String),
    /// Pick one entry of the suggestion list by index
    SelectSuggestion(usize),
    /// Result of reading a user-selected image file
    ImageUploaded(String),
    /// Result of reading a user-selected logo file
    LogoUploaded(String),
    PredefinedLogo(&'static str),
    RemoveLogo,
    Category(String),
    Source(String),
}

/// Panel-owned state: the suggestion list and the request indicator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlPanel {
    suggestions: Vec<String>,
    loading: bool,
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn begin_suggestions(&mut self) {
        self.loading = true;
    }

    /// Replace the list wholesale with a response.
    pub fn finish_suggestions(&mut self, suggestions: Vec<String>) {
        self.suggestions = suggestions;
        self.loading = false;
    }

    /// Widgets visible for the given state. Opacity is only offered for the
    /// overlay layout and logo removal only when a logo is set.
    pub fn visible_widgets(&self, state: &DesignState) -> Vec<Widget> {
        let mut widgets = vec![Widget::ThemePicker, Widget::LayoutPicker, Widget::FontSize];
        if state.layout == Layout::Overlay {
            widgets.push(Widget::OverlayOpacity);
        }
        widgets.extend([Widget::ImageBrightness, Widget::ImageContrast, Widget::CustomCss, Widget::Headline]);
        if !self.suggestions.is_empty() {
            widgets.push(Widget::Suggestions);
        }
        widgets.extend([Widget::ImageUpload, Widget::LogoPicker]);
        if state.logo_url.is_some() {
            widgets.push(Widget::LogoRemove);
        }
        widgets.extend([Widget::Category, Widget::Source]);
        widgets
    }

    /// Build the state that results from `control`.
    pub fn apply(&self, state: &DesignState, control: Control) -> DesignState {
        match control {
            Control::ThemeColor(theme_color) => DesignState { theme_color, ..state.clone() },
            Control::Layout(layout) => DesignState { layout, ..state.clone() },
            Control::FontSize(v) => DesignState { font_size: FONT_SIZE.clamp(v) as u32, ..state.clone() },
            Control::OverlayOpacityPercent(v) => DesignState {
                overlay_opacity: OVERLAY_OPACITY.clamp(v) as f64 / 100.0,
                ..state.clone()
            },
            Control::ImageBrightness(v) => DesignState {
                image_brightness: IMAGE_BRIGHTNESS.clamp(v) as u32,
                ..state.clone()
            },
            Control::ImageContrast(v) => DesignState {
                image_contrast: IMAGE_CONTRAST.clamp(v) as u32,
                ..state.clone()
            },
            Control::CustomCss(custom_css) => DesignState { custom_css, ..state.clone() },
            Control::ResetCustomCss => DesignState { custom_css: String::new(), ..state.clone() },
            Control::Headline(headline) => DesignState { headline, ..state.clone() },
            Control::SelectSuggestion(idx) => match self.suggestions.get(idx) {
                Some(headline) => DesignState { headline: headline.clone(), ..state.clone() },
                None => state.clone(),
            },
            Control::ImageUploaded(uri) => DesignState { image_url: Some(uri), ..state.clone() },
            Control::LogoUploaded(uri) => DesignState { logo_url: Some(uri), ..state.clone() },
            Control::PredefinedLogo(id) => match LogoAsset::by_id(id) {
                Some(logo) => DesignState { logo_url: Some(logo.url.to_string()), ..state.clone() },
                None => {
                    log::warn!("unknown predefined logo '{}'", id);
                    state.clone()
                }
            },
            Control::RemoveLogo => DesignState { logo_url: None, ..state.clone() },
            Control::Category(category) => DesignState { category, ..state.clone() },
            Control::Source(source) => DesignState { source, ..state.clone() },
        }
    }

    /// Opacity as the slider shows it (rounded integer percent).
    pub fn opacity_percent(state: &DesignState) -> i64 {
        (state.overlay_opacity * 100.0).round() as i64
    }
}

/// Read a picked image file into an `ImageUploaded` event.
pub fn image_upload(path: &Path) -> Result<Control> {
    Ok(Control::ImageUploaded(assets::read_as_data_uri(path)?))
}

/// Read a picked logo file into a `LogoUploaded` event.
pub fn logo_upload(path: &Path) -> Result<Control> {
    Ok(Control::LogoUploaded(assets::read_as_data_uri(path)?))
}
