//! The design document edited by the control panel.
//!
//! `DesignState` is a plain value: every edit builds a new one (see
//! [`crate::controls::ControlPanel::apply`]) and the composition renderer
//! reads it without mutating it.

use serde::{Deserialize, Serialize};

/// Which composition template renders the poster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Full-bleed image with a bottom gradient scrim
    #[default]
    Overlay,
    /// Empty spacer above a content panel with a logo footer
    Split,
    /// Flat scrim, outlined headline and a brand strip
    Minimal,
}

impl Layout {
    pub const ALL: [Layout; 3] = [Layout::Overlay, Layout::Split, Layout::Minimal];

    /// Label shown on the layout button
    pub fn label(self) -> &'static str {
        match self {
            Layout::Overlay => "تغطية كاملة",
            Layout::Split => "خبر مقسوم",
            Layout::Minimal => "مينيمال",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Layout::Overlay => "overlay",
            Layout::Split => "split",
            Layout::Minimal => "minimal",
        }
    }
}

impl std::str::FromStr for Layout {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "overlay" => Ok(Layout::Overlay),
            "split" => Ok(Layout::Split),
            "minimal" => Ok(Layout::Minimal),
            other => Err(crate::Error::ConfigError(format!("unknown layout '{}'", other))),
        }
    }
}

/// The fixed theme palette offered by the color picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThemeColor {
    EconomicBlue,
    ProfitGreen,
    GoldAccent,
    CriticalRed,
    ModernBlack,
    RoyalPurple,
    OceanTeal,
    SlateGrey,
}

impl ThemeColor {
    /// Picker order
    pub const ALL: [ThemeColor; 8] = [
        ThemeColor::EconomicBlue,
        ThemeColor::ProfitGreen,
        ThemeColor::GoldAccent,
        ThemeColor::CriticalRed,
        ThemeColor::ModernBlack,
        ThemeColor::RoyalPurple,
        ThemeColor::OceanTeal,
        ThemeColor::SlateGrey,
    ];

    pub fn hex(self) -> &'static str {
        match self {
            ThemeColor::EconomicBlue => "#0f172a",
            ThemeColor::ProfitGreen => "#059669",
            ThemeColor::GoldAccent => "#d97706",
            ThemeColor::CriticalRed => "#dc2626",
            ThemeColor::ModernBlack => "#18181b",
            ThemeColor::RoyalPurple => "#581c87",
            ThemeColor::OceanTeal => "#0e7490",
            ThemeColor::SlateGrey => "#334155",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ThemeColor::EconomicBlue => "أزرق اقتصادي",
            ThemeColor::ProfitGreen => "أخضر نمو",
            ThemeColor::GoldAccent => "ذهبي فاخر",
            ThemeColor::CriticalRed => "أحمر عاجل",
            ThemeColor::ModernBlack => "أسود عصري",
            ThemeColor::RoyalPurple => "بنفسجي ملكي",
            ThemeColor::OceanTeal => "تيل محيطي",
            ThemeColor::SlateGrey => "رمادي صلب",
        }
    }

    /// Look up a palette entry by its hex value (case-insensitive).
    pub fn from_hex(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.hex().eq_ignore_ascii_case(value.trim()))
    }
}

/// Everything the poster is rendered from.
///
/// `theme_color` is kept as a string and is never checked against
/// [`ThemeColor`]; any CSS color string passes through to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DesignState {
    pub headline: String,
    pub category: String,
    pub source: String,
    pub image_url: Option<String>,
    pub logo_url: Option<String>,
    pub theme_color: String,
    pub layout: Layout,
    /// Fraction in `[0, 1]`
    pub overlay_opacity: f64,
    /// Pixels in `[20, 80]`
    pub font_size: u32,
    /// Percent in `[50, 150]`
    pub image_brightness: u32,
    /// Percent in `[50, 150]`
    pub image_contrast: u32,
    pub custom_css: String,
}

impl Default for DesignState {
    fn default() -> Self {
        Self {
            headline: "أدخل العنوان الاقتصادي هنا ليكون جذاباً للمتابعين".to_string(),
            category: "عاجل".to_string(),
            source: "أخبار الاقتصاد".to_string(),
            image_url: Some("https://picsum.photos/800/800?business".to_string()),
            logo_url: None,
            theme_color: ThemeColor::EconomicBlue.hex().to_string(),
            layout: Layout::Overlay,
            overlay_opacity: 0.7,
            font_size: 36,
            image_brightness: 100,
            image_contrast: 100,
            custom_css: String::new(),
        }
    }
}

impl DesignState {
    /// Load a design document from camelCase JSON. Missing fields take defaults.
    pub fn from_json(text: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
