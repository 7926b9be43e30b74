//! Colour themes.
//!
//! A [`ThemeVariant`] is picked once in `main` and its [`ColorPalette`] is handed
//! to the app, which passes it to every render call. Nothing reads the
//! environment after startup.

use ratatui::style::{Color, Modifier, Style};

// ============================================================================
// Theme Variant
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeVariant {
    Dark,
    Light,
    /// No colours; emphasis by modifiers only.
    Plain,
}

impl ThemeVariant {
    /// Parse a variant name from a string (case-insensitive).
    pub fn from_str_name(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            "plain" | "none" => Some(Self::Plain),
            _ => None,
        }
    }

    /// Build the `ColorPalette` for this variant.
    pub fn palette(self) -> ColorPalette {
        match self {
            Self::Dark => ColorPalette::dark(),
            Self::Light => ColorPalette::light(),
            Self::Plain => ColorPalette::plain(),
        }
    }

    /// Resolves the variant from flags, config and the process environment.
    pub fn detect(no_color: bool, configured: Option<&str>) -> Self {
        Self::detect_with(no_color, configured, |key| std::env::var(key).ok())
    }

    /// [`detect`](Self::detect) with an injectable environment lookup.
    ///
    /// Order: `--no-color`, `NO_COLOR`, `TERM=dumb`, then an explicit
    /// `dark`/`light` config value, then the `COLORFGBG` background, then dark.
    pub fn detect_with(
        no_color: bool,
        configured: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        if no_color || env("NO_COLOR").is_some_and(|v| !v.is_empty()) {
            return Self::Plain;
        }
        if env("TERM").is_some_and(|t| t == "dumb") {
            return Self::Plain;
        }
        if let Some(variant) = configured.and_then(Self::from_str_name) {
            return variant;
        }
        env("COLORFGBG")
            .and_then(|v| background_from_colorfgbg(&v))
            .unwrap_or(Self::Dark)
    }
}

/// `COLORFGBG` is `fg;bg` (sometimes `fg;default;bg`); low ANSI indices are dark.
fn background_from_colorfgbg(value: &str) -> Option<ThemeVariant> {
    let bg: u8 = value.rsplit(';').next()?.trim().parse().ok()?;
    Some(match bg {
        0..=6 | 8 => ThemeVariant::Dark,
        _ => ThemeVariant::Light,
    })
}

// ============================================================================
// Color Palette
// ============================================================================

/// One `Style` per visual element of the browse and article views.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorPalette {
    // -- Browse --
    pub section_header: Style,
    pub accent_rule: Style,
    pub search: Style,
    pub headline: Style,
    pub headline_selected: Style,
    pub date: Style,
    pub subtitle: Style,
    pub dim: Style,
    pub help: Style,
    pub dot_active: Style,
    pub dot_inactive: Style,

    // -- Article --
    pub overtitle_section: Style,
    pub overtitle: Style,
    pub article_title: Style,
    pub article_subtitle: Style,
    pub article_date: Style,
    pub body: Style,
    pub heading: Style,
    pub emphasis: Style,
    pub strong: Style,
    pub code: Style,
    pub quote: Style,
    pub link: Style,
    pub error: Style,
}

/// Brand red used for rules, selection and section labels.
const BRAND_RED: Color = Color::Rgb(0xE3, 0x12, 0x0B);

impl ColorPalette {
    fn dark() -> Self {
        let text = Color::Rgb(0xF2, 0xF2, 0xF2);
        let muted = Color::Rgb(0xB3, 0xB3, 0xB3);
        let faint = Color::Rgb(0x59, 0x59, 0x59);
        Self {
            section_header: Style::default().fg(text).add_modifier(Modifier::BOLD),
            accent_rule: Style::default().fg(BRAND_RED),
            search: Style::default().fg(BRAND_RED),
            headline: Style::default().fg(text),
            headline_selected: Style::default()
                .fg(BRAND_RED)
                .add_modifier(Modifier::BOLD),
            date: Style::default().fg(faint),
            subtitle: Style::default().fg(muted),
            dim: Style::default().fg(faint),
            help: Style::default().fg(faint),
            dot_active: Style::default().fg(BRAND_RED),
            dot_inactive: Style::default().fg(faint),

            overtitle_section: Style::default()
                .fg(BRAND_RED)
                .add_modifier(Modifier::BOLD),
            overtitle: Style::default().fg(muted),
            article_title: Style::default().fg(text).add_modifier(Modifier::BOLD),
            article_subtitle: Style::default().fg(muted).add_modifier(Modifier::ITALIC),
            article_date: Style::default().fg(faint),
            body: Style::default().fg(text),
            heading: Style::default().fg(text).add_modifier(Modifier::BOLD),
            emphasis: Style::default().add_modifier(Modifier::ITALIC),
            strong: Style::default().add_modifier(Modifier::BOLD),
            code: Style::default().fg(Color::Yellow),
            quote: Style::default().fg(muted).add_modifier(Modifier::ITALIC),
            link: Style::default().fg(muted).add_modifier(Modifier::UNDERLINED),
            error: Style::default().fg(Color::Rgb(0xE2, 0x36, 0x5B)),
        }
    }

    fn light() -> Self {
        let text = Color::Rgb(0x33, 0x33, 0x33);
        let muted = Color::Rgb(0x59, 0x59, 0x59);
        let faint = Color::Rgb(0xB3, 0xB3, 0xB3);
        Self {
            section_header: Style::default().fg(text).add_modifier(Modifier::BOLD),
            accent_rule: Style::default().fg(BRAND_RED),
            search: Style::default().fg(BRAND_RED),
            headline: Style::default().fg(text),
            headline_selected: Style::default()
                .fg(BRAND_RED)
                .add_modifier(Modifier::BOLD),
            date: Style::default().fg(muted),
            subtitle: Style::default().fg(muted),
            dim: Style::default().fg(faint),
            help: Style::default().fg(muted),
            dot_active: Style::default().fg(BRAND_RED),
            dot_inactive: Style::default().fg(faint),

            overtitle_section: Style::default()
                .fg(BRAND_RED)
                .add_modifier(Modifier::BOLD),
            overtitle: Style::default().fg(muted),
            article_title: Style::default().fg(text).add_modifier(Modifier::BOLD),
            article_subtitle: Style::default().fg(muted).add_modifier(Modifier::ITALIC),
            article_date: Style::default().fg(muted),
            body: Style::default().fg(text),
            heading: Style::default().fg(text).add_modifier(Modifier::BOLD),
            emphasis: Style::default().add_modifier(Modifier::ITALIC),
            strong: Style::default().add_modifier(Modifier::BOLD),
            code: Style::default().fg(Color::Rgb(0x14, 0x1F, 0x52)),
            quote: Style::default().fg(muted).add_modifier(Modifier::ITALIC),
            link: Style::default().fg(muted).add_modifier(Modifier::UNDERLINED),
            error: Style::default().fg(Color::Rgb(0xC9, 0x1D, 0x42)),
        }
    }

    fn plain() -> Self {
        let none = Style::default();
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let italic = Style::default().add_modifier(Modifier::ITALIC);
        Self {
            section_header: bold,
            accent_rule: none,
            search: none,
            headline: none,
            headline_selected: Style::default().add_modifier(Modifier::REVERSED),
            date: none,
            subtitle: none,
            dim: none,
            help: none,
            dot_active: bold,
            dot_inactive: none,

            overtitle_section: bold,
            overtitle: none,
            article_title: bold,
            article_subtitle: italic,
            article_date: none,
            body: none,
            heading: bold,
            emphasis: italic,
            strong: bold,
            code: none,
            quote: italic,
            link: none,
            error: bold,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn variant_from_str_name() {
        assert_eq!(ThemeVariant::from_str_name("Light"), Some(ThemeVariant::Light));
        assert_eq!(ThemeVariant::from_str_name("DARK"), Some(ThemeVariant::Dark));
        assert_eq!(ThemeVariant::from_str_name("auto"), None);
    }

    #[test]
    fn no_color_wins_over_everything() {
        let variant = ThemeVariant::detect_with(false, Some("light"), env(&[("NO_COLOR", "1")]));
        assert_eq!(variant, ThemeVariant::Plain);
        let variant = ThemeVariant::detect_with(true, Some("light"), env(&[]));
        assert_eq!(variant, ThemeVariant::Plain);
    }

    #[test]
    fn empty_no_color_is_ignored() {
        let variant = ThemeVariant::detect_with(false, None, env(&[("NO_COLOR", "")]));
        assert_eq!(variant, ThemeVariant::Dark);
    }

    #[test]
    fn dumb_terminal_is_plain() {
        let variant = ThemeVariant::detect_with(false, None, env(&[("TERM", "dumb")]));
        assert_eq!(variant, ThemeVariant::Plain);
    }

    #[test]
    fn config_beats_colorfgbg() {
        let variant =
            ThemeVariant::detect_with(false, Some("dark"), env(&[("COLORFGBG", "0;15")]));
        assert_eq!(variant, ThemeVariant::Dark);
    }

    #[test]
    fn colorfgbg_background_detection() {
        let light = ThemeVariant::detect_with(false, Some("auto"), env(&[("COLORFGBG", "0;15")]));
        assert_eq!(light, ThemeVariant::Light);
        let dark = ThemeVariant::detect_with(false, None, env(&[("COLORFGBG", "15;default;0")]));
        assert_eq!(dark, ThemeVariant::Dark);
        let garbage = ThemeVariant::detect_with(false, None, env(&[("COLORFGBG", "x")]));
        assert_eq!(garbage, ThemeVariant::Dark);
    }

    #[test]
    fn plain_palette_has_no_colours() {
        let plain = ThemeVariant::Plain.palette();
        for style in [plain.accent_rule, plain.headline, plain.body, plain.error] {
            assert_eq!(style.fg, None);
            assert_eq!(style.bg, None);
        }
    }

    #[test]
    fn light_palette_differs_from_dark() {
        let dark = ThemeVariant::Dark.palette();
        let light = ThemeVariant::Light.palette();
        assert_ne!(dark.body, light.body);
        assert_eq!(dark.accent_rule, light.accent_rule);
    }
}
