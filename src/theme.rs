//! Theme system

use ratatui::style::Color;

/// Complete color palette for TUI rendering
#[derive(Debug, Clone, Copy)]
pub struct ThemeColors {
    // Bar regions
    pub bar_fill_bg: Color,
    pub bar_fill_fg: Color,
    pub bar_over_bg: Color,
    pub bar_over_fg: Color,
    pub bar_empty_bg: Color,
    pub marker_fg: Color,

    // Text
    pub text_primary: Color,
    pub text_muted: Color,

    // Status
    pub title: Color,
    pub error: Color,
}

impl ThemeColors {
    /// Default theme
    pub const DEFAULT: Self = Self {
        // Bar regions
        bar_fill_bg: Color::Rgb(70, 110, 220),
        bar_fill_fg: Color::Rgb(230, 233, 248),
        bar_over_bg: Color::Rgb(235, 195, 100),
        bar_over_fg: Color::Rgb(22, 24, 38),
        bar_empty_bg: Color::Rgb(32, 35, 52),
        marker_fg: Color::Rgb(230, 233, 248),

        // Text
        text_primary: Color::Rgb(230, 233, 248),
        text_muted: Color::Rgb(140, 145, 168),

        // Status
        title: Color::Rgb(100, 215, 235),
        error: Color::Rgb(250, 120, 130),
    };
}

/// Theme container providing access to color palette
#[derive(Debug, Clone, Copy, Default)]
pub struct Theme;

impl Theme {
    #[inline]
    pub const fn colors(&self) -> ThemeColors {
        ThemeColors::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_regions_are_distinct() {
        let colors = ThemeColors::DEFAULT;
        assert_ne!(colors.bar_fill_bg, colors.bar_over_bg);
        assert_ne!(colors.bar_fill_bg, colors.bar_empty_bg);
    }
}
