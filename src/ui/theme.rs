use crate::models::Tone;
use crossterm::style::{Attribute, Color, ContentStyle};

pub struct Theme;

impl Theme {
    // Base colors
    pub const FG: Color = Color::White;
    pub const DIM: Color = Color::DarkGrey;
    pub const ACCENT: Color = Color::Green;

    // Status colors
    pub const SUCCESS: Color = Color::Green;
    pub const ERROR: Color = Color::Red;

    fn style(fg: Color, bold: bool) -> ContentStyle {
        let mut style = ContentStyle::new();
        style.foreground_color = Some(fg);
        if bold {
            style.attributes.set(Attribute::Bold);
        }
        style
    }

    pub fn tone(tone: Tone) -> Color {
        match tone {
            Tone::Red => Color::Red,
            Tone::Orange => Color::DarkYellow,
            Tone::Yellow => Color::Yellow,
            Tone::Green => Color::Green,
            Tone::Blue => Color::Blue,
            Tone::Sky => Color::Cyan,
            Tone::Gray => Color::Grey,
        }
    }

    pub fn title() -> ContentStyle {
        Self::style(Self::ACCENT, true)
    }

    pub fn header() -> ContentStyle {
        Self::style(Self::FG, true)
    }

    pub fn dim() -> ContentStyle {
        Self::style(Self::DIM, false)
    }

    pub fn success() -> ContentStyle {
        Self::style(Self::SUCCESS, false)
    }

    pub fn error() -> ContentStyle {
        Self::style(Self::ERROR, true)
    }

    pub fn color(fg: Color) -> ContentStyle {
        Self::style(fg, false)
    }

    pub fn badge(tone: Tone) -> ContentStyle {
        Self::style(Self::tone(tone), true)
    }

    pub fn moisture_color(moisture: f64) -> Color {
        if moisture < 0.15 {
            Self::tone(Tone::Orange)
        } else if moisture < 0.35 {
            Self::tone(Tone::Green)
        } else {
            Self::tone(Tone::Blue)
        }
    }
}
