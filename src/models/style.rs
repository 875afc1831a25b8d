use serde::Serialize;

/// Icon reference attached to derived advisories and badges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Icon {
    AlertOctagon,
    AlertTriangle,
    CheckCircle,
    Info,
    Droplet,
    Droplets,
    CloudRain,
    CloudDrizzle,
    CloudLightning,
    Cloud,
    Sun,
    Thermometer,
    ThermometerSnowflake,
    Snowflake,
    Wind,
    HelpCircle,
}

impl Icon {
    pub fn as_str(&self) -> &'static str {
        match self {
            Icon::AlertOctagon => "alert-octagon",
            Icon::AlertTriangle => "alert-triangle",
            Icon::CheckCircle => "check-circle",
            Icon::Info => "info",
            Icon::Droplet => "droplet",
            Icon::Droplets => "droplets",
            Icon::CloudRain => "cloud-rain",
            Icon::CloudDrizzle => "cloud-drizzle",
            Icon::CloudLightning => "cloud-lightning",
            Icon::Cloud => "cloud",
            Icon::Sun => "sun",
            Icon::Thermometer => "thermometer",
            Icon::ThermometerSnowflake => "thermometer-snowflake",
            Icon::Snowflake => "snowflake",
            Icon::Wind => "wind",
            Icon::HelpCircle => "help-circle",
        }
    }

    /// Single-glyph stand-in for terminals.
    pub fn symbol(&self) -> &'static str {
        match self {
            Icon::AlertOctagon => "!",
            Icon::AlertTriangle => "⚠",
            Icon::CheckCircle => "✓",
            Icon::Info => "ℹ",
            Icon::Droplet => "💧",
            Icon::Droplets => "💦",
            Icon::CloudRain => "🌧",
            Icon::CloudDrizzle => "🌦",
            Icon::CloudLightning => "⛈",
            Icon::Cloud => "☁",
            Icon::Sun => "☀",
            Icon::Thermometer => "🌡",
            Icon::ThermometerSnowflake => "🥶",
            Icon::Snowflake => "❄",
            Icon::Wind => "🌬",
            Icon::HelpCircle => "?",
        }
    }
}

impl std::fmt::Display for Icon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Colour family of a derived entry. Front ends pick the class pair,
/// terminals use `ui::theme`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Sky,
    Gray,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Red => "red",
            Tone::Orange => "orange",
            Tone::Yellow => "yellow",
            Tone::Green => "green",
            Tone::Blue => "blue",
            Tone::Sky => "sky",
            Tone::Gray => "gray",
        }
    }

    pub fn text_class(&self) -> &'static str {
        match self {
            Tone::Red => "text-red-600",
            Tone::Orange => "text-orange-600",
            Tone::Yellow => "text-yellow-600",
            Tone::Green => "text-green-600",
            Tone::Blue => "text-blue-600",
            Tone::Sky => "text-sky-600",
            Tone::Gray => "text-gray-600",
        }
    }

    pub fn bg_class(&self) -> &'static str {
        match self {
            Tone::Red => "bg-red-100",
            Tone::Orange => "bg-orange-100",
            Tone::Yellow => "bg-yellow-100",
            Tone::Green => "bg-green-100",
            Tone::Blue => "bg-blue-100",
            Tone::Sky => "bg-sky-100",
            Tone::Gray => "bg-gray-100",
        }
    }
}

impl std::fmt::Display for Tone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
