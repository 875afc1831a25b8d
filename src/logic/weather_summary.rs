use crate::models::{Icon, Tone};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::LazyLock;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedWeatherSummary {
    pub text: String,
    pub icon: Icon,
    pub tone: Tone,
}

/// Style for phrases the table does not know yet.
pub const DEFAULT_WEATHER_STYLE: (Icon, Tone) = (Icon::Cloud, Tone::Gray);

static WEATHER_STYLES: LazyLock<HashMap<&'static str, (Icon, Tone)>> = LazyLock::new(|| {
    HashMap::from([
        ("дуже спекотно", (Icon::Thermometer, Tone::Red)),
        ("спекотно", (Icon::Sun, Tone::Orange)),
        ("тепло", (Icon::Sun, Tone::Yellow)),
        ("сонячно", (Icon::Sun, Tone::Yellow)),
        ("помірна температура", (Icon::Thermometer, Tone::Green)),
        ("прохолодно", (Icon::ThermometerSnowflake, Tone::Sky)),
        ("холодно", (Icon::Snowflake, Tone::Blue)),
        ("заморозки", (Icon::Snowflake, Tone::Blue)),
        ("без опадів", (Icon::Sun, Tone::Yellow)),
        ("невеликий дощ", (Icon::CloudDrizzle, Tone::Sky)),
        ("дощ", (Icon::CloudRain, Tone::Blue)),
        ("сильний дощ", (Icon::CloudRain, Tone::Blue)),
        ("гроза", (Icon::CloudLightning, Tone::Orange)),
        ("хмарно", (Icon::Cloud, Tone::Gray)),
        ("вітряно", (Icon::Wind, Tone::Sky)),
        ("сильний вітер", (Icon::Wind, Tone::Orange)),
        ("висока вологість", (Icon::Droplets, Tone::Blue)),
        ("низька вологість", (Icon::Droplet, Tone::Orange)),
        ("посуха", (Icon::AlertTriangle, Tone::Red)),
    ])
});

/// Look up one phrase; matching ignores case and surrounding whitespace.
pub fn weather_style(phrase: &str) -> (Icon, Tone) {
    WEATHER_STYLES
        .get(phrase.trim().to_lowercase().as_str())
        .copied()
        .unwrap_or(DEFAULT_WEATHER_STYLE)
}

fn capitalize_first(line: &str) -> String {
    let mut chars = line.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// One styled entry per non-blank line of a daily weather summary.
pub fn parse_weather_summary(summary: &str) -> Vec<ParsedWeatherSummary> {
    summary
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let (icon, tone) = weather_style(line);
            ParsedWeatherSummary {
                text: capitalize_first(line),
                icon,
                tone,
            }
        })
        .collect()
}
