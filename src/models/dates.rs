//! Boundary conversions for the backend's JSON quirks: ISO date strings that
//! may carry a time part, nullable strings, and enumerations that arrive as
//! either a name or an ordinal.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serializer};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse `2024-06-01`, `2024-06-01T00:00:00`, `2024-06-01T00:00:00Z` or any
/// other ISO-8601 form that starts with a calendar date.
pub fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let date_part = s.get(..10)?;
    let rest = &s[10..];
    if !(rest.is_empty() || rest.starts_with('T') || rest.starts_with(' ')) {
        return None;
    }
    NaiveDate::parse_from_str(date_part, DATE_FORMAT).ok()
}

pub fn format_iso_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// `#[serde(with = "iso_date")]`
pub mod iso_date {
    use super::*;

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_iso_date(*date))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;
        let value = String::deserialize(deserializer)?;
        parse_iso_date(&value)
            .ok_or_else(|| D::Error::custom(format!("invalid ISO date '{}'", value)))
    }
}

/// Treat an explicit JSON `null` like a missing field.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// An enumeration value as the backend sends it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawEnum {
    Ordinal(i64),
    Name(String),
}

impl RawEnum {
    /// Canonical label for this value: names are trimmed, ordinals are looked
    /// up in `table` and fall back to their decimal form.
    pub fn into_label(self, table: &[&str]) -> String {
        match self {
            RawEnum::Name(name) => name.trim().to_string(),
            RawEnum::Ordinal(index) => usize::try_from(index)
                .ok()
                .and_then(|i| table.get(i))
                .map(|name| name.to_string())
                .unwrap_or_else(|| index.to_string()),
        }
    }
}
