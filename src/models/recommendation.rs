use super::dates::{iso_date, null_as_default, RawEnum};
use crate::error::{FieldOpsError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Irrigation intensity the backend recommends for a field.
///
/// The backend sends either the Ukrainian phrase or the ordinal index of its
/// enumeration; both normalise here so nothing downstream re-checks the shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IrrigationAction {
    None,
    Light,
    Medium,
    Intensive,
    VeryIntensive,
    /// Anything the backend added after this client was built.
    Unrecognized(String),
}

impl IrrigationAction {
    pub const ALL: [IrrigationAction; 5] = [
        IrrigationAction::None,
        IrrigationAction::Light,
        IrrigationAction::Medium,
        IrrigationAction::Intensive,
        IrrigationAction::VeryIntensive,
    ];

    /// Canonical phrase as emitted by the backend; `None` for unrecognized
    /// values.
    pub fn phrase(&self) -> Option<&'static str> {
        match self {
            IrrigationAction::None => Some("Не потрібно зрошення"),
            IrrigationAction::Light => Some("Легке зрошення рекомендовано"),
            IrrigationAction::Medium => Some("Помірне зрошення рекомендовано"),
            IrrigationAction::Intensive => Some("Інтенсивне зрошення рекомендовано"),
            IrrigationAction::VeryIntensive => Some("Дуже інтенсивне зрошення рекомендовано"),
            IrrigationAction::Unrecognized(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            IrrigationAction::Unrecognized(raw) => raw,
            known => known.phrase().unwrap_or_default(),
        }
    }

    pub fn from_str(s: &str) -> Self {
        let trimmed = s.trim();
        let lowered = trimmed.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|action| action.as_str().to_lowercase() == lowered)
            .or_else(|| match lowered.as_str() {
                "none" => Some(IrrigationAction::None),
                "light" => Some(IrrigationAction::Light),
                "medium" => Some(IrrigationAction::Medium),
                "intensive" => Some(IrrigationAction::Intensive),
                "veryintensive" | "very_intensive" | "very-intensive" => {
                    Some(IrrigationAction::VeryIntensive)
                }
                _ => None,
            })
            .unwrap_or_else(|| IrrigationAction::Unrecognized(trimmed.to_string()))
    }

    pub fn from_ordinal(index: i64) -> Self {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).cloned())
            .unwrap_or_else(|| IrrigationAction::Unrecognized(index.to_string()))
    }

    pub fn needs_irrigation(&self) -> bool {
        *self != IrrigationAction::None
    }
}

impl std::fmt::Display for IrrigationAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for IrrigationAction {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for IrrigationAction {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match RawEnum::deserialize(deserializer)? {
            RawEnum::Ordinal(index) => IrrigationAction::from_ordinal(index),
            RawEnum::Name(name) => IrrigationAction::from_str(&name),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WeatherConditions {
    pub temperature: f64,
    pub min_temperature: f64,
    pub max_temperature: f64,
    pub relative_humidity: f64,
    pub wind_speed: f64,
    pub solar_radiation: f64,
    pub precipitation: f64,
}

/// One day of the backend's irrigation forecast window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrrigationForecast {
    #[serde(with = "iso_date")]
    pub date: NaiveDate,
    #[serde(rename = "eT0", default)]
    pub et0: f64,
    #[serde(rename = "eTc", default)]
    pub etc: f64,
    #[serde(default)]
    pub expected_precipitation: f64,
    #[serde(default)]
    pub net_irrigation_requirement: f64,
    #[serde(default)]
    pub gross_irrigation_requirement: f64,
}

/// Per-field, per-day irrigation advice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrrigationRecommendation {
    pub field_id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub field_name: String,
    #[serde(with = "iso_date")]
    pub date: NaiveDate,
    #[serde(rename = "eT0", default)]
    pub et0: f64,
    #[serde(default)]
    pub kc: f64,
    #[serde(rename = "eTc", default)]
    pub etc: f64,
    #[serde(default)]
    pub precipitation: f64,
    #[serde(default)]
    pub effective_precipitation: f64,
    #[serde(default)]
    pub net_irrigation_requirement: f64,
    #[serde(default)]
    pub gross_irrigation_requirement: f64,
    #[serde(default, alias = "currentSoilMoisture")]
    pub soil_moisture: f64,
    pub recommended_action: IrrigationAction,
    #[serde(default, deserialize_with = "null_as_default")]
    pub crop_stage: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub weather_conditions: WeatherConditions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast: Option<Vec<IrrigationForecast>>,
}

impl IrrigationRecommendation {
    /// Forecast days must be strictly ascending.
    pub fn check_forecast_order(&self) -> Result<()> {
        let Some(forecast) = &self.forecast else {
            return Ok(());
        };
        for pair in forecast.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(FieldOpsError::InvalidData(format!(
                    "forecast for field {} is not strictly ascending at {}",
                    self.field_id, pair[1].date
                )));
            }
        }
        Ok(())
    }

    pub fn forecast_days(&self) -> &[IrrigationForecast] {
        self.forecast.as_deref().unwrap_or_default()
    }
}
