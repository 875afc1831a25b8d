use crate::models::{IrrigationRecommendation, WeeklyIrrigationSchedule};
use chrono::NaiveDate;
use serde::Serialize;

/// One day of a water-balance chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPoint {
    pub date: NaiveDate,
    /// Short axis label, e.g. "15.07".
    pub label: String,
    pub et0: f64,
    pub etc: f64,
    pub precipitation: f64,
    pub net: f64,
    pub gross: f64,
}

fn axis_label(date: NaiveDate) -> String {
    date.format("%d.%m").to_string()
}

/// Chart points for a recommendation's forecast window. Empty when the
/// forecast was not requested.
pub fn forecast_series(rec: &IrrigationRecommendation) -> Vec<ForecastPoint> {
    rec.forecast_days()
        .iter()
        .map(|f| ForecastPoint {
            date: f.date,
            label: axis_label(f.date),
            et0: f.et0,
            etc: f.etc,
            precipitation: f.expected_precipitation,
            net: f.net_irrigation_requirement,
            gross: f.gross_irrigation_requirement,
        })
        .collect()
}

pub fn schedule_series(schedule: &WeeklyIrrigationSchedule) -> Vec<ForecastPoint> {
    schedule
        .daily_schedule
        .iter()
        .map(|d| ForecastPoint {
            date: d.date,
            label: axis_label(d.date),
            et0: d.et0,
            etc: d.etc,
            precipitation: d.precipitation,
            net: d.net_irrigation_required,
            gross: d.gross_irrigation_required,
        })
        .collect()
}

/// Day with the highest crop water use (eTc). Earliest day wins ties.
pub fn peak_demand(points: &[ForecastPoint]) -> Option<&ForecastPoint> {
    points.iter().fold(None, |best: Option<&ForecastPoint>, p| match best {
        Some(b) if b.etc >= p.etc => Some(b),
        _ => Some(p),
    })
}
