use crate::models::{IrrigationAction, IrrigationRecommendation, WeeklyIrrigationSchedule};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

/// Farm-wide counters shown above the field list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmSummary {
    pub total_fields: usize,
    pub fields_to_irrigate: usize,
    pub total_water_needed: f64,
    pub critical_field_count: usize,
}

/// Reduce a batch result to farm-wide counters. Order-independent; any
/// action other than `None` counts as needing irrigation.
pub fn summarize(recs: &[IrrigationRecommendation]) -> FarmSummary {
    recs.iter().fold(
        FarmSummary {
            total_fields: recs.len(),
            ..Default::default()
        },
        |mut summary, rec| {
            if rec.recommended_action.needs_irrigation() {
                summary.fields_to_irrigate += 1;
                summary.total_water_needed += rec.gross_irrigation_requirement;
            }
            if rec.recommended_action == IrrigationAction::VeryIntensive {
                summary.critical_field_count += 1;
            }
            summary
        },
    )
}

/// Lookup by field id. A field repeated in the batch keeps its last entry.
pub fn index_by_field(
    recs: &[IrrigationRecommendation],
) -> HashMap<i64, &IrrigationRecommendation> {
    recs.iter().map(|r| (r.field_id, r)).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekSummary {
    pub field_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// As reported by the backend.
    pub irrigation_days: u32,
    pub total_water_requirement: f64,
    pub total_expected_precipitation: f64,
    pub flagged_dates: Vec<NaiveDate>,
}

impl WeekSummary {
    /// True when the backend's count disagrees with its own daily flags.
    pub fn has_count_mismatch(&self) -> bool {
        self.flagged_dates.len() != self.irrigation_days as usize
    }
}

pub fn summarize_week(schedule: &WeeklyIrrigationSchedule) -> WeekSummary {
    let summary = WeekSummary {
        field_id: schedule.field_id,
        start_date: schedule.start_date,
        end_date: schedule.end_date,
        irrigation_days: schedule.irrigation_days,
        total_water_requirement: schedule.total_water_requirement,
        total_expected_precipitation: schedule.total_expected_precipitation,
        flagged_dates: schedule.irrigation_dates().collect(),
    };
    if summary.has_count_mismatch() {
        tracing::debug!(
            field_id = schedule.field_id,
            reported = summary.irrigation_days,
            flagged = summary.flagged_dates.len(),
            "Backend irrigation day count differs from daily flags"
        );
    }
    summary
}
