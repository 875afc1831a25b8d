use super::dates::{iso_date, null_as_default, RawEnum};
use super::field::CROP_TYPES;
use crate::error::{FieldOpsError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySchedule {
    #[serde(with = "iso_date")]
    pub date: NaiveDate,
    #[serde(default, deserialize_with = "null_as_default")]
    pub day_of_week: String,
    #[serde(rename = "eT0", default)]
    pub et0: f64,
    #[serde(rename = "eTc", default)]
    pub etc: f64,
    #[serde(default)]
    pub precipitation: f64,
    #[serde(default, alias = "netIrrigationRequirement")]
    pub net_irrigation_required: f64,
    #[serde(default, alias = "grossIrrigationRequirement")]
    pub gross_irrigation_required: f64,
    #[serde(default)]
    pub soil_moisture: f64,
    #[serde(default)]
    pub should_irrigate: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub recommended_time: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub weather_summary: String,
}

/// Seven-day (or other inclusive range) irrigation plan for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyIrrigationSchedule {
    pub field_id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub field_name: String,
    #[serde(default, deserialize_with = "crop_type_label")]
    pub crop_type: String,
    #[serde(with = "iso_date")]
    pub start_date: NaiveDate,
    #[serde(with = "iso_date")]
    pub end_date: NaiveDate,
    #[serde(default, deserialize_with = "null_as_default")]
    pub daily_schedule: Vec<DailySchedule>,
    #[serde(default)]
    pub total_water_requirement: f64,
    #[serde(default)]
    pub total_expected_precipitation: f64,
    /// Server-computed; the client never recounts it.
    #[serde(default)]
    pub irrigation_days: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub recommendations: String,
}

fn crop_type_label<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawEnum>::deserialize(deserializer)?
        .map(|raw| raw.into_label(CROP_TYPES))
        .unwrap_or_default())
}

impl WeeklyIrrigationSchedule {
    /// The daily entries must cover every day from start to end exactly once,
    /// in order.
    pub fn check_calendar(&self) -> Result<()> {
        if self.end_date < self.start_date {
            return Err(FieldOpsError::InvalidData(format!(
                "schedule for field {} ends ({}) before it starts ({})",
                self.field_id, self.end_date, self.start_date
            )));
        }

        let mut expected = self.start_date;
        for day in &self.daily_schedule {
            if day.date != expected {
                return Err(FieldOpsError::InvalidData(format!(
                    "schedule for field {} expected {} but found {}",
                    self.field_id, expected, day.date
                )));
            }
            expected = expected.succ_opt().ok_or_else(|| {
                FieldOpsError::InvalidData("schedule runs past the calendar".into())
            })?;
        }

        let covered_through = expected.pred_opt().unwrap_or(expected);
        if self.daily_schedule.is_empty() || covered_through != self.end_date {
            return Err(FieldOpsError::InvalidData(format!(
                "schedule for field {} does not reach its end date {}",
                self.field_id, self.end_date
            )));
        }
        Ok(())
    }

    /// Days the backend flagged for irrigation, in schedule order.
    pub fn irrigation_dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.daily_schedule
            .iter()
            .filter(|d| d.should_irrigate)
            .map(|d| d.date)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_week(start: NaiveDate, irrigate: &[bool]) -> WeeklyIrrigationSchedule {
        let daily_schedule: Vec<DailySchedule> = irrigate
            .iter()
            .enumerate()
            .map(|(i, should)| {
                let date = start + chrono::Duration::days(i as i64);
                DailySchedule {
                    date,
                    day_of_week: date.format("%A").to_string(),
                    et0: 5.0,
                    etc: 5.5,
                    precipitation: 0.0,
                    net_irrigation_required: if *should { 12.0 } else { 0.0 },
                    gross_irrigation_required: if *should { 15.0 } else { 0.0 },
                    soil_moisture: 0.4,
                    should_irrigate: *should,
                    recommended_time: "06:00-09:00".into(),
                    weather_summary: "Спекотно\nБез опадів".into(),
                }
            })
            .collect();
        let end_date = start + chrono::Duration::days(irrigate.len().max(1) as i64 - 1);
        WeeklyIrrigationSchedule {
            field_id: 3,
            field_name: "Південне".into(),
            crop_type: "Corn".into(),
            start_date: start,
            end_date,
            daily_schedule,
            total_water_requirement: 45.0,
            total_expected_precipitation: 0.0,
            irrigation_days: irrigate.iter().filter(|s| **s).count() as u32,
            recommendations: String::new(),
        }
    }

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 15).unwrap()
    }

    #[test]
    fn deserializes_with_ordinal_crop_type() {
        let json = r#"{
            "fieldId": 3,
            "fieldName": "Південне",
            "cropType": 1,
            "startDate": "2024-07-15T00:00:00",
            "endDate": "2024-07-16T00:00:00",
            "dailySchedule": [
                {"date": "2024-07-15", "dayOfWeek": "Понеділок", "eT0": 5.0, "eTc": 5.5,
                 "precipitation": 0, "netIrrigationRequired": 10, "grossIrrigationRequired": 12.5,
                 "soilMoisture": 0.35, "shouldIrrigate": true, "recommendedTime": "06:00",
                 "weatherSummary": "Дуже спекотно\nВітряно"},
                {"date": "2024-07-16", "dayOfWeek": "Вівторок", "eT0": 4.0, "eTc": 4.4,
                 "precipitation": 6, "netIrrigationRequired": 0, "grossIrrigationRequired": 0,
                 "soilMoisture": 0.45, "shouldIrrigate": false, "recommendedTime": null,
                 "weatherSummary": "Сильний дощ"}
            ],
            "totalWaterRequirement": 12.5,
            "totalExpectedPrecipitation": 6,
            "irrigationDays": 1,
            "recommendations": "Поливати зранку"
        }"#;
        let week: WeeklyIrrigationSchedule = serde_json::from_str(json).unwrap();
        assert_eq!(week.crop_type, CROP_TYPES[1]);
        assert_eq!(week.daily_schedule.len(), 2);
        assert_eq!(week.daily_schedule[1].recommended_time, "");
        assert_eq!(week.irrigation_days, 1);
        assert!(week.check_calendar().is_ok());
    }

    #[test]
    fn string_crop_type_kept() {
        let json = r#"{"fieldId": 1, "cropType": "Соняшник",
            "startDate": "2024-07-15", "endDate": "2024-07-15"}"#;
        let week: WeeklyIrrigationSchedule = serde_json::from_str(json).unwrap();
        assert_eq!(week.crop_type, "Соняшник");
        assert!(week.daily_schedule.is_empty());
    }

    #[test]
    fn calendar_accepts_full_week() {
        let week = sample_week(monday(), &[true, false, true, false, false, true, false]);
        assert!(week.check_calendar().is_ok());
        assert_eq!(week.irrigation_dates().count(), 3);
    }

    #[test]
    fn calendar_rejects_gap() {
        let mut week = sample_week(monday(), &[false; 7]);
        week.daily_schedule.remove(3);
        assert!(week.check_calendar().is_err());
    }

    #[test]
    fn calendar_rejects_duplicate() {
        let mut week = sample_week(monday(), &[false; 7]);
        week.daily_schedule[2].date = week.daily_schedule[1].date;
        assert!(week.check_calendar().is_err());
    }

    #[test]
    fn calendar_rejects_short_range() {
        let mut week = sample_week(monday(), &[false; 7]);
        week.daily_schedule.pop();
        assert!(week.check_calendar().is_err());
    }

    #[test]
    fn irrigation_dates_follow_flags() {
        let week = sample_week(monday(), &[false, true, false, true]);
        let dates: Vec<NaiveDate> = week.irrigation_dates().collect();
        assert_eq!(
            dates,
            vec![
                monday() + chrono::Duration::days(1),
                monday() + chrono::Duration::days(3)
            ]
        );
    }
}
