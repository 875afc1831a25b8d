use chrono::NaiveDate;
use fieldops::cache::{CacheKey, CacheStore, MemoryCacheStore};
use fieldops::datasources::{BatchRequest, RecommendationQuery, RecommendationSource};
use fieldops::error::{FieldOpsError, Result};
use fieldops::logic::summary::summarize_week;
use fieldops::logic::{parse_notes, IrrigationService, LoadState, NoteKind};
use fieldops::models::{IrrigationAction, IrrigationRecommendation, WeeklyIrrigationSchedule};
use serde_json::json;
use std::sync::Arc;

/// Serves canned backend JSON so the whole decode path is exercised.
struct CannedBackend;

fn recommendation_json(field_id: i64, action: &str, gross: f64) -> serde_json::Value {
    json!({
        "fieldId": field_id,
        "fieldName": format!("Поле {}", field_id),
        "date": "2024-07-15T00:00:00",
        "eT0": 5.1,
        "kc": 1.05,
        "eTc": 5.36,
        "precipitation": 0.0,
        "effectivePrecipitation": 0.0,
        "netIrrigationRequirement": gross * 0.85,
        "grossIrrigationRequirement": gross,
        "soilMoisture": 0.31,
        "recommendedAction": action,
        "cropStage": "Вегетація",
        "notes": "Критично: дефіцит води. Орієнтовно потрібно 25 мм",
        "weatherConditions": null
    })
}

impl RecommendationSource for CannedBackend {
    async fn recommendation(
        &self,
        field_id: i64,
        _query: RecommendationQuery,
    ) -> Result<IrrigationRecommendation> {
        if field_id == 404 {
            return Err(FieldOpsError::from_status(404, String::new(), "recommendation"));
        }
        Ok(serde_json::from_value(recommendation_json(
            field_id,
            "Помірне зрошення рекомендовано",
            12.0,
        ))?)
    }

    async fn batch(&self, request: BatchRequest) -> Result<Vec<IrrigationRecommendation>> {
        let payload: Vec<serde_json::Value> = request
            .field_ids
            .iter()
            .map(|id| match id {
                2 => recommendation_json(*id, "Дуже інтенсивне зрошення рекомендовано", 27.4),
                _ => recommendation_json(*id, "Не потрібно зрошення", 3.0),
            })
            .collect();
        Ok(serde_json::from_value(serde_json::Value::Array(payload))?)
    }

    async fn weekly_schedule(
        &self,
        field_id: i64,
        _start_date: Option<NaiveDate>,
    ) -> Result<WeeklyIrrigationSchedule> {
        let flags = [true, false, false, true, false, true, false];
        let days: Vec<serde_json::Value> = flags
            .iter()
            .enumerate()
            .map(|(i, irrigate)| {
                let (net, gross) = if *irrigate { (10.0, 12.5) } else { (0.0, 0.0) };
                json!({
                    "date": format!("2024-07-{:02}T00:00:00", 15 + i),
                    "dayOfWeek": "",
                    "eT0": 5.0,
                    "eTc": 5.5,
                    "precipitation": 0.0,
                    "netIrrigationRequired": net,
                    "grossIrrigationRequired": gross,
                    "soilMoisture": 0.3,
                    "shouldIrrigate": irrigate,
                    "recommendedTime": "05:00-08:00",
                    "weatherSummary": "Спекотно\nВітряно"
                })
            })
            .collect();

        Ok(serde_json::from_value(json!({
            "fieldId": field_id,
            "fieldName": "Південне",
            "cropType": 1,
            "startDate": "2024-07-15",
            "endDate": "2024-07-21",
            "dailySchedule": days,
            "totalWaterRequirement": 37.5,
            "totalExpectedPrecipitation": 0.0,
            "irrigationDays": 3,
            "recommendations": "Вологість ґрунту в нормі"
        }))?)
    }
}

fn service() -> IrrigationService<CannedBackend, MemoryCacheStore> {
    IrrigationService::new(Arc::new(CannedBackend), Arc::new(MemoryCacheStore::new()))
}

#[tokio::test]
async fn dashboard_counts_one_critical_field() {
    let service = service();
    let dashboard = service
        .dashboard(BatchRequest::new(vec![1, 2, 3]))
        .await
        .unwrap();

    assert_eq!(dashboard.summary.total_fields, 3);
    assert_eq!(dashboard.summary.fields_to_irrigate, 1);
    assert_eq!(dashboard.summary.critical_field_count, 1);
    assert_eq!(dashboard.summary.total_water_needed, 27.4);

    let critical = &dashboard.recommendations[1];
    assert_eq!(critical.recommended_action, IrrigationAction::VeryIntensive);
    assert!(!critical.recommended_action.style().is_unknown());
}

#[tokio::test]
async fn weekly_day_count_comes_from_backend() {
    let service = service();
    let week = service.weekly_schedule(3, None).await.unwrap();

    assert_eq!(week.daily_schedule.len(), 7);
    assert!(week.check_calendar().is_ok());
    assert_eq!(week.crop_type, "Corn");

    let summary = summarize_week(&week);
    assert_eq!(summary.irrigation_days, 3);
    assert_eq!(summary.flagged_dates.len(), 3);
}

#[tokio::test]
async fn notes_from_fetched_recommendation_are_classified() {
    let service = service();
    let rec = service
        .recommendation(5, RecommendationQuery::default())
        .await
        .unwrap();

    let kinds: Vec<NoteKind> = parse_notes(&rec.notes).map(|n| n.kind).collect();
    assert_eq!(kinds, vec![NoteKind::Critical, NoteKind::Info]);
    assert_eq!(rec.weather_conditions.temperature, 0.0);
}

#[tokio::test]
async fn not_found_surfaces_and_is_recorded() {
    let service = service();
    let query = RecommendationQuery::default();
    let err = service.recommendation(404, query).await.unwrap_err();
    assert!(matches!(err, FieldOpsError::NotFound(_)));
    assert!(matches!(
        service.load_state(&CacheKey::recommendation(404, query)),
        LoadState::Failed(_)
    ));
    assert!(service.cache().keys().unwrap().is_empty());
}
