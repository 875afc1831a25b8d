use super::api::ApiClient;
use super::{BatchRequest, RecommendationQuery, RecommendationSource};
use crate::error::{FieldOpsError, Result};
use crate::models::dates::format_iso_date;
use crate::models::{IrrigationRecommendation, WeeklyIrrigationSchedule};
use chrono::NaiveDate;
use reqwest::Request;
use serde::Serialize;

/// Client for the backend's `irrigation/*` endpoints.
#[derive(Clone)]
pub struct IrrigationClient {
    api: ApiClient,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchBody<'a> {
    field_ids: &'a [i64],
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<String>,
}

fn validate_field_id(field_id: i64) -> Result<()> {
    if field_id <= 0 {
        return Err(FieldOpsError::Validation(format!(
            "field id must be positive, got {}",
            field_id
        )));
    }
    Ok(())
}

impl IrrigationClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn recommendation_request(
        &self,
        field_id: i64,
        query: RecommendationQuery,
    ) -> Result<Request> {
        validate_field_id(field_id)?;
        let url = self.api.endpoint(
            &format!("irrigation/getRecommendation/{}", field_id),
            &[
                ("includeForecast", query.include_forecast.to_string()),
                ("forecastDays", query.forecast_days.to_string()),
            ],
        )?;
        self.api.get_request(url)
    }

    pub fn batch_request(&self, request: &BatchRequest) -> Result<Request> {
        if request.field_ids.is_empty() {
            return Err(FieldOpsError::Validation(
                "batch request needs at least one field id".into(),
            ));
        }
        for id in &request.field_ids {
            validate_field_id(*id)?;
        }

        let url = self.api.endpoint("irrigation/getBatchRecommendations", &[])?;
        let body = BatchBody {
            field_ids: &request.field_ids,
            date: request.date.map(format_iso_date),
        };
        self.api.post_json_request(url, &body)
    }

    pub fn weekly_request(&self, field_id: i64, start_date: Option<NaiveDate>) -> Result<Request> {
        validate_field_id(field_id)?;
        let query: Vec<(&str, String)> = start_date
            .map(|d| ("startDate", format_iso_date(d)))
            .into_iter()
            .collect();
        let url = self.api.endpoint(
            &format!("irrigation/getWeeklySchedule/{}", field_id),
            &query,
        )?;
        self.api.get_request(url)
    }
}

impl RecommendationSource for IrrigationClient {
    async fn recommendation(
        &self,
        field_id: i64,
        query: RecommendationQuery,
    ) -> Result<IrrigationRecommendation> {
        let request = self.recommendation_request(field_id, query)?;
        tracing::info!(field_id, ?query, "Fetching irrigation recommendation");
        let rec: IrrigationRecommendation = self
            .api
            .send_json(request, &format!("recommendation for field {}", field_id))
            .await?;
        if let Err(e) = rec.check_forecast_order() {
            tracing::warn!(field_id, error = %e, "Recommendation forecast out of order");
        }
        Ok(rec)
    }

    async fn batch(&self, request: BatchRequest) -> Result<Vec<IrrigationRecommendation>> {
        let http_request = self.batch_request(&request)?;
        tracing::info!(fields = request.field_ids.len(), date = ?request.date, "Fetching batch recommendations");
        let recs: Vec<IrrigationRecommendation> = self
            .api
            .send_json(http_request, "batch recommendations")
            .await?;
        for rec in &recs {
            if let Err(e) = rec.check_forecast_order() {
                tracing::warn!(field_id = rec.field_id, error = %e, "Recommendation forecast out of order");
            }
        }
        Ok(recs)
    }

    async fn weekly_schedule(
        &self,
        field_id: i64,
        start_date: Option<NaiveDate>,
    ) -> Result<WeeklyIrrigationSchedule> {
        let request = self.weekly_request(field_id, start_date)?;
        tracing::info!(field_id, start_date = ?start_date, "Fetching weekly irrigation schedule");
        let week: WeeklyIrrigationSchedule = self
            .api
            .send_json(request, &format!("weekly schedule for field {}", field_id))
            .await?;
        if let Err(e) = week.check_calendar() {
            tracing::warn!(field_id, error = %e, "Weekly schedule calendar is inconsistent");
        }
        Ok(week)
    }
}
