pub mod api;
pub mod fields;
pub mod irrigation;

pub use api::ApiClient;
pub use fields::FieldsClient;
pub use irrigation::IrrigationClient;

use crate::error::Result;
use crate::models::{IrrigationRecommendation, WeeklyIrrigationSchedule};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Options for a single-field recommendation fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecommendationQuery {
    pub include_forecast: bool,
    pub forecast_days: u32,
}

impl Default for RecommendationQuery {
    fn default() -> Self {
        Self {
            include_forecast: true,
            forecast_days: 7,
        }
    }
}

/// Fields to fetch in one batch, optionally for a specific day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequest {
    pub field_ids: Vec<i64>,
    pub date: Option<NaiveDate>,
}

impl BatchRequest {
    pub fn new(field_ids: Vec<i64>) -> Self {
        Self {
            field_ids,
            date: None,
        }
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }
}

/// Where recommendations come from. Implemented by the HTTP client and by
/// test fakes.
pub trait RecommendationSource: Send + Sync + 'static {
    fn recommendation(
        &self,
        field_id: i64,
        query: RecommendationQuery,
    ) -> impl Future<Output = Result<IrrigationRecommendation>> + Send;

    fn batch(
        &self,
        request: BatchRequest,
    ) -> impl Future<Output = Result<Vec<IrrigationRecommendation>>> + Send;

    fn weekly_schedule(
        &self,
        field_id: i64,
        start_date: Option<NaiveDate>,
    ) -> impl Future<Output = Result<WeeklyIrrigationSchedule>> + Send;
}
