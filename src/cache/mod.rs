//! Keyed store for the last successfully fetched irrigation data.
//!
//! Entries live until they are replaced or explicitly invalidated; there is
//! no TTL. Undated requests are keyed by the day they were made on, and the
//! SQLite store drops entries written on earlier days when the CLI opens it.
//! Writing a per-field entry marks every batch entry that covers the same
//! field stale so the next batch read refetches.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryCacheStore;

use crate::datasources::{BatchRequest, RecommendationQuery};
use crate::error::Result;
use crate::models::{IrrigationRecommendation, WeeklyIrrigationSchedule};
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Recommendation,
    Batch,
    WeeklySchedule,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Recommendation => "recommendation",
            ResourceKind::Batch => "batch",
            ResourceKind::WeeklySchedule => "weekly",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Composite key: resource type, field id, the day the data applies to and,
/// for batches, the signature of the requested field set.
///
/// Requests without an explicit date are keyed by the local calendar day they
/// were made on, so a persisted "today" entry is never served on a later day.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CacheKey {
    Recommendation {
        field_id: i64,
        include_forecast: bool,
        forecast_days: u32,
        day: NaiveDate,
    },
    Batch {
        /// Sorted and deduplicated.
        field_ids: Vec<i64>,
        date: NaiveDate,
    },
    WeeklySchedule {
        field_id: i64,
        start_date: NaiveDate,
    },
}

/// Local calendar day used for requests that leave the date to the backend.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

impl CacheKey {
    pub fn recommendation(field_id: i64, query: RecommendationQuery) -> Self {
        Self::recommendation_on(field_id, query, today())
    }

    pub fn recommendation_on(field_id: i64, query: RecommendationQuery, day: NaiveDate) -> Self {
        CacheKey::Recommendation {
            field_id,
            include_forecast: query.include_forecast,
            forecast_days: query.forecast_days,
            day,
        }
    }

    pub fn batch(request: &BatchRequest) -> Self {
        let mut field_ids = request.field_ids.clone();
        field_ids.sort_unstable();
        field_ids.dedup();
        CacheKey::Batch {
            field_ids,
            date: request.date.unwrap_or_else(today),
        }
    }

    pub fn weekly(field_id: i64, start_date: Option<NaiveDate>) -> Self {
        CacheKey::WeeklySchedule {
            field_id,
            start_date: start_date.unwrap_or_else(today),
        }
    }

    pub fn resource(&self) -> ResourceKind {
        match self {
            CacheKey::Recommendation { .. } => ResourceKind::Recommendation,
            CacheKey::Batch { .. } => ResourceKind::Batch,
            CacheKey::WeeklySchedule { .. } => ResourceKind::WeeklySchedule,
        }
    }

    pub fn covers_field(&self, id: i64) -> bool {
        match self {
            CacheKey::Recommendation { field_id, .. }
            | CacheKey::WeeklySchedule { field_id, .. } => *field_id == id,
            CacheKey::Batch { field_ids, .. } => field_ids.binary_search(&id).is_ok(),
        }
    }

    /// Stable textual form, used as the primary key of persisted entries.
    pub fn storage_key(&self) -> String {
        match self {
            CacheKey::Recommendation {
                field_id,
                include_forecast,
                forecast_days,
                day,
            } => format!(
                "recommendation:{}:forecast={}:days={}:day={}",
                field_id,
                include_forecast,
                forecast_days,
                day.format("%Y-%m-%d")
            ),
            CacheKey::Batch { field_ids, date } => {
                let ids: Vec<String> = field_ids.iter().map(|id| id.to_string()).collect();
                format!("batch:{}:date={}", ids.join(","), date.format("%Y-%m-%d"))
            }
            CacheKey::WeeklySchedule {
                field_id,
                start_date,
            } => format!("weekly:{}:start={}", field_id, start_date.format("%Y-%m-%d")),
        }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.storage_key())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum CachedValue {
    Recommendation(IrrigationRecommendation),
    Batch(Vec<IrrigationRecommendation>),
    WeeklySchedule(WeeklyIrrigationSchedule),
}

impl CachedValue {
    pub fn into_recommendation(self) -> Option<IrrigationRecommendation> {
        match self {
            CachedValue::Recommendation(rec) => Some(rec),
            _ => None,
        }
    }

    pub fn into_batch(self) -> Option<Vec<IrrigationRecommendation>> {
        match self {
            CachedValue::Batch(recs) => Some(recs),
            _ => None,
        }
    }

    pub fn into_weekly(self) -> Option<WeeklyIrrigationSchedule> {
        match self {
            CachedValue::WeeklySchedule(week) => Some(week),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub value: CachedValue,
    pub stale: bool,
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn fresh(value: CachedValue) -> Self {
        Self {
            value,
            stale: false,
            stored_at: Utc::now(),
        }
    }
}

/// Storage seam for fetched values. Implementations must replace entries
/// atomically: a reader sees either the old or the new value.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>>;

    fn set(&self, key: CacheKey, value: CachedValue) -> Result<()>;

    fn invalidate(&self, key: &CacheKey) -> Result<()>;

    /// Keep the value but force the next read to refetch.
    fn mark_stale(&self, key: &CacheKey) -> Result<()>;

    fn keys(&self) -> Result<Vec<CacheKey>>;

    fn clear(&self) -> Result<()>;
}
