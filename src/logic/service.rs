use super::sequencer::RequestSequencer;
use super::summary::{summarize, FarmSummary};
use crate::cache::{CacheEntry, CacheKey, CacheStore, CachedValue, ResourceKind};
use crate::datasources::{BatchRequest, RecommendationQuery, RecommendationSource};
use crate::error::{FieldOpsError, Result};
use crate::models::{IrrigationRecommendation, WeeklyIrrigationSchedule};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{ready, Context, Poll};
use tokio::task::JoinHandle;

/// Where a cached resource is in its fetch lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Ready,
    Failed(String),
}

impl LoadState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadState::Idle => "idle",
            LoadState::Loading => "loading",
            LoadState::Ready => "ready",
            LoadState::Failed(_) => "failed",
        }
    }
}

impl std::fmt::Display for LoadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadState::Failed(reason) => write!(f, "failed: {}", reason),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

/// Owns a spawned fetch. Cancelling or dropping the handle aborts the
/// request; an aborted fetch never writes the cache.
#[derive(Debug)]
pub struct FetchHandle<T> {
    task: Option<JoinHandle<Result<T>>>,
}

impl<T> FetchHandle<T> {
    fn new(task: JoinHandle<Result<T>>) -> Self {
        Self { task: Some(task) }
    }

    pub fn cancel(&self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }

    pub async fn join(self) -> Result<T> {
        self.await
    }
}

impl<T> Future for FetchHandle<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let Some(task) = self.task.as_mut() else {
            return Poll::Ready(Err(FieldOpsError::Cancelled));
        };
        let output = ready!(Pin::new(task).poll(cx));
        self.task = None;
        Poll::Ready(match output {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(FieldOpsError::Cancelled),
            Err(e) => Err(FieldOpsError::Task(e.to_string())),
        })
    }
}

impl<T> Drop for FetchHandle<T> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Farm overview built from one batch fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub recommendations: Vec<IrrigationRecommendation>,
    pub summary: FarmSummary,
}

/// Couples a recommendation source with a cache. Reads are served from the
/// cache while the entry is fresh; every fetch goes through the sequencer so
/// a superseded response is returned to its caller but never cached.
pub struct IrrigationService<S, C: ?Sized = dyn CacheStore> {
    source: Arc<S>,
    cache: Arc<C>,
    sequencer: Arc<RequestSequencer>,
    failures: Arc<Mutex<HashMap<CacheKey, String>>>,
}

impl<S, C: ?Sized> Clone for IrrigationService<S, C> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            cache: Arc::clone(&self.cache),
            sequencer: Arc::clone(&self.sequencer),
            failures: Arc::clone(&self.failures),
        }
    }
}

impl<S, C> IrrigationService<S, C>
where
    S: RecommendationSource,
    C: CacheStore + ?Sized + 'static,
{
    pub fn new(source: Arc<S>, cache: Arc<C>) -> Self {
        Self {
            source,
            cache,
            sequencer: RequestSequencer::new(),
            failures: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub async fn recommendation(
        &self,
        field_id: i64,
        query: RecommendationQuery,
    ) -> Result<IrrigationRecommendation> {
        let key = CacheKey::recommendation(field_id, query);
        if let Some(rec) = self.cached(&key).and_then(CachedValue::into_recommendation) {
            tracing::debug!(%key, "Serving recommendation from cache");
            return Ok(rec);
        }
        self.refresh_recommendation(field_id, query).await
    }

    pub async fn refresh_recommendation(
        &self,
        field_id: i64,
        query: RecommendationQuery,
    ) -> Result<IrrigationRecommendation> {
        let key = CacheKey::recommendation(field_id, query);
        self.fetch(
            key,
            self.source.recommendation(field_id, query),
            CachedValue::Recommendation,
        )
        .await
    }

    pub async fn batch(&self, request: BatchRequest) -> Result<Vec<IrrigationRecommendation>> {
        let key = CacheKey::batch(&request);
        if let Some(recs) = self.cached(&key).and_then(CachedValue::into_batch) {
            tracing::debug!(%key, "Serving batch from cache");
            return Ok(recs);
        }
        self.refresh_batch(request).await
    }

    pub async fn refresh_batch(
        &self,
        request: BatchRequest,
    ) -> Result<Vec<IrrigationRecommendation>> {
        let key = CacheKey::batch(&request);
        self.fetch(key, self.source.batch(request), CachedValue::Batch)
            .await
    }

    pub async fn weekly_schedule(
        &self,
        field_id: i64,
        start_date: Option<NaiveDate>,
    ) -> Result<WeeklyIrrigationSchedule> {
        let key = CacheKey::weekly(field_id, start_date);
        if let Some(week) = self.cached(&key).and_then(CachedValue::into_weekly) {
            tracing::debug!(%key, "Serving weekly schedule from cache");
            return Ok(week);
        }
        self.refresh_weekly_schedule(field_id, start_date).await
    }

    pub async fn refresh_weekly_schedule(
        &self,
        field_id: i64,
        start_date: Option<NaiveDate>,
    ) -> Result<WeeklyIrrigationSchedule> {
        let key = CacheKey::weekly(field_id, start_date);
        self.fetch(
            key,
            self.source.weekly_schedule(field_id, start_date),
            CachedValue::WeeklySchedule,
        )
        .await
    }

    pub async fn dashboard(&self, request: BatchRequest) -> Result<Dashboard> {
        let recommendations = self.batch(request).await?;
        let summary = summarize(&recommendations);
        Ok(Dashboard {
            recommendations,
            summary,
        })
    }

    pub fn spawn_recommendation(
        &self,
        field_id: i64,
        query: RecommendationQuery,
    ) -> FetchHandle<IrrigationRecommendation> {
        let service = self.clone();
        FetchHandle::new(tokio::spawn(async move {
            service.recommendation(field_id, query).await
        }))
    }

    pub fn spawn_batch(&self, request: BatchRequest) -> FetchHandle<Vec<IrrigationRecommendation>> {
        let service = self.clone();
        FetchHandle::new(tokio::spawn(async move { service.batch(request).await }))
    }

    pub fn spawn_weekly_schedule(
        &self,
        field_id: i64,
        start_date: Option<NaiveDate>,
    ) -> FetchHandle<WeeklyIrrigationSchedule> {
        let service = self.clone();
        FetchHandle::new(tokio::spawn(async move {
            service.weekly_schedule(field_id, start_date).await
        }))
    }

    pub fn load_state(&self, key: &CacheKey) -> LoadState {
        if self.sequencer.is_pending(key) {
            return LoadState::Loading;
        }
        if let Some(reason) = self.lock_failures().get(key) {
            return LoadState::Failed(reason.clone());
        }
        match self.cache_get(key) {
            Some(_) => LoadState::Ready,
            None => LoadState::Idle,
        }
    }

    /// Drop every cached entry that includes `field_id`. Fetches for the field
    /// that are still in flight are superseded, so their responses are
    /// returned to the caller but never written back. Returns how many
    /// entries were removed.
    pub fn invalidate_field(&self, field_id: i64) -> Result<usize> {
        self.sequencer.supersede_field(field_id);
        let keys: Vec<CacheKey> = self
            .cache
            .keys()?
            .into_iter()
            .filter(|k| k.covers_field(field_id))
            .collect();
        for key in &keys {
            self.cache.invalidate(key)?;
        }
        self.lock_failures().retain(|k, _| !k.covers_field(field_id));
        tracing::info!(field_id, removed = keys.len(), "Invalidated cached field data");
        Ok(keys.len())
    }

    async fn fetch<T, F, W>(&self, key: CacheKey, request: F, wrap: W) -> Result<T>
    where
        T: Clone,
        F: Future<Output = Result<T>>,
        W: FnOnce(T) -> CachedValue,
    {
        let ticket = self.sequencer.issue(key.clone());
        match request.await {
            Ok(value) => {
                let committed = ticket.commit(|| {
                    self.store(&key, wrap(value.clone()));
                    self.lock_failures().remove(&key);
                });
                if !committed {
                    tracing::debug!(%key, seq = ticket.seq(), "Discarding superseded response");
                }
                Ok(value)
            }
            Err(e) => {
                if matches!(e, FieldOpsError::Validation(_)) {
                    return Err(e);
                }
                ticket.commit(|| {
                    self.lock_failures().insert(key.clone(), e.to_string());
                });
                Err(e)
            }
        }
    }

    fn cached(&self, key: &CacheKey) -> Option<CachedValue> {
        self.cache_get(key)
            .filter(|entry| !entry.stale)
            .map(|entry| entry.value)
    }

    fn cache_get(&self, key: &CacheKey) -> Option<CacheEntry> {
        match self.cache.get(key) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(%key, error = %e, "Cache read failed, treating as miss");
                None
            }
        }
    }

    fn store(&self, key: &CacheKey, value: CachedValue) {
        if let Err(e) = self.cache.set(key.clone(), value) {
            tracing::warn!(%key, error = %e, "Cache write failed");
            return;
        }
        if let CacheKey::Recommendation { field_id, .. } = key {
            self.mark_batches_stale(*field_id);
        }
    }

    fn mark_batches_stale(&self, field_id: i64) {
        let keys = match self.cache.keys() {
            Ok(keys) => keys,
            Err(e) => {
                tracing::warn!(error = %e, "Could not list cache keys");
                return;
            }
        };
        for key in keys
            .iter()
            .filter(|k| k.resource() == ResourceKind::Batch && k.covers_field(field_id))
        {
            if let Err(e) = self.cache.mark_stale(key) {
                tracing::warn!(%key, error = %e, "Could not mark batch entry stale");
            }
        }
    }

    fn lock_failures(&self) -> std::sync::MutexGuard<'_, HashMap<CacheKey, String>> {
        self.failures.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{today, MemoryCacheStore};
    use crate::db::Database;
    use crate::models::recommendation::tests::sample;
    use crate::models::schedule::tests::sample_week;
    use crate::models::IrrigationAction;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::oneshot;

    /// Answers with the call index as the gross requirement so tests can
    /// tell responses apart. Calls listed in `gates` wait for their sender.
    #[derive(Default)]
    struct FakeSource {
        calls: AtomicUsize,
        batch_calls: AtomicUsize,
        weekly_calls: AtomicUsize,
        fail: AtomicBool,
        gates: Mutex<HashMap<usize, oneshot::Receiver<()>>>,
    }

    impl FakeSource {
        fn gate(&self, call: usize) -> oneshot::Sender<()> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().unwrap().insert(call, rx);
            tx
        }

        fn failure(&self) -> Option<FieldOpsError> {
            self.fail.load(Ordering::SeqCst).then(|| FieldOpsError::Server {
                status: 503,
                body: "maintenance".into(),
            })
        }
    }

    impl RecommendationSource for FakeSource {
        async fn recommendation(
            &self,
            field_id: i64,
            _query: RecommendationQuery,
        ) -> Result<IrrigationRecommendation> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let gate = self.gates.lock().unwrap().remove(&call);
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            if let Some(e) = self.failure() {
                return Err(e);
            }
            Ok(sample(field_id, IrrigationAction::Medium, call as f64))
        }

        async fn batch(&self, request: BatchRequest) -> Result<Vec<IrrigationRecommendation>> {
            self.batch_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(e) = self.failure() {
                return Err(e);
            }
            Ok(request
                .field_ids
                .iter()
                .map(|id| {
                    let action = if *id == 2 {
                        IrrigationAction::VeryIntensive
                    } else {
                        IrrigationAction::None
                    };
                    sample(*id, action, *id as f64 * 10.0)
                })
                .collect())
        }

        async fn weekly_schedule(
            &self,
            field_id: i64,
            start_date: Option<NaiveDate>,
        ) -> Result<WeeklyIrrigationSchedule> {
            self.weekly_calls.fetch_add(1, Ordering::SeqCst);
            let start = start_date.unwrap_or_else(|| NaiveDate::from_ymd_opt(2024, 7, 15).unwrap());
            let mut week = sample_week(start, &[true, false, true, false, false, false, true]);
            week.field_id = field_id;
            Ok(week)
        }
    }

    fn service() -> (Arc<FakeSource>, IrrigationService<FakeSource, MemoryCacheStore>) {
        let source = Arc::new(FakeSource::default());
        let service = IrrigationService::new(Arc::clone(&source), Arc::new(MemoryCacheStore::new()));
        (source, service)
    }

    fn sqlite_service(
        dir: &std::path::PathBuf,
    ) -> (Arc<FakeSource>, IrrigationService<FakeSource, Database>) {
        let source = Arc::new(FakeSource::default());
        let db = Database::open(Some(dir)).unwrap();
        (Arc::clone(&source), IrrigationService::new(source, Arc::new(db)))
    }

    fn scratch_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("fieldops-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[tokio::test]
    async fn cached_read_skips_source() {
        let (source, service) = service();
        let query = RecommendationQuery::default();
        let key = CacheKey::recommendation(5, query);
        assert_eq!(service.load_state(&key), LoadState::Idle);

        let first = service.recommendation(5, query).await.unwrap();
        let second = service.recommendation(5, query).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(service.load_state(&key), LoadState::Ready);

        service.refresh_recommendation(5, query).await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn superseded_response_is_not_cached() {
        let (source, service) = service();
        let query = RecommendationQuery::default();
        let release_first = source.gate(0);

        let first = service.refresh_recommendation(7, query);
        let second = async {
            let rec = service.refresh_recommendation(7, query).await;
            let _ = release_first.send(());
            rec
        };
        let (first, second) = tokio::join!(first, second);

        assert_eq!(first.unwrap().gross_irrigation_requirement, 0.0);
        assert_eq!(second.unwrap().gross_irrigation_requirement, 1.0);

        let cached = service
            .cache()
            .get(&CacheKey::recommendation(7, query))
            .unwrap()
            .unwrap();
        assert_eq!(
            cached.value.into_recommendation().unwrap().gross_irrigation_requirement,
            1.0
        );
    }

    #[tokio::test]
    async fn failure_recorded_until_next_success() {
        let (source, service) = service();
        let query = RecommendationQuery::default();
        let key = CacheKey::recommendation(3, query);

        source.fail.store(true, Ordering::SeqCst);
        let err = service.recommendation(3, query).await.unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert!(matches!(service.load_state(&key), LoadState::Failed(_)));

        source.fail.store(false, Ordering::SeqCst);
        service.recommendation(3, query).await.unwrap();
        assert_eq!(service.load_state(&key), LoadState::Ready);
    }

    #[tokio::test]
    async fn field_refresh_marks_covering_batch_stale() {
        let (source, service) = service();
        let request = BatchRequest::new(vec![1, 2, 3]);

        service.batch(request.clone()).await.unwrap();
        service.batch(request.clone()).await.unwrap();
        assert_eq!(source.batch_calls.load(Ordering::SeqCst), 1);

        service
            .refresh_recommendation(9, RecommendationQuery::default())
            .await
            .unwrap();
        service.batch(request.clone()).await.unwrap();
        assert_eq!(source.batch_calls.load(Ordering::SeqCst), 1);

        service
            .refresh_recommendation(2, RecommendationQuery::default())
            .await
            .unwrap();
        let entry = service.cache().get(&CacheKey::batch(&request)).unwrap().unwrap();
        assert!(entry.stale);

        service.batch(request).await.unwrap();
        assert_eq!(source.batch_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidate_field_drops_every_covering_entry() {
        let (source, service) = service();
        service.batch(BatchRequest::new(vec![1, 2])).await.unwrap();
        service.batch(BatchRequest::new(vec![3])).await.unwrap();
        service.weekly_schedule(2, None).await.unwrap();

        assert_eq!(service.invalidate_field(2).unwrap(), 2);
        assert_eq!(service.cache().len(), 1);

        service.weekly_schedule(2, None).await.unwrap();
        assert_eq!(source.weekly_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidated_field_discards_in_flight_response() {
        let (source, service) = service();
        let query = RecommendationQuery::default();
        let key = CacheKey::recommendation(8, query);
        let release = source.gate(0);

        let in_flight = service.refresh_recommendation(8, query);
        let mutation = async {
            tokio::time::timeout(Duration::from_secs(5), async {
                while service.load_state(&key) != LoadState::Loading {
                    tokio::task::yield_now().await;
                }
            })
            .await
            .unwrap();
            service.invalidate_field(8).unwrap();
            let _ = release.send(());
        };
        let (rec, ()) = tokio::join!(in_flight, mutation);

        assert_eq!(rec.unwrap().field_id, 8);
        assert!(service.cache().get(&key).unwrap().is_none());
        assert_eq!(service.load_state(&key), LoadState::Idle);

        let fresh = service.recommendation(8, query).await.unwrap();
        assert_eq!(fresh.gross_irrigation_requirement, 1.0);
        assert_eq!(service.load_state(&key), LoadState::Ready);
    }

    #[tokio::test]
    async fn persisted_entry_from_earlier_day_is_refetched() {
        let dir = scratch_dir("reopen");
        let query = RecommendationQuery::default();
        let yesterday = today().pred_opt().unwrap();

        let earlier_run = Database::open(Some(&dir)).unwrap();
        earlier_run
            .set(
                CacheKey::recommendation_on(5, query, yesterday),
                CachedValue::Recommendation(sample(5, IrrigationAction::Light, 99.0)),
            )
            .unwrap();
        drop(earlier_run);

        let (source, service) = sqlite_service(&dir);
        let rec = service.recommendation(5, query).await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(rec.gross_irrigation_requirement, 0.0);
        drop(service);

        let (source, service) = sqlite_service(&dir);
        let rec = service.recommendation(5, query).await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
        assert_eq!(rec.gross_irrigation_requirement, 0.0);
        drop(service);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn dashboard_summarizes_batch() {
        let (_source, service) = service();
        let dashboard = service
            .dashboard(BatchRequest::new(vec![1, 2, 3]))
            .await
            .unwrap();
        assert_eq!(dashboard.recommendations.len(), 3);
        assert_eq!(dashboard.summary.fields_to_irrigate, 1);
        assert_eq!(dashboard.summary.critical_field_count, 1);
        assert_eq!(dashboard.summary.total_water_needed, 20.0);
    }

    #[tokio::test]
    async fn cancelled_fetch_releases_key_and_skips_cache() {
        let (source, service) = service();
        let query = RecommendationQuery::default();
        let key = CacheKey::recommendation(4, query);
        let _hold = source.gate(0);

        let handle = service.spawn_recommendation(4, query);
        tokio::time::timeout(Duration::from_secs(5), async {
            while service.load_state(&key) != LoadState::Loading {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        handle.cancel();
        assert!(matches!(handle.join().await, Err(FieldOpsError::Cancelled)));
        assert_eq!(service.load_state(&key), LoadState::Idle);
        assert!(service.cache().is_empty());
    }

    #[tokio::test]
    async fn spawned_fetch_completes() {
        let (_source, service) = service();
        let handle = service.spawn_weekly_schedule(6, None);
        let week = handle.join().await.unwrap();
        assert_eq!(week.field_id, 6);
        assert_eq!(week.irrigation_days, 3);
        assert_eq!(
            service.load_state(&CacheKey::weekly(6, None)),
            LoadState::Ready
        );
    }
}
