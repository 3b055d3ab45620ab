//! Cache Store Module
//!
//! Persistent cache engine: a keyed map of entries mirrored into one blob of
//! the backing store, pruned by capacity and quota, with bounded retry when
//! the backing store is full.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cache::retry::{with_retry, RetryError};
use crate::cache::{
    select_for_eviction, CacheEntry, CacheStats, ChapterEntry, Clock, PrunePolicy, SystemClock,
    TranslationEntry, MAX_KEY_LENGTH,
};
use crate::error::{CacheError, Result};
use crate::storage::{
    BackingStore, QuotaEstimator, QuotaState, CHAPTER_CACHE_KEY, DEFAULT_QUOTA_BYTES,
    TRANSLATION_CACHE_KEY,
};

/// Chapter text cache
pub type ChapterCache = CacheStore<ChapterEntry>;

/// AI response cache
pub type TranslationCache = CacheStore<TranslationEntry>;

// == Cache Store ==
/// Persistent cache of one entry shape, stored under a single backing key.
///
/// Not internally synchronized: callers share it behind one lock so that
/// evict-then-write sequences never interleave.
#[derive(Debug)]
pub struct CacheStore<E: CacheEntry> {
    /// Backing-store key holding the serialized map
    storage_key: String,
    /// Key-value storage
    entries: HashMap<String, E>,
    /// Capacity and pruning settings
    policy: PrunePolicy,
    backend: Arc<dyn BackingStore>,
    estimator: QuotaEstimator,
    clock: Arc<dyn Clock>,
    /// Performance statistics
    stats: CacheStats,
}

impl<E: CacheEntry> CacheStore<E> {
    // == Constructor ==
    /// Creates an empty store writing to `storage_key` of `backend`.
    ///
    /// Uses the wall clock and the default quota tier until overridden.
    /// Call [`load`](Self::load) to hydrate from earlier sessions.
    pub fn new(
        storage_key: impl Into<String>,
        policy: PrunePolicy,
        backend: Arc<dyn BackingStore>,
    ) -> Self {
        Self {
            storage_key: storage_key.into(),
            entries: HashMap::new(),
            policy,
            backend,
            estimator: QuotaEstimator::with_quota(DEFAULT_QUOTA_BYTES),
            clock: Arc::new(SystemClock),
            stats: CacheStats::new(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_estimator(mut self, estimator: QuotaEstimator) -> Self {
        self.estimator = estimator;
        self
    }

    // == Load ==
    /// Replaces the in-memory entries with the persisted blob.
    ///
    /// A missing, unreadable or malformed blob leaves the store empty.
    /// Returns the number of entries loaded.
    pub fn load(&mut self) -> usize {
        self.entries = match self.backend.get_item(&self.storage_key) {
            Ok(Some(raw)) => match serde_json::from_str::<HashMap<String, E>>(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    let err = CacheError::InvalidEntry(e.to_string());
                    warn!("Discarding '{}': {}", self.storage_key, err);
                    HashMap::new()
                }
            },
            Ok(None) => HashMap::new(),
            Err(e) => {
                warn!("Could not read '{}', starting empty: {}", self.storage_key, e);
                HashMap::new()
            }
        };

        self.stats.set_total_entries(self.entries.len());
        info!(
            "Loaded {} entries from '{}'",
            self.entries.len(),
            self.storage_key
        );
        self.entries.len()
    }

    // == Get ==
    /// Looks up a value without refreshing its recency.
    ///
    /// Use [`touch`](Self::touch) when the read should count as a use.
    pub fn get(&mut self, key: &str) -> Option<E::Value> {
        match self.entries.get(key) {
            Some(entry) => {
                self.stats.record_hit();
                Some(entry.value().clone())
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Last-used time of `key`, if present.
    pub fn last_used(&self, key: &str) -> Option<u64> {
        self.entries.get(key).map(|entry| entry.last_used())
    }

    // == Touch ==
    /// Marks `key` as used now and persists.
    ///
    /// Returns `false` without writing when the key is absent.
    pub fn touch(&mut self, key: &str) -> Result<bool> {
        let now = self.clock.now_ms();
        match self.entries.get_mut(key) {
            Some(entry) => entry.touch(now),
            None => return Ok(false),
        }

        self.persist()?;
        Ok(true)
    }

    // == Put ==
    /// Inserts or replaces `key`, stamped with the current time, then persists.
    ///
    /// Pruning never evicts `key` itself. If the blob still cannot be written
    /// the entry stays in memory and `CachePersistFailure` is returned.
    pub fn put(&mut self, key: impl Into<String>, value: E::Value) -> Result<()> {
        let key = key.into();

        if key.is_empty() {
            return Err(CacheError::InvalidRequest("Key cannot be empty".to_string()));
        }
        if key.len() > MAX_KEY_LENGTH {
            return Err(CacheError::InvalidRequest(format!(
                "Key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            )));
        }

        let mut entry = E::new(value, self.clock.now_ms());
        if let Some(previous) = self.entries.get(&key) {
            entry.touch(previous.last_used());
        }

        debug!("Caching '{}' in '{}'", key, self.storage_key);
        self.entries.insert(key.clone(), entry);
        self.write_through(true, Some(&key))
    }

    // == Remove ==
    /// Removes `key` and persists. Returns `false` when it was absent.
    pub fn remove(&mut self, key: &str) -> Result<bool> {
        if self.entries.remove(key).is_none() {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    // == Prune Now ==
    /// Evicts the `count` least recently used entries and persists.
    ///
    /// Returns the number of entries evicted.
    pub fn prune_now(&mut self, count: usize) -> Result<usize> {
        let evicted = self.evict(count, None);
        self.write_through(false, None)?;
        Ok(evicted)
    }

    // == Relieve Pressure ==
    /// Evicts a quota batch and persists if usage is above the threshold.
    ///
    /// A failed quota check is logged and treated as no pressure. Returns the
    /// number of entries evicted.
    pub fn relieve_pressure(&mut self) -> Result<usize> {
        let evicted = self.prune_for_quota(None);
        if evicted > 0 {
            // Usage in the backend is stale until this write lands
            self.write_through(false, None)?;
        }
        Ok(evicted)
    }

    /// Fresh usage snapshot of the whole backing store.
    pub fn quota_state(&self) -> Result<QuotaState> {
        self.estimator.check(self.backend.as_ref())
    }

    // == Persist ==
    /// Writes all entries to the backing store.
    ///
    /// 1. Over capacity: evict per the capacity batch.
    /// 2. Usage above the quota threshold: evict per the quota batch.
    /// 3. Write; each refusal for lack of space evicts a retry batch and
    ///    tries again, up to `max_attempts` writes in total.
    ///
    /// Fails with `CachePersistFailure` once every attempt is spent. Any other
    /// write error is returned as is, without retry.
    pub fn persist(&mut self) -> Result<()> {
        self.write_through(true, None)
    }

    // == Accessors ==
    /// Keys ordered from least to most recently used.
    pub fn keys(&self) -> Vec<String> {
        select_for_eviction(&self.entries, self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn policy(&self) -> &PrunePolicy {
        &self.policy
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    /// Inserts an entry as is, without pruning or persisting.
    #[cfg(test)]
    pub(crate) fn insert_entry(&mut self, key: String, entry: E) {
        self.entries.insert(key, entry);
    }

    // == Internals ==
    /// `keep` is exempt from every eviction step.
    fn write_through(&mut self, check_quota: bool, keep: Option<&str>) -> Result<()> {
        let over_capacity = self.policy.capacity_eviction_count(self.entries.len());
        if over_capacity > 0 {
            let evicted = self.evict(over_capacity, keep);
            debug!(
                "'{}' over capacity {}: evicted {} entries",
                self.storage_key, self.policy.capacity, evicted
            );
        }

        if check_quota {
            self.prune_for_quota(keep);
        }

        let max_attempts = self.policy.max_attempts;
        let outcome = with_retry(
            &mut *self,
            max_attempts,
            |store| store.write_blob(),
            CacheError::is_quota_exceeded,
            |store, attempt| {
                store.stats.record_persist_retry();
                let batch = store.policy.retry_batch.count(store.entries.len());
                let evicted = store.evict(batch, keep);
                warn!(
                    "Storage full writing '{}' (attempt {}), evicted {} entries and retrying",
                    store.storage_key, attempt, evicted
                );
            },
        );

        self.stats.set_total_entries(self.entries.len());

        match outcome {
            Ok(()) => Ok(()),
            Err(RetryError::Exhausted { attempts, last }) => {
                self.stats.record_persist_failure();
                warn!(
                    "Giving up on '{}' after {} attempts; cache continues in memory only",
                    self.storage_key, attempts
                );
                Err(CacheError::CachePersistFailure {
                    store: self.storage_key.clone(),
                    attempts,
                    reason: last.to_string(),
                })
            }
            Err(RetryError::Fatal(e)) => Err(e),
        }
    }

    fn evict(&mut self, count: usize, keep: Option<&str>) -> usize {
        let extra = usize::from(keep.is_some());
        let victims: Vec<String> = select_for_eviction(&self.entries, count.saturating_add(extra))
            .into_iter()
            .filter(|key| Some(key.as_str()) != keep)
            .take(count)
            .collect();
        for key in &victims {
            self.entries.remove(key);
        }
        self.stats.record_evictions(victims.len());
        victims.len()
    }

    fn prune_for_quota(&mut self, keep: Option<&str>) -> usize {
        match self.quota_state() {
            Ok(state) if state.is_over(self.policy.quota_threshold) => {
                let batch = self.policy.quota_batch.count(self.entries.len());
                let evicted = self.evict(batch, keep);
                info!(
                    "Storage at {:.0}% of quota: evicted {} entries from '{}'",
                    state.ratio * 100.0,
                    evicted,
                    self.storage_key
                );
                evicted
            }
            Ok(_) => 0,
            Err(e) => {
                warn!("Quota check failed for '{}': {}", self.storage_key, e);
                0
            }
        }
    }

    fn write_blob(&self) -> Result<()> {
        let json = serde_json::to_string(&self.entries)?;
        self.backend.set_item(&self.storage_key, &json)
    }
}

impl CacheStore<ChapterEntry> {
    /// Chapter cache under its standard key and policy.
    pub fn chapters(capacity: usize, backend: Arc<dyn BackingStore>) -> Self {
        Self::new(CHAPTER_CACHE_KEY, PrunePolicy::chapters(capacity), backend)
    }
}

impl CacheStore<TranslationEntry> {
    /// Translation cache under its standard key and policy.
    pub fn translations(capacity: usize, backend: Arc<dyn BackingStore>) -> Self {
        Self::new(
            TRANSLATION_CACHE_KEY,
            PrunePolicy::translations(capacity),
            backend,
        )
    }
}
