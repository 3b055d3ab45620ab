//! Prune Policy
//!
//! Capacity, batch sizes and thresholds that drive when and how much a
//! store evicts.

use crate::cache::{DEFAULT_PRUNE_BATCH, DEFAULT_PRUNE_RATIO};
use crate::config::{DEFAULT_MAX_PERSIST_ATTEMPTS, DEFAULT_QUOTA_THRESHOLD};

// == Batch Size ==
/// How many entries one pruning pass removes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BatchSize {
    /// Always the same number of entries
    Fixed(usize),
    /// `max(min, floor(ratio * len))`
    Proportional { min: usize, ratio: f64 },
}

impl BatchSize {
    /// Batch size for a store currently holding `len` entries.
    pub fn count(&self, len: usize) -> usize {
        match *self {
            BatchSize::Fixed(n) => n,
            BatchSize::Proportional { min, ratio } => {
                min.max((len as f64 * ratio).floor() as usize)
            }
        }
    }

    /// The proportional default: at least 5, or 10% of the store.
    pub fn proportional() -> Self {
        BatchSize::Proportional {
            min: DEFAULT_PRUNE_BATCH,
            ratio: DEFAULT_PRUNE_RATIO,
        }
    }
}

// == Prune Policy ==
/// Eviction settings for one cache store.
#[derive(Debug, Clone, PartialEq)]
pub struct PrunePolicy {
    /// Maximum number of entries
    pub capacity: usize,
    /// Removed when a write finds the store over capacity
    pub capacity_batch: BatchSize,
    /// Removed when usage is above `quota_threshold`
    pub quota_batch: BatchSize,
    /// Removed after each write refused for lack of space
    pub retry_batch: BatchSize,
    /// Usage ratio above which writes prune ahead of time
    pub quota_threshold: f64,
    /// Write attempts per persist
    pub max_attempts: u32,
}

impl PrunePolicy {
    /// Chapter cache policy: flat batch of 5 on overflow.
    pub fn chapters(capacity: usize) -> Self {
        Self {
            capacity,
            capacity_batch: BatchSize::Fixed(DEFAULT_PRUNE_BATCH),
            quota_batch: BatchSize::proportional(),
            retry_batch: BatchSize::Fixed(DEFAULT_PRUNE_BATCH),
            quota_threshold: DEFAULT_QUOTA_THRESHOLD,
            max_attempts: DEFAULT_MAX_PERSIST_ATTEMPTS,
        }
    }

    /// Translation cache policy: 5 or 10% of the store on overflow, whichever is larger.
    pub fn translations(capacity: usize) -> Self {
        Self {
            capacity_batch: BatchSize::proportional(),
            ..Self::chapters(capacity)
        }
    }

    pub fn with_quota_threshold(mut self, threshold: f64) -> Self {
        self.quota_threshold = threshold;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    // == Capacity Eviction Count ==
    /// Entries to evict from a store holding `len` entries, `0` when within capacity.
    ///
    /// Evicts a full batch when the capacity is larger than the batch, so the
    /// store gains headroom; otherwise only the overflow, so a small store is
    /// never emptied by its own batch.
    pub fn capacity_eviction_count(&self, len: usize) -> usize {
        if len <= self.capacity {
            return 0;
        }

        let overflow = len - self.capacity;
        let batch = self.capacity_batch.count(len);

        if self.capacity > batch {
            overflow.max(batch)
        } else {
            overflow
        }
    }
}
