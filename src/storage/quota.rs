//! Quota Estimation
//!
//! Approximates backing-store usage and picks the platform's storage ceiling.

use serde::Serialize;

use super::BackingStore;
use crate::error::Result;

// == Quota Tiers ==
/// Ceiling for platforms with a tight storage allowance
pub const RESTRICTED_QUOTA_BYTES: u64 = 5 * 1024 * 1024; // 5 MB

/// Ceiling for every other platform
pub const DEFAULT_QUOTA_BYTES: u64 = 10 * 1024 * 1024; // 10 MB

/// Estimated cost of one stored pair: two bytes per UTF-16 code unit.
///
/// An approximation of how browsers account string storage, not an exact
/// byte count.
pub fn item_cost(key: &str, value: &str) -> u64 {
    2 * (key.encode_utf16().count() + value.encode_utf16().count()) as u64
}

// == Quota State ==
/// Snapshot of store usage against the ceiling. Always computed fresh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QuotaState {
    /// Estimated bytes in use
    pub usage_bytes: u64,
    /// Storage ceiling in bytes
    pub quota_bytes: u64,
    /// usage_bytes / quota_bytes
    pub ratio: f64,
}

impl QuotaState {
    pub fn new(usage_bytes: u64, quota_bytes: u64) -> Self {
        let ratio = if quota_bytes == 0 {
            if usage_bytes == 0 {
                0.0
            } else {
                1.0
            }
        } else {
            usage_bytes as f64 / quota_bytes as f64
        };

        Self {
            usage_bytes,
            quota_bytes,
            ratio,
        }
    }

    /// Returns true when usage is strictly above `threshold`.
    pub fn is_over(&self, threshold: f64) -> bool {
        self.ratio > threshold
    }
}

// == Quota Estimator ==
/// Measures backing-store usage against a fixed ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaEstimator {
    quota_bytes: u64,
}

impl QuotaEstimator {
    /// Creates an estimator for the tier matching `platform`.
    pub fn for_platform(platform: &str) -> Self {
        Self::with_quota(Self::quota_for(platform))
    }

    /// Creates an estimator with an explicit ceiling.
    pub fn with_quota(quota_bytes: u64) -> Self {
        Self { quota_bytes }
    }

    /// Returns the storage ceiling this estimator measures against.
    pub fn quota_bytes(&self) -> u64 {
        self.quota_bytes
    }

    /// Picks the ceiling for a platform identifier (a user-agent style string).
    ///
    /// Apple mobile devices and Safari (without Chrome/Chromium in the
    /// identifier) get the restricted tier.
    pub fn quota_for(platform: &str) -> u64 {
        let id = platform.to_ascii_lowercase();
        let apple_mobile = ["iphone", "ipad", "ipod"].iter().any(|d| id.contains(d));
        let safari = id.contains("safari") && !id.contains("chrome") && !id.contains("chromium");

        if apple_mobile || safari {
            RESTRICTED_QUOTA_BYTES
        } else {
            DEFAULT_QUOTA_BYTES
        }
    }

    /// Sums [`item_cost`] over every stored pair.
    pub fn estimate_usage(store: &dyn BackingStore) -> Result<u64> {
        Ok(store.items()?.iter().map(|(k, v)| item_cost(k, v)).sum())
    }

    /// Computes a fresh [`QuotaState`] for `store`.
    pub fn check(&self, store: &dyn BackingStore) -> Result<QuotaState> {
        Ok(QuotaState::new(
            Self::estimate_usage(store)?,
            self.quota_bytes,
        ))
    }
}
