//! Lightweight global metrics for the bloom filter index.
//!
//! Relaxed atomic counters for:
//! - granule lifecycle (build / serialize / deserialize)
//! - filter bytes moved through streams
//! - probes (may_contain) and how many of them allowed a skip

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

// ----- Granules -----
static GRANULES_BUILT: AtomicU64 = AtomicU64::new(0);
static GRANULES_SERIALIZED: AtomicU64 = AtomicU64::new(0);
static GRANULES_DESERIALIZED: AtomicU64 = AtomicU64::new(0);

// ----- Bytes -----
static FILTER_BYTES_WRITTEN: AtomicU64 = AtomicU64::new(0);
static FILTER_BYTES_READ: AtomicU64 = AtomicU64::new(0);

// ----- Probes -----
static PROBES_TOTAL: AtomicU64 = AtomicU64::new(0);
static PROBES_NEGATIVE: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSnapshot {
    pub granules_built: u64,
    pub granules_serialized: u64,
    pub granules_deserialized: u64,

    pub filter_bytes_written: u64,
    pub filter_bytes_read: u64,

    pub probes_total: u64,
    pub probes_negative: u64,
}

impl MetricsSnapshot {
    /// Share of probes that answered "definitely absent".
    pub fn skip_ratio(&self) -> f64 {
        if self.probes_total == 0 {
            0.0
        } else {
            self.probes_negative as f64 / self.probes_total as f64
        }
    }
}

pub fn record_granule_built() {
    GRANULES_BUILT.fetch_add(1, Ordering::Relaxed);
}

pub fn record_granule_serialized(filter_bytes: u64) {
    GRANULES_SERIALIZED.fetch_add(1, Ordering::Relaxed);
    FILTER_BYTES_WRITTEN.fetch_add(filter_bytes, Ordering::Relaxed);
}

pub fn record_granule_deserialized(filter_bytes: u64) {
    GRANULES_DESERIALIZED.fetch_add(1, Ordering::Relaxed);
    FILTER_BYTES_READ.fetch_add(filter_bytes, Ordering::Relaxed);
}

pub fn record_probe(hit: bool) {
    PROBES_TOTAL.fetch_add(1, Ordering::Relaxed);
    if !hit {
        PROBES_NEGATIVE.fetch_add(1, Ordering::Relaxed);
    }
}

pub fn snapshot() -> MetricsSnapshot {
    MetricsSnapshot {
        granules_built: GRANULES_BUILT.load(Ordering::Relaxed),
        granules_serialized: GRANULES_SERIALIZED.load(Ordering::Relaxed),
        granules_deserialized: GRANULES_DESERIALIZED.load(Ordering::Relaxed),
        filter_bytes_written: FILTER_BYTES_WRITTEN.load(Ordering::Relaxed),
        filter_bytes_read: FILTER_BYTES_READ.load(Ordering::Relaxed),
        probes_total: PROBES_TOTAL.load(Ordering::Relaxed),
        probes_negative: PROBES_NEGATIVE.load(Ordering::Relaxed),
    }
}
