//! granule_bloom: per-granule bloom filter skip index.
//!
//! One bloom filter per indexed column for each granule (block of rows), sized and
//! serialized as a unit in a fixed, versioned binary layout.

// Format constants and shared plumbing
pub mod consts;
pub mod error;
pub mod config;
pub mod metrics;

// Hashing, codecs, primitives
pub mod hash;
pub mod varint;
pub mod filter;

// Granule and its build/persist surroundings
pub mod granule;
pub mod aggregator;
pub mod segment;

// Convenience re-exports
pub use aggregator::GranuleAggregator;
pub use config::{IndexConfig, IndexConfigBuilder};
pub use error::IndexError;
pub use filter::BloomFilter;
pub use granule::Granule;
pub use hash::{hash_column, hash_value, Value, BF_HASH_SEEDS};
pub use segment::{SegmentHeader, SegmentReader, SegmentSummary, SegmentWriter};
