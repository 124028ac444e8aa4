//! Index-wide configuration for bloom filter granules.
//!
//! `bits_per_row` and `hash_functions` are not stored in a granule's bytes: writer and
//! reader must agree on them out of band. The segment file header carries them.
//!
//! Env (read by `IndexConfig::from_env()` / `IndexConfigBuilder::new()`):
//! - GBF_BITS_PER_ROW   (default 8)
//! - GBF_HASH_FUNCTIONS (default 4, at most the seed table size)

use anyhow::Result;
use std::fmt;

use crate::consts::{ATOM_BITS, DEFAULT_BITS_PER_ROW, DEFAULT_HASH_FUNCTIONS};
use crate::error::IndexError;
use crate::hash::max_hash_functions;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexConfig {
    /// Bits of filter capacity per row.
    pub bits_per_row: u64,

    /// Seeded insertions per value; seed `i` is `BF_HASH_SEEDS[i]`.
    pub hash_functions: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            bits_per_row: DEFAULT_BITS_PER_ROW,
            hash_functions: DEFAULT_HASH_FUNCTIONS,
        }
    }
}

impl IndexConfig {
    pub fn new(bits_per_row: u64, hash_functions: usize) -> Self {
        Self {
            bits_per_row,
            hash_functions,
        }
    }

    /// Defaults overridden by GBF_* env vars. Unparsable values are ignored.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("GBF_BITS_PER_ROW") {
            if let Ok(n) = v.trim().parse::<u64>() {
                cfg.bits_per_row = n;
            }
        }

        if let Ok(v) = std::env::var("GBF_HASH_FUNCTIONS") {
            if let Ok(n) = v.trim().parse::<usize>() {
                cfg.hash_functions = n;
            }
        }

        cfg
    }

    pub fn with_bits_per_row(mut self, bits: u64) -> Self {
        self.bits_per_row = bits;
        self
    }

    pub fn with_hash_functions(mut self, k: usize) -> Self {
        self.hash_functions = k;
        self
    }

    /// Reject configurations the seed table or the size formula cannot serve.
    pub fn validate(&self) -> Result<()> {
        if self.bits_per_row == 0 {
            return Err(IndexError::ZeroBitsPerRow.into());
        }
        if self.hash_functions == 0 {
            return Err(IndexError::ZeroHashFunctions.into());
        }
        let available = max_hash_functions();
        if self.hash_functions > available {
            return Err(IndexError::TooManyHashFunctions {
                requested: self.hash_functions,
                available,
            }
            .into());
        }
        Ok(())
    }

    /// Byte size of every filter in a granule of `total_rows`:
    /// ceil(bits_per_row * total_rows / 8).
    pub fn bytes_size(&self, total_rows: u64) -> Result<usize> {
        let overflow = || IndexError::SizeOverflow {
            bits_per_row: self.bits_per_row,
            total_rows,
        };
        let bits = self
            .bits_per_row
            .checked_mul(total_rows)
            .and_then(|b| b.checked_add(ATOM_BITS - 1))
            .ok_or_else(overflow)?;
        let bytes = usize::try_from(bits / ATOM_BITS).map_err(|_| overflow())?;
        Ok(bytes)
    }
}

impl fmt::Display for IndexConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IndexConfig {{ bits_per_row: {}, hash_functions: {} }}",
            self.bits_per_row, self.hash_functions
        )
    }
}

/// Builder producing a validated IndexConfig.
#[derive(Clone, Debug)]
pub struct IndexConfigBuilder {
    cfg: IndexConfig,
}

impl Default for IndexConfigBuilder {
    fn default() -> Self {
        // Start from env, then allow overrides.
        Self {
            cfg: IndexConfig::from_env(),
        }
    }
}

impl IndexConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a clean default (without reading env).
    pub fn from_default() -> Self {
        Self {
            cfg: IndexConfig::default(),
        }
    }

    pub fn bits_per_row(mut self, bits: u64) -> Self {
        self.cfg.bits_per_row = bits;
        self
    }

    pub fn hash_functions(mut self, k: usize) -> Self {
        self.cfg.hash_functions = k;
        self
    }

    pub fn build(self) -> Result<IndexConfig> {
        self.cfg.validate()?;
        Ok(self.cfg)
    }
}
