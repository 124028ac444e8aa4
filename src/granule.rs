//! Granule: one bloom filter per indexed column for a block of rows.
//!
//! Binary layout (version 1):
//!   [total_rows varuint]
//!   columns × [bytes_size raw bytes], bytes_size = ceil(bits_per_row * total_rows / 8)
//!
//! Column count, bits_per_row and hash_functions are index-wide and not stored here.
//! All filters share one size derived from the highest-cardinality column, so the
//! layout needs no per-column length. This sizing is part of the on-disk format.
//!
//! A granule is Empty or Populated. Building and deserializing move Empty -> Populated;
//! Populated is terminal and read-only, so it can be shared across readers freely.

use anyhow::Result;
use log::debug;
use std::collections::HashSet;
use std::hash::BuildHasher;
use std::io::{Read, Write};

use crate::config::IndexConfig;
use crate::consts::GRANULE_VERSION;
use crate::error::IndexError;
use crate::filter::BloomFilter;
use crate::metrics::{
    record_granule_built, record_granule_deserialized, record_granule_serialized, record_probe,
};
use crate::varint::{read_var_uint, var_uint_len, write_var_uint};

#[derive(Debug, Clone, PartialEq, Eq)]
enum GranuleState {
    /// Filter slots exist but are unsized.
    Empty { columns: usize },
    /// total_rows > 0, every filter holds bytes_size(total_rows) bytes.
    Populated {
        total_rows: u64,
        filters: Vec<BloomFilter>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Granule {
    config: IndexConfig,
    state: GranuleState,
}

impl Granule {
    /// Empty granule with `columns` unsized filter slots (deserialization target).
    ///
    /// Zero columns is allowed: such a granule reads and writes only its row count.
    pub fn new_empty(config: &IndexConfig, columns: usize) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: *config,
            state: GranuleState::Empty { columns },
        })
    }

    /// Build a granule from the distinct hashes of each indexed column, in column order.
    ///
    /// Every filter is sized from the largest set. When all sets are empty the result
    /// is an empty granule with `column_hashes.len()` slots.
    pub fn from_column_hashes<S: BuildHasher>(
        config: &IndexConfig,
        column_hashes: &[HashSet<u64, S>],
    ) -> Result<Self> {
        if column_hashes.is_empty() {
            return Err(IndexError::EmptyColumns.into());
        }
        config.validate()?;

        let total_rows = column_hashes.iter().map(|s| s.len()).max().unwrap_or(0) as u64;
        if total_rows == 0 {
            return Ok(Self {
                config: *config,
                state: GranuleState::Empty {
                    columns: column_hashes.len(),
                },
            });
        }

        let bytes_size = config.bytes_size(total_rows)?;
        let filters = column_hashes
            .iter()
            .map(|hashes| {
                let mut f = BloomFilter::try_new(bytes_size, config.hash_functions, 0)?;
                for &h in hashes {
                    f.add_hash(h);
                }
                Ok(f)
            })
            .collect::<Result<Vec<BloomFilter>>>()?;

        debug!(
            "granule build: columns={}, total_rows={}, bytes_size={}",
            filters.len(),
            total_rows,
            bytes_size
        );
        record_granule_built();

        Ok(Self {
            config: *config,
            state: GranuleState::Populated { total_rows, filters },
        })
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self.state, GranuleState::Empty { .. })
    }

    #[inline]
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Cardinality basis of the filters; 0 for an empty granule.
    #[inline]
    pub fn total_rows(&self) -> u64 {
        match &self.state {
            GranuleState::Empty { .. } => 0,
            GranuleState::Populated { total_rows, .. } => *total_rows,
        }
    }

    /// Number of filter slots (indexed columns). Fixed for the granule's lifetime.
    #[inline]
    pub fn columns(&self) -> usize {
        match &self.state {
            GranuleState::Empty { columns } => *columns,
            GranuleState::Populated { filters, .. } => filters.len(),
        }
    }

    /// Shared byte size of each filter; 0 for an empty granule.
    pub fn bytes_size(&self) -> usize {
        match &self.state {
            GranuleState::Empty { .. } => 0,
            GranuleState::Populated { filters, .. } => filters.first().map_or(0, |f| f.size()),
        }
    }

    /// Populated filters in column order; empty slice for an empty granule.
    pub fn filters(&self) -> &[BloomFilter] {
        match &self.state {
            GranuleState::Empty { .. } => &[],
            GranuleState::Populated { filters, .. } => filters,
        }
    }

    /// Filter of `column`, if populated.
    pub fn filter(&self, column: usize) -> Option<&BloomFilter> {
        self.filters().get(column)
    }

    /// Length of the serialized form; 0 for an empty granule.
    pub fn serialized_len(&self) -> usize {
        match &self.state {
            GranuleState::Empty { .. } => 0,
            GranuleState::Populated { total_rows, filters } => {
                var_uint_len(*total_rows) + filters.len() * self.bytes_size()
            }
        }
    }

    /// Read a granule written by `serialize_binary` into this empty granule.
    ///
    /// Reads one varuint and then `columns × bytes_size` bytes, nothing else. On any
    /// error the granule stays empty.
    pub fn deserialize_binary<R: Read>(&mut self, r: &mut R, version: u32) -> Result<()> {
        self.deserialize_binary_bounded(r, version, u64::MAX)
    }

    /// `deserialize_binary` for a source with at most `available` bytes left.
    ///
    /// A row count whose filters cannot fit in `available` is rejected with
    /// `BodyTooLarge` before any filter is allocated.
    pub fn deserialize_binary_bounded<R: Read>(
        &mut self,
        r: &mut R,
        version: u32,
        available: u64,
    ) -> Result<()> {
        let columns = match self.state {
            GranuleState::Empty { columns } => columns,
            GranuleState::Populated { .. } => return Err(IndexError::AlreadyPopulated.into()),
        };
        if version != GRANULE_VERSION {
            return Err(IndexError::UnknownVersion(version).into());
        }

        let total_rows = read_var_uint(r)?;
        if total_rows == 0 {
            debug!("granule read: total_rows=0, granule stays empty");
            return Ok(());
        }

        let bytes_size = self.config.bytes_size(total_rows)?;
        let needed = (bytes_size as u64)
            .checked_mul(columns as u64)
            .ok_or(IndexError::SizeOverflow {
                bits_per_row: self.config.bits_per_row,
                total_rows,
            })?;
        let available = available.saturating_sub(var_uint_len(total_rows) as u64);
        if needed > available {
            return Err(IndexError::BodyTooLarge { needed, available }.into());
        }

        let mut filters = Vec::with_capacity(columns);
        for _ in 0..columns {
            filters.push(BloomFilter::read_from(r, bytes_size, self.config.hash_functions, 0)?);
        }

        record_granule_deserialized(needed);
        self.state = GranuleState::Populated { total_rows, filters };
        Ok(())
    }

    /// Write this populated granule in version 1 layout.
    pub fn serialize_binary<W: Write>(&self, w: &mut W) -> Result<()> {
        let (total_rows, filters) = match &self.state {
            GranuleState::Empty { .. } => return Err(IndexError::EmptyGranule.into()),
            GranuleState::Populated { total_rows, filters } => (*total_rows, filters),
        };

        write_var_uint(w, total_rows)?;
        let bytes_size = self.config.bytes_size(total_rows)?;
        for f in filters {
            w.write_all(&f.as_bytes()[..bytes_size])?;
        }

        record_granule_serialized((bytes_size * filters.len()) as u64);
        Ok(())
    }

    /// Can rows of this granule have a `column` value hashing to `hash`?
    ///
    /// False means the granule can be skipped. An empty granule answers true.
    pub fn may_contain(&self, column: usize, hash: u64) -> Result<bool> {
        self.check_column(column)?;
        let hit = match self.filter(column) {
            Some(f) => f.contains_hash(hash),
            None => true,
        };
        record_probe(hit);
        Ok(hit)
    }

    /// IN-list form of `may_contain`: true if any of `hashes` may be present.
    pub fn may_contain_any(&self, column: usize, hashes: &[u64]) -> Result<bool> {
        self.check_column(column)?;
        let hit = match self.filter(column) {
            Some(f) => hashes.iter().any(|&h| f.contains_hash(h)),
            None => true,
        };
        record_probe(hit);
        Ok(hit)
    }

    fn check_column(&self, column: usize) -> Result<()> {
        let columns = self.columns();
        if column >= columns {
            return Err(IndexError::ColumnOutOfRange { column, columns }.into());
        }
        Ok(())
    }
}
