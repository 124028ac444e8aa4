//! GranuleAggregator: collects distinct column hashes while rows stream in during
//! index build, then hands them to `Granule::from_column_hashes`.

use anyhow::Result;
use log::debug;
use std::collections::HashSet;

use crate::config::IndexConfig;
use crate::error::IndexError;
use crate::granule::Granule;
use crate::hash::{hash_value, Value};

#[derive(Debug)]
pub struct GranuleAggregator {
    config: IndexConfig,
    column_hashes: Vec<HashSet<u64>>,
    rows: u64,
}

impl GranuleAggregator {
    pub fn new(config: &IndexConfig, columns: usize) -> Result<Self> {
        config.validate()?;
        if columns == 0 {
            return Err(IndexError::EmptyColumns.into());
        }
        Ok(Self {
            config: *config,
            column_hashes: vec![HashSet::new(); columns],
            rows: 0,
        })
    }

    #[inline]
    pub fn columns(&self) -> usize {
        self.column_hashes.len()
    }

    /// Rows seen since the last `take_granule`.
    #[inline]
    pub fn rows(&self) -> u64 {
        self.rows
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Add a block of rows: one slice per indexed column, all of equal length.
    pub fn update(&mut self, columns: &[&[Value]]) -> Result<()> {
        if columns.len() != self.column_hashes.len() {
            return Err(IndexError::ColumnCountMismatch {
                expected: self.column_hashes.len(),
                got: columns.len(),
            }
            .into());
        }
        let block_rows = columns.first().map_or(0, |c| c.len());
        for (i, c) in columns.iter().enumerate() {
            if c.len() != block_rows {
                return Err(IndexError::RowCountMismatch {
                    column: i,
                    expected: block_rows,
                    got: c.len(),
                }
                .into());
            }
        }

        for (set, values) in self.column_hashes.iter_mut().zip(columns) {
            set.extend(values.iter().map(hash_value));
        }
        self.rows += block_rows as u64;
        Ok(())
    }

    /// Add already-hashed values for one column. Does not advance `rows()`.
    pub fn update_hashes<I: IntoIterator<Item = u64>>(&mut self, column: usize, hashes: I) -> Result<()> {
        let columns = self.column_hashes.len();
        let set = self
            .column_hashes
            .get_mut(column)
            .ok_or(IndexError::ColumnOutOfRange { column, columns })?;
        set.extend(hashes);
        Ok(())
    }

    /// Advance the row counter for input fed through `update_hashes`.
    pub fn add_rows(&mut self, rows: u64) {
        self.rows += rows;
    }

    /// Build a granule from everything collected so far and start over.
    pub fn take_granule(&mut self) -> Result<Granule> {
        let columns = self.column_hashes.len();
        let sets = std::mem::replace(&mut self.column_hashes, vec![HashSet::new(); columns]);
        let rows = std::mem::take(&mut self.rows);
        let g = Granule::from_column_hashes(&self.config, &sets)?;
        debug!(
            "aggregator: granule from rows={} (total_rows={})",
            rows,
            g.total_rows()
        );
        Ok(g)
    }
}
