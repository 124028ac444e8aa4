//! Invariant violations raised by the index.
//!
//! Every variant is a broken precondition (caller misuse or on-disk corruption).
//! Operations return `anyhow::Result` and wrap these values, so callers that care
//! about the kind use `err.downcast_ref::<IndexError>()`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    #[error("granule must index at least one column")]
    EmptyColumns,

    #[error("cannot read data into a non-empty bloom filter granule")]
    AlreadyPopulated,

    #[error("attempt to write an empty bloom filter granule")]
    EmptyGranule,

    #[error("unknown bloom filter index version {0}")]
    UnknownVersion(u32),

    #[error("bits_per_row must be > 0")]
    ZeroBitsPerRow,

    #[error("hash_functions must be > 0")]
    ZeroHashFunctions,

    #[error("hash_functions={requested} exceeds seed table size {available}")]
    TooManyHashFunctions { requested: usize, available: usize },

    #[error("filter size overflow: bits_per_row={bits_per_row}, total_rows={total_rows}")]
    SizeOverflow { bits_per_row: u64, total_rows: u64 },

    #[error("cannot allocate a {bytes}-byte filter")]
    FilterAlloc { bytes: usize },

    #[error("granule body needs {needed} bytes, only {available} remain")]
    BodyTooLarge { needed: u64, available: u64 },

    #[error("column {column} out of range 0..{columns}")]
    ColumnOutOfRange { column: usize, columns: usize },

    #[error("column count mismatch: expected {expected}, got {got}")]
    ColumnCountMismatch { expected: usize, got: usize },

    #[error("row count mismatch in column {column}: expected {expected}, got {got}")]
    RowCountMismatch { column: usize, expected: usize, got: usize },

    #[error("varuint longer than 10 bytes")]
    VarUIntTooLong,

    #[error("bad segment magic")]
    BadMagic,

    #[error("segment header checksum mismatch (stored {stored:#010x}, computed {computed:#010x})")]
    HeaderChecksum { stored: u32, computed: u32 },
}
