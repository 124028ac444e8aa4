//! Format constants shared by the granule codec and the segment file.

// -------- Granule (binary layout v1) --------

/// The only granule format version accepted on read.
pub const GRANULE_VERSION: u32 = 1;

/// Filter sizes are rounded up to whole bytes: ceil(bits / ATOM_BITS).
pub const ATOM_BITS: u64 = 8;

// -------- VarUInt --------

/// A u64 needs at most ceil(64 / 7) = 10 groups.
pub const VAR_UINT_MAX_LEN: usize = 10;

// -------- Segment file --------
// Header (LE), 32 bytes:
// [magic8="GBFIDX1\0"][version u32][bits_per_row u64][hash_functions u32][columns u32][crc32 u32]
// crc32 covers bytes [0..28). Granules follow back to back.
pub const SEGMENT_MAGIC: &[u8; 8] = b"GBFIDX1\0";
pub const SEGMENT_HDR_SIZE: usize = 32;

pub const OFF_MAGIC: usize = 0;
pub const OFF_VERSION: usize = 8;
pub const OFF_BITS_PER_ROW: usize = 12;
pub const OFF_HASH_FUNCTIONS: usize = 20;
pub const OFF_COLUMNS: usize = 24;
pub const OFF_CRC32: usize = 28;

// -------- Config defaults --------

pub const DEFAULT_BITS_PER_ROW: u64 = 8;
pub const DEFAULT_HASH_FUNCTIONS: usize = 4;
