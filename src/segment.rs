//! segment: index file holding the granules of one data part, in granule order.
//!
//! Format (LE):
//!   [magic8="GBFIDX1\0"]
//!   [version u32=1]
//!   [bits_per_row u64]
//!   [hash_functions u32]
//!   [columns u32]
//!   [crc32 u32]          -- over bytes [0..28)
//! Body: granules back to back, each in the granule binary layout (no framing).
//!
//! The header carries the index-wide parameters a granule does not store, so a
//! reader needs nothing but the path.

use anyhow::{anyhow, Context, Result};
use byteorder::{ByteOrder, LittleEndian};
use crc32fast::Hasher as Crc32;
use log::{debug, info, warn};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Read, Seek, Write};
use std::path::{Path, PathBuf};

use crate::config::IndexConfig;
use crate::consts::{
    GRANULE_VERSION, OFF_BITS_PER_ROW, OFF_COLUMNS, OFF_CRC32, OFF_HASH_FUNCTIONS, OFF_MAGIC,
    OFF_VERSION, SEGMENT_HDR_SIZE, SEGMENT_MAGIC,
};
use crate::error::IndexError;
use crate::granule::Granule;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentHeader {
    pub version: u32,
    pub config: IndexConfig,
    pub columns: usize,
}

impl SegmentHeader {
    fn encode(&self) -> Result<[u8; SEGMENT_HDR_SIZE]> {
        let hash_functions = u32::try_from(self.config.hash_functions)
            .map_err(|_| anyhow!("hash_functions {} does not fit u32", self.config.hash_functions))?;
        let columns = u32::try_from(self.columns)
            .map_err(|_| anyhow!("columns {} does not fit u32", self.columns))?;

        let mut hdr = [0u8; SEGMENT_HDR_SIZE];
        hdr[OFF_MAGIC..OFF_MAGIC + 8].copy_from_slice(SEGMENT_MAGIC);
        LittleEndian::write_u32(&mut hdr[OFF_VERSION..OFF_VERSION + 4], self.version);
        LittleEndian::write_u64(&mut hdr[OFF_BITS_PER_ROW..OFF_BITS_PER_ROW + 8], self.config.bits_per_row);
        LittleEndian::write_u32(&mut hdr[OFF_HASH_FUNCTIONS..OFF_HASH_FUNCTIONS + 4], hash_functions);
        LittleEndian::write_u32(&mut hdr[OFF_COLUMNS..OFF_COLUMNS + 4], columns);
        let crc = header_crc(&hdr);
        LittleEndian::write_u32(&mut hdr[OFF_CRC32..OFF_CRC32 + 4], crc);
        Ok(hdr)
    }

    fn decode(hdr: &[u8; SEGMENT_HDR_SIZE]) -> Result<Self> {
        if &hdr[OFF_MAGIC..OFF_MAGIC + 8] != SEGMENT_MAGIC {
            return Err(IndexError::BadMagic.into());
        }
        let stored = LittleEndian::read_u32(&hdr[OFF_CRC32..OFF_CRC32 + 4]);
        let computed = header_crc(hdr);
        if stored != computed {
            return Err(IndexError::HeaderChecksum { stored, computed }.into());
        }
        let version = LittleEndian::read_u32(&hdr[OFF_VERSION..OFF_VERSION + 4]);
        if version != GRANULE_VERSION {
            return Err(IndexError::UnknownVersion(version).into());
        }
        let bits_per_row = LittleEndian::read_u64(&hdr[OFF_BITS_PER_ROW..OFF_BITS_PER_ROW + 8]);
        let hash_functions = LittleEndian::read_u32(&hdr[OFF_HASH_FUNCTIONS..OFF_HASH_FUNCTIONS + 4]);
        let columns = LittleEndian::read_u32(&hdr[OFF_COLUMNS..OFF_COLUMNS + 4]);
        Ok(Self {
            version,
            config: IndexConfig::new(bits_per_row, hash_functions as usize),
            columns: columns as usize,
        })
    }
}

#[inline]
fn header_crc(hdr: &[u8]) -> u32 {
    let mut h = Crc32::new();
    h.update(&hdr[..OFF_CRC32]);
    h.finalize()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentSummary {
    pub granules: u64,
    pub bytes: u64,
}

/// Append-only writer. Call `finish()` to flush and fsync.
#[derive(Debug)]
pub struct SegmentWriter {
    path: PathBuf,
    header: SegmentHeader,
    out: BufWriter<File>,
    granules: u64,
    bytes: u64,
}

impl SegmentWriter {
    /// Create a new segment file. Fails if `path` already exists.
    pub fn create(path: &Path, config: &IndexConfig, columns: usize) -> Result<Self> {
        config.validate()?;
        if columns == 0 {
            return Err(IndexError::EmptyColumns.into());
        }
        let header = SegmentHeader {
            version: GRANULE_VERSION,
            config: *config,
            columns,
        };
        let hdr = header.encode()?;

        let f = OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(path)
            .with_context(|| format!("create segment {}", path.display()))?;
        let mut out = BufWriter::new(f);
        out.write_all(&hdr)?;

        debug!("segment create: {} ({}, columns={})", path.display(), config, columns);
        Ok(Self {
            path: path.to_path_buf(),
            header,
            out,
            granules: 0,
            bytes: SEGMENT_HDR_SIZE as u64,
        })
    }

    #[inline]
    pub fn header(&self) -> &SegmentHeader {
        &self.header
    }

    /// Append one populated granule built with this segment's configuration.
    pub fn append(&mut self, granule: &Granule) -> Result<()> {
        if granule.columns() != self.header.columns {
            return Err(IndexError::ColumnCountMismatch {
                expected: self.header.columns,
                got: granule.columns(),
            }
            .into());
        }
        if granule.config() != &self.header.config {
            return Err(anyhow!(
                "granule {} does not match segment {}",
                granule.config(),
                self.header.config
            ));
        }
        granule.serialize_binary(&mut self.out)?;
        self.granules += 1;
        self.bytes += granule.serialized_len() as u64;
        Ok(())
    }

    /// Flush buffered granules and sync the file.
    pub fn finish(self) -> Result<SegmentSummary> {
        let SegmentWriter {
            path,
            out,
            granules,
            bytes,
            ..
        } = self;
        let f = out
            .into_inner()
            .map_err(|e| anyhow!("flush segment {}: {}", path.display(), e.error()))?;
        f.sync_all()
            .with_context(|| format!("sync segment {}", path.display()))?;
        info!(
            "segment {}: wrote {} granule(s), {} byte(s)",
            path.display(),
            granules,
            bytes
        );
        Ok(SegmentSummary { granules, bytes })
    }
}

/// Sequential reader over a segment file.
#[derive(Debug)]
pub struct SegmentReader {
    path: PathBuf,
    header: SegmentHeader,
    input: BufReader<File>,
    file_len: u64,
    granules_read: u64,
}

impl SegmentReader {
    pub fn open(path: &Path) -> Result<Self> {
        let f = OpenOptions::new()
            .read(true)
            .open(path)
            .with_context(|| format!("open segment {}", path.display()))?;
        let file_len = f
            .metadata()
            .with_context(|| format!("stat segment {}", path.display()))?
            .len();
        let mut input = BufReader::new(f);

        let mut hdr = [0u8; SEGMENT_HDR_SIZE];
        input
            .read_exact(&mut hdr)
            .with_context(|| format!("read segment header {}", path.display()))?;
        let header = match SegmentHeader::decode(&hdr) {
            Ok(h) => h,
            Err(e) => {
                warn!("segment {}: rejected header: {}", path.display(), e);
                return Err(e);
            }
        };
        header.config.validate()?;
        if header.columns == 0 {
            return Err(IndexError::EmptyColumns.into());
        }

        debug!(
            "segment open: {} (v{}, {}, columns={})",
            path.display(),
            header.version,
            header.config,
            header.columns
        );
        Ok(Self {
            path: path.to_path_buf(),
            header,
            input,
            file_len,
            granules_read: 0,
        })
    }

    #[inline]
    pub fn header(&self) -> &SegmentHeader {
        &self.header
    }

    #[inline]
    pub fn config(&self) -> &IndexConfig {
        &self.header.config
    }

    #[inline]
    pub fn columns(&self) -> usize {
        self.header.columns
    }

    #[inline]
    pub fn version(&self) -> u32 {
        self.header.version
    }

    /// Next granule, or None at a clean end of file.
    ///
    /// A granule whose filters would run past the end of the file is rejected before
    /// its filters are allocated.
    pub fn next_granule(&mut self) -> Result<Option<Granule>> {
        if self.input.fill_buf()?.is_empty() {
            return Ok(None);
        }
        let pos = self.input.stream_position()?;
        let available = self.file_len.saturating_sub(pos);
        let mut g = Granule::new_empty(&self.header.config, self.header.columns)?;
        g.deserialize_binary_bounded(&mut self.input, self.header.version, available)
            .with_context(|| {
                format!(
                    "read granule #{} from {}",
                    self.granules_read,
                    self.path.display()
                )
            })?;
        self.granules_read += 1;
        Ok(Some(g))
    }

    /// Read every remaining granule.
    pub fn read_all(&mut self) -> Result<Vec<Granule>> {
        let mut out = Vec::new();
        while let Some(g) = self.next_granule()? {
            out.push(g);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_roundtrip() {
        let h = SegmentHeader {
            version: GRANULE_VERSION,
            config: IndexConfig::new(12, 5),
            columns: 3,
        };
        let bytes = h.encode().unwrap();
        assert_eq!(&bytes[..8], SEGMENT_MAGIC);
        assert_eq!(SegmentHeader::decode(&bytes).unwrap(), h);
    }

    #[test]
    fn header_detects_corruption() {
        let h = SegmentHeader {
            version: GRANULE_VERSION,
            config: IndexConfig::new(8, 2),
            columns: 1,
        };
        let mut bytes = h.encode().unwrap();
        bytes[OFF_COLUMNS] ^= 0x01;
        let err = SegmentHeader::decode(&bytes).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<IndexError>(),
            Some(IndexError::HeaderChecksum { .. })
        ));

        let mut bytes = h.encode().unwrap();
        bytes[0] = b'X';
        let err = SegmentHeader::decode(&bytes).unwrap_err();
        assert_eq!(err.downcast_ref::<IndexError>(), Some(&IndexError::BadMagic));
    }

    #[test]
    fn header_rejects_unknown_version() {
        let h = SegmentHeader {
            version: 2,
            config: IndexConfig::new(8, 2),
            columns: 1,
        };
        let bytes = h.encode().unwrap();
        let err = SegmentHeader::decode(&bytes).unwrap_err();
        assert_eq!(err.downcast_ref::<IndexError>(), Some(&IndexError::UnknownVersion(2)));
    }
}
