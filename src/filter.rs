//! BloomFilter: fixed-size bit array with seeded-hash insertion.
//!
//! Backing storage is one `Box<[u8]>` of exactly `size` bytes, allocated once and
//! never resized. Bit `pos` lives in byte `pos / 8`, mask `1 << (pos % 8)`, which is
//! the little-endian byte image of a u64-word bit array: the bytes can be written to
//! and read from disk as-is.

use anyhow::Result;
use std::io::{self, Read};

use crate::error::IndexError;
use crate::hash::{hash128_to_64, seed_at};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BloomFilter {
    bits: Box<[u8]>,
    hashes: usize,
    seed: u64,
}

impl BloomFilter {
    /// Allocate a zeroed filter of `size` bytes.
    pub fn new(size: usize, hashes: usize, seed: u64) -> Self {
        Self {
            bits: vec![0u8; size].into_boxed_slice(),
            hashes,
            seed,
        }
    }

    /// Like `new`, but an allocation failure is returned instead of aborting.
    pub fn try_new(size: usize, hashes: usize, seed: u64) -> Result<Self> {
        let mut bits = reserve(size)?;
        bits.resize(size, 0);
        Ok(Self {
            bits: bits.into_boxed_slice(),
            hashes,
            seed,
        })
    }

    /// Read exactly `size` filter bytes from `r`.
    ///
    /// Buffer space is reserved fallibly and filled only with bytes that actually
    /// arrive, so a short stream fails with `UnexpectedEof` without zeroing `size` bytes.
    pub fn read_from<R: Read>(r: &mut R, size: usize, hashes: usize, seed: u64) -> Result<Self> {
        let mut bits = reserve(size)?;
        r.take(size as u64).read_to_end(&mut bits)?;
        if bits.len() != size {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("filter body: expected {} bytes, got {}", size, bits.len()),
            )
            .into());
        }
        Ok(Self {
            bits: bits.into_boxed_slice(),
            hashes,
            seed,
        })
    }

    /// Size in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.bits.len()
    }

    #[inline]
    pub fn hashes(&self) -> usize {
        self.hashes
    }

    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Raw bit array, exactly `size()` bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bits
    }

    #[inline]
    fn nbits(&self) -> u64 {
        (self.bits.len() as u64) * 8
    }

    /// Set the bit selected by (hash, hash_seed).
    #[inline]
    pub fn add_hash_with_seed(&mut self, hash: u64, hash_seed: u64) {
        if self.bits.is_empty() {
            return;
        }
        let pos = hash128_to_64(hash, hash_seed) % self.nbits();
        set_bit(&mut self.bits, pos as usize);
    }

    /// Test the bit selected by (hash, hash_seed). A zero-sized filter holds nothing.
    #[inline]
    pub fn find_hash_with_seed(&self, hash: u64, hash_seed: u64) -> bool {
        if self.bits.is_empty() {
            return false;
        }
        let pos = hash128_to_64(hash, hash_seed) % self.nbits();
        get_bit(&self.bits, pos as usize)
    }

    /// Insert `hash` once per hash function, seed `i` taken from the seed table.
    ///
    /// `hashes` must not exceed the seed table; `IndexConfig::validate` guarantees it.
    pub fn add_hash(&mut self, hash: u64) {
        for i in 0..self.hashes {
            if let Some(s) = seed_at(i) {
                self.add_hash_with_seed(hash, s);
            }
        }
    }

    /// True if every seeded bit of `hash` is set (may be a false positive).
    pub fn contains_hash(&self, hash: u64) -> bool {
        (0..self.hashes).all(|i| match seed_at(i) {
            Some(s) => self.find_hash_with_seed(hash, s),
            None => true,
        })
    }

    /// Number of set bits.
    pub fn bits_set(&self) -> u64 {
        self.bits.iter().map(|b| b.count_ones() as u64).sum()
    }

    /// True if no bit is set.
    pub fn is_clear(&self) -> bool {
        self.bits.iter().all(|&b| b == 0)
    }

    /// Share of set bits in 0.0..=1.0 (0.0 for a zero-sized filter).
    pub fn fill_ratio(&self) -> f64 {
        if self.bits.is_empty() {
            0.0
        } else {
            self.bits_set() as f64 / self.nbits() as f64
        }
    }
}

fn reserve(size: usize) -> Result<Vec<u8>> {
    let mut v = Vec::new();
    v.try_reserve_exact(size)
        .map_err(|_| IndexError::FilterAlloc { bytes: size })?;
    Ok(v)
}

#[inline]
fn set_bit(bytes: &mut [u8], bit: usize) {
    let byte = bit / 8;
    let mask = 1u8 << (bit % 8);
    bytes[byte] |= mask;
}

#[inline]
fn get_bit(bytes: &[u8], bit: usize) -> bool {
    let byte = bit / 8;
    let mask = 1u8 << (bit % 8);
    (bytes[byte] & mask) != 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::BF_HASH_SEEDS;

    #[test]
    fn new_is_zeroed_and_exact() {
        let f = BloomFilter::new(13, 3, 0);
        assert_eq!(f.size(), 13);
        assert_eq!(f.as_bytes().len(), 13);
        assert!(f.is_clear());
        assert_eq!(f.hashes(), 3);
        assert_eq!(f.seed(), 0);
    }

    #[test]
    fn seeded_bit_matches_word_layout() {
        let mut f = BloomFilter::new(16, 1, 0);
        let hash = 42u64;
        let seed = BF_HASH_SEEDS[0];
        f.add_hash_with_seed(hash, seed);

        let pos = hash128_to_64(hash, seed) % 128;
        let mut words = [0u64; 2];
        words[(pos / 64) as usize] |= 1u64 << (pos % 64);
        let mut image = Vec::new();
        for w in words {
            image.extend_from_slice(&w.to_le_bytes());
        }
        assert_eq!(f.as_bytes(), &image[..]);
    }

    #[test]
    fn no_false_negatives() {
        let mut f = BloomFilter::new(64, 4, 0);
        let hashes: Vec<u64> = (0..50u64).map(|i| i.wrapping_mul(0x9E37_79B9_7F4A_7C15)).collect();
        for &h in &hashes {
            f.add_hash(h);
        }
        for &h in &hashes {
            assert!(f.contains_hash(h), "hash {} missing", h);
        }
        assert!(f.bits_set() > 0);
        assert!(f.fill_ratio() > 0.0 && f.fill_ratio() <= 1.0);
    }

    #[test]
    fn add_hash_uses_positional_seeds() {
        let mut a = BloomFilter::new(32, 2, 0);
        a.add_hash(7);

        let mut b = BloomFilter::new(32, 2, 0);
        b.add_hash_with_seed(7, BF_HASH_SEEDS[0]);
        b.add_hash_with_seed(7, BF_HASH_SEEDS[1]);
        assert_eq!(a, b);
    }

    #[test]
    fn empty_filter_reports_absent() {
        let mut f = BloomFilter::new(8, 3, 0);
        assert!(!f.contains_hash(1));
        f.add_hash(1);
        assert!(f.contains_hash(1));

        let z = BloomFilter::new(0, 3, 0);
        assert!(!z.contains_hash(1));
        assert_eq!(z.fill_ratio(), 0.0);
    }

    #[test]
    fn try_new_matches_new() {
        let f = BloomFilter::try_new(13, 3, 5).unwrap();
        assert_eq!(f, BloomFilter::new(13, 3, 5));
    }

    #[test]
    fn huge_filter_is_an_error() {
        let err = BloomFilter::try_new(usize::MAX, 2, 0).unwrap_err();
        assert_eq!(
            err.downcast_ref::<IndexError>(),
            Some(&IndexError::FilterAlloc { bytes: usize::MAX })
        );
    }

    #[test]
    fn read_from_exact_and_short() {
        let data = [0xA5u8, 0x01, 0xFF, 0x00];
        let f = BloomFilter::read_from(&mut &data[..], 3, 2, 0).unwrap();
        assert_eq!(f.as_bytes(), &data[..3]);
        assert_eq!(f.hashes(), 2);

        let err = BloomFilter::read_from(&mut &data[..], 8, 2, 0).unwrap_err();
        let io = err.downcast_ref::<std::io::Error>().unwrap();
        assert_eq!(io.kind(), std::io::ErrorKind::UnexpectedEof);
    }
}
