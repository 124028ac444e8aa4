//! Hashing for the bloom filter index.
//!
//! - `BF_HASH_SEEDS`: the fixed, ordered seed table. Seed `i` drives hash function `i`.
//! - `hash128_to_64`: mixes a base hash with a seed into a bit position source.
//! - `hash_value` / `hash_column`: turn typed column values into 64-bit base hashes.
//!
//! All of these end up on disk (indirectly, through which bits are set), so they must
//! stay bit-stable across releases and platforms.

use std::collections::HashSet;
use std::hash::Hasher;
use twox_hash::XxHash64;

/// Process-wide seed table. Position matters: never reorder or edit.
pub const BF_HASH_SEEDS: [u64; 15] = [
    13635471485423070496,
    10336109063487487899,
    17779957404565211594,
    8988612159822229247,
    4954614162757618085,
    12980113590177089081,
    9263883436177860930,
    3656350954916107562,
    16765245675779094010,
    1614837574785101961,
    12343024318226024045,
    10154862637346713785,
    4574484289891213981,
    12290862232227658958,
    1260024917019014011,
];

/// Seed for hash function `index`, or None past the end of the table.
#[inline]
pub fn seed_at(index: usize) -> Option<u64> {
    BF_HASH_SEEDS.get(index).copied()
}

/// Upper bound for `hash_functions` in any index configuration.
#[inline]
pub fn max_hash_functions() -> usize {
    BF_HASH_SEEDS.len()
}

/// CityHash `Hash128to64` over the pair (low, high).
#[inline]
pub fn hash128_to_64(low: u64, high: u64) -> u64 {
    const K_MUL: u64 = 0x9ddf_ea08_eb38_2d69;
    let mut a = (low ^ high).wrapping_mul(K_MUL);
    a ^= a >> 47;
    let mut b = (high ^ a).wrapping_mul(K_MUL);
    b ^= b >> 47;
    b.wrapping_mul(K_MUL)
}

/// 64-bit integer finalizer (murmur3 fmix64).
#[inline]
pub fn int_hash64(mut x: u64) -> u64 {
    x ^= x >> 33;
    x = x.wrapping_mul(0xff51_afd7_ed55_8ccd);
    x ^= x >> 33;
    x = x.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    x ^= x >> 33;
    x
}

/// xxHash64 over raw bytes.
#[inline]
pub fn xxh64(data: &[u8], seed: u64) -> u64 {
    let mut h = XxHash64::with_seed(seed);
    h.write(data);
    h.finish()
}

/// A single column cell as seen by the index.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    UInt(u64),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
}

/// Base hash of one value.
///
/// Numerics hash their 64-bit pattern with `int_hash64`, so `Int(5)` and `UInt(5)`
/// collide on purpose. `-0.0` is folded into `0.0`.
pub fn hash_value(v: &Value) -> u64 {
    match v {
        Value::Null => int_hash64(0),
        Value::UInt(x) => int_hash64(*x),
        Value::Int(x) => int_hash64(*x as u64),
        Value::Float(f) => {
            let f = if *f == 0.0 { 0.0 } else { *f };
            int_hash64(f.to_bits())
        }
        Value::Str(s) => xxh64(s.as_bytes(), 0),
        Value::Bytes(b) => xxh64(b, 0),
    }
}

/// Distinct base hashes of a column slice.
pub fn hash_column(values: &[Value]) -> HashSet<u64> {
    values.iter().map(hash_value).collect()
}
