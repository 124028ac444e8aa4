//! VarUInt codec: 7 bits per byte, high bit = continuation, low groups first.

use anyhow::Result;
use byteorder::{ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

use crate::consts::VAR_UINT_MAX_LEN;
use crate::error::IndexError;

/// Write `x` as a VarUInt. Returns the number of bytes written.
pub fn write_var_uint<W: Write>(w: &mut W, mut x: u64) -> Result<usize> {
    let mut n = 0;
    while x > 0x7F {
        w.write_u8((x as u8 & 0x7F) | 0x80)?;
        x >>= 7;
        n += 1;
    }
    w.write_u8(x as u8)?;
    Ok(n + 1)
}

/// Read one VarUInt. EOF mid-value surfaces as io::ErrorKind::UnexpectedEof.
pub fn read_var_uint<R: Read>(r: &mut R) -> Result<u64> {
    let mut x: u64 = 0;
    for i in 0..VAR_UINT_MAX_LEN {
        let byte = r.read_u8()?;
        x |= ((byte & 0x7F) as u64) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(x);
        }
    }
    Err(IndexError::VarUIntTooLong.into())
}

/// Encoded length of `x` in bytes.
#[inline]
pub fn var_uint_len(x: u64) -> usize {
    let bits = 64 - (x | 1).leading_zeros() as usize;
    (bits + 6) / 7
}
