//! Conversion between symbol streams and codec bytes
//!
//! Symbols carry `bits_per_symbol` bits each and are packed MSB-first: the
//! first symbol lands in the top bits of the first byte.

use crate::error::FilmboxError;
use bytes::{BufMut, BytesMut};

/// Pack symbols into bytes, zero-padding the final byte
pub fn pack(symbols: &[u8], bits_per_symbol: u8) -> Result<BytesMut, FilmboxError> {
    check_depth(bits_per_symbol)?;
    let bits = bits_per_symbol as u32;
    let mask = ((1u16 << bits) - 1) as u8;

    let mut out = BytesMut::with_capacity((symbols.len() * bits as usize).div_ceil(8));
    let mut acc: u32 = 0;
    let mut filled: u32 = 0;

    for &symbol in symbols {
        acc = (acc << bits) | (symbol & mask) as u32;
        filled += bits;
        while filled >= 8 {
            filled -= 8;
            out.put_u8((acc >> filled) as u8);
        }
        acc &= (1 << filled) - 1;
    }
    if filled > 0 {
        out.put_u8((acc << (8 - filled)) as u8);
    }

    Ok(out)
}

/// Unpack the first `count` symbols from `bytes`
pub fn unpack(bytes: &[u8], bits_per_symbol: u8, count: usize) -> Result<Vec<u8>, FilmboxError> {
    check_depth(bits_per_symbol)?;
    let bits = bits_per_symbol as usize;
    let needed = (count * bits).div_ceil(8);
    if bytes.len() < needed {
        return Err(FilmboxError::PayloadSizeMismatch {
            expected: needed,
            actual: bytes.len(),
        });
    }

    let mut symbols = Vec::with_capacity(count);
    for i in 0..count {
        let mut value = 0u8;
        for b in 0..bits {
            let bit = i * bits + b;
            let set = (bytes[bit / 8] >> (7 - bit % 8)) & 1;
            value = (value << 1) | set;
        }
        symbols.push(value);
    }
    Ok(symbols)
}

fn check_depth(bits_per_symbol: u8) -> Result<(), FilmboxError> {
    if (1..=8).contains(&bits_per_symbol) {
        Ok(())
    } else {
        Err(FilmboxError::InvalidProperty {
            property: "bits_per_symbol".into(),
            reason: format!("{} is outside 1..=8", bits_per_symbol),
        })
    }
}
