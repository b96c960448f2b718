/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! ISO 8583 presence bitmaps.
//!
//! The bitmap announces which numbered fields occupy a message. On the wire
//! it is 16 uppercase hex ASCII characters for fields 1..64, extended to 32
//! characters when any field above 64 is present (bit 1 then flags the
//! secondary map). Parsing accepts either case.

use crate::error::DecodeError;
use bytes::{BufMut, BytesMut};
use std::fmt;

/// Uppercase hex digit table used for all wire output.
pub(crate) const HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";

/// Returns the value of an ASCII hex digit, accepting either case.
#[inline]
#[must_use]
pub(crate) fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        _ => None,
    }
}

/// Presence map over fields 1..=128.
///
/// Bit layout: field `i` occupies bit `128 - i` of the backing `u128`, so
/// field 1 is the most significant bit of the primary map. Field 1 itself is
/// the secondary-bitmap indicator and is managed by the codec, never by
/// callers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bitmap(u128);

const SECONDARY_MASK: u128 = (1u128 << 64) - 1;
const FIELD_ONE: u128 = 1u128 << 127;

impl Bitmap {
    /// Creates an empty bitmap.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    const fn bit_for(field: u8) -> Option<u128> {
        if field == 0 || field > 128 {
            None
        } else {
            Some(1u128 << (128 - field as u32))
        }
    }

    /// Marks a field as present. Indices outside 1..=128 are ignored.
    #[inline]
    pub fn set(&mut self, field: u8) {
        if let Some(bit) = Self::bit_for(field) {
            self.0 |= bit;
        }
    }

    /// Clears a field.
    #[inline]
    pub fn clear(&mut self, field: u8) {
        if let Some(bit) = Self::bit_for(field) {
            self.0 &= !bit;
        }
    }

    /// Returns true if the field is marked present.
    #[inline]
    #[must_use]
    pub fn get(&self, field: u8) -> bool {
        Self::bit_for(field).is_some_and(|bit| self.0 & bit != 0)
    }

    /// Returns true if no field is marked present.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Returns true if any field in 65..=128 is present.
    #[inline]
    #[must_use]
    pub const fn has_secondary(&self) -> bool {
        self.0 & SECONDARY_MASK != 0
    }

    /// Iterates the present field indices in ascending order.
    pub fn field_indices(&self) -> impl Iterator<Item = u8> + '_ {
        (1..=128u8).filter(|&i| self.get(i))
    }

    /// Writes the wire form: 16 uppercase hex characters, or 32 with the
    /// field-1 bit forced on when any field above 64 is present.
    pub fn write_hex(&self, buf: &mut BytesMut) {
        let secondary = self.has_secondary();
        let mut bits = self.0;
        if secondary {
            bits |= FIELD_ONE;
        } else {
            bits &= !FIELD_ONE;
        }
        let nibbles = if secondary { 32 } else { 16 };
        for i in 0..nibbles {
            let shift = 124 - 4 * i;
            let nibble = ((bits >> shift) & 0xF) as usize;
            buf.put_u8(HEX_UPPER[nibble]);
        }
    }

    /// Reads a bitmap starting at `offset`.
    ///
    /// Consumes 16 hex characters, or 32 when the first bit announces a
    /// secondary map. Returns the bitmap and the number of bytes consumed.
    ///
    /// # Errors
    /// Returns [`DecodeError::Truncated`] when the buffer ends inside the
    /// bitmap and [`DecodeError::InvalidBitmap`] on a non-hex byte.
    pub fn parse(buf: &[u8], offset: usize) -> Result<(Self, usize), DecodeError> {
        let primary = Self::read_half(buf, offset)?;
        if primary & (1u64 << 63) != 0 {
            let secondary = Self::read_half(buf, offset + 16)?;
            let bits = (u128::from(primary) << 64) | u128::from(secondary);
            Ok((Self(bits), 32))
        } else {
            Ok((Self(u128::from(primary) << 64), 16))
        }
    }

    fn read_half(buf: &[u8], offset: usize) -> Result<u64, DecodeError> {
        let available = buf.len().saturating_sub(offset);
        if available < 16 {
            return Err(DecodeError::Truncated {
                offset,
                needed: 16,
                available,
            });
        }
        let mut half: u64 = 0;
        for i in 0..16 {
            let nibble = hex_value(buf[offset + i])
                .ok_or(DecodeError::InvalidBitmap { offset: offset + i })?;
            half = (half << 4) | u64::from(nibble);
        }
        Ok(half)
    }
}

impl FromIterator<u8> for Bitmap {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        let mut bitmap = Self::new();
        for field in iter {
            bitmap.set(field);
        }
        bitmap
    }
}

impl fmt::Display for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = BytesMut::with_capacity(32);
        self.write_hex(&mut buf);
        f.write_str(&String::from_utf8_lossy(&buf))
    }
}
