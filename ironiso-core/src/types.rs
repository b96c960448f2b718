/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Core types for ISO 8583 operations.
//!
//! This module provides fundamental types used throughout the ironiso engine:
//! - [`Mti`]: Message type indicator with request/response arithmetic
//! - [`CharEncoding`]: Character encodings for text payloads
//! - [`TraceNumberGenerator`]: Source of field-11 trace numbers
//! - [`SimpleTraceGenerator`]: Atomic in-memory trace source

use crate::bitmap::hex_value;
use crate::error::DecodeError;
use arrayvec::ArrayString;
use bytes::{BufMut, BytesMut};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use thiserror::Error;

/// ISO 8583 message type indicator.
///
/// The MTI is a 16-bit value whose four hex nibbles classify a message by
/// version, class, function, and origin. It travels on the wire as four
/// ASCII hex digits. Requests end in a function digit of 0; the matching
/// response adds 0x10 (0200 becomes 0210, 0400 becomes 0410).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(into = "String", try_from = "String")]
pub struct Mti(u16);

impl Mti {
    /// Creates a message type indicator from its numeric value.
    ///
    /// # Arguments
    /// * `value` - The MTI value, for example `0x0200`
    #[inline]
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Returns the raw MTI value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u16 {
        self.0
    }

    /// Returns the response type for this request type.
    ///
    /// The function nibble is incremented by one: 0200 -> 0210.
    #[inline]
    #[must_use]
    pub const fn response(self) -> Self {
        Self(self.0 + 0x10)
    }

    /// Returns true if the function nibble marks a request (x x 0 x).
    #[inline]
    #[must_use]
    pub const fn is_request(self) -> bool {
        (self.0 >> 4) & 0xF == 0
    }

    /// Returns true if the function nibble marks a response (x x 1 x).
    #[inline]
    #[must_use]
    pub const fn is_response(self) -> bool {
        (self.0 >> 4) & 0xF == 1
    }

    /// Renders the MTI as four uppercase hex digits.
    #[must_use]
    pub fn as_str(self) -> ArrayString<4> {
        let mut buf = ArrayString::new();
        let _ = fmt::write(&mut buf, format_args!("{:04X}", self.0));
        buf
    }

    /// Writes the four-digit wire form of the MTI.
    #[inline]
    pub fn write_to(self, buf: &mut BytesMut) {
        buf.put_slice(self.as_str().as_bytes());
    }

    /// Reads an MTI from four ASCII hex digits at `offset`.
    ///
    /// Accepts upper- or lowercase digits.
    ///
    /// # Errors
    /// Returns [`DecodeError::Truncated`] when fewer than four bytes remain
    /// and [`DecodeError::InvalidMti`] when a byte is not a hex digit.
    pub fn from_wire(buf: &[u8], offset: usize) -> Result<Self, DecodeError> {
        let available = buf.len().saturating_sub(offset);
        if available < 4 {
            return Err(DecodeError::Truncated {
                offset,
                needed: 4,
                available,
            });
        }
        let mut value: u16 = 0;
        for i in 0..4 {
            let nibble = hex_value(buf[offset + i])
                .ok_or(DecodeError::InvalidMti { offset: offset + i })?;
            value = (value << 4) | u16::from(nibble);
        }
        Ok(Self(value))
    }
}

impl From<u16> for Mti {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl From<Mti> for u16 {
    fn from(mti: Mti) -> Self {
        mti.0
    }
}

impl From<Mti> for String {
    fn from(mti: Mti) -> Self {
        mti.as_str().to_string()
    }
}

impl TryFrom<String> for Mti {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value
            .parse()
            .map_err(|_| format!("invalid MTI: {value:?}"))
    }
}

impl FromStr for Mti {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_wire(s.as_bytes(), 0).and_then(|mti| {
            if s.len() == 4 {
                Ok(mti)
            } else {
                Err(DecodeError::InvalidMti { offset: 4 })
            }
        })
    }
}

impl fmt::Display for Mti {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}", self.0)
    }
}

/// Failure converting text to or from bytes under a [`CharEncoding`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// A byte is not valid in the encoding.
    #[error("byte 0x{byte:02X} at index {index} is not valid {encoding} text")]
    InvalidByte {
        /// The encoding in effect.
        encoding: CharEncoding,
        /// Index of the offending byte within the payload.
        index: usize,
        /// The offending byte.
        byte: u8,
    },

    /// A character has no representation in the encoding.
    #[error("char {ch:?} cannot be represented in {encoding}")]
    UnmappableChar {
        /// The encoding in effect.
        encoding: CharEncoding,
        /// The offending character.
        ch: char,
    },
}

/// Character encoding for textual field payloads.
///
/// ISO 8583's historical default is a single-byte Latin encoding, kept here
/// as [`CharEncoding::Latin1`]. Variable-length prefixes always count
/// **bytes**, including under [`CharEncoding::Utf8`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CharEncoding {
    /// ISO-8859-1, one byte per character.
    #[default]
    Latin1,
    /// US-ASCII, one byte per character, high bit rejected.
    Ascii,
    /// UTF-8. Length prefixes still count bytes.
    Utf8,
}

impl CharEncoding {
    /// Decodes a byte payload into a string.
    ///
    /// # Errors
    /// Returns [`EncodingError`] when a byte is invalid in this encoding.
    pub fn decode(self, bytes: &[u8]) -> Result<String, EncodingError> {
        match self {
            Self::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            Self::Ascii => {
                if let Some(index) = bytes.iter().position(|b| !b.is_ascii()) {
                    return Err(EncodingError::InvalidByte {
                        encoding: self,
                        index,
                        byte: bytes[index],
                    });
                }
                Ok(bytes.iter().map(|&b| char::from(b)).collect())
            }
            Self::Utf8 => std::str::from_utf8(bytes).map(str::to_owned).map_err(|e| {
                let index = e.valid_up_to();
                EncodingError::InvalidByte {
                    encoding: self,
                    index,
                    byte: bytes.get(index).copied().unwrap_or(0),
                }
            }),
        }
    }

    /// Encodes a string into the buffer.
    ///
    /// # Errors
    /// Returns [`EncodingError::UnmappableChar`] when a character has no
    /// representation in this encoding.
    pub fn encode_into(self, s: &str, buf: &mut BytesMut) -> Result<(), EncodingError> {
        match self {
            Self::Latin1 => {
                for ch in s.chars() {
                    let code = u32::from(ch);
                    if code > 0xFF {
                        return Err(EncodingError::UnmappableChar { encoding: self, ch });
                    }
                    buf.put_u8(code as u8);
                }
                Ok(())
            }
            Self::Ascii => {
                for ch in s.chars() {
                    if !ch.is_ascii() {
                        return Err(EncodingError::UnmappableChar { encoding: self, ch });
                    }
                    buf.put_u8(ch as u8);
                }
                Ok(())
            }
            Self::Utf8 => {
                buf.put_slice(s.as_bytes());
                Ok(())
            }
        }
    }

    /// Encodes a string to a fresh byte vector.
    ///
    /// # Errors
    /// Returns [`EncodingError::UnmappableChar`] when a character has no
    /// representation in this encoding.
    pub fn encode(self, s: &str) -> Result<BytesMut, EncodingError> {
        let mut buf = BytesMut::with_capacity(s.len());
        self.encode_into(s, &mut buf)?;
        Ok(buf)
    }
}

impl fmt::Display for CharEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Latin1 => "ISO-8859-1",
            Self::Ascii => "US-ASCII",
            Self::Utf8 => "UTF-8",
        };
        write!(f, "{name}")
    }
}

/// Largest value a field-11 trace number can take before wrapping.
pub const MAX_TRACE: u32 = 999_999;

/// Source of trace numbers for field 11 of newly created messages.
///
/// Implementations must be internally synchronized: the factory calls
/// [`next_trace`](TraceNumberGenerator::next_trace) from concurrent
/// producers and this is the only mutable state shared through it.
pub trait TraceNumberGenerator: Send + Sync + fmt::Debug {
    /// Returns the next trace number, in 1..=[`MAX_TRACE`].
    fn next_trace(&self) -> u32;
}

/// In-memory trace number source backed by an atomic counter.
///
/// Numbers increase monotonically and wrap from 999999 back to 1.
#[derive(Debug)]
pub struct SimpleTraceGenerator {
    value: AtomicU32,
}

impl SimpleTraceGenerator {
    /// Creates a generator that will hand out `last + 1` first.
    ///
    /// # Arguments
    /// * `last` - The last trace number already used, reduced modulo 10^6
    #[must_use]
    pub fn new(last: u32) -> Self {
        Self {
            value: AtomicU32::new(last % (MAX_TRACE + 1)),
        }
    }

    /// Returns the most recently handed-out trace number.
    #[inline]
    #[must_use]
    pub fn current(&self) -> u32 {
        self.value.load(Ordering::SeqCst)
    }
}

impl Default for SimpleTraceGenerator {
    fn default() -> Self {
        Self::new(0)
    }
}

impl TraceNumberGenerator for SimpleTraceGenerator {
    fn next_trace(&self) -> u32 {
        let mut current = self.value.load(Ordering::Relaxed);
        loop {
            let next = if current >= MAX_TRACE { 1 } else { current + 1 };
            match self
                .value
                .compare_exchange_weak(current, next, Ordering::SeqCst, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(actual) => current = actual,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mti_response() {
        assert_eq!(Mti::new(0x0200).response(), Mti::new(0x0210));
        assert_eq!(Mti::new(0x0400).response(), Mti::new(0x0410));
        assert_eq!(Mti::new(0x0800).response(), Mti::new(0x0810));
    }

    #[test]
    fn test_mti_request_response_flags() {
        assert!(Mti::new(0x0200).is_request());
        assert!(!Mti::new(0x0200).is_response());
        assert!(Mti::new(0x0210).is_response());
        assert!(!Mti::new(0x0420).is_request());
        assert!(!Mti::new(0x0420).is_response());
    }

    #[test]
    fn test_mti_as_str() {
        assert_eq!(Mti::new(0x0200).as_str().as_str(), "0200");
        assert_eq!(Mti::new(0x08_00).as_str().as_str(), "0800");
        assert_eq!(Mti::new(0x1A2B).as_str().as_str(), "1A2B");
    }

    #[test]
    fn test_mti_from_wire_case_insensitive() {
        assert_eq!(Mti::from_wire(b"0200", 0).unwrap(), Mti::new(0x0200));
        assert_eq!(Mti::from_wire(b"1a2b", 0).unwrap(), Mti::new(0x1A2B));
        assert_eq!(Mti::from_wire(b"XX0210", 2).unwrap(), Mti::new(0x0210));
    }

    #[test]
    fn test_mti_from_wire_errors() {
        assert!(matches!(
            Mti::from_wire(b"02", 0),
            Err(DecodeError::Truncated {
                offset: 0,
                needed: 4,
                available: 2
            })
        ));
        assert!(matches!(
            Mti::from_wire(b"02G0", 0),
            Err(DecodeError::InvalidMti { offset: 2 })
        ));
    }

    #[test]
    fn test_mti_serde_string_form() {
        let mti = Mti::new(0x0210);
        assert_eq!(String::from(mti), "0210");
        assert_eq!(Mti::try_from("0210".to_string()).unwrap(), mti);
        assert!(Mti::try_from("21".to_string()).is_err());
    }

    #[test]
    fn test_latin1_roundtrip() {
        let enc = CharEncoding::Latin1;
        let bytes = [0x41, 0xE9, 0xFF];
        let s = enc.decode(&bytes).unwrap();
        assert_eq!(s, "A\u{e9}\u{ff}");
        assert_eq!(enc.encode(&s).unwrap().as_ref(), &bytes[..]);
    }

    #[test]
    fn test_latin1_rejects_wide_chars() {
        let err = CharEncoding::Latin1.encode("snowman \u{2603}").unwrap_err();
        assert!(matches!(err, EncodingError::UnmappableChar { ch: '\u{2603}', .. }));
    }

    #[test]
    fn test_ascii_rejects_high_bytes() {
        let err = CharEncoding::Ascii.decode(&[b'A', 0xE9]).unwrap_err();
        assert!(matches!(
            err,
            EncodingError::InvalidByte {
                index: 1,
                byte: 0xE9,
                ..
            }
        ));
    }

    #[test]
    fn test_utf8_decode() {
        assert_eq!(CharEncoding::Utf8.decode("caf\u{e9}".as_bytes()).unwrap(), "caf\u{e9}");
        assert!(CharEncoding::Utf8.decode(&[0xFF, 0xFE]).is_err());
    }

    #[test]
    fn test_trace_generator_sequence() {
        let gen = SimpleTraceGenerator::new(0);
        assert_eq!(gen.next_trace(), 1);
        assert_eq!(gen.next_trace(), 2);
        assert_eq!(gen.current(), 2);
    }

    #[test]
    fn test_trace_generator_wraps() {
        let gen = SimpleTraceGenerator::new(MAX_TRACE - 1);
        assert_eq!(gen.next_trace(), MAX_TRACE);
        assert_eq!(gen.next_trace(), 1);
    }

    #[test]
    fn test_trace_generator_concurrent() {
        use std::sync::Arc;
        let gen = Arc::new(SimpleTraceGenerator::new(0));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let gen = Arc::clone(&gen);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        gen.next_trace();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(gen.current(), 4000);
    }
}
