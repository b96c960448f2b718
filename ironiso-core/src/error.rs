/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Error types for the ironiso ISO 8583 engine.
//!
//! This module provides a unified error hierarchy using `thiserror` for typed,
//! domain-specific errors across all ironiso operations.

use crate::field::IsoType;
use crate::types::{EncodingError, Mti};
use thiserror::Error;

/// Result type alias using [`IsoError`] as the error type.
pub type Result<T> = std::result::Result<T, IsoError>;

/// Top-level error type for all ironiso operations.
#[derive(Debug, Error)]
pub enum IsoError {
    /// Error during message decoding.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Error during message encoding.
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    /// Error in factory or schema configuration.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error from an underlying sink.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that occur while decoding an ISO 8583 message.
///
/// Every variant that results from a malformed byte carries the buffer
/// offset of the item being read when the failure was detected. Field
/// context is attached by the factory through [`DecodeError::Field`], so a
/// surfaced error always names both the offset and the field index.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Buffer ended before the item starting at `offset` could complete.
    #[error("message truncated: item at offset {offset} needs {needed} bytes, {available} available")]
    Truncated {
        /// Offset at which the unfinished item begins.
        offset: usize,
        /// Bytes required to complete the item.
        needed: usize,
        /// Bytes actually remaining in the buffer.
        available: usize,
    },

    /// Message type indicator is not four hex digits.
    #[error("invalid message type indicator at offset {offset}")]
    InvalidMti {
        /// Offset of the offending byte.
        offset: usize,
    },

    /// Bitmap contains a byte that is not a hex digit.
    #[error("non-hex digit in bitmap at offset {offset}")]
    InvalidBitmap {
        /// Offset of the offending byte.
        offset: usize,
    },

    /// Length prefix of a variable field is not ASCII digits.
    #[error("non-digit length prefix for {iso_type} field at offset {offset}")]
    InvalidLengthPrefix {
        /// Kind of the field being parsed.
        iso_type: IsoType,
        /// Offset of the length prefix.
        offset: usize,
    },

    /// Date or time field does not denote a valid instant.
    #[error("invalid {iso_type} value at offset {offset}")]
    InvalidDate {
        /// Kind of the field being parsed.
        iso_type: IsoType,
        /// Offset of the field payload.
        offset: usize,
    },

    /// Amount field contains a non-digit character.
    #[error("non-digit character in amount at offset {offset}")]
    InvalidAmount {
        /// Offset of the field payload.
        offset: usize,
    },

    /// Character decoding of a text payload failed.
    #[error("character decoding failed at offset {offset}: {source}")]
    Encoding {
        /// Offset of the field payload.
        offset: usize,
        /// Underlying conversion failure.
        #[source]
        source: EncodingError,
    },

    /// No parse map is registered for the parsed message type.
    #[error("no parse map registered for type {mti}")]
    NoParseMap {
        /// The message type that was parsed.
        mti: Mti,
    },

    /// The bitmap names a field the registered parse map does not describe.
    #[error("parse map for type {mti} has no entry for field {field}")]
    NoParseInfo {
        /// The message type being parsed.
        mti: Mti,
        /// The field index present in the bitmap but absent from the map.
        field: u8,
    },

    /// A field-level failure, wrapped with the field index by the factory.
    #[error("field {field}: {source}")]
    Field {
        /// Index of the field whose parser failed.
        field: u8,
        /// The underlying failure.
        #[source]
        source: Box<DecodeError>,
    },
}

impl DecodeError {
    /// Wraps this error with the index of the field being parsed.
    #[must_use]
    pub fn for_field(self, field: u8) -> Self {
        Self::Field {
            field,
            source: Box::new(self),
        }
    }
}

/// Errors that occur while encoding an ISO 8583 message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// Value is longer than the declared or maximum length of its kind.
    #[error("value of {length} bytes exceeds {max} for {iso_type}")]
    TooLong {
        /// Kind of the field being encoded.
        iso_type: IsoType,
        /// Actual payload length in bytes.
        length: usize,
        /// Declared length or kind maximum.
        max: usize,
    },

    /// Value does not fill the declared width and the kind does not pad.
    #[error("value of {length} bytes does not match the declared {expected} of {iso_type}")]
    WrongLength {
        /// Kind of the field being encoded.
        iso_type: IsoType,
        /// Actual payload length in bytes.
        length: usize,
        /// Declared field length.
        expected: usize,
    },

    /// The domain value cannot be rendered as the declared kind.
    #[error("{found} value cannot be encoded as {iso_type}")]
    KindMismatch {
        /// Kind of the field being encoded.
        iso_type: IsoType,
        /// Name of the value variant that was found.
        found: &'static str,
    },

    /// Amount does not fit the 12-digit minor-unit representation.
    #[error("amount cannot be represented in 12 digits")]
    AmountOutOfRange,

    /// Character encoding of a text payload failed.
    #[error("character encoding failed: {0}")]
    Encoding(#[from] EncodingError),

    /// A field-level failure, wrapped with the field index by the message.
    #[error("field {field}: {source}")]
    Field {
        /// Index of the field whose encoding failed.
        field: u8,
        /// The underlying failure.
        #[source]
        source: Box<EncodeError>,
    },
}

impl EncodeError {
    /// Wraps this error with the index of the field being encoded.
    #[must_use]
    pub fn for_field(self, field: u8) -> Self {
        Self::Field {
            field,
            source: Box::new(self),
        }
    }
}

/// Errors raised synchronously while configuring a factory or schema.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Field 1 carries the secondary-bitmap indicator and is never settable.
    #[error("field 1 is reserved for the secondary bitmap indicator")]
    ReservedField,

    /// Field index outside the data-element range.
    #[error("field index {index} is outside 2..=128")]
    FieldIndexOutOfRange {
        /// The rejected index.
        index: u8,
    },

    /// A fixed-width kind was declared with a zero or missing length.
    #[error("{iso_type} requires a positive declared length")]
    ZeroLength {
        /// The kind missing its length.
        iso_type: IsoType,
    },

    /// Declared length exceeds the maximum the kind can carry.
    #[error("declared length {length} exceeds the {max} maximum of {iso_type}")]
    LengthOverflow {
        /// The kind being configured.
        iso_type: IsoType,
        /// The rejected length.
        length: usize,
        /// Maximum the kind supports.
        max: usize,
    },

    /// Template field kind disagrees with the parse map for the same type.
    #[error("field {index}: template kind {found} disagrees with parse map kind {expected}")]
    KindMismatch {
        /// Index of the inconsistent field.
        index: u8,
        /// Kind declared in the parse map.
        expected: IsoType,
        /// Kind declared in the template.
        found: IsoType,
    },

    /// A template value cannot be converted to its declared kind.
    #[error("field {index}: value does not fit {iso_type}: {reason}")]
    BadTemplateValue {
        /// Index of the offending field.
        index: u8,
        /// Kind the value was declared as.
        iso_type: IsoType,
        /// Why the conversion failed.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_display() {
        let err = DecodeError::Truncated {
            offset: 16,
            needed: 10,
            available: 4,
        };
        assert_eq!(
            err.to_string(),
            "message truncated: item at offset 16 needs 10 bytes, 4 available"
        );
    }

    #[test]
    fn test_decode_error_field_context() {
        let err = DecodeError::InvalidAmount { offset: 40 }.for_field(4);
        assert_eq!(
            err.to_string(),
            "field 4: non-digit character in amount at offset 40"
        );
    }

    #[test]
    fn test_iso_error_from_decode() {
        let decode = DecodeError::NoParseMap { mti: Mti::new(0x0200) };
        let err: IsoError = decode.into();
        assert!(matches!(err, IsoError::Decode(DecodeError::NoParseMap { .. })));
        assert_eq!(
            err.to_string(),
            "decode error: no parse map registered for type 0200"
        );
    }

    #[test]
    fn test_encode_error_display() {
        let err = EncodeError::TooLong {
            iso_type: IsoType::Llvar,
            length: 120,
            max: 99,
        };
        assert_eq!(err.to_string(), "value of 120 bytes exceeds 99 for LLVAR");
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::ReservedField;
        assert_eq!(
            err.to_string(),
            "field 1 is reserved for the secondary bitmap indicator"
        );
    }
}
