/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Field kinds and values for ISO 8583 messages.
//!
//! This module provides:
//! - [`IsoType`]: The closed set of field kinds and their length/encoding rules
//! - [`FieldIndex`]: Type-safe data element index (2..=128)
//! - [`FieldValue`]: Enumeration of domain value types
//! - [`IsoValue`]: A typed, length-aware field cell with its encoder
//! - [`CustomFieldCodec`] / [`CustomFieldValue`]: Per-field enrichment hooks

use crate::error::{ConfigError, EncodeError};
use crate::types::CharEncoding;
use bytes::{BufMut, Bytes, BytesMut};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// The closed set of ISO 8583 field kinds.
///
/// Each kind fixes the field's length discipline and payload encoding:
///
/// | Kind | Length | Payload |
/// |---|---|---|
/// | `Numeric` | fixed N | ASCII digits, left-padded with `'0'` |
/// | `Alpha` | fixed N | ASCII, right-padded with space |
/// | `Llvar` / `Lllvar` | <= 99 / 999 | 2/3-digit byte-length prefix, text |
/// | `Date10` | 10 | `MMddHHmmss`, local time |
/// | `Date4` | 4 | `MMdd` |
/// | `DateExp` | 4 | `yyMM` card expiry |
/// | `Time` | 6 | `HHmmss` |
/// | `Amount` | 12 | ASCII digits, implied two decimals |
/// | `Binary` | fixed N | raw bytes |
/// | `Llbin` / `Lllbin` | <= 99 / 999 | 2/3-digit byte-length prefix, raw |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IsoType {
    /// Fixed-width digits, zero-padded on the left.
    Numeric,
    /// Fixed-width text, space-padded on the right.
    Alpha,
    /// Variable text up to 99 bytes, 2-digit length prefix.
    Llvar,
    /// Variable text up to 999 bytes, 3-digit length prefix.
    Lllvar,
    /// Date and time, `MMddHHmmss`.
    Date10,
    /// Date, `MMdd`.
    Date4,
    /// Card expiration date, `yyMM`.
    DateExp,
    /// Time of day, `HHmmss`.
    Time,
    /// Amount in minor units, 12 digits.
    Amount,
    /// Fixed-width raw bytes.
    Binary,
    /// Variable raw bytes up to 99, 2-digit length prefix.
    Llbin,
    /// Variable raw bytes up to 999, 3-digit length prefix.
    Lllbin,
}

impl IsoType {
    /// Returns true if the kind requires an explicit declared length.
    #[inline]
    #[must_use]
    pub const fn needs_length(self) -> bool {
        matches!(self, Self::Numeric | Self::Alpha | Self::Binary)
    }

    /// Returns the built-in width of self-describing kinds.
    #[inline]
    #[must_use]
    pub const fn intrinsic_length(self) -> Option<usize> {
        match self {
            Self::Date10 => Some(10),
            Self::Date4 | Self::DateExp => Some(4),
            Self::Time => Some(6),
            Self::Amount => Some(12),
            _ => None,
        }
    }

    /// Returns true if the declared length is exact rather than a maximum.
    #[inline]
    #[must_use]
    pub const fn is_fixed_length(self) -> bool {
        !matches!(self, Self::Llvar | Self::Lllvar | Self::Llbin | Self::Lllbin)
    }

    /// Returns the width of the ASCII length prefix: 0, 2, or 3 digits.
    #[inline]
    #[must_use]
    pub const fn length_prefix_digits(self) -> usize {
        match self {
            Self::Llvar | Self::Llbin => 2,
            Self::Lllvar | Self::Lllbin => 3,
            _ => 0,
        }
    }

    /// Returns the payload maximum of variable-length kinds.
    #[inline]
    #[must_use]
    pub const fn max_variable_length(self) -> Option<usize> {
        match self {
            Self::Llvar | Self::Llbin => Some(99),
            Self::Lllvar | Self::Lllbin => Some(999),
            _ => None,
        }
    }

    /// Returns true if the payload is raw bytes rather than text.
    #[inline]
    #[must_use]
    pub const fn is_binary_payload(self) -> bool {
        matches!(self, Self::Binary | Self::Llbin | Self::Lllbin)
    }

    /// Returns the chrono format string of date/time kinds.
    #[inline]
    #[must_use]
    pub const fn date_format(self) -> Option<&'static str> {
        match self {
            Self::Date10 => Some("%m%d%H%M%S"),
            Self::Date4 => Some("%m%d"),
            Self::DateExp => Some("%y%m"),
            Self::Time => Some("%H%M%S"),
            _ => None,
        }
    }

    /// Returns the canonical name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Numeric => "NUMERIC",
            Self::Alpha => "ALPHA",
            Self::Llvar => "LLVAR",
            Self::Lllvar => "LLLVAR",
            Self::Date10 => "DATE10",
            Self::Date4 => "DATE4",
            Self::DateExp => "DATE_EXP",
            Self::Time => "TIME",
            Self::Amount => "AMOUNT",
            Self::Binary => "BINARY",
            Self::Llbin => "LLBIN",
            Self::Lllbin => "LLLBIN",
        }
    }
}

impl fmt::Display for IsoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data element index within a message, restricted to 2..=128.
///
/// Field 1 is the secondary-bitmap indicator and is computed by the codec;
/// it cannot be named by a `FieldIndex`, which keeps it out of the public
/// message surface entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct FieldIndex(u8);

impl FieldIndex {
    /// Creates a field index, returning `None` outside 2..=128.
    #[inline]
    #[must_use]
    pub const fn new(index: u8) -> Option<Self> {
        if index >= 2 && index <= 128 {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Returns the raw index.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for FieldIndex {
    type Error = ConfigError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        match index {
            1 => Err(ConfigError::ReservedField),
            _ => Self::new(index).ok_or(ConfigError::FieldIndexOutOfRange { index }),
        }
    }
}

impl From<FieldIndex> for u8 {
    fn from(index: FieldIndex) -> Self {
        index.0
    }
}

impl fmt::Display for FieldIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A type-erased domain value produced by a [`CustomFieldCodec`].
///
/// Implemented automatically for every `Clone + PartialEq + Debug` type, so
/// codec authors only implement [`CustomFieldCodec`] itself.
pub trait CustomFieldValue: Any + Send + Sync + fmt::Debug {
    /// Upcasts to `Any` for downcasting to the concrete type.
    fn as_any(&self) -> &dyn Any;

    /// Clones the value behind the trait object.
    fn clone_boxed(&self) -> Box<dyn CustomFieldValue>;

    /// Compares with another erased value of possibly different type.
    fn eq_boxed(&self, other: &dyn CustomFieldValue) -> bool;
}

impl<T> CustomFieldValue for T
where
    T: Any + Send + Sync + fmt::Debug + Clone + PartialEq,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_boxed(&self) -> Box<dyn CustomFieldValue> {
        Box::new(self.clone())
    }

    fn eq_boxed(&self, other: &dyn CustomFieldValue) -> bool {
        other.as_any().downcast_ref::<T>().map_or(false, |o| self == o)
    }
}

/// Converts between a field's domain representation and its on-wire text.
///
/// Decoding is best-effort enrichment: returning `None` keeps the raw
/// string in the message instead of failing the parse.
pub trait CustomFieldCodec: Send + Sync + fmt::Debug {
    /// Decodes on-wire text into a domain value, or `None` to keep the raw text.
    fn decode_field(&self, raw: &str) -> Option<Box<dyn CustomFieldValue>>;

    /// Encodes the domain value back into on-wire text.
    fn encode_field(&self, value: &dyn CustomFieldValue) -> String;
}

/// Domain value of a single field.
#[derive(Debug)]
pub enum FieldValue {
    /// Text value, also the fallback for raw parsed payloads.
    Text(String),
    /// Integer value, rendered with the kind's padding.
    Int(i64),
    /// Fixed-point amount with scale 2 (minor units / 100).
    Amount(Decimal),
    /// Date/time value for the date and time kinds.
    DateTime(NaiveDateTime),
    /// Raw bytes for the binary kinds.
    Bytes(Bytes),
    /// User-defined value handled by a [`CustomFieldCodec`].
    Custom(Box<dyn CustomFieldValue>),
}

impl FieldValue {
    /// Returns the variant name, used in kind-mismatch errors.
    #[must_use]
    pub const fn variant_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "Text",
            Self::Int(_) => "Int",
            Self::Amount(_) => "Amount",
            Self::DateTime(_) => "DateTime",
            Self::Bytes(_) => "Bytes",
            Self::Custom(_) => "Custom",
        }
    }

    /// Natural payload length in bytes, before any padding or prefix.
    #[must_use]
    pub fn natural_length(&self) -> usize {
        match self {
            Self::Text(s) => s.len(),
            Self::Int(v) => itoa::Buffer::new().format(*v).len(),
            Self::Amount(_) => 12,
            Self::DateTime(_) => 0,
            Self::Bytes(b) => b.len(),
            Self::Custom(_) => 0,
        }
    }
}

impl Clone for FieldValue {
    fn clone(&self) -> Self {
        match self {
            Self::Text(s) => Self::Text(s.clone()),
            Self::Int(v) => Self::Int(*v),
            Self::Amount(d) => Self::Amount(*d),
            Self::DateTime(dt) => Self::DateTime(*dt),
            Self::Bytes(b) => Self::Bytes(b.clone()),
            Self::Custom(v) => Self::Custom(v.clone_boxed()),
        }
    }
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Amount(a), Self::Amount(b)) => a == b,
            (Self::DateTime(a), Self::DateTime(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            (Self::Custom(a), Self::Custom(b)) => a.eq_boxed(&**b),
            _ => false,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Int(v) => write!(f, "{v}"),
            Self::Amount(d) => write!(f, "{d}"),
            Self::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            Self::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Self::Custom(v) => write!(f, "{v:?}"),
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<Decimal> for FieldValue {
    fn from(d: Decimal) -> Self {
        Self::Amount(d)
    }
}

impl From<NaiveDateTime> for FieldValue {
    fn from(dt: NaiveDateTime) -> Self {
        Self::DateTime(dt)
    }
}

impl From<Bytes> for FieldValue {
    fn from(b: Bytes) -> Self {
        Self::Bytes(b)
    }
}

/// Padding discipline of the fixed-width text kinds.
#[derive(Debug, Clone, Copy)]
enum Pad {
    /// `'0'` fill on the left (NUMERIC).
    LeftZero,
    /// Space fill on the right (ALPHA).
    RightSpace,
    /// No padding; the value must already have the exact width.
    None,
}

/// A single field cell: kind, domain value, declared length, and an
/// optional custom codec that takes over the text conversion.
///
/// For fixed kinds the encoded byte length always equals the declared
/// length; for variable kinds the emitted prefix always matches the actual
/// payload, and the declared length is advisory. All length discipline is
/// enforced when encoding.
#[derive(Debug, Clone)]
pub struct IsoValue {
    iso_type: IsoType,
    value: FieldValue,
    length: usize,
    custom: Option<Arc<dyn CustomFieldCodec>>,
}

impl IsoValue {
    /// Creates a value whose length is intrinsic or derived from the payload.
    #[must_use]
    pub fn new(iso_type: IsoType, value: impl Into<FieldValue>) -> Self {
        let value = value.into();
        let length = iso_type
            .intrinsic_length()
            .unwrap_or_else(|| value.natural_length());
        Self {
            iso_type,
            value,
            length,
            custom: None,
        }
    }

    /// Creates a value with an explicit declared length.
    ///
    /// Self-describing kinds (dates, time, amount) keep their intrinsic
    /// width regardless of the argument.
    #[must_use]
    pub fn with_length(iso_type: IsoType, value: impl Into<FieldValue>, length: usize) -> Self {
        let length = iso_type.intrinsic_length().unwrap_or(length);
        Self {
            iso_type,
            value: value.into(),
            length,
            custom: None,
        }
    }

    /// Attaches a custom codec that handles the text conversion.
    #[must_use]
    pub fn with_custom(mut self, codec: Arc<dyn CustomFieldCodec>) -> Self {
        self.custom = Some(codec);
        self
    }

    /// Returns the field kind.
    #[inline]
    #[must_use]
    pub const fn iso_type(&self) -> IsoType {
        self.iso_type
    }

    /// Returns the domain value.
    #[inline]
    #[must_use]
    pub const fn value(&self) -> &FieldValue {
        &self.value
    }

    /// Returns the declared length.
    #[inline]
    #[must_use]
    pub const fn length(&self) -> usize {
        self.length
    }

    /// Returns the attached custom codec, if any.
    #[must_use]
    pub fn custom(&self) -> Option<&Arc<dyn CustomFieldCodec>> {
        self.custom.as_ref()
    }

    /// Returns the value as text, if it is a `Text` variant.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match &self.value {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as an integer, if it is an `Int` variant.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match &self.value {
            FieldValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a decimal amount, if it is an `Amount` variant.
    #[must_use]
    pub fn as_amount(&self) -> Option<Decimal> {
        match &self.value {
            FieldValue::Amount(d) => Some(*d),
            _ => None,
        }
    }

    /// Returns the value as a date/time, if it is a `DateTime` variant.
    #[must_use]
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match &self.value {
            FieldValue::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    /// Returns the value as raw bytes, if it is a `Bytes` variant.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match &self.value {
            FieldValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Downcasts a `Custom` value to its concrete type.
    #[must_use]
    pub fn custom_value<T: Any>(&self) -> Option<&T> {
        match &self.value {
            FieldValue::Custom(v) => v.as_any().downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Encodes the field into `buf` under the kind's length and padding
    /// rules: length prefix first for variable kinds, then the payload.
    ///
    /// # Errors
    /// Returns [`EncodeError`] when the value does not fit the declared
    /// length, cannot be rendered as the kind, or fails character encoding.
    pub fn encode_to(&self, buf: &mut BytesMut, encoding: CharEncoding) -> Result<(), EncodeError> {
        match self.iso_type {
            IsoType::Numeric => {
                let text = self.render_text()?;
                self.write_fixed_text(buf, encoding, &text, Pad::LeftZero)
            }
            IsoType::Alpha => {
                let text = self.render_text()?;
                self.write_fixed_text(buf, encoding, &text, Pad::RightSpace)
            }
            IsoType::Date10 | IsoType::Date4 | IsoType::DateExp | IsoType::Time => {
                let text = self.render_datetime()?;
                self.write_fixed_text(buf, encoding, &text, Pad::None)
            }
            IsoType::Amount => {
                let text = self.render_amount()?;
                self.write_fixed_text(buf, encoding, &text, Pad::None)
            }
            IsoType::Binary => {
                let bytes = self.raw_bytes()?;
                if bytes.len() != self.length {
                    return Err(EncodeError::WrongLength {
                        iso_type: self.iso_type,
                        length: bytes.len(),
                        expected: self.length,
                    });
                }
                buf.put_slice(bytes);
                Ok(())
            }
            IsoType::Llvar | IsoType::Lllvar => {
                let text = self.render_text()?;
                let payload = encoding.encode(&text)?;
                self.write_variable(buf, &payload)
            }
            IsoType::Llbin | IsoType::Lllbin => {
                let bytes = self.raw_bytes()?;
                self.write_variable(buf, bytes)
            }
        }
    }

    fn render_text(&self) -> Result<String, EncodeError> {
        match &self.value {
            FieldValue::Text(s) => Ok(s.clone()),
            FieldValue::Int(v) => Ok(itoa::Buffer::new().format(*v).to_owned()),
            FieldValue::Custom(v) => self.render_custom(v.as_ref()),
            other => Err(EncodeError::KindMismatch {
                iso_type: self.iso_type,
                found: other.variant_name(),
            }),
        }
    }

    fn render_datetime(&self) -> Result<String, EncodeError> {
        match &self.value {
            FieldValue::DateTime(dt) => {
                // date_format is Some for every kind routed here
                let format = self.iso_type.date_format().unwrap_or("%m%d%H%M%S");
                Ok(dt.format(format).to_string())
            }
            FieldValue::Text(s) => Ok(s.clone()),
            FieldValue::Custom(v) => self.render_custom(v.as_ref()),
            other => Err(EncodeError::KindMismatch {
                iso_type: self.iso_type,
                found: other.variant_name(),
            }),
        }
    }

    fn render_amount(&self) -> Result<String, EncodeError> {
        match &self.value {
            FieldValue::Amount(d) => {
                let mut scaled = *d;
                scaled.rescale(2);
                let minor = scaled.mantissa();
                if !(0..=999_999_999_999).contains(&minor) {
                    return Err(EncodeError::AmountOutOfRange);
                }
                Ok(format!("{minor:012}"))
            }
            FieldValue::Int(v) => {
                let minor = v.checked_mul(100).ok_or(EncodeError::AmountOutOfRange)?;
                if !(0..=999_999_999_999).contains(&minor) {
                    return Err(EncodeError::AmountOutOfRange);
                }
                Ok(format!("{minor:012}"))
            }
            FieldValue::Text(s) => {
                if s.contains('.') {
                    let parsed = Decimal::from_str(s).map_err(|_| EncodeError::KindMismatch {
                        iso_type: self.iso_type,
                        found: "Text",
                    })?;
                    let mut scaled = parsed;
                    scaled.rescale(2);
                    let minor = scaled.mantissa();
                    if !(0..=999_999_999_999).contains(&minor) {
                        return Err(EncodeError::AmountOutOfRange);
                    }
                    Ok(format!("{minor:012}"))
                } else if s.len() > 12 {
                    Err(EncodeError::TooLong {
                        iso_type: self.iso_type,
                        length: s.len(),
                        max: 12,
                    })
                } else {
                    Ok(format!("{s:0>12}"))
                }
            }
            FieldValue::Custom(v) => {
                let text = self.render_custom(v.as_ref())?;
                if text.len() > 12 {
                    return Err(EncodeError::TooLong {
                        iso_type: self.iso_type,
                        length: text.len(),
                        max: 12,
                    });
                }
                Ok(format!("{text:0>12}"))
            }
            other => Err(EncodeError::KindMismatch {
                iso_type: self.iso_type,
                found: other.variant_name(),
            }),
        }
    }

    fn render_custom(&self, value: &dyn CustomFieldValue) -> Result<String, EncodeError> {
        match &self.custom {
            Some(codec) => Ok(codec.encode_field(value)),
            None => Err(EncodeError::KindMismatch {
                iso_type: self.iso_type,
                found: "Custom",
            }),
        }
    }

    fn raw_bytes(&self) -> Result<&Bytes, EncodeError> {
        match &self.value {
            FieldValue::Bytes(b) => Ok(b),
            other => Err(EncodeError::KindMismatch {
                iso_type: self.iso_type,
                found: other.variant_name(),
            }),
        }
    }

    fn write_fixed_text(
        &self,
        buf: &mut BytesMut,
        encoding: CharEncoding,
        text: &str,
        pad: Pad,
    ) -> Result<(), EncodeError> {
        // The declared length is a byte count; measure the payload after
        // character encoding so multi-byte UTF-8 text cannot shift the
        // offsets of every following field.
        let payload = encoding.encode(text)?;
        let width = payload.len();
        if width > self.length {
            return Err(EncodeError::TooLong {
                iso_type: self.iso_type,
                length: width,
                max: self.length,
            });
        }
        if width < self.length && matches!(pad, Pad::None) {
            return Err(EncodeError::WrongLength {
                iso_type: self.iso_type,
                length: width,
                expected: self.length,
            });
        }
        let fill = self.length - width;
        if matches!(pad, Pad::LeftZero) {
            buf.put_bytes(b'0', fill);
        }
        buf.put_slice(&payload);
        if matches!(pad, Pad::RightSpace) {
            buf.put_bytes(b' ', fill);
        }
        Ok(())
    }

    fn write_variable(&self, buf: &mut BytesMut, payload: &[u8]) -> Result<(), EncodeError> {
        // max_variable_length is Some for every kind routed here
        let max = self.iso_type.max_variable_length().unwrap_or(0);
        if payload.len() > max {
            return Err(EncodeError::TooLong {
                iso_type: self.iso_type,
                length: payload.len(),
                max,
            });
        }
        let prefix = self.iso_type.length_prefix_digits();
        let mut digits = itoa::Buffer::new();
        let formatted = digits.format(payload.len());
        buf.put_bytes(b'0', prefix - formatted.len());
        buf.put_slice(formatted.as_bytes());
        buf.put_slice(payload);
        Ok(())
    }
}

impl PartialEq for IsoValue {
    fn eq(&self, other: &Self) -> bool {
        self.iso_type == other.iso_type
            && self.length == other.length
            && self.value == other.value
    }
}

impl fmt::Display for IsoValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.iso_type, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn encode(value: &IsoValue) -> Vec<u8> {
        let mut buf = BytesMut::new();
        value.encode_to(&mut buf, CharEncoding::Latin1).unwrap();
        buf.to_vec()
    }

    #[test]
    fn test_iso_type_registry() {
        assert!(IsoType::Numeric.needs_length());
        assert!(!IsoType::Llvar.needs_length());
        assert_eq!(IsoType::Date10.intrinsic_length(), Some(10));
        assert_eq!(IsoType::Amount.intrinsic_length(), Some(12));
        assert!(IsoType::Binary.is_fixed_length());
        assert!(!IsoType::Lllbin.is_fixed_length());
        assert_eq!(IsoType::Llvar.length_prefix_digits(), 2);
        assert_eq!(IsoType::Lllvar.length_prefix_digits(), 3);
        assert_eq!(IsoType::Alpha.length_prefix_digits(), 0);
        assert_eq!(IsoType::Llbin.max_variable_length(), Some(99));
        assert_eq!(IsoType::Lllvar.max_variable_length(), Some(999));
        assert!(IsoType::Llbin.is_binary_payload());
        assert!(!IsoType::Llvar.is_binary_payload());
    }

    #[test]
    fn test_field_index_range() {
        assert!(FieldIndex::new(2).is_some());
        assert!(FieldIndex::new(128).is_some());
        assert!(FieldIndex::new(0).is_none());
        assert!(FieldIndex::new(1).is_none());
        assert!(FieldIndex::new(129).is_none());
        assert_eq!(FieldIndex::try_from(1), Err(ConfigError::ReservedField));
        assert_eq!(
            FieldIndex::try_from(200),
            Err(ConfigError::FieldIndexOutOfRange { index: 200 })
        );
    }

    #[test]
    fn test_numeric_zero_padding() {
        let value = IsoValue::with_length(IsoType::Numeric, 123i64, 6);
        assert_eq!(encode(&value), b"000123");
    }

    #[test]
    fn test_numeric_too_long() {
        let value = IsoValue::with_length(IsoType::Numeric, "1234567", 6);
        let mut buf = BytesMut::new();
        let err = value.encode_to(&mut buf, CharEncoding::Latin1).unwrap_err();
        assert_eq!(
            err,
            EncodeError::TooLong {
                iso_type: IsoType::Numeric,
                length: 7,
                max: 6
            }
        );
    }

    #[test]
    fn test_alpha_space_padding() {
        let value = IsoValue::with_length(IsoType::Alpha, "TERM", 8);
        assert_eq!(encode(&value), b"TERM    ");
    }

    #[test]
    fn test_fixed_width_counts_bytes_not_chars() {
        // Five chars but six UTF-8 bytes: must not fit a declared 5.
        let value = IsoValue::with_length(IsoType::Alpha, "caf\u{e9}x", 5);
        let mut buf = BytesMut::new();
        let err = value.encode_to(&mut buf, CharEncoding::Utf8).unwrap_err();
        assert_eq!(
            err,
            EncodeError::TooLong {
                iso_type: IsoType::Alpha,
                length: 6,
                max: 5
            }
        );

        // The same text is four single bytes in Latin-1 and fills a 4 exactly.
        let value = IsoValue::with_length(IsoType::Alpha, "caf\u{e9}", 4);
        let mut buf = BytesMut::new();
        value.encode_to(&mut buf, CharEncoding::Latin1).unwrap();
        assert_eq!(buf.as_ref(), [b'c', b'a', b'f', 0xE9]);

        // Under UTF-8 the accented char costs two bytes, so a declared 5
        // holds it with no padding left over.
        let value = IsoValue::with_length(IsoType::Alpha, "caf\u{e9}", 5);
        let mut buf = BytesMut::new();
        value.encode_to(&mut buf, CharEncoding::Utf8).unwrap();
        assert_eq!(buf.as_ref(), "caf\u{e9}".as_bytes());
        assert_eq!(buf.len(), 5);
    }

    #[test]
    fn test_amount_from_decimal() {
        let value = IsoValue::new(IsoType::Amount, Decimal::new(1000, 2));
        assert_eq!(encode(&value), b"000000001000");
    }

    #[test]
    fn test_amount_from_plain_digits() {
        let value = IsoValue::new(IsoType::Amount, "1000");
        assert_eq!(encode(&value), b"000000001000");
    }

    #[test]
    fn test_amount_from_decimal_point_text() {
        let value = IsoValue::new(IsoType::Amount, "10.5");
        assert_eq!(encode(&value), b"000000001050");
    }

    #[test]
    fn test_amount_negative_rejected() {
        let value = IsoValue::new(IsoType::Amount, Decimal::new(-500, 2));
        let mut buf = BytesMut::new();
        let err = value.encode_to(&mut buf, CharEncoding::Latin1).unwrap_err();
        assert_eq!(err, EncodeError::AmountOutOfRange);
    }

    #[test]
    fn test_date10_formatting() {
        let dt = NaiveDate::from_ymd_opt(2024, 1, 25)
            .unwrap()
            .and_hms_opt(13, 22, 40)
            .unwrap();
        let value = IsoValue::new(IsoType::Date10, dt);
        assert_eq!(encode(&value), b"0125132240");
    }

    #[test]
    fn test_date_exp_formatting() {
        let dt = NaiveDate::from_ymd_opt(2027, 9, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let value = IsoValue::new(IsoType::DateExp, dt);
        assert_eq!(encode(&value), b"2709");
    }

    #[test]
    fn test_time_formatting() {
        let dt = NaiveDate::from_ymd_opt(2024, 1, 25)
            .unwrap()
            .and_hms_opt(7, 5, 9)
            .unwrap();
        let value = IsoValue::new(IsoType::Time, dt);
        assert_eq!(encode(&value), b"070509");
    }

    #[test]
    fn test_llvar_prefix() {
        let value = IsoValue::new(IsoType::Llvar, "4111111111111111");
        assert_eq!(encode(&value), b"164111111111111111");
    }

    #[test]
    fn test_lllvar_prefix() {
        let value = IsoValue::new(IsoType::Lllvar, "HELLO");
        assert_eq!(encode(&value), b"005HELLO");
    }

    #[test]
    fn test_llvar_overflow() {
        let long = "9".repeat(100);
        let value = IsoValue::new(IsoType::Llvar, long.as_str());
        let mut buf = BytesMut::new();
        let err = value.encode_to(&mut buf, CharEncoding::Latin1).unwrap_err();
        assert_eq!(
            err,
            EncodeError::TooLong {
                iso_type: IsoType::Llvar,
                length: 100,
                max: 99
            }
        );
    }

    #[test]
    fn test_binary_exact_width() {
        let value = IsoValue::with_length(IsoType::Binary, Bytes::from_static(&[1, 2, 3, 4]), 4);
        assert_eq!(encode(&value), [1, 2, 3, 4]);

        let short = IsoValue::with_length(IsoType::Binary, Bytes::from_static(&[1, 2]), 4);
        let mut buf = BytesMut::new();
        let err = short.encode_to(&mut buf, CharEncoding::Latin1).unwrap_err();
        assert!(matches!(err, EncodeError::WrongLength { expected: 4, length: 2, .. }));
    }

    #[test]
    fn test_llbin_prefix() {
        let value = IsoValue::new(IsoType::Llbin, Bytes::from_static(&[0xAB, 0xCD]));
        assert_eq!(encode(&value), b"02\xAB\xCD");
    }

    #[test]
    fn test_kind_mismatch() {
        let value = IsoValue::with_length(IsoType::Binary, "not bytes", 4);
        let mut buf = BytesMut::new();
        let err = value.encode_to(&mut buf, CharEncoding::Latin1).unwrap_err();
        assert_eq!(
            err,
            EncodeError::KindMismatch {
                iso_type: IsoType::Binary,
                found: "Text"
            }
        );
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Currency(&'static str);

    #[derive(Debug)]
    struct CurrencyCodec;

    impl CustomFieldCodec for CurrencyCodec {
        fn decode_field(&self, raw: &str) -> Option<Box<dyn CustomFieldValue>> {
            match raw.trim() {
                "840" => Some(Box::new(Currency("USD"))),
                "978" => Some(Box::new(Currency("EUR"))),
                _ => None,
            }
        }

        fn encode_field(&self, value: &dyn CustomFieldValue) -> String {
            match value.as_any().downcast_ref::<Currency>() {
                Some(Currency("USD")) => "840".to_owned(),
                Some(Currency("EUR")) => "978".to_owned(),
                _ => String::new(),
            }
        }
    }

    #[test]
    fn test_custom_codec_encoding() {
        let value = IsoValue::with_length(
            IsoType::Numeric,
            FieldValue::Custom(Box::new(Currency("USD"))),
            3,
        )
        .with_custom(Arc::new(CurrencyCodec));
        assert_eq!(encode(&value), b"840");
    }

    #[test]
    fn test_custom_value_equality() {
        let a = FieldValue::Custom(Box::new(Currency("USD")));
        let b = FieldValue::Custom(Box::new(Currency("USD")));
        let c = FieldValue::Custom(Box::new(Currency("EUR")));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, FieldValue::Text("840".to_owned()));
    }

    #[test]
    fn test_deep_clone() {
        let original = IsoValue::new(IsoType::Llvar, "CLONE ME");
        let copy = original.clone();
        assert_eq!(original, copy);
    }
}
