/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Per-field parse schema entries.
//!
//! A [`FieldParseInfo`] describes one (message type, field index) slot: the
//! field kind, its declared length for fixed kinds, the character encoding,
//! and an optional custom codec. It exposes a single operation, `parse`,
//! which consumes bytes at an offset and yields the field value plus the
//! number of bytes consumed. Entries are immutable once installed and safe
//! to use from concurrent parsers.

use crate::dates;
use bytes::Bytes;
use chrono::{Local, NaiveDateTime};
use ironiso_core::error::{ConfigError, DecodeError};
use ironiso_core::field::{CustomFieldCodec, FieldValue, IsoType, IsoValue};
use ironiso_core::types::CharEncoding;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::debug;

/// Schema entry for a single field.
#[derive(Debug, Clone)]
pub struct FieldParseInfo {
    iso_type: IsoType,
    length: usize,
    encoding: Option<CharEncoding>,
    custom: Option<Arc<dyn CustomFieldCodec>>,
}

impl FieldParseInfo {
    /// Creates a schema entry.
    ///
    /// Self-describing kinds keep their intrinsic width; variable kinds
    /// ignore the length argument.
    ///
    /// # Errors
    /// Returns [`ConfigError::ZeroLength`] when a kind that requires a
    /// declared length is given zero.
    pub fn new(iso_type: IsoType, length: usize) -> Result<Self, ConfigError> {
        if iso_type.needs_length() && length == 0 {
            return Err(ConfigError::ZeroLength { iso_type });
        }
        let length = if iso_type.is_fixed_length() {
            iso_type.intrinsic_length().unwrap_or(length)
        } else {
            0
        };
        Ok(Self {
            iso_type,
            length,
            encoding: None,
            custom: None,
        })
    }

    /// Entry for a NUMERIC field of the given width.
    ///
    /// # Errors
    /// Returns [`ConfigError::ZeroLength`] for a zero width.
    pub fn numeric(length: usize) -> Result<Self, ConfigError> {
        Self::new(IsoType::Numeric, length)
    }

    /// Entry for an ALPHA field of the given width.
    ///
    /// # Errors
    /// Returns [`ConfigError::ZeroLength`] for a zero width.
    pub fn alpha(length: usize) -> Result<Self, ConfigError> {
        Self::new(IsoType::Alpha, length)
    }

    /// Entry for a BINARY field of the given width.
    ///
    /// # Errors
    /// Returns [`ConfigError::ZeroLength`] for a zero width.
    pub fn binary(length: usize) -> Result<Self, ConfigError> {
        Self::new(IsoType::Binary, length)
    }

    /// Entry for an LLVAR field.
    #[must_use]
    pub fn llvar() -> Self {
        Self::infallible(IsoType::Llvar)
    }

    /// Entry for an LLLVAR field.
    #[must_use]
    pub fn lllvar() -> Self {
        Self::infallible(IsoType::Lllvar)
    }

    /// Entry for an LLBIN field.
    #[must_use]
    pub fn llbin() -> Self {
        Self::infallible(IsoType::Llbin)
    }

    /// Entry for an LLLBIN field.
    #[must_use]
    pub fn lllbin() -> Self {
        Self::infallible(IsoType::Lllbin)
    }

    /// Entry for a DATE10 field.
    #[must_use]
    pub fn date10() -> Self {
        Self::infallible(IsoType::Date10)
    }

    /// Entry for a DATE4 field.
    #[must_use]
    pub fn date4() -> Self {
        Self::infallible(IsoType::Date4)
    }

    /// Entry for a DATE_EXP field.
    #[must_use]
    pub fn date_exp() -> Self {
        Self::infallible(IsoType::DateExp)
    }

    /// Entry for a TIME field.
    #[must_use]
    pub fn time() -> Self {
        Self::infallible(IsoType::Time)
    }

    /// Entry for an AMOUNT field.
    #[must_use]
    pub fn amount() -> Self {
        Self::infallible(IsoType::Amount)
    }

    fn infallible(iso_type: IsoType) -> Self {
        Self {
            iso_type,
            length: iso_type.intrinsic_length().unwrap_or(0),
            encoding: None,
            custom: None,
        }
    }

    /// Overrides the character encoding for this field.
    #[must_use]
    pub fn with_encoding(mut self, encoding: CharEncoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    /// Attaches a custom codec applied to the decoded text.
    #[must_use]
    pub fn with_custom(mut self, custom: Arc<dyn CustomFieldCodec>) -> Self {
        self.custom = Some(custom);
        self
    }

    /// Sets the encoding only if none was explicitly configured. The
    /// factory stamps its own encoding through this when a map is installed.
    pub fn inherit_encoding(&mut self, encoding: CharEncoding) {
        if self.encoding.is_none() {
            self.encoding = Some(encoding);
        }
    }

    /// Returns the field kind.
    #[inline]
    #[must_use]
    pub const fn iso_type(&self) -> IsoType {
        self.iso_type
    }

    /// Returns the declared length (0 for variable kinds).
    #[inline]
    #[must_use]
    pub const fn length(&self) -> usize {
        self.length
    }

    /// Returns the effective character encoding.
    #[must_use]
    pub fn encoding(&self) -> CharEncoding {
        self.encoding.unwrap_or_default()
    }

    /// Parses this field at `offset`, returning the value and the number of
    /// bytes consumed.
    ///
    /// The parser is pure: it reads only from `buf` and can be called from
    /// any number of threads at once.
    ///
    /// # Errors
    /// Returns [`DecodeError`] when the buffer is too short, a length
    /// prefix is not digits, the text cannot be decoded, or a date or
    /// amount payload is malformed.
    pub fn parse(&self, buf: &[u8], offset: usize) -> Result<(IsoValue, usize), DecodeError> {
        self.parse_at(buf, offset, Local::now().naive_local())
    }

    /// Parse against an explicit reference instant for the year-less date
    /// kinds. `parse` uses the local clock.
    pub(crate) fn parse_at(
        &self,
        buf: &[u8],
        offset: usize,
        reference: NaiveDateTime,
    ) -> Result<(IsoValue, usize), DecodeError> {
        match self.iso_type {
            IsoType::Numeric | IsoType::Alpha => {
                let raw = self.read_text(buf, offset, self.length)?;
                let value = self.enrich(raw);
                Ok((self.build(value, self.length), self.length))
            }
            IsoType::Date10 | IsoType::Date4 | IsoType::DateExp | IsoType::Time => {
                let width = self.length;
                let raw = self.read_text(buf, offset, width)?;
                if let Some(custom) = self.decode_custom(&raw) {
                    return Ok((self.build(custom, width), width));
                }
                let parsed = match self.iso_type {
                    IsoType::Date10 => dates::parse_date10(&raw, reference),
                    IsoType::Date4 => dates::parse_date4(&raw, reference),
                    IsoType::DateExp => dates::parse_date_exp(&raw, reference),
                    _ => dates::parse_time(&raw, reference),
                };
                let dt = parsed.ok_or(DecodeError::InvalidDate {
                    iso_type: self.iso_type,
                    offset,
                })?;
                Ok((self.build(FieldValue::DateTime(dt), width), width))
            }
            IsoType::Amount => {
                let raw = self.read_text(buf, offset, 12)?;
                if let Some(custom) = self.decode_custom(&raw) {
                    return Ok((self.build(custom, 12), 12));
                }
                let mut minor: i64 = 0;
                for b in raw.bytes() {
                    if !b.is_ascii_digit() {
                        return Err(DecodeError::InvalidAmount { offset });
                    }
                    minor = minor * 10 + i64::from(b - b'0');
                }
                let value = FieldValue::Amount(Decimal::new(minor, 2));
                Ok((self.build(value, 12), 12))
            }
            IsoType::Binary => {
                let bytes = take(buf, offset, self.length)?;
                let value = FieldValue::Bytes(Bytes::copy_from_slice(bytes));
                Ok((self.build(value, self.length), self.length))
            }
            IsoType::Llvar | IsoType::Lllvar => {
                let (payload_len, prefix) = self.read_length_prefix(buf, offset)?;
                let raw = self.read_text(buf, offset + prefix, payload_len)?;
                let value = self.enrich(raw);
                Ok((self.build(value, payload_len), prefix + payload_len))
            }
            IsoType::Llbin | IsoType::Lllbin => {
                let (payload_len, prefix) = self.read_length_prefix(buf, offset)?;
                let bytes = take(buf, offset + prefix, payload_len)?;
                let value = FieldValue::Bytes(Bytes::copy_from_slice(bytes));
                Ok((self.build(value, payload_len), prefix + payload_len))
            }
        }
    }

    fn build(&self, value: FieldValue, length: usize) -> IsoValue {
        let built = IsoValue::with_length(self.iso_type, value, length);
        match &self.custom {
            Some(codec) => built.with_custom(Arc::clone(codec)),
            None => built,
        }
    }

    fn read_text(&self, buf: &[u8], offset: usize, needed: usize) -> Result<String, DecodeError> {
        let bytes = take(buf, offset, needed)?;
        self.encoding()
            .decode(bytes)
            .map_err(|source| DecodeError::Encoding { offset, source })
    }

    fn read_length_prefix(&self, buf: &[u8], offset: usize) -> Result<(usize, usize), DecodeError> {
        let digits = self.iso_type.length_prefix_digits();
        let prefix = take(buf, offset, digits)?;
        let mut length = 0usize;
        for (i, &b) in prefix.iter().enumerate() {
            if !b.is_ascii_digit() {
                return Err(DecodeError::InvalidLengthPrefix {
                    iso_type: self.iso_type,
                    offset: offset + i,
                });
            }
            length = length * 10 + usize::from(b - b'0');
        }
        Ok((length, digits))
    }

    /// Runs the custom codec over the decoded text, if one is attached.
    fn decode_custom(&self, raw: &str) -> Option<FieldValue> {
        let codec = self.custom.as_ref()?;
        match codec.decode_field(raw) {
            Some(value) => Some(FieldValue::Custom(value)),
            None => {
                debug!(raw, "custom codec declined value, keeping raw text");
                None
            }
        }
    }

    /// Custom decode with raw-text fallback for the plain text kinds.
    fn enrich(&self, raw: String) -> FieldValue {
        match self.decode_custom(&raw) {
            Some(value) => value,
            None => FieldValue::Text(raw),
        }
    }
}

/// Borrows `needed` bytes at `offset`, or reports the shortfall.
fn take(buf: &[u8], offset: usize, needed: usize) -> Result<&[u8], DecodeError> {
    let available = buf.len().saturating_sub(offset);
    if available < needed {
        return Err(DecodeError::Truncated {
            offset,
            needed,
            available,
        });
    }
    Ok(&buf[offset..offset + needed])
}
