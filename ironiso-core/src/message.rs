/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! ISO 8583 message representation.
//!
//! An [`IsoMessage`] is an ordered, bitmap-indexed collection of field
//! values with an optional ISO header, a message type indicator, and an
//! optional single-byte terminator. Messages are owned by one producer or
//! consumer at a time; the factory deep-copies template fields into them.

use crate::bitmap::Bitmap;
use crate::error::EncodeError;
use crate::field::{FieldIndex, FieldValue, IsoType, IsoValue};
use crate::types::{CharEncoding, Mti};
use bytes::{BufMut, Bytes, BytesMut};
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// A single ISO 8583 message.
///
/// The wire form is produced by [`write_to`](IsoMessage::write_to):
///
/// ```text
/// [ header bytes ][ 4 hex MTI ][ 16/32 hex bitmap ][ fields ascending ][ etx? ]
/// ```
///
/// The secondary bitmap is emitted exactly when a field above 64 is
/// present; field 1 is the indicator bit and never appears as a field.
#[derive(Debug, Clone, PartialEq)]
pub struct IsoMessage {
    header: Option<String>,
    mti: Mti,
    fields: BTreeMap<FieldIndex, IsoValue>,
    etx: Option<u8>,
    encoding: CharEncoding,
}

impl IsoMessage {
    /// Creates an empty message of the given type.
    #[must_use]
    pub fn new(mti: Mti) -> Self {
        Self::with_header(mti, None)
    }

    /// Creates an empty message with an ISO header.
    #[must_use]
    pub fn with_header(mti: Mti, header: Option<String>) -> Self {
        Self {
            header,
            mti,
            fields: BTreeMap::new(),
            etx: None,
            encoding: CharEncoding::default(),
        }
    }

    /// Returns the ISO header, if any.
    #[must_use]
    pub fn header(&self) -> Option<&str> {
        self.header.as_deref()
    }

    /// Sets or clears the ISO header.
    pub fn set_header(&mut self, header: Option<String>) {
        self.header = header;
    }

    /// Returns the message type indicator.
    #[inline]
    #[must_use]
    pub const fn mti(&self) -> Mti {
        self.mti
    }

    /// Sets the message type indicator.
    pub fn set_mti(&mut self, mti: Mti) {
        self.mti = mti;
    }

    /// Returns the terminator byte, if one is configured.
    #[inline]
    #[must_use]
    pub const fn etx(&self) -> Option<u8> {
        self.etx
    }

    /// Sets or clears the terminator byte.
    pub fn set_etx(&mut self, etx: Option<u8>) {
        self.etx = etx;
    }

    /// Returns the character encoding used for text payloads.
    #[inline]
    #[must_use]
    pub const fn encoding(&self) -> CharEncoding {
        self.encoding
    }

    /// Sets the character encoding used for text payloads.
    pub fn set_encoding(&mut self, encoding: CharEncoding) {
        self.encoding = encoding;
    }

    /// Installs a field value.
    pub fn set_field(&mut self, index: FieldIndex, value: IsoValue) {
        self.fields.insert(index, value);
    }

    /// Convenience: wraps a raw value into an [`IsoValue`] and installs it.
    pub fn set_value(
        &mut self,
        index: FieldIndex,
        iso_type: IsoType,
        value: impl Into<FieldValue>,
        length: usize,
    ) {
        self.set_field(index, IsoValue::with_length(iso_type, value, length));
    }

    /// Returns true if the field is present.
    #[must_use]
    pub fn has_field(&self, index: FieldIndex) -> bool {
        self.fields.contains_key(&index)
    }

    /// Returns the field value, if present.
    #[must_use]
    pub fn get_field(&self, index: FieldIndex) -> Option<&IsoValue> {
        self.fields.get(&index)
    }

    /// Removes and returns the field value, if present.
    pub fn remove_field(&mut self, index: FieldIndex) -> Option<IsoValue> {
        self.fields.remove(&index)
    }

    /// Iterates present fields in ascending index order.
    pub fn fields(&self) -> impl Iterator<Item = (FieldIndex, &IsoValue)> {
        self.fields.iter().map(|(&index, value)| (index, value))
    }

    /// Iterates present field indices in ascending order.
    pub fn field_indices(&self) -> impl Iterator<Item = FieldIndex> + '_ {
        self.fields.keys().copied()
    }

    /// Returns the number of present fields.
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Copies every present field of `other` into this message, replacing
    /// values at overlapping indices. Values are deep copies; later edits
    /// to either message never affect the other.
    pub fn merge_from(&mut self, other: &IsoMessage) {
        for (index, value) in other.fields() {
            self.fields.insert(index, value.clone());
        }
    }

    /// Returns true if the wire form will carry a secondary bitmap.
    #[must_use]
    pub fn has_secondary_bitmap(&self) -> bool {
        self.fields.keys().next_back().is_some_and(|i| i.value() >= 65)
    }

    /// Computes the presence bitmap of this message.
    #[must_use]
    pub fn bitmap(&self) -> Bitmap {
        self.fields.keys().map(|i| i.value()).collect()
    }

    /// Writes the complete wire form of the message into `buf`.
    ///
    /// # Errors
    /// Returns [`EncodeError`] with field context when a field value cannot
    /// be encoded; the partially written buffer is the caller's to discard.
    pub fn write_to(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        if let Some(header) = &self.header {
            self.encoding.encode_into(header, buf)?;
        }
        self.mti.write_to(buf);
        self.bitmap().write_hex(buf);
        for (index, value) in &self.fields {
            value
                .encode_to(buf, self.encoding)
                .map_err(|e| e.for_field(index.value()))?;
        }
        if let Some(etx) = self.etx {
            buf.put_u8(etx);
        }
        Ok(())
    }

    /// Writes the message and returns the frozen buffer.
    ///
    /// # Errors
    /// Returns [`EncodeError`] when a field value cannot be encoded.
    pub fn write_bytes(&self) -> Result<Bytes, EncodeError> {
        let mut buf = BytesMut::with_capacity(64 + self.fields.len() * 16);
        self.write_to(&mut buf)?;
        Ok(buf.freeze())
    }

    /// Renders a one-line human-readable form for logs.
    #[must_use]
    pub fn debug_string(&self) -> String {
        let mut out = String::new();
        if let Some(header) = &self.header {
            out.push_str(header);
            out.push(' ');
        }
        let _ = write!(out, "{}[{}]", self.mti, self.bitmap());
        for (index, value) in &self.fields {
            let _ = write!(out, " {index}:{value}");
        }
        out
    }
}
