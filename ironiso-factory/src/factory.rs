/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! The ISO 8583 message factory.
//!
//! A [`MessageFactory`] holds per-type headers, per-type message templates,
//! and per-type parse schemas, and produces messages three ways: from
//! scratch ([`new_message`](MessageFactory::new_message)), as a response to
//! a request ([`create_response`](MessageFactory::create_response)), and
//! from inbound bytes ([`parse`](MessageFactory::parse)).
//!
//! ## Two-phase lifecycle
//!
//! Configuration setters take `&mut self`; producing and parsing take
//! `&self`. The borrow checker therefore enforces the phase boundary:
//! while any producer or parser holds a shared reference the factory
//! cannot be reconfigured. Once configured, a factory behind an `Arc` is
//! safe for unlimited concurrent use; the trace-number source is the only
//! shared mutable dependency and is internally synchronized.

use chrono::Local;
use ironiso_core::bitmap::Bitmap;
use ironiso_core::error::DecodeError;
use ironiso_core::field::{FieldIndex, IsoType};
use ironiso_core::message::IsoMessage;
use ironiso_core::types::{CharEncoding, Mti, TraceNumberGenerator};
use ironiso_parse::FieldParseInfo;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

/// Field 11, systems trace audit number.
const TRACE_FIELD: FieldIndex = match FieldIndex::new(11) {
    Some(index) => index,
    None => unreachable!(),
};

/// Field 7, transmission date and time.
const DATE_FIELD: FieldIndex = match FieldIndex::new(7) {
    Some(index) => index,
    None => unreachable!(),
};

/// Creates messages from templates and parses inbound buffers.
#[derive(Debug, Default)]
pub struct MessageFactory {
    /// ISO header per message type.
    headers: HashMap<Mti, String>,
    /// Message template per message type.
    templates: HashMap<Mti, IsoMessage>,
    /// Parse schema per message type.
    parse_maps: HashMap<Mti, HashMap<FieldIndex, FieldParseInfo>>,
    /// Ascending field order per parse schema, precomputed at install time.
    parse_order: HashMap<Mti, SmallVec<[FieldIndex; 32]>>,
    trace_gen: Option<Arc<dyn TraceNumberGenerator>>,
    assign_date: bool,
    etx: Option<u8>,
    encoding: CharEncoding,
}

impl MessageFactory {
    /// Creates an unconfigured factory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets or removes the ISO header for a message type.
    pub fn set_iso_header(&mut self, mti: Mti, header: Option<String>) {
        match header {
            Some(value) => {
                self.headers.insert(mti, value);
            }
            None => {
                self.headers.remove(&mti);
            }
        }
    }

    /// Returns the ISO header configured for a message type.
    #[must_use]
    pub fn iso_header(&self, mti: Mti) -> Option<&str> {
        self.headers.get(&mti).map(String::as_str)
    }

    /// Sets or removes the message template for a type. New messages of
    /// that type start with deep copies of every template field.
    pub fn set_message_template(&mut self, mti: Mti, template: Option<IsoMessage>) {
        match template {
            Some(value) => {
                self.templates.insert(mti, value);
            }
            None => {
                self.templates.remove(&mti);
            }
        }
    }

    /// Returns the template configured for a message type.
    #[must_use]
    pub fn message_template(&self, mti: Mti) -> Option<&IsoMessage> {
        self.templates.get(&mti)
    }

    /// Installs the parse schema for a message type and precomputes its
    /// ascending field order so parsing never re-sorts.
    ///
    /// Entries without an explicit encoding inherit the factory encoding,
    /// so call [`set_character_encoding`](Self::set_character_encoding)
    /// before installing maps.
    pub fn set_parse_map(&mut self, mti: Mti, mut map: HashMap<FieldIndex, FieldParseInfo>) {
        for info in map.values_mut() {
            info.inherit_encoding(self.encoding);
        }
        let mut order: SmallVec<[FieldIndex; 32]> = map.keys().copied().collect();
        order.sort_unstable();
        trace!(
            mti = %mti,
            fields = ?order.iter().map(|i| i.value()).collect::<Vec<_>>(),
            "installing parse map"
        );
        self.parse_maps.insert(mti, map);
        self.parse_order.insert(mti, order);
    }

    /// Returns the parse schema installed for a message type.
    #[must_use]
    pub fn parse_map(&self, mti: Mti) -> Option<&HashMap<FieldIndex, FieldParseInfo>> {
        self.parse_maps.get(&mti)
    }

    /// Sets the trace-number source. Every message created afterwards gets
    /// field 11 assigned from it.
    pub fn set_trace_number_generator(&mut self, generator: Arc<dyn TraceNumberGenerator>) {
        self.trace_gen = Some(generator);
    }

    /// Returns the configured trace-number source.
    #[must_use]
    pub fn trace_number_generator(&self) -> Option<&Arc<dyn TraceNumberGenerator>> {
        self.trace_gen.as_ref()
    }

    /// Sets whether new messages get the current time in field 7.
    pub fn set_assign_date(&mut self, flag: bool) {
        self.assign_date = flag;
    }

    /// Returns true if new messages get the current time in field 7.
    #[must_use]
    pub const fn assign_date(&self) -> bool {
        self.assign_date
    }

    /// Sets or clears the terminator byte appended to written messages.
    pub fn set_etx(&mut self, etx: Option<u8>) {
        self.etx = etx;
    }

    /// Returns the configured terminator byte.
    #[must_use]
    pub const fn etx(&self) -> Option<u8> {
        self.etx
    }

    /// Sets the character encoding for headers and text payloads.
    pub fn set_character_encoding(&mut self, encoding: CharEncoding) {
        self.encoding = encoding;
    }

    /// Returns the factory character encoding.
    #[must_use]
    pub const fn character_encoding(&self) -> CharEncoding {
        self.encoding
    }

    /// Creates a new message of the given type: configured header, deep
    /// copies of the template fields, then trace (field 11) and date
    /// (field 7) when those sources are configured.
    #[must_use]
    pub fn new_message(&self, mti: Mti) -> IsoMessage {
        let mut message = self.blank(mti);
        if let Some(generator) = &self.trace_gen {
            let next = generator.next_trace();
            message.set_value(TRACE_FIELD, IsoType::Numeric, i64::from(next), 6);
        }
        if self.assign_date {
            message.set_value(DATE_FIELD, IsoType::Date10, Local::now().naive_local(), 10);
        }
        message
    }

    /// Creates the response to a request: type + 0x10, the response type's
    /// header and template, then every request field overlaid on top.
    /// Request values win over template values at overlapping indices.
    #[must_use]
    pub fn create_response(&self, request: &IsoMessage) -> IsoMessage {
        let mut response = self.blank(request.mti().response());
        response.merge_from(request);
        response
    }

    fn blank(&self, mti: Mti) -> IsoMessage {
        let mut message = IsoMessage::with_header(mti, self.headers.get(&mti).cloned());
        message.set_etx(self.etx);
        message.set_encoding(self.encoding);
        if let Some(template) = self.templates.get(&mti) {
            message.merge_from(template);
        }
        message
    }

    /// Parses an inbound buffer into a message.
    ///
    /// The buffer must hold a complete message without any transport
    /// length framing: `header_len` header bytes, the four-digit type, the
    /// bitmap, and every field the bitmap announces.
    ///
    /// # Errors
    /// Returns [`DecodeError::NoParseMap`] when no schema is registered
    /// for the parsed type, [`DecodeError::NoParseInfo`] when the bitmap
    /// names a field the schema lacks, [`DecodeError::Truncated`] when the
    /// buffer ends early, and field-level errors wrapped with their field
    /// index. No partial message is ever returned.
    pub fn parse(&self, buf: &[u8], header_len: usize) -> Result<IsoMessage, DecodeError> {
        if buf.len() < header_len {
            return Err(DecodeError::Truncated {
                offset: 0,
                needed: header_len,
                available: buf.len(),
            });
        }
        let header = if header_len > 0 {
            let decoded = self
                .encoding
                .decode(&buf[..header_len])
                .map_err(|source| DecodeError::Encoding { offset: 0, source })?;
            Some(decoded)
        } else {
            None
        };
        let mti = Mti::from_wire(buf, header_len)?;
        let (bitmap, bitmap_len) = Bitmap::parse(buf, header_len + 4)?;

        let guide = self
            .parse_maps
            .get(&mti)
            .ok_or(DecodeError::NoParseMap { mti })?;
        let order = self
            .parse_order
            .get(&mti)
            .ok_or(DecodeError::NoParseMap { mti })?;

        // Every announced field must have a schema entry before any field
        // is parsed, otherwise offsets past the gap would be garbage.
        for field in bitmap.field_indices().filter(|&f| f >= 2) {
            let known = FieldIndex::new(field).is_some_and(|index| guide.contains_key(&index));
            if !known {
                return Err(DecodeError::NoParseInfo { mti, field });
            }
        }

        let mut message = IsoMessage::with_header(mti, header);
        message.set_encoding(self.encoding);
        message.set_etx(self.etx);

        let mut pos = header_len + 4 + bitmap_len;
        for &index in order {
            if !bitmap.get(index.value()) {
                continue;
            }
            let Some(info) = guide.get(&index) else {
                continue;
            };
            let (value, consumed) = info
                .parse(buf, pos)
                .map_err(|e| e.for_field(index.value()))?;
            message.set_field(index, value);
            pos += consumed;
        }
        Ok(message)
    }
}
