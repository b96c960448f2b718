/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Programmatic factory configuration.
//!
//! [`FactoryConfig`] is a serde-described picture of a fully configured
//! factory: headers, message templates, and parse schemas keyed by message
//! type. Loading it from a file format is the caller's concern; any format
//! serde can read produces this structure, which is then applied to a
//! [`MessageFactory`] in one validated step. Inconsistencies surface as
//! [`ConfigError`] before the factory is ever used.

use crate::factory::MessageFactory;
use bytes::Bytes;
use ironiso_core::error::{ConfigError, IsoError};
use ironiso_core::field::{FieldIndex, FieldValue, IsoType, IsoValue};
use ironiso_core::message::IsoMessage;
use ironiso_core::types::{CharEncoding, Mti};
use ironiso_parse::FieldParseInfo;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Complete factory configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FactoryConfig {
    /// Terminator byte appended to written messages.
    pub etx: Option<u8>,
    /// Whether new messages get the current time in field 7.
    pub assign_date: bool,
    /// Character encoding for headers and text payloads.
    pub encoding: CharEncoding,
    /// ISO headers per message type.
    pub headers: Vec<HeaderSpec>,
    /// Message templates per message type.
    pub templates: Vec<TemplateSpec>,
    /// Parse schemas per message type.
    pub parse_maps: Vec<ParseMapSpec>,
}

/// ISO header for one message type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeaderSpec {
    /// The message type the header applies to.
    pub mti: Mti,
    /// The header text.
    pub header: String,
}

/// Template for one message type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateSpec {
    /// The message type the template applies to.
    pub mti: Mti,
    /// Default field values copied into every new message of the type.
    pub fields: Vec<TemplateFieldSpec>,
}

/// One template field value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateFieldSpec {
    /// Field index, 2..=128.
    pub index: u8,
    /// Field kind.
    pub iso_type: IsoType,
    /// Declared length; defaults to the kind's intrinsic width or the
    /// value's own length.
    #[serde(default)]
    pub length: Option<usize>,
    /// The value: text for text kinds, hex digits for binary kinds.
    pub value: String,
}

/// Parse schema for one message type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseMapSpec {
    /// The message type the schema applies to.
    pub mti: Mti,
    /// Expected fields in the type.
    pub fields: Vec<ParseFieldSpec>,
}

/// One parse schema entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseFieldSpec {
    /// Field index, 2..=128.
    pub index: u8,
    /// Field kind.
    pub iso_type: IsoType,
    /// Declared length for fixed kinds.
    #[serde(default)]
    pub length: Option<usize>,
    /// Per-field encoding override.
    #[serde(default)]
    pub encoding: Option<CharEncoding>,
}

impl FactoryConfig {
    /// Applies the whole configuration to a factory.
    ///
    /// Parse maps are installed before templates so template fields can be
    /// cross-checked against the schema of the same message type.
    ///
    /// # Errors
    /// Returns [`ConfigError`] (wrapped in [`IsoError`]) on out-of-range
    /// indices, zero lengths for fixed kinds, kind disagreements between a
    /// template and its parse map, and values that do not fit their kind.
    pub fn apply(&self, factory: &mut MessageFactory) -> Result<(), IsoError> {
        factory.set_character_encoding(self.encoding);
        factory.set_etx(self.etx);
        factory.set_assign_date(self.assign_date);

        for spec in &self.headers {
            factory.set_iso_header(spec.mti, Some(spec.header.clone()));
        }

        for spec in &self.parse_maps {
            let mut map = HashMap::with_capacity(spec.fields.len());
            for field in &spec.fields {
                let index = parse_index(field.index)?;
                let mut info = FieldParseInfo::new(field.iso_type, field.length.unwrap_or(0))?;
                if let Some(encoding) = field.encoding {
                    info = info.with_encoding(encoding);
                }
                map.insert(index, info);
            }
            factory.set_parse_map(spec.mti, map);
        }

        for spec in &self.templates {
            let mut template = IsoMessage::new(spec.mti);
            template.set_encoding(self.encoding);
            for field in &spec.fields {
                let index = parse_index(field.index)?;
                if let Some(info) = factory.parse_map(spec.mti).and_then(|m| m.get(&index)) {
                    if info.iso_type() != field.iso_type {
                        return Err(ConfigError::KindMismatch {
                            index: field.index,
                            expected: info.iso_type(),
                            found: field.iso_type,
                        }
                        .into());
                    }
                }
                template.set_field(index, template_value(field)?);
            }
            factory.set_message_template(spec.mti, Some(template));
        }
        Ok(())
    }
}

fn parse_index(index: u8) -> Result<FieldIndex, ConfigError> {
    FieldIndex::try_from(index)
}

/// Builds the [`IsoValue`] for a template field, validating the value
/// against the declared kind and length.
fn template_value(field: &TemplateFieldSpec) -> Result<IsoValue, IsoError> {
    let iso_type = field.iso_type;
    let bad = |reason: &str| {
        IsoError::from(ConfigError::BadTemplateValue {
            index: field.index,
            iso_type,
            reason: reason.to_owned(),
        })
    };

    if iso_type.is_binary_payload() {
        let bytes = decode_hex(&field.value).ok_or_else(|| bad("not an even run of hex digits"))?;
        let length = field.length.unwrap_or(bytes.len());
        if iso_type == IsoType::Binary && bytes.len() != length {
            return Err(bad("payload does not fill the declared length"));
        }
        if let Some(max) = iso_type.max_variable_length() {
            if bytes.len() > max {
                return Err(ConfigError::LengthOverflow {
                    iso_type,
                    length: bytes.len(),
                    max,
                }
                .into());
            }
        }
        return Ok(IsoValue::with_length(
            iso_type,
            FieldValue::Bytes(Bytes::from(bytes)),
            length,
        ));
    }

    let width = field.value.chars().count();
    if let Some(intrinsic) = iso_type.intrinsic_length() {
        // Date, time, and amount templates travel as pre-rendered text.
        let exact = match iso_type {
            IsoType::Amount => width <= intrinsic,
            _ => width == intrinsic,
        };
        if !exact {
            return Err(bad("value does not match the kind's width"));
        }
        if !field.value.chars().all(|c| c.is_ascii_digit() || c == '.') {
            return Err(bad("value is not numeric"));
        }
        return Ok(IsoValue::new(iso_type, field.value.as_str()));
    }

    if let Some(max) = iso_type.max_variable_length() {
        if width > max {
            return Err(ConfigError::LengthOverflow {
                iso_type,
                length: width,
                max,
            }
            .into());
        }
        return Ok(IsoValue::new(iso_type, field.value.as_str()));
    }

    // Fixed text kinds with an explicit width.
    let length = match field.length {
        Some(0) => return Err(ConfigError::ZeroLength { iso_type }.into()),
        Some(length) => length,
        None => width,
    };
    if width > length {
        return Err(bad("value is longer than the declared length"));
    }
    Ok(IsoValue::with_length(iso_type, field.value.as_str(), length))
}

fn decode_hex(s: &str) -> Option<Vec<u8>> {
    fn digit(b: u8) -> Option<u8> {
        match b {
            b'0'..=b'9' => Some(b - b'0'),
            b'A'..=b'F' => Some(b - b'A' + 10),
            b'a'..=b'f' => Some(b - b'a' + 10),
            _ => None,
        }
    }
    if s.len() % 2 != 0 {
        return None;
    }
    s.as_bytes()
        .chunks(2)
        .map(|pair| Some((digit(pair[0])? << 4) | digit(pair[1])?))
        .collect()
}
