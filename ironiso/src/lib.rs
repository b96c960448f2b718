/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # Ironiso
//!
//! An ISO 8583 codec and message factory for Rust.
//!
//! Ironiso frames and parses the wire protocol used between payment
//! terminals, acquirers, switches, and issuers: a fixed-width message type
//! indicator, one or two hex-ASCII presence bitmaps, and a heterogeneous
//! sequence of typed fields whose layout is defined per message type.
//!
//! ## Quick Start
//!
//! ```rust
//! use ironiso::prelude::*;
//! use std::collections::HashMap;
//!
//! let mut factory = MessageFactory::new();
//! factory.set_iso_header(Mti::new(0x0200), Some("ISO015000050".to_owned()));
//!
//! let mut map = HashMap::new();
//! map.insert(
//!     FieldIndex::new(3).unwrap(),
//!     FieldParseInfo::numeric(6).unwrap(),
//! );
//! map.insert(FieldIndex::new(4).unwrap(), FieldParseInfo::amount());
//! factory.set_parse_map(Mti::new(0x0200), map);
//!
//! let mut message = factory.new_message(Mti::new(0x0200));
//! message.set_value(
//!     FieldIndex::new(3).unwrap(),
//!     IsoType::Numeric,
//!     "650000",
//!     6,
//! );
//! message.set_value(FieldIndex::new(4).unwrap(), IsoType::Amount, "1000", 12);
//!
//! let wire = message.write_bytes().unwrap();
//! let parsed = factory.parse(&wire, 12).unwrap();
//! assert_eq!(parsed.mti(), Mti::new(0x0200));
//! ```
//!
//! ## Crate Organization
//!
//! - [`core`]: Errors, field kinds and values, messages, wire primitives
//! - [`parse`]: Schema-driven field parsers
//! - [`factory`]: Message factory and configuration ingestion

pub mod core {
    //! Errors, field kinds and values, messages, wire primitives.
    pub use ironiso_core::*;
}

pub mod parse {
    //! Schema-driven field parsers.
    pub use ironiso_parse::*;
}

pub mod factory {
    //! Message factory and configuration ingestion.
    pub use ironiso_factory::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    // Core types
    pub use ironiso_core::{
        Bitmap, CharEncoding, ConfigError, CustomFieldCodec, CustomFieldValue, DecodeError,
        EncodeError, EncodingError, FieldIndex, FieldValue, IsoError, IsoMessage, IsoType,
        IsoValue, Mti, Result, SimpleTraceGenerator, TraceNumberGenerator,
    };

    // Field parsers
    pub use ironiso_parse::FieldParseInfo;

    // Factory
    pub use ironiso_factory::{FactoryConfig, MessageFactory};
}
