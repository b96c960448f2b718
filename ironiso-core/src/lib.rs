/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # Ironiso Core
//!
//! Core types, values, and wire primitives for the ironiso ISO 8583 engine.
//!
//! This crate provides the fundamental building blocks used across all
//! ironiso crates:
//! - **Error types**: Unified error handling with `thiserror`
//! - **Field types**: [`IsoType`], [`IsoValue`], [`FieldIndex`], and the
//!   custom-codec traits
//! - **Message type**: [`IsoMessage`] with the complete wire encoder
//! - **Wire primitives**: [`Bitmap`], [`Mti`], [`CharEncoding`]
//! - **Trace numbers**: [`TraceNumberGenerator`] and [`SimpleTraceGenerator`]
//!
//! ## Ownership Model
//!
//! Messages are plain owned values, never shared. Factory templates are
//! deep-copied into new messages, so a message can be freely mutated without
//! observing or affecting any other.

pub mod bitmap;
pub mod error;
pub mod field;
pub mod message;
pub mod types;

pub use bitmap::Bitmap;
pub use error::{ConfigError, DecodeError, EncodeError, IsoError, Result};
pub use field::{CustomFieldCodec, CustomFieldValue, FieldIndex, FieldValue, IsoType, IsoValue};
pub use message::IsoMessage;
pub use types::{
    CharEncoding, EncodingError, Mti, SimpleTraceGenerator, TraceNumberGenerator, MAX_TRACE,
};
