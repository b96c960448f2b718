/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # Ironiso Parse
//!
//! Schema-driven field parsers for the ironiso ISO 8583 engine.
//!
//! A parse schema is a set of [`FieldParseInfo`] entries, one per
//! (message type, field index) slot. Each entry knows its field kind's
//! length and encoding rules and exposes a single pure operation:
//! `parse(buf, offset)` yielding the decoded [`IsoValue`](ironiso_core::IsoValue)
//! and the number of bytes consumed. The factory walks the message bitmap
//! and dispatches to these entries in ascending field order.
//!
//! Year-less date kinds (DATE10, DATE4) are resolved against the local
//! clock with the standard six-month rollback for settlement windows.

mod dates;
mod info;

pub use info::FieldParseInfo;
