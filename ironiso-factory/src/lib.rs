/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # Ironiso Factory
//!
//! Message factory and configuration ingestion for the ironiso ISO 8583
//! engine.
//!
//! The [`MessageFactory`] builds outbound messages from per-type templates
//! (assigning trace numbers and timestamps), constructs responses from
//! requests, and parses inbound byte buffers against per-type parse
//! schemas. [`FactoryConfig`] is the serde-described configuration surface
//! that feeds a factory from whatever format the caller reads.

pub mod config;
pub mod factory;

pub use config::{
    FactoryConfig, HeaderSpec, ParseFieldSpec, ParseMapSpec, TemplateFieldSpec, TemplateSpec,
};
pub use factory::MessageFactory;
