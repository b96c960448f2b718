/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! End-to-end scenarios over the whole engine: factory configuration,
//! message creation, wire encoding, and symmetric parsing.

use ironiso::prelude::*;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

fn idx(i: u8) -> FieldIndex {
    FieldIndex::new(i).unwrap()
}

/// Factory for a 0200 purchase: header, template field 3, and a parse map
/// covering the fields the scenarios exercise.
fn purchase_factory() -> MessageFactory {
    let mut factory = MessageFactory::new();
    factory.set_iso_header(Mti::new(0x0200), Some("ISO015000050".to_owned()));
    factory.set_iso_header(Mti::new(0x0210), Some("ISO015000055".to_owned()));

    let mut template = IsoMessage::new(Mti::new(0x0200));
    template.set_value(idx(3), IsoType::Numeric, "650000", 6);
    factory.set_message_template(Mti::new(0x0200), Some(template));

    let mut map = HashMap::new();
    map.insert(idx(2), FieldParseInfo::llvar());
    map.insert(idx(3), FieldParseInfo::numeric(6).unwrap());
    map.insert(idx(4), FieldParseInfo::amount());
    map.insert(idx(11), FieldParseInfo::numeric(6).unwrap());
    map.insert(idx(41), FieldParseInfo::alpha(8).unwrap());
    map.insert(idx(64), FieldParseInfo::binary(4).unwrap());
    map.insert(idx(70), FieldParseInfo::numeric(3).unwrap());
    factory.set_parse_map(Mti::new(0x0200), map.clone());
    factory.set_parse_map(Mti::new(0x0210), map);
    factory
}

#[test]
fn purchase_encodes_to_known_bytes() {
    let factory = purchase_factory();
    let mut message = factory.new_message(Mti::new(0x0200));
    message.set_value(idx(4), IsoType::Amount, "1000", 12);
    message.set_value(idx(11), IsoType::Numeric, "000123", 6);
    message.set_value(idx(41), IsoType::Alpha, "TERM0001", 8);

    let wire = message.write_bytes().unwrap();
    let expected: Vec<u8> = [
        "ISO015000050",
        "0200",
        "3020000000800000",
        "650000",
        "000000001000",
        "000123",
        "TERM0001",
    ]
    .concat()
    .into_bytes();
    assert_eq!(wire.as_ref(), expected.as_slice());
}

#[test]
fn purchase_parses_back() {
    let factory = purchase_factory();
    let mut message = factory.new_message(Mti::new(0x0200));
    message.set_value(idx(4), IsoType::Amount, "1000", 12);
    message.set_value(idx(11), IsoType::Numeric, "000123", 6);
    message.set_value(idx(41), IsoType::Alpha, "TERM0001", 8);
    let wire = message.write_bytes().unwrap();

    let parsed = factory.parse(&wire, 12).unwrap();
    assert_eq!(parsed.mti(), Mti::new(0x0200));
    assert_eq!(parsed.header(), Some("ISO015000050"));
    assert_eq!(parsed.get_field(idx(3)).unwrap().as_text(), Some("650000"));
    assert_eq!(
        parsed.get_field(idx(4)).unwrap().as_amount(),
        Some(Decimal::new(1000, 2))
    );
    assert_eq!(parsed.get_field(idx(11)).unwrap().as_text(), Some("000123"));
    assert_eq!(
        parsed.get_field(idx(41)).unwrap().as_text(),
        Some("TERM0001")
    );
}

#[test]
fn secondary_bitmap_appears_at_field_65_and_up() {
    let factory = purchase_factory();

    let mut high = factory.new_message(Mti::new(0x0200));
    high.remove_field(idx(3));
    high.set_value(idx(70), IsoType::Numeric, "301", 3);
    let wire = high.write_bytes().unwrap();
    // Header + MTI + 32 hex chars; first bitmap char carries the field-1 bit.
    assert_eq!(wire.len(), 12 + 4 + 32 + 3);
    assert_eq!(wire[16], b'8');

    let mut low = factory.new_message(Mti::new(0x0200));
    let wire = low.write_bytes().unwrap();
    assert_eq!(wire.len(), 12 + 4 + 16 + 6);
    // Field 3 only: no field-1 bit, 16 hex chars.
    assert_eq!(&wire[16..32], b"2000000000000000");
    low.set_value(idx(64), IsoType::Binary, bytes::Bytes::from_static(&[0; 4]), 4);
    let wire = low.write_bytes().unwrap();
    assert_eq!(wire.len(), 12 + 4 + 16 + 6 + 4);
}

#[test]
fn llvar_pan_roundtrip() {
    let factory = purchase_factory();
    let mut message = factory.new_message(Mti::new(0x0200));
    message.remove_field(idx(3));
    message.set_field(idx(2), IsoValue::new(IsoType::Llvar, "4111111111111111"));

    let wire = message.write_bytes().unwrap();
    let body = &wire[12 + 4 + 16..];
    assert_eq!(body, b"164111111111111111");

    let parsed = factory.parse(&wire, 12).unwrap();
    assert_eq!(
        parsed.get_field(idx(2)).unwrap().as_text(),
        Some("4111111111111111")
    );
    assert_eq!(parsed.get_field(idx(2)).unwrap().length(), 16);
}

#[test]
fn response_overlays_request_over_template() {
    let mut factory = purchase_factory();

    let mut response_template = IsoMessage::new(Mti::new(0x0210));
    response_template.set_value(idx(3), IsoType::Numeric, "000000", 6);
    response_template.set_value(idx(39), IsoType::Alpha, "00", 2);
    factory.set_message_template(Mti::new(0x0210), Some(response_template));

    let mut request = factory.new_message(Mti::new(0x0200));
    request.set_value(idx(4), IsoType::Amount, "1000", 12);
    request.set_value(idx(11), IsoType::Numeric, "000123", 6);
    request.set_value(idx(41), IsoType::Alpha, "TERM0001", 8);

    let response = factory.create_response(&request);
    assert_eq!(response.mti(), Mti::new(0x0210));
    assert_eq!(response.header(), Some("ISO015000055"));
    // Request value wins over the template's "000000".
    assert_eq!(response.get_field(idx(3)).unwrap().as_text(), Some("650000"));
    // Template default for a field the request did not carry.
    assert_eq!(response.get_field(idx(39)).unwrap().as_text(), Some("00"));
    // Request fields copied across.
    assert_eq!(
        response.get_field(idx(4)).unwrap().as_amount(),
        Some(Decimal::new(1000, 2))
    );
    assert_eq!(
        response.get_field(idx(41)).unwrap().as_text(),
        Some("TERM0001")
    );
}

#[test]
fn truncated_bitmap_reports_offset() {
    let factory = purchase_factory();
    let wire = b"ISO0150000500200B220";
    let err = factory.parse(wire, 12).unwrap_err();
    assert_eq!(
        err,
        DecodeError::Truncated {
            offset: 16,
            needed: 16,
            available: 4
        }
    );
}

#[test]
fn no_partial_message_on_field_error() {
    let factory = purchase_factory();
    let mut message = factory.new_message(Mti::new(0x0200));
    message.set_value(idx(11), IsoType::Numeric, "000123", 6);
    let mut wire = message.write_bytes().unwrap().to_vec();
    wire.truncate(wire.len() - 2);

    let err = factory.parse(&wire, 12).unwrap_err();
    assert!(matches!(err, DecodeError::Field { field: 11, .. }));
}

#[test]
fn whole_message_roundtrip_bytes() {
    let factory = purchase_factory();

    let mut primary_only = factory.new_message(Mti::new(0x0200));
    primary_only.set_value(idx(4), IsoType::Amount, "250", 12);
    primary_only.set_value(idx(41), IsoType::Alpha, "TERM0002", 8);

    let mut with_secondary = factory.new_message(Mti::new(0x0200));
    with_secondary.set_field(idx(2), IsoValue::new(IsoType::Llvar, "4111111111111111"));
    with_secondary.set_value(
        idx(64),
        IsoType::Binary,
        bytes::Bytes::from_static(&[0xCA, 0xFE, 0xBA, 0xBE]),
        4,
    );
    with_secondary.set_value(idx(70), IsoType::Numeric, "301", 3);

    for message in [primary_only, with_secondary] {
        let wire = message.write_bytes().unwrap();
        let parsed = factory.parse(&wire, 12).unwrap();
        assert_eq!(parsed.header(), message.header());
        assert_eq!(parsed.mti(), message.mti());
        let rewritten = parsed.write_bytes().unwrap();
        assert_eq!(rewritten, wire, "reparse must serialize identically");
    }
}

#[test]
fn parse_repeats_deterministically() {
    let factory = purchase_factory();
    let mut message = factory.new_message(Mti::new(0x0200));
    message.set_value(idx(4), IsoType::Amount, "9999", 12);
    let wire = message.write_bytes().unwrap();

    let first = factory.parse(&wire, 12).unwrap();
    let second = factory.parse(&wire, 12).unwrap();
    assert_eq!(first, second);
}

#[test]
fn trace_numbers_flow_into_field_11() {
    let mut factory = purchase_factory();
    factory.set_trace_number_generator(Arc::new(SimpleTraceGenerator::new(0)));

    let first = factory.new_message(Mti::new(0x0200));
    let second = factory.new_message(Mti::new(0x0200));
    assert_eq!(first.get_field(idx(11)).unwrap().as_int(), Some(1));
    assert_eq!(second.get_field(idx(11)).unwrap().as_int(), Some(2));

    let wire = second.write_bytes().unwrap();
    let parsed = factory.parse(&wire, 12).unwrap();
    assert_eq!(parsed.get_field(idx(11)).unwrap().as_text(), Some("000002"));
}

#[test]
fn terminator_byte_roundtrip() {
    let mut factory = purchase_factory();
    factory.set_etx(Some(0x03));

    let mut message = factory.new_message(Mti::new(0x0200));
    message.set_value(idx(11), IsoType::Numeric, "000777", 6);
    let wire = message.write_bytes().unwrap();
    assert_eq!(wire.last(), Some(&0x03));

    // The parser stops after the last declared field; the terminator is
    // transport trim.
    let parsed = factory.parse(&wire, 12).unwrap();
    assert_eq!(parsed.get_field(idx(11)).unwrap().as_text(), Some("000777"));
    assert_eq!(parsed.write_bytes().unwrap(), wire);
}
