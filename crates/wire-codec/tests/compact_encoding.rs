use wire_codec::reader::Reader;
use wire_codec::writer::Writer;

#[test]
fn compact_u16_boundaries_roundtrip_and_report_correct_length() {
    let cases: &[(u16, usize)] = &[
        (0, 1),
        (0x7F, 1),
        (0x80, 2),
        (0x3FFF, 2),
        (0x4000, 3),
        (0xFFFF, 3),
    ];
    for &(value, expected_len) in cases {
        let mut buf = [0u8; 3];
        let mut w = Writer::new(&mut buf);
        w.write_compact_u16(value).unwrap();
        assert_eq!(w.position(), expected_len, "value={value:#x}");
        let mut r = Reader::new(&buf[..w.position()]);
        assert_eq!(r.read_compact_u16().unwrap(), value);
    }
}

#[test]
fn varint_roundtrips_across_full_u64_range() {
    let cases: &[u64] = &[0, 1, 0x7F, 0x80, 0x3FFF_FFFF, u32::MAX as u64, u64::MAX];
    for &value in cases {
        let mut buf = [0u8; 10];
        let mut w = Writer::new(&mut buf);
        w.write_varint_u64(value).unwrap();
        let mut r = Reader::new(&buf[..w.position()]);
        assert_eq!(r.read_varint_u64().unwrap(), value);
    }
}

#[test]
fn varint_overflow_beyond_64_bits_is_rejected() {
    // Ten continuation bytes with the high bit set: more than 64 bits of
    // payload, must be rejected rather than silently wrapping.
    let bytes = [0xFFu8; 10];
    let mut r = Reader::new(&bytes);
    assert_eq!(
        r.read_varint_u64(),
        Err(wire_codec::CodecError::VarIntOverflow)
    );
}

#[test]
fn short_input_is_invalid_data_not_a_panic() {
    let bytes = [0x01u8, 0x02];
    let mut r = Reader::new(&bytes);
    assert_eq!(r.read_u32(), Err(wire_codec::CodecError::InvalidData));
}
