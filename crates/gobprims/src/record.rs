//! The sample record written by `gobprims write`.

use serde::{Deserialize, Serialize};

/// A pair of coordinates, nested inside [`Example`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Point {
    pub x: isize,
    pub y: isize,
}

/// A record with one field of each supported scalar kind plus a nested struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Example {
    pub bool: bool,
    pub int: isize,
    pub uint: usize,
    pub float: f64,
    pub bytes: Vec<u8>,
    pub string: String,
    pub nested: Point,
}

/// The fixed record the CLI writes.
#[allow(clippy::approx_constant)]
pub fn sample() -> Example {
    Example {
        bool: true,
        int: 42,
        uint: 777,
        float: 3.14159265,
        bytes: vec![1, 2, 3],
        string: "Hello gophers!".to_string(),
        nested: Point { x: 42, y: 7777 },
    }
}

#[cfg(test)]
mod tests {
    use gobprims_serde::{from_slice, to_vec, Decoder, Encoder};
    use gobprims_wire::{get_int, MessageReader};

    use super::*;

    // -65: struct Example with seven fields, Nested typed 66.
    const EXAMPLE_DEF: [u8; 91] = [
        0x5a, 0xff, 0x81, 0x03, 0x01, 0x01, 0x07, b'E', b'x', b'a', b'm', b'p', b'l', b'e',
        0x01, 0xff, 0x82, 0x00, 0x01, 0x07, 0x01, 0x04, b'B', b'o', b'o', b'l', 0x01, 0x02,
        0x00, 0x01, 0x03, b'I', b'n', b't', 0x01, 0x04, 0x00, 0x01, 0x04, b'U', b'i', b'n',
        b't', 0x01, 0x06, 0x00, 0x01, 0x05, b'F', b'l', b'o', b'a', b't', 0x01, 0x08, 0x00,
        0x01, 0x05, b'B', b'y', b't', b'e', b's', 0x01, 0x0a, 0x00, 0x01, 0x06, b'S', b't',
        b'r', b'i', b'n', b'g', 0x01, 0x0c, 0x00, 0x01, 0x06, b'N', b'e', b's', b't', b'e',
        b'd', 0x01, 0xff, 0x84, 0x00, 0x00, 0x00,
    ];

    // -66: struct Point {X, Y int}.
    const POINT_DEF: [u8; 32] = [
        0x1f, 0xff, 0x83, 0x03, 0x01, 0x01, 0x05, b'P', b'o', b'i', b'n', b't', 0x01, 0xff,
        0x84, 0x00, 0x01, 0x02, 0x01, 0x01, b'X', 0x01, 0x04, 0x00, 0x01, 0x01, b'Y', 0x01,
        0x04, 0x00, 0x00, 0x00,
    ];

    // 65: every field set; Float is 3.14159265 byte-reversed.
    const SAMPLE_VALUE: [u8; 51] = [
        0x32, 0xff, 0x82, 0x01, 0x01, 0x01, 0x54, 0x01, 0xfe, 0x03, 0x09, 0x01, 0xf8, 0xf1,
        0xd4, 0xc8, 0x53, 0xfb, 0x21, 0x09, 0x40, 0x01, 0x03, 0x01, 0x02, 0x03, 0x01, 0x0e,
        b'H', b'e', b'l', b'l', b'o', b' ', b'g', b'o', b'p', b'h', b'e', b'r', b's', b'!',
        0x01, 0x01, 0x54, 0x01, 0xfe, 0x3c, 0xc2, 0x00, 0x00,
    ];

    #[test]
    fn sample_stream_matches_reference() {
        let mut expected = EXAMPLE_DEF.to_vec();
        expected.extend_from_slice(&POINT_DEF);
        expected.extend_from_slice(&SAMPLE_VALUE);
        assert_eq!(to_vec(&sample()).unwrap(), expected);
    }

    #[test]
    fn sample_round_trips_exactly() {
        let wire = to_vec(&sample()).unwrap();
        let decoded: Example = from_slice(&wire).unwrap();
        assert_eq!(decoded, sample());
        assert_eq!(decoded.float.to_bits(), sample().float.to_bits());
    }

    #[test]
    fn definitions_precede_value() {
        let wire = to_vec(&sample()).unwrap();
        let mut reader = MessageReader::new(wire.as_slice());

        let mut ids = Vec::new();
        for _ in 0..3 {
            let mut message = reader.read_message().unwrap();
            ids.push(get_int(&mut message).unwrap());
        }
        // Example is defined first, then the nested Point, then the value.
        assert_eq!(ids, vec![-65, -66, 65]);
    }

    #[test]
    fn nested_record_decodes_on_its_own() {
        #[derive(Debug, Deserialize, PartialEq)]
        #[serde(rename_all = "PascalCase")]
        struct NestedOnly {
            nested: Point,
        }

        let wire = to_vec(&sample()).unwrap();
        let decoded: NestedOnly = from_slice(&wire).unwrap();
        assert_eq!(decoded.nested, Point { x: 42, y: 7777 });
    }

    #[test]
    fn field_order_does_not_matter() {
        #[derive(Debug, Deserialize, PartialEq)]
        #[serde(rename_all = "PascalCase")]
        struct Reordered {
            nested: Point,
            string: String,
            int: i64,
        }

        let wire = to_vec(&sample()).unwrap();
        let decoded: Reordered = from_slice(&wire).unwrap();
        assert_eq!(decoded.string, "Hello gophers!");
        assert_eq!(decoded.int, 42);
        assert_eq!(decoded.nested.y, 7777);
    }

    #[test]
    fn repeated_records_share_definitions() {
        let mut encoder = Encoder::new(Vec::new());
        encoder.encode(&sample()).unwrap();
        let first = encoder.get_ref().len();
        encoder.encode(&sample()).unwrap();
        let wire = encoder.into_inner();

        let mut decoder = Decoder::new(&wire[first..]);
        // The second value alone refers to types defined earlier on the stream.
        assert!(decoder.decode::<Example>().is_err());

        let mut decoder = Decoder::new(wire.as_slice());
        assert_eq!(decoder.decode::<Example>().unwrap(), sample());
        assert_eq!(decoder.decode::<Example>().unwrap(), sample());
    }

    #[test]
    fn zero_fields_decode_as_zero() {
        let sparse = Example {
            bool: false,
            int: 0,
            uint: 0,
            float: 0.0,
            bytes: vec![9],
            string: String::new(),
            nested: Point { x: 0, y: 1 },
        };
        let wire = to_vec(&sparse).unwrap();
        assert_eq!(from_slice::<Example>(&wire).unwrap(), sparse);
    }

    #[test]
    fn empty_bytes_need_an_earlier_value() {
        let mut empty = sample();
        empty.bytes.clear();
        assert!(matches!(
            to_vec(&empty),
            Err(gobprims_serde::GobError::IndeterminateType(_))
        ));

        let mut encoder = Encoder::new(Vec::new());
        encoder.encode(&sample()).unwrap();
        encoder.encode(&empty).unwrap();
        let wire = encoder.into_inner();

        let mut decoder = Decoder::new(wire.as_slice());
        decoder.decode::<Example>().unwrap();
        assert_eq!(decoder.decode::<Example>().unwrap(), empty);
    }
}
