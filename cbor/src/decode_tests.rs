use super::decode::*;
use super::value::*;
use hex_literal::hex;
use num_bigint::BigInt;
use time::macros::datetime;

fn array(items: impl IntoIterator<Item = i64>) -> Value {
    Value::Array(items.into_iter().map(Value::from).collect())
}

fn parse_err(data: &[u8]) -> Error {
    decode(data).unwrap_err()
}

#[test]
fn rfc_tests() {
    // RFC 8949, Appendix A:
    // https://www.rfc-editor.org/rfc/rfc8949.html#section-appendix.a

    assert_eq!(Value::from(0), decode(&hex!("00")).unwrap());
    assert_eq!(Value::from(1), decode(&hex!("01")).unwrap());
    assert_eq!(Value::from(10), decode(&hex!("0a")).unwrap());
    assert_eq!(Value::from(23), decode(&hex!("17")).unwrap());
    assert_eq!(Value::from(24), decode(&hex!("1818")).unwrap());
    assert_eq!(Value::from(25), decode(&hex!("1819")).unwrap());
    assert_eq!(Value::from(100), decode(&hex!("1864")).unwrap());
    assert_eq!(Value::from(1000), decode(&hex!("1903e8")).unwrap());
    assert_eq!(Value::from(1000000), decode(&hex!("1a000f4240")).unwrap());
    assert_eq!(
        Value::from(1000000000000u64),
        decode(&hex!("1b000000e8d4a51000")).unwrap()
    );
    assert_eq!(
        Value::from(18446744073709551615u64),
        decode(&hex!("1bffffffffffffffff")).unwrap()
    );
    assert_eq!(
        Value::from(BigInt::from(1) << 64u32),
        decode(&hex!("c249010000000000000000")).unwrap()
    );
    assert_eq!(
        Value::from(-(BigInt::from(1) << 64u32)),
        decode(&hex!("3bffffffffffffffff")).unwrap()
    );
    assert_eq!(
        Value::from(-(BigInt::from(1) << 64u32) - 1),
        decode(&hex!("c349010000000000000000")).unwrap()
    );
    assert_eq!(Value::from(-1), decode(&hex!("20")).unwrap());
    assert_eq!(Value::from(-10), decode(&hex!("29")).unwrap());
    assert_eq!(Value::from(-100), decode(&hex!("3863")).unwrap());
    assert_eq!(Value::from(-1000), decode(&hex!("3903e7")).unwrap());
    assert_eq!(Value::from(0.0), decode(&hex!("f90000")).unwrap());
    assert_eq!(Value::from(-0.0), decode(&hex!("f98000")).unwrap());
    assert_eq!(Value::from(1.0), decode(&hex!("f93c00")).unwrap());
    assert_eq!(Value::from(1.1), decode(&hex!("fb3ff199999999999a")).unwrap());
    assert_eq!(Value::from(1.5), decode(&hex!("f93e00")).unwrap());
    assert_eq!(Value::from(65504.0), decode(&hex!("f97bff")).unwrap());
    assert_eq!(Value::from(100000.0), decode(&hex!("fa47c35000")).unwrap());
    assert_eq!(
        Value::from(3.4028234663852886e+38),
        decode(&hex!("fa7f7fffff")).unwrap()
    );
    assert_eq!(
        Value::from(1.0e+300),
        decode(&hex!("fb7e37e43c8800759c")).unwrap()
    );
    assert_eq!(
        Value::from(5.960464477539063e-8),
        decode(&hex!("f90001")).unwrap()
    );
    assert_eq!(Value::from(0.00006103515625), decode(&hex!("f90400")).unwrap());
    assert_eq!(Value::from(-4.0), decode(&hex!("f9c400")).unwrap());
    assert_eq!(Value::from(-4.1), decode(&hex!("fbc010666666666666")).unwrap());
    assert_eq!(Value::from(f64::INFINITY), decode(&hex!("f97c00")).unwrap());
    assert!(decode(&hex!("f97e00")).unwrap().as_f64().unwrap().is_nan());
    assert_eq!(
        Value::from(f64::NEG_INFINITY),
        decode(&hex!("f9fc00")).unwrap()
    );
    assert_eq!(Value::from(f64::INFINITY), decode(&hex!("fa7f800000")).unwrap());
    assert!(decode(&hex!("fa7fc00000")).unwrap().as_f64().unwrap().is_nan());
    assert_eq!(
        Value::from(f64::NEG_INFINITY),
        decode(&hex!("faff800000")).unwrap()
    );
    assert_eq!(
        Value::from(f64::INFINITY),
        decode(&hex!("fb7ff0000000000000")).unwrap()
    );
    assert!(
        decode(&hex!("fb7ff8000000000000"))
            .unwrap()
            .as_f64()
            .unwrap()
            .is_nan()
    );
    assert_eq!(
        Value::from(f64::NEG_INFINITY),
        decode(&hex!("fbfff0000000000000")).unwrap()
    );
    assert_eq!(Value::from(false), decode(&hex!("f4")).unwrap());
    assert_eq!(Value::from(true), decode(&hex!("f5")).unwrap());
    assert_eq!(Value::Null, decode(&hex!("f6")).unwrap());
    assert_eq!(Value::Undefined, decode(&hex!("f7")).unwrap());

    // Unassigned simple values are not part of the value model
    assert_eq!(parse_err(&hex!("f0")), Error::UnsupportedSimpleValue(16));
    assert_eq!(parse_err(&hex!("f8ff")), Error::UnsupportedSimpleValue(255));

    assert_eq!(
        Value::Date(datetime!(2013-03-21 20:04:00 UTC)),
        decode(&hex!("c074323031332d30332d32315432303a30343a30305a")).unwrap()
    );
    assert_eq!(
        Value::Date(datetime!(2013-03-21 20:04:00 UTC)),
        decode(&hex!("c11a514b67b0")).unwrap()
    );
    assert_eq!(
        Value::Date(datetime!(2013-03-21 20:04:00.5 UTC)),
        decode(&hex!("c1fb41d452d9ec200000")).unwrap()
    );
    assert_eq!(
        Value::tagged(23, hex!("01020304").to_vec()),
        decode(&hex!("d74401020304")).unwrap()
    );
    // The embedded item is decoded in place of the byte string
    assert_eq!(
        Value::from("IETF"),
        decode(&hex!("d818456449455446")).unwrap()
    );
    assert_eq!(
        Value::Url(url::Url::parse("http://www.example.com").unwrap()),
        decode(&hex!("d82076687474703a2f2f7777772e6578616d706c652e636f6d")).unwrap()
    );
    assert_eq!(Value::from(Vec::<u8>::new()), decode(&hex!("40")).unwrap());
    assert_eq!(
        Value::from(hex!("01020304").to_vec()),
        decode(&hex!("4401020304")).unwrap()
    );
    assert_eq!(Value::from(""), decode(&hex!("60")).unwrap());
    assert_eq!(Value::from("a"), decode(&hex!("6161")).unwrap());
    assert_eq!(Value::from("IETF"), decode(&hex!("6449455446")).unwrap());
    assert_eq!(Value::from("\"\\"), decode(&hex!("62225c")).unwrap());
    assert_eq!(Value::from("\u{00fc}"), decode(&hex!("62c3bc")).unwrap());
    assert_eq!(Value::from("\u{6c34}"), decode(&hex!("63e6b0b4")).unwrap());
    assert_eq!(Value::from("\u{10151}"), decode(&hex!("64f0908591")).unwrap());
    assert_eq!(array([]), decode(&hex!("80")).unwrap());
    assert_eq!(array([1, 2, 3]), decode(&hex!("83010203")).unwrap());

    let nested = Value::from(vec![Value::from(1), array([2, 3]), array([4, 5])]);
    assert_eq!(nested, decode(&hex!("8301820203820405")).unwrap());
    assert_eq!(
        array(1..=25),
        decode(&hex!(
            "98190102030405060708090a0b0c0d0e0f101112131415161718181819"
        ))
        .unwrap()
    );
    assert_eq!(Value::from(Map::new()), decode(&hex!("a0")).unwrap());

    let mut m = Map::new();
    m.push(1, 2);
    m.push(3, 4);
    assert_eq!(Value::from(m), decode(&hex!("a201020304")).unwrap());

    let mut ab = Map::new();
    ab.push("a", 1);
    ab.push("b", array([2, 3]));
    assert_eq!(
        Value::from(ab.clone()),
        decode(&hex!("a26161016162820203")).unwrap()
    );

    let mut bc = Map::new();
    bc.push("b", "c");
    let a_bc = Value::from(vec![Value::from("a"), Value::from(bc)]);
    assert_eq!(a_bc, decode(&hex!("826161a161626163")).unwrap());

    let mut letters = Map::new();
    for (k, v) in ["a", "b", "c", "d", "e"].iter().zip(["A", "B", "C", "D", "E"]) {
        letters.push(*k, v);
    }
    assert_eq!(
        Value::from(letters),
        decode(&hex!("a56161614161626142616361436164614461656145")).unwrap()
    );

    // Indefinite-length forms decode to the same values as their definite counterparts
    assert_eq!(
        Value::from(hex!("0102030405").to_vec()),
        decode(&hex!("5f42010243030405ff")).unwrap()
    );
    assert_eq!(
        Value::from("streaming"),
        decode(&hex!("7f657374726561646d696e67ff")).unwrap()
    );
    assert_eq!(array([]), decode(&hex!("9fff")).unwrap());
    assert_eq!(nested, decode(&hex!("9f018202039f0405ffff")).unwrap());
    assert_eq!(nested, decode(&hex!("9f01820203820405ff")).unwrap());
    assert_eq!(nested, decode(&hex!("83018202039f0405ff")).unwrap());
    assert_eq!(nested, decode(&hex!("83019f0203ff820405")).unwrap());
    assert_eq!(
        array(1..=25),
        decode(&hex!(
            "9f0102030405060708090a0b0c0d0e0f101112131415161718181819ff"
        ))
        .unwrap()
    );
    assert_eq!(
        Value::from(ab),
        decode(&hex!("bf61610161629f0203ffff")).unwrap()
    );
    assert_eq!(a_bc, decode(&hex!("826161bf61626163ff")).unwrap());

    let mut fun = Map::new();
    fun.push("Fun", true);
    fun.push("Amt", -2);
    assert_eq!(
        Value::from(fun),
        decode(&hex!("bf6346756ef563416d7421ff")).unwrap()
    );
}

#[test]
fn self_describe_tag() {
    assert_eq!(
        Value::tagged(55798, false),
        decode(&hex!("d9d9f6f4")).unwrap()
    );
    assert_eq!(
        Value::tagged(55799, Value::tagged(1000, Map::new())),
        decode(&hex!("d9d9f7d903e8a0")).unwrap()
    );
}

#[test]
fn integer_normalisation() {
    // Bignums that fit 64 bits come back as plain integers
    assert_eq!(
        decode(&hex!("c24101")).unwrap().as_integer(),
        Some(&Integer::Small(1))
    );
    assert_eq!(decode(&hex!("c240")).unwrap(), Value::from(0));
    assert_eq!(decode(&hex!("c340")).unwrap(), Value::from(-1));
    assert_eq!(
        decode(&hex!("3b7fffffffffffffff")).unwrap().as_integer(),
        Some(&Integer::Small(i64::MIN))
    );
    assert!(matches!(
        decode(&hex!("3b8000000000000000")).unwrap(),
        Value::Integer(Integer::Big(_))
    ));
}

#[test]
fn invalid_utf8() {
    assert!(matches!(parse_err(&hex!("62c328")), Error::InvalidUtf8(_)));
    assert!(matches!(
        parse_err(&hex!("7f61c361a9ff")),
        Error::InvalidUtf8(_)
    ));
}

#[test]
fn unsupported_tags() {
    assert_eq!(
        parse_err(&hex!("c48221196ab3")),
        Error::NotSupported {
            tag: 4,
            feature: "Decimal fraction"
        }
    );
    assert_eq!(
        parse_err(&hex!("c5822003")),
        Error::NotSupported {
            tag: 5,
            feature: "Bigfloat"
        }
    );
}

#[test]
fn incorrect_tag_content() {
    assert_eq!(
        parse_err(&hex!("c001")),
        Error::IncorrectType {
            tag: 0,
            expected: "text string",
            found: "integer"
        }
    );
    assert_eq!(
        parse_err(&hex!("c16161")),
        Error::IncorrectType {
            tag: 1,
            expected: "number",
            found: "text string"
        }
    );
    assert_eq!(
        parse_err(&hex!("c26161")),
        Error::IncorrectType {
            tag: 2,
            expected: "byte string",
            found: "text string"
        }
    );
    assert_eq!(
        parse_err(&hex!("d82001")),
        Error::IncorrectType {
            tag: 32,
            expected: "text string",
            found: "integer"
        }
    );
    assert_eq!(
        parse_err(&hex!("d9011380")),
        Error::IncorrectType {
            tag: 275,
            expected: "map",
            found: "array"
        }
    );
}

#[test]
fn invalid_dates() {
    assert!(matches!(
        parse_err(&hex!("c063616263")),
        Error::InvalidDate(_)
    ));
    assert!(matches!(
        parse_err(&hex!("c11bffffffffffffffff")),
        Error::InvalidDate(_)
    ));
    assert!(matches!(
        parse_err(&hex!("c11b7fffffffffffffff")),
        Error::InvalidDate(_)
    ));
    assert!(matches!(
        parse_err(&hex!("c1fb7ff8000000000000")),
        Error::InvalidDate(_)
    ));
}

#[test]
fn invalid_url() {
    assert!(matches!(
        parse_err(&hex!("d82063616263")),
        Error::InvalidUrl(_)
    ));
}

#[test]
fn records() {
    let mut expected = Record::new();
    expected.insert("a", 1);
    expected.insert("b", 2);
    assert_eq!(
        Value::from(expected),
        decode(&hex!("d90113a2616101616202")).unwrap()
    );

    // Last write wins
    let r = decode(&hex!("d90113a2616101616102")).unwrap();
    let r = r.as_record().unwrap();
    assert_eq!(r.len(), 1);
    assert_eq!(r.get("a"), Some(&Value::from(2)));

    assert_eq!(
        parse_err(&hex!("d90113a10102")),
        Error::InvalidRecordKey("integer")
    );
}

#[test]
fn large_records() {
    const FIELDS: u32 = 40_000;
    let mut data = hex!("d90113ba").to_vec();
    data.extend_from_slice(&FIELDS.to_be_bytes());
    for idx in 0..FIELDS {
        data.push(0x65);
        data.extend_from_slice(format!("{idx:05}").as_bytes());
        data.push(0x00);
    }

    let r = decode(&data).unwrap();
    let r = r.as_record().unwrap();
    assert_eq!(r.len(), FIELDS as usize);
    assert_eq!(r.get("39999"), Some(&Value::from(0)));
    assert_eq!(r.iter().next().map(|(n, _)| n.as_str()), Some("00000"));

    // Repeated names collapse onto the first slot
    let mut data = hex!("d90113ba").to_vec();
    data.extend_from_slice(&FIELDS.to_be_bytes());
    for idx in 0..FIELDS {
        data.extend_from_slice(&hex!("6161"));
        data.push((idx % 24) as u8);
    }
    let r = decode(&data).unwrap();
    let r = r.as_record().unwrap();
    assert_eq!(r.len(), 1);
    assert_eq!(r.get("a"), Some(&Value::from((FIELDS - 1) % 24)));
}

#[test]
fn duplicate_map_keys() {
    let m = decode(&hex!("a201020103")).unwrap();
    let m = m.as_map().unwrap();
    assert_eq!(m.len(), 2);
    assert_eq!(m.get(&Value::from(1)), Some(&Value::from(2)));
}

#[test]
fn embedded_items() {
    assert_eq!(array([1]), decode(&hex!("d818428101")).unwrap());
    assert_eq!(parse_err(&hex!("d8184181")), Error::NotEnoughData);
}

#[test]
fn truncation() {
    assert_eq!(parse_err(&hex!("")), Error::NotEnoughData);
    assert_eq!(parse_err(&hex!("1903")), Error::NotEnoughData);
    assert_eq!(parse_err(&hex!("1b0000")), Error::NotEnoughData);
    assert_eq!(parse_err(&hex!("43aabb")), Error::NotEnoughData);
    assert_eq!(parse_err(&hex!("830102")), Error::NotEnoughData);
    assert_eq!(parse_err(&hex!("9f01")), Error::NotEnoughData);
    assert_eq!(parse_err(&hex!("a101")), Error::NotEnoughData);
    assert_eq!(parse_err(&hex!("bf0102")), Error::NotEnoughData);
    assert_eq!(parse_err(&hex!("5f4101")), Error::NotEnoughData);
    assert_eq!(parse_err(&hex!("c2")), Error::NotEnoughData);
    assert_eq!(parse_err(&hex!("fa0000")), Error::NotEnoughData);
}

#[test]
fn oversized_lengths() {
    assert_eq!(
        parse_err(&hex!("5bffffffffffffffff")),
        Error::LengthOutOfRange(u64::MAX)
    );
    assert_eq!(
        parse_err(&hex!("9bffffffffffffffff")),
        Error::LengthOutOfRange(u64::MAX)
    );
    assert_eq!(
        parse_err(&hex!("bbffffffffffffffff")),
        Error::LengthOutOfRange(u64::MAX)
    );
    assert_eq!(parse_err(&hex!("7a00010000")), Error::LengthOutOfRange(65536));
    assert_eq!(parse_err(&hex!("5f5a0000ffff")), Error::LengthOutOfRange(65535));

    // A length within the input but past its end is truncation
    assert_eq!(parse_err(&hex!("4501020304")), Error::NotEnoughData);
}

#[test]
fn stray_breaks() {
    assert_eq!(parse_err(&hex!("ff")), Error::UnexpectedBreak);
    assert_eq!(parse_err(&hex!("8201ff")), Error::UnexpectedBreak);
    assert_eq!(parse_err(&hex!("a20102ff00")), Error::UnexpectedBreak);
    assert_eq!(parse_err(&hex!("c0ff")), Error::UnexpectedBreak);
    assert_eq!(parse_err(&hex!("bf01ff")), Error::PartialMap);
}

#[test]
fn invalid_chunks() {
    assert_eq!(parse_err(&hex!("5f01ff")), Error::InvalidChunk);
    assert_eq!(parse_err(&hex!("5f6161ff")), Error::InvalidChunk);
    assert_eq!(parse_err(&hex!("7f4100ff")), Error::InvalidChunk);
    assert_eq!(parse_err(&hex!("5f5fffff")), Error::InvalidChunk);
    assert_eq!(
        decode(&hex!("5fff")).unwrap(),
        Value::from(Vec::<u8>::new())
    );
    assert_eq!(decode(&hex!("7fff")).unwrap(), Value::from(""));
}

#[test]
fn reserved_headers() {
    for header in [0x1c, 0x1f, 0x3e, 0x5d, 0x7c, 0x9e, 0xbc, 0xdc, 0xdf, 0xfc, 0xfe] {
        assert_eq!(parse_err(&[header, 0, 0]), Error::Unimplemented(header));
    }
}

#[test]
fn max_recursion() {
    let mut deep = vec![0x81; 200];
    deep.push(0x00);
    assert_eq!(parse_err(&deep), Error::MaxRecursion);

    let mut tags = vec![0xc6; 200];
    tags.push(0x00);
    assert_eq!(parse_err(&tags), Error::MaxRecursion);

    assert!(
        Decoder::new(&hex!("818100"))
            .with_max_depth(2)
            .decode_value()
            .is_ok()
    );
    assert_eq!(
        Decoder::new(&hex!("81818100"))
            .with_max_depth(2)
            .decode_value(),
        Err(Error::MaxRecursion)
    );
}

#[test]
fn sequences() {
    let data = hex!("01 6161 80");
    let mut decoder = Decoder::new(&data);
    assert_eq!(decoder.next(), Some(Ok(Value::from(1))));
    assert_eq!(decoder.offset(), 1);
    assert_eq!(decoder.next(), Some(Ok(Value::from("a"))));
    assert_eq!(decoder.next(), Some(Ok(array([]))));
    assert!(decoder.is_exhausted());
    assert_eq!(decoder.next(), None);

    // Iteration stops after the first error
    let items: Vec<_> = Decoder::new(&hex!("01 ff 02")).collect();
    assert_eq!(items, [Ok(Value::from(1)), Err(Error::UnexpectedBreak)]);
}

#[test]
fn failed_decode_restores_cursor() {
    let data = hex!("01 8201");
    let mut decoder = Decoder::new(&data);
    assert_eq!(decoder.decode_value(), Ok(Value::from(1)));
    assert_eq!(decoder.decode_value(), Err(Error::NotEnoughData));
    assert_eq!(decoder.offset(), 1);
}

#[test]
fn trailing_bytes_ignored() {
    assert_eq!(decode(&hex!("0102")).unwrap(), Value::from(1));
}

#[test]
fn decode_is_repeatable() {
    let data = hex!("d90113a261610161629f0203ff");
    assert_eq!(decode(&data).unwrap(), decode(&data).unwrap());
}
