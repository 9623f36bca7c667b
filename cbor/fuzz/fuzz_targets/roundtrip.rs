#![no_main]

use cbor_value::{Decoder, decode, encode};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    for value in Decoder::new(data).flatten() {
        // Dates shifted outside RFC 3339 years by UTC normalisation cannot be re-encoded
        let Ok(bytes) = encode(&value) else {
            continue;
        };
        let again = decode(&bytes).expect("Encoder output must decode");
        assert_eq!(
            encode(&again).expect("Re-encoding a decoded value must succeed"),
            bytes,
            "{value}"
        );
    }
});
