#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    for value in cbor_value::Decoder::new(data).flatten() {
        _ = format!("{value}");
    }
});
