#![no_main]

use libfuzzer_sys::fuzz_target;
use png_payload::{ChecksumPolicy, CodecOptions, Png};

fuzz_target!(|data: &[u8]| {
    // Parsing arbitrary input should NEVER panic, only return errors
    if let Ok(png) = Png::parse(data) {
        // A successful parse must reproduce the input exactly
        assert_eq!(png.serialize(), data);

        let _ = png.find_payload_chunk();
        let _ = png.payload_text();
        let _ = png.invalid_crc_chunks();
    }

    let verify = CodecOptions::new().checksum_policy(ChecksumPolicy::Verify);
    let _ = Png::parse_with_options(data, verify);
});
