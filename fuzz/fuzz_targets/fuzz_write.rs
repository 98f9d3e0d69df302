#![no_main]

use libfuzzer_sys::fuzz_target;
use png_payload::Png;

fuzz_target!(|input: (&[u8], &str)| {
    let (data, text) = input;

    // Try to parse and then write with an embedded payload
    if let Ok(mut png) = Png::parse(data) {
        let chunk_count = png.len();
        let had_payload = png.find_payload_chunk().is_some();

        if png.set_payload_chunk(text).is_ok() {
            let expected = if had_payload { chunk_count } else { chunk_count + 1 };
            assert_eq!(png.len(), expected);

            let mut output = Vec::new();
            png.write_to(&mut output).unwrap();
            assert_eq!(output, png.serialize());

            let reparsed = Png::parse(&output).unwrap();
            assert_eq!(reparsed.payload_text().unwrap().as_deref(), Some(text));
        }

        let _ = png.remove_payload_chunk();
    }
});
