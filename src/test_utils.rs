//! Test utilities for building PNG byte streams and loading fixture files.
//!
//! This module provides helpers for:
//! - Synthetic PNGs assembled chunk by chunk (no files needed)
//! - Fixture files from `tests/fixtures/`
//! - Extended fixtures from custom directories (via `PNG_PAYLOAD_TEST_FIXTURES` env var)
//!
//! # Usage
//!
//! ```no_run
//! use png_payload::test_utils::*;
//!
//! # fn example() -> png_payload::Result<()> {
//! // Smallest parseable PNG: IHDR + IEND
//! let bytes = minimal_png();
//!
//! // Hand-built chunk sequence, optionally with a forced CRC
//! let bytes = png_from_chunks(&[
//!     raw_chunk(b"IHDR", &[0; 13], None),
//!     raw_chunk(b"IEND", &[], Some(0)),
//! ]);
//!
//! // Fixture files
//! let pixel = fixture_bytes(PIXEL)?;
//! # Ok(())
//! # }
//! ```

use std::{collections::HashMap, fs, path::PathBuf, sync::LazyLock};

use crate::{crc::crc32, png::PNG_SIGNATURE, Error, Result};

/// Embedded text of the [`PIXEL_CODE`] fixture's payload chunk
pub const PIXEL_CODE_TEXT: &str = "<xml xmlns=\"https://developers.google.com/blockly/xml\"><block type=\"controls_if\" id=\"a1\" x=\"10\" y=\"20\"></block></xml>";

/// Macro to define fixtures with embedded data and file fallback
macro_rules! define_fixtures {
    ($($name:ident => $file:expr),* $(,)?) => {
        $(
            #[allow(dead_code)]
            pub const $name: &str = $file;
        )*

        // Fixtures are small, so they are always compiled in
        static EMBEDDED_FIXTURES: LazyLock<HashMap<&'static str, &'static [u8]>> =
            LazyLock::new(|| {
                let mut map = HashMap::new();
                $(
                    let bytes: &'static [u8] = include_bytes!(concat!("../tests/fixtures/", $file));
                    map.insert($file, bytes);
                )*
                map
            });

        /// Get the embedded fixtures registry
        pub fn get_registry() -> &'static HashMap<&'static str, &'static [u8]> {
            &EMBEDDED_FIXTURES
        }

        /// List all defined fixtures
        pub fn list_all_fixtures() -> Vec<&'static str> {
            vec![$($file),*]
        }
    };
}

define_fixtures!(
    PIXEL => "pixel.png",           // 69 bytes - 1x1 RGB: IHDR, IDAT, IEND
    PIXEL_CODE => "pixel_code.png", // 198 bytes - same image with a coDe chunk before IEND
);

/// Encode one chunk: length, type, data, CRC
///
/// The CRC is computed over type + data unless `crc` forces a value, which is
/// how tests build files with stale checksums.
pub fn raw_chunk(chunk_type: &[u8; 4], data: &[u8], crc: Option<u32>) -> Vec<u8> {
    let mut out = Vec::with_capacity(12 + data.len());
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(chunk_type);
    out.extend_from_slice(data);

    let crc = crc.unwrap_or_else(|| {
        let mut covered = chunk_type.to_vec();
        covered.extend_from_slice(data);
        crc32(&covered)
    });
    out.extend_from_slice(&crc.to_be_bytes());
    out
}

/// PNG signature followed by the given encoded chunks
pub fn png_from_chunks(chunks: &[Vec<u8>]) -> Vec<u8> {
    let mut out = PNG_SIGNATURE.to_vec();
    for chunk in chunks {
        out.extend_from_slice(chunk);
    }
    out
}

/// A header-like chunk and a terminal chunk, nothing else
///
/// The header describes a 1x1 8-bit RGB image.
pub fn minimal_png() -> Vec<u8> {
    png_from_chunks(&[
        raw_chunk(
            b"IHDR",
            &[
                0x00, 0x00, 0x00, 0x01, // Width: 1
                0x00, 0x00, 0x00, 0x01, // Height: 1
                0x08, // Bit depth: 8
                0x02, // Color type: RGB
                0x00, // Compression: deflate
                0x00, // Filter: adaptive
                0x00, // Interlace: none
            ],
            None,
        ),
        raw_chunk(b"IEND", &[], None),
    ])
}

/// Get path to a fixture file
///
/// Search order:
/// 1. PNG_PAYLOAD_TEST_FIXTURES env var (for extended test sets)
/// 2. Default tests/fixtures directory
pub fn fixture_path(file_name: &str) -> PathBuf {
    if let Ok(custom_dir) = std::env::var("PNG_PAYLOAD_TEST_FIXTURES") {
        let path = PathBuf::from(custom_dir).join(file_name);
        if path.exists() {
            return path;
        }
    }

    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/fixtures");
    path.push(file_name);
    path
}

/// Helper to get fixture data as bytes
pub fn fixture_bytes(name: &str) -> Result<Vec<u8>> {
    if let Some(bytes) = get_registry().get(name) {
        return Ok(bytes.to_vec());
    }

    fs::read(fixture_path(name)).map_err(Error::Io)
}

/// List all available fixtures (embedded + extended directory)
pub fn list_fixtures() -> Result<Vec<String>> {
    let mut fixtures: Vec<String> = list_all_fixtures().into_iter().map(String::from).collect();

    if let Ok(custom_dir) = std::env::var("PNG_PAYLOAD_TEST_FIXTURES") {
        let extended_path = PathBuf::from(custom_dir);
        if extended_path.is_dir() {
            for entry in fs::read_dir(extended_path)? {
                let path = entry?.path();
                let is_png = path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
                if !path.is_file() || !is_png {
                    continue;
                }
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    if !fixtures.iter().any(|f| f == name) {
                        fixtures.push(name.to_string());
                    }
                }
            }
        }
    }

    Ok(fixtures)
}
