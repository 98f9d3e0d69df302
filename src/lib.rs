//! PNG chunk codec for carrying an application payload inside an image.
//!
//! A PNG is a signature followed by length-prefixed, CRC-protected chunks.
//! This crate parses that chunk structure, lets you embed one private
//! ancillary chunk (`coDe` by default) holding arbitrary text such as a
//! serialized program, and writes the chunks back out byte for byte. Image
//! viewers ignore the extra chunk, so the picture doubles as a save file.
//!
//! # Design Principles
//!
//! - **Structural only**: chunks are enumerated, looked up, inserted and
//!   serialized; pixel data is never decoded
//! - **Lossless**: parse then serialize reproduces the input exactly,
//!   including stored CRCs
//! - **Synchronous core**: the codec works on complete buffers; I/O lives in
//!   thin adapters ([`Png::open`], [`Png::write_to`], and `async_io`)
//!
//! # Quick Start
//!
//! ```no_run
//! use png_payload::Png;
//!
//! # fn main() -> png_payload::Result<()> {
//! // Export: screenshot bytes in, PNG with embedded code out
//! let mut png = Png::open("screenshot.png")?;
//! png.set_payload_chunk("<xml><block type=\"controls_if\"/></xml>")?;
//! png.save("program.png")?;
//!
//! // Import: read the code back from a dropped file
//! let png = Png::open("program.png")?;
//! if let Some(code) = png.payload_text()? {
//!     println!("{code}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Checksums
//!
//! By default stored CRCs are trusted and carried forward unchanged. Use
//! [`CodecOptions::checksum_policy`] to warn about or reject mismatches:
//!
//! ```no_run
//! use png_payload::{ChecksumPolicy, CodecOptions, Png};
//!
//! # fn main() -> png_payload::Result<()> {
//! let options = CodecOptions::new().checksum_policy(ChecksumPolicy::Verify);
//! let png = Png::open_with_options("program.png", options)?;
//! # Ok(())
//! # }
//! ```

mod chunk;
pub mod crc;
mod error;
pub mod io;
mod options;
mod png;

#[cfg(feature = "async-io")]
pub mod async_io;

pub use chunk::{Chunk, ChunkType, CHUNK_OVERHEAD};
pub use crc::{crc32, Crc32};
pub use error::{Error, Result};
pub use options::{ChecksumPolicy, CodecOptions, MAX_PAYLOAD_LEN};
pub use png::{Png, PNG_SIGNATURE};

// Test utilities - only compiled for tests or when explicitly enabled
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
