//! Blocking byte source and sink adapters for [`Png`]
//!
//! The codec itself only works on complete in-memory buffers. These helpers
//! fill that buffer from a reader or file and stream the serialized bytes back
//! out.

use crate::{
    error::Result,
    options::CodecOptions,
    png::{Png, PNG_SIGNATURE},
};
use log::debug;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

impl Png {
    /// Read a whole PNG from `reader` and parse it
    pub fn read_from<R: Read>(reader: &mut R, options: CodecOptions) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::parse_with_options(&bytes, options)
    }

    /// Open and parse a PNG file with default options
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, CodecOptions::default())
    }

    /// Open and parse a PNG file
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: CodecOptions) -> Result<Self> {
        let path = path.as_ref();
        debug!("reading PNG from {}", path.display());
        let bytes = std::fs::read(path)?;
        Self::parse_with_options(&bytes, options)
    }

    /// Open and parse a PNG file through a memory map
    ///
    /// Avoids copying the file into a heap buffer before parsing. The chunk
    /// data is still copied into the returned container.
    #[cfg(feature = "memory-mapped")]
    pub fn open_mapped<P: AsRef<Path>>(path: P, options: CodecOptions) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        // SAFETY: the map is only read during parsing and dropped before
        // returning. Concurrent truncation of the file by another process is
        // outside what this crate can guard against.
        let mmap = unsafe { memmap2::Mmap::map(&file)? };
        Self::parse_with_options(&mmap, options)
    }

    /// Stream the serialized PNG to `writer`
    ///
    /// Produces exactly the bytes of [`Png::serialize`] without building
    /// them in one buffer first.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(PNG_SIGNATURE)?;
        for chunk in self.chunks() {
            chunk.write_to(writer)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Write the serialized PNG to a new file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        debug!(
            "writing PNG to {}: {} bytes",
            path.display(),
            self.serialized_len()
        );
        let mut output = BufWriter::new(File::create(path)?);
        self.write_to(&mut output)
    }
}

/// Copy a PNG from `reader` to `writer`, embedding `text` in its payload chunk
///
/// This is the blocking form of the "export with code" flow: parse, set the
/// payload, serialize.
pub fn embed_payload<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    text: &str,
    options: CodecOptions,
) -> Result<()> {
    let mut png = Png::read_from(reader, options)?;
    png.set_payload_chunk(text)?;
    png.write_to(writer)
}

/// Read a PNG from `reader` and return its payload text, if any
pub fn extract_payload<R: Read>(reader: &mut R, options: CodecOptions) -> Result<Option<String>> {
    Png::read_from(reader, options)?.payload_text()
}
