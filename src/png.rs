//! PNG container: chunk parsing, payload chunk management and serialization

use crate::{
    chunk::{Chunk, ChunkType, CHUNK_OVERHEAD},
    crc::Crc32,
    error::{Error, Result},
    options::{ChecksumPolicy, CodecOptions},
};
use byteorder::{BigEndian, ByteOrder};
use log::{debug, trace, warn};
use std::fmt;

/// PNG signature: 89 50 4E 47 0D 0A 1A 0A
pub const PNG_SIGNATURE: &[u8; 8] = b"\x89PNG\r\n\x1a\n";

/// An ordered sequence of PNG chunks
///
/// Serializes to the PNG signature followed by every chunk in order. Chunks
/// keep the order they were parsed or inserted in; a newly added payload
/// chunk goes just before the last chunk so that `IEND` stays last.
///
/// # Example
///
/// ```
/// use png_payload::{test_utils::minimal_png, Png};
///
/// # fn main() -> png_payload::Result<()> {
/// let mut png = Png::parse(&minimal_png())?;
/// assert!(png.find_payload_chunk().is_none());
///
/// png.set_payload_chunk("<xml>foo</xml>")?;
/// let bytes = png.serialize();
///
/// let reloaded = Png::parse(&bytes)?;
/// assert_eq!(reloaded.payload_text()?.as_deref(), Some("<xml>foo</xml>"));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Png {
    chunks: Vec<Chunk>,
    options: CodecOptions,
    crc: &'static Crc32,
}

impl Png {
    /// Create an empty container with default options
    pub fn new() -> Self {
        Self::with_options(CodecOptions::default())
    }

    /// Create an empty container with the given options
    pub fn with_options(options: CodecOptions) -> Self {
        Self {
            chunks: Vec::new(),
            options,
            crc: Crc32::shared(),
        }
    }

    /// Wrap an existing chunk sequence
    pub fn from_chunks(chunks: Vec<Chunk>, options: CodecOptions) -> Self {
        Self {
            chunks,
            options,
            crc: Crc32::shared(),
        }
    }

    /// Detect the PNG signature at the start of `header`
    pub fn detect(header: &[u8]) -> bool {
        header.starts_with(PNG_SIGNATURE)
    }

    /// Parse a complete PNG byte stream with default options
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        Self::parse_with_options(bytes, CodecOptions::default())
    }

    /// Parse a complete PNG byte stream
    ///
    /// Chunk types are not validated and no particular chunk is required;
    /// only the signature and the chunk framing are checked. Stored CRCs are
    /// handled according to the options' [`ChecksumPolicy`].
    ///
    /// # Errors
    /// - [`Error::MissingSignature`] if the buffer does not start with the PNG signature
    /// - [`Error::TruncatedChunk`] if a chunk would extend past the end of the buffer
    /// - [`Error::ChecksumMismatch`] under [`ChecksumPolicy::Verify`]
    pub fn parse_with_options(bytes: &[u8], options: CodecOptions) -> Result<Self> {
        if !Self::detect(bytes) {
            return Err(Error::MissingSignature);
        }

        let crc = Crc32::shared();
        let mut chunks = Vec::new();
        let mut offset = PNG_SIGNATURE.len();

        while offset < bytes.len() {
            let available = bytes.len() - offset;

            // Length + type must be present before the length can be trusted
            if available < 8 {
                return Err(Error::TruncatedChunk {
                    offset: offset as u64,
                    needed: CHUNK_OVERHEAD as u64,
                    available: available as u64,
                });
            }

            let chunk_len = BigEndian::read_u32(&bytes[offset..offset + 4]);
            let needed = CHUNK_OVERHEAD as u64 + u64::from(chunk_len);
            if needed > available as u64 {
                return Err(Error::TruncatedChunk {
                    offset: offset as u64,
                    needed,
                    available: available as u64,
                });
            }

            let mut chunk_type = [0u8; 4];
            chunk_type.copy_from_slice(&bytes[offset + 4..offset + 8]);
            let chunk_type = ChunkType(chunk_type);

            let data_start = offset + 8;
            let data_end = data_start + chunk_len as usize;
            let stored = BigEndian::read_u32(&bytes[data_end..data_end + 4]);

            let data = bytes[data_start..data_end].to_vec();
            let chunk = Chunk::from_raw_parts(chunk_type, data, stored)?;
            trace!(
                "chunk {} at offset {}: {} bytes, crc {:#010x}",
                chunk_type,
                offset,
                chunk_len,
                stored
            );

            match options.checksum_policy {
                ChecksumPolicy::Trust => {}
                ChecksumPolicy::Warn | ChecksumPolicy::Verify => {
                    let computed = chunk.computed_crc(crc);
                    if computed != stored {
                        if options.checksum_policy == ChecksumPolicy::Verify {
                            return Err(Error::ChecksumMismatch {
                                offset: offset as u64,
                                chunk_type,
                                stored,
                                computed,
                            });
                        }
                        warn!(
                            "CRC mismatch in {} chunk at offset {}: stored {:#010x}, computed {:#010x}",
                            chunk_type, offset, stored, computed
                        );
                    }
                }
            }

            chunks.push(chunk);
            offset = data_end + 4; // Move to next chunk
        }

        debug!("parsed PNG: {} chunks, {} bytes", chunks.len(), bytes.len());

        Ok(Self {
            chunks,
            options,
            crc,
        })
    }

    /// Options this container was created with
    pub fn options(&self) -> &CodecOptions {
        &self.options
    }

    /// All chunks in order
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Take ownership of the chunk sequence
    pub fn into_chunks(self) -> Vec<Chunk> {
        self.chunks
    }

    /// Number of chunks
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the container holds no chunks
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// First chunk with the given type
    pub fn find_chunk(&self, chunk_type: ChunkType) -> Option<&Chunk> {
        self.chunks.iter().find(|c| c.chunk_type() == chunk_type)
    }

    fn payload_index(&self) -> Option<usize> {
        let payload_type = self.options.payload_type;
        self.chunks
            .iter()
            .position(|c| c.chunk_type() == payload_type)
    }

    /// The payload chunk, if present
    pub fn find_payload_chunk(&self) -> Option<&Chunk> {
        self.find_chunk(self.options.payload_type)
    }

    /// Decode the payload chunk as UTF-8 text
    ///
    /// Returns `Ok(None)` when there is no payload chunk and
    /// [`Error::Encoding`] when its data is not valid UTF-8.
    pub fn payload_text(&self) -> Result<Option<String>> {
        let Some(chunk) = self.find_payload_chunk() else {
            return Ok(None);
        };

        let text = std::str::from_utf8(chunk.data())
            .map_err(|e| Error::Encoding(format!("payload chunk is not UTF-8: {e}")))?;
        Ok(Some(text.to_owned()))
    }

    /// Embed `text` in the payload chunk
    ///
    /// The chunk data is the UTF-8 encoding of `text` and the CRC is computed
    /// over the payload type followed by that data. An existing payload chunk
    /// is replaced where it stands; otherwise the new chunk is inserted just
    /// before the last chunk.
    ///
    /// # Errors
    /// [`Error::DataTooLarge`] if the encoded text exceeds the configured
    /// limit. The container is left unchanged.
    pub fn set_payload_chunk(&mut self, text: &str) -> Result<()> {
        self.set_payload_bytes(text.as_bytes())
    }

    /// Embed arbitrary bytes in the payload chunk
    ///
    /// Same placement rules as [`Png::set_payload_chunk`].
    pub fn set_payload_bytes(&mut self, data: &[u8]) -> Result<()> {
        let max = self.options.max_payload_len;
        if data.len() > max {
            return Err(Error::DataTooLarge {
                size: data.len(),
                max,
            });
        }

        let chunk = Chunk::new(self.options.payload_type, data.to_vec(), self.crc)?;

        match self.payload_index() {
            Some(index) => {
                debug!(
                    "replacing {} chunk at index {}: {} -> {} bytes",
                    chunk.chunk_type(),
                    index,
                    self.chunks[index].length(),
                    chunk.length()
                );
                self.chunks[index] = chunk;
            }
            None => {
                // Keep the terminal chunk last
                let index = self.chunks.len().saturating_sub(1);
                debug!(
                    "inserting {} chunk at index {}: {} bytes",
                    chunk.chunk_type(),
                    index,
                    chunk.length()
                );
                self.chunks.insert(index, chunk);
            }
        }

        Ok(())
    }

    /// Remove and return the payload chunk
    pub fn remove_payload_chunk(&mut self) -> Option<Chunk> {
        let index = self.payload_index()?;
        debug!("removing {} chunk at index {}", self.options.payload_type, index);
        Some(self.chunks.remove(index))
    }

    /// Indices of chunks whose stored CRC does not match their type + data
    pub fn invalid_crc_chunks(&self) -> Vec<usize> {
        self.chunks
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_crc_valid(self.crc))
            .map(|(i, _)| i)
            .collect()
    }

    /// Size of the serialized byte stream
    pub fn serialized_len(&self) -> usize {
        PNG_SIGNATURE.len() + self.chunks.iter().map(Chunk::encoded_len).sum::<usize>()
    }

    /// Serialize to a PNG byte stream
    ///
    /// Writes the signature and then every chunk with its stored CRC. CRCs
    /// are not recomputed.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.serialized_len());
        out.extend_from_slice(PNG_SIGNATURE);
        for chunk in &self.chunks {
            chunk.encode_into(&mut out);
        }
        out
    }
}

impl Default for Png {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Png {
    fn eq(&self, other: &Self) -> bool {
        self.chunks == other.chunks
    }
}

impl Eq for Png {}

impl fmt::Debug for Png {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Png")
            .field("chunks", &self.chunks)
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{minimal_png, png_from_chunks, raw_chunk};

    #[test]
    fn test_parse_minimal() {
        let png = Png::parse(&minimal_png()).unwrap();

        assert_eq!(png.len(), 2);
        assert_eq!(png.chunks()[0].chunk_type(), ChunkType::IHDR);
        assert_eq!(png.chunks()[0].length(), 13);
        assert_eq!(png.chunks()[0].crc(), 0x9077_53DE);
        assert_eq!(png.chunks()[1].chunk_type(), ChunkType::IEND);
        assert_eq!(png.chunks()[1].crc(), 0xAE42_6082);
    }

    #[test]
    fn test_invalid_signature() {
        let data = vec![0x00; 16];
        let result = Png::parse(&data);
        assert!(matches!(result, Err(Error::MissingSignature)));

        assert!(matches!(Png::parse(&[]), Err(Error::MissingSignature)));
        assert!(matches!(Png::parse(&PNG_SIGNATURE[..7]), Err(Error::MissingSignature)));
    }

    #[test]
    fn test_signature_only() {
        let png = Png::parse(PNG_SIGNATURE).unwrap();
        assert!(png.is_empty());
        assert_eq!(png.serialize(), PNG_SIGNATURE.to_vec());
    }

    #[test]
    fn test_truncated_data() {
        let mut data = minimal_png();
        data.truncate(data.len() - 1);

        match Png::parse(&data) {
            Err(Error::TruncatedChunk {
                offset,
                needed,
                available,
            }) => {
                assert_eq!(offset, 33);
                assert_eq!(needed, 12);
                assert_eq!(available, 11);
            }
            other => panic!("expected TruncatedChunk, got {other:?}"),
        }
    }

    #[test]
    fn test_truncated_header() {
        let mut data = minimal_png();
        data.extend_from_slice(&[0, 0, 0]);
        assert!(matches!(
            Png::parse(&data),
            Err(Error::TruncatedChunk { available: 3, .. })
        ));
    }

    #[test]
    fn test_huge_declared_length() {
        let mut data = PNG_SIGNATURE.to_vec();
        data.extend_from_slice(&u32::MAX.to_be_bytes());
        data.extend_from_slice(b"IDAT");
        data.extend_from_slice(&[0; 8]);

        assert!(matches!(
            Png::parse(&data),
            Err(Error::TruncatedChunk { needed, .. }) if needed == 12 + u64::from(u32::MAX)
        ));
    }

    #[test]
    fn test_round_trip_is_byte_identical() {
        let original = png_from_chunks(&[
            raw_chunk(b"IHDR", &[0, 0, 0, 1, 0, 0, 0, 1, 8, 6, 0, 0, 0], None),
            raw_chunk(b"tEXt", b"Comment\0hello", None),
            raw_chunk(b"IDAT", &[0x78, 0x9C, 0x01, 0x02], None),
            raw_chunk(b"IEND", &[], None),
        ]);

        let png = Png::parse(&original).unwrap();
        assert_eq!(png.serialized_len(), original.len());
        assert_eq!(png.serialize(), original);
    }

    #[test]
    fn test_stale_crc_is_carried_forward() {
        let original = png_from_chunks(&[
            raw_chunk(b"IHDR", &[0; 13], Some(0x1234_5678)),
            raw_chunk(b"IEND", &[], None),
        ]);

        let png = Png::parse(&original).unwrap();
        assert_eq!(png.chunks()[0].crc(), 0x1234_5678);
        assert_eq!(png.invalid_crc_chunks(), vec![0]);
        assert_eq!(png.serialize(), original);
    }

    #[test]
    fn test_checksum_policies() {
        let original = png_from_chunks(&[
            raw_chunk(b"IHDR", &[0; 13], None),
            raw_chunk(b"tEXt", b"k\0v", Some(0)),
            raw_chunk(b"IEND", &[], None),
        ]);

        let trust = Png::parse(&original).unwrap();
        assert_eq!(trust.invalid_crc_chunks(), vec![1]);

        let warn = CodecOptions::new().checksum_policy(ChecksumPolicy::Warn);
        let png = Png::parse_with_options(&original, warn).unwrap();
        assert_eq!(png.len(), 3);
        assert_eq!(png.invalid_crc_chunks(), vec![1]);
        assert_eq!(png.serialize(), original);

        let verify = CodecOptions::new().checksum_policy(ChecksumPolicy::Verify);
        match Png::parse_with_options(&original, verify) {
            Err(Error::ChecksumMismatch {
                offset,
                chunk_type,
                stored,
                computed,
            }) => {
                assert_eq!(offset, 8 + 12 + 13);
                assert_eq!(chunk_type, ChunkType(*b"tEXt"));
                assert_eq!(stored, 0);
                assert_eq!(computed, crate::crc::crc32(b"tEXtk\0v"));
            }
            other => panic!("expected ChecksumMismatch, got {other:?}"),
        }

        let verify = CodecOptions::new().checksum_policy(ChecksumPolicy::Verify);
        assert!(Png::parse_with_options(&minimal_png(), verify).is_ok());
    }

    /// Collects warnings emitted by the parser
    struct CaptureLogger {
        messages: std::sync::Mutex<Vec<String>>,
    }

    impl log::Log for CaptureLogger {
        fn enabled(&self, metadata: &log::Metadata) -> bool {
            metadata.level() <= log::Level::Warn
        }

        fn log(&self, record: &log::Record) {
            if self.enabled(record.metadata()) {
                if let Ok(mut messages) = self.messages.lock() {
                    messages.push(record.args().to_string());
                }
            }
        }

        fn flush(&self) {}
    }

    static CAPTURE: CaptureLogger = CaptureLogger {
        messages: std::sync::Mutex::new(Vec::new()),
    };

    fn captured_warnings() -> Vec<String> {
        CAPTURE.messages.lock().unwrap().clone()
    }

    #[test]
    fn test_warn_policy_logs_mismatch() {
        // Only this test installs a logger in the unit test binary
        let _ = log::set_logger(&CAPTURE);
        log::set_max_level(log::LevelFilter::Warn);

        let original = png_from_chunks(&[
            raw_chunk(b"IHDR", &[0; 13], None),
            raw_chunk(b"zTXt", b"k\0\0v", Some(0x0BAD_F00D)),
            raw_chunk(b"IEND", &[], None),
        ]);

        Png::parse(&original).unwrap();
        assert!(!captured_warnings().iter().any(|m| m.contains("zTXt")));

        let warn = CodecOptions::new().checksum_policy(ChecksumPolicy::Warn);
        Png::parse_with_options(&original, warn).unwrap();

        let warnings = captured_warnings();
        let message = warnings
            .iter()
            .find(|m| m.contains("CRC mismatch in zTXt chunk"))
            .expect("warning for the corrupted chunk");
        assert!(message.contains("offset 33"));
        assert!(message.contains("stored 0x0badf00d"));
    }

    #[test]
    fn test_find_payload_absent() {
        let png = Png::parse(&minimal_png()).unwrap();
        assert!(png.find_payload_chunk().is_none());
        assert_eq!(png.payload_text().unwrap(), None);
    }

    #[test]
    fn test_insert_before_terminal_chunk() {
        let mut png = Png::parse(&minimal_png()).unwrap();
        png.set_payload_chunk("<xml>foo</xml>").unwrap();

        let types: Vec<_> = png.chunks().iter().map(|c| c.chunk_type()).collect();
        assert_eq!(types, vec![ChunkType::IHDR, ChunkType::coDe, ChunkType::IEND]);

        let chunk = png.find_payload_chunk().unwrap();
        assert_eq!(chunk.length(), 14);
        assert_eq!(chunk.data(), b"<xml>foo</xml>");
        assert_eq!(chunk.crc(), crate::crc::crc32(b"coDe<xml>foo</xml>"));
    }

    #[test]
    fn test_insert_into_empty_container() {
        let mut png = Png::new();
        png.set_payload_chunk("x").unwrap();
        assert_eq!(png.len(), 1);
        assert_eq!(png.chunks()[0].chunk_type(), ChunkType::coDe);
    }

    #[test]
    fn test_set_is_idempotent() {
        let mut png = Png::parse(&minimal_png()).unwrap();
        png.set_payload_chunk("X").unwrap();
        let first = png.clone();

        png.set_payload_chunk("X").unwrap();
        assert_eq!(png.len(), first.len());
        assert_eq!(png, first);
    }

    #[test]
    fn test_replace_keeps_position() {
        let original = png_from_chunks(&[
            raw_chunk(b"IHDR", &[0; 13], None),
            raw_chunk(b"coDe", b"old", None),
            raw_chunk(b"IDAT", &[1, 2, 3], None),
            raw_chunk(b"IEND", &[], None),
        ]);

        let mut png = Png::parse(&original).unwrap();
        png.set_payload_chunk("X").unwrap();
        png.set_payload_chunk("Y").unwrap();

        let matches: Vec<_> = png
            .chunks()
            .iter()
            .enumerate()
            .filter(|(_, c)| c.chunk_type() == ChunkType::coDe)
            .collect();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].0, 1);
        assert_eq!(matches[0].1.data(), b"Y");
        assert_eq!(png.len(), 4);
    }

    #[test]
    fn test_non_ascii_payload() {
        let mut png = Png::parse(&minimal_png()).unwrap();
        let text = "<block type=\"文字\">ünïcödé 🚀</block>";
        png.set_payload_chunk(text).unwrap();

        let chunk = png.find_payload_chunk().unwrap();
        assert_eq!(chunk.length() as usize, text.len());

        let reloaded = Png::parse(&png.serialize()).unwrap();
        assert_eq!(reloaded.payload_text().unwrap().as_deref(), Some(text));
    }

    #[test]
    fn test_invalid_utf8_payload() {
        let original = png_from_chunks(&[
            raw_chunk(b"IHDR", &[0; 13], None),
            raw_chunk(b"coDe", &[0xFF, 0xFE], None),
            raw_chunk(b"IEND", &[], None),
        ]);

        let png = Png::parse(&original).unwrap();
        assert!(png.find_payload_chunk().is_some());
        assert!(matches!(png.payload_text(), Err(Error::Encoding(_))));
    }

    #[test]
    fn test_payload_limit() {
        let options = CodecOptions::new().max_payload_len(4);
        let mut png = Png::parse_with_options(&minimal_png(), options).unwrap();
        let before = png.clone();

        let result = png.set_payload_chunk("too long");
        assert!(matches!(result, Err(Error::DataTooLarge { size: 8, max: 4 })));
        assert_eq!(png, before);

        png.set_payload_chunk("ok").unwrap();
        assert_eq!(png.len(), 3);
    }

    #[test]
    fn test_custom_payload_type() {
        let options = CodecOptions::new().payload_type(ChunkType(*b"prOg"));
        let mut png = Png::parse_with_options(&minimal_png(), options).unwrap();
        png.set_payload_chunk("data").unwrap();

        assert!(png.find_chunk(ChunkType(*b"prOg")).is_some());
        assert!(png.find_chunk(ChunkType::coDe).is_none());
    }

    #[test]
    fn test_remove_payload() {
        let mut png = Png::parse(&minimal_png()).unwrap();
        assert!(png.remove_payload_chunk().is_none());

        png.set_payload_chunk("x").unwrap();
        let removed = png.remove_payload_chunk().unwrap();
        assert_eq!(removed.chunk_type(), ChunkType::coDe);
        assert_eq!(removed.into_data(), b"x".to_vec());
        assert_eq!(png.serialize(), minimal_png());
    }

    #[test]
    fn test_set_before_serialize_is_visible() {
        let mut png = Png::parse(&minimal_png()).unwrap();
        png.set_payload_chunk("first").unwrap();
        let a = png.serialize();
        png.set_payload_chunk("second").unwrap();
        let b = png.serialize();

        assert_ne!(a, b);
        assert_eq!(b.len(), a.len() + 1);
        assert_eq!(
            Png::parse(&b).unwrap().payload_text().unwrap().as_deref(),
            Some("second")
        );
    }
}
