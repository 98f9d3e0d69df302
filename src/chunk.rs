//! PNG chunk records

use crate::{
    crc::Crc32,
    error::{Error, Result},
};
use byteorder::{BigEndian, ByteOrder, WriteBytesExt};
use std::fmt;
use std::io::Write;

/// Bytes of framing around each chunk's data: length (4) + type (4) + CRC (4)
pub const CHUNK_OVERHEAD: usize = 12;

/// Convert a data length to the 32-bit length field
fn checked_length(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| Error::DataTooLarge {
        size: len,
        max: u32::MAX as usize,
    })
}

/// A 4-byte PNG chunk type tag
///
/// Tags are ASCII by convention but never validated; any four bytes are
/// carried through parsing and serialization unchanged. The case of each
/// letter encodes a property bit (bit 5 of the byte).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChunkType(pub [u8; 4]);

#[allow(non_upper_case_globals)]
impl ChunkType {
    /// Image header, always first
    pub const IHDR: Self = Self(*b"IHDR");
    /// Compressed image data
    pub const IDAT: Self = Self(*b"IDAT");
    /// Image trailer, always last
    pub const IEND: Self = Self(*b"IEND");
    /// Private ancillary chunk holding the embedded program text
    pub const coDe: Self = Self(*b"coDe");

    /// Raw tag bytes
    pub const fn bytes(&self) -> [u8; 4] {
        self.0
    }

    /// Lowercase first letter: not needed to display the image
    pub const fn is_ancillary(&self) -> bool {
        self.0[0] & 0x20 != 0
    }

    /// Lowercase second letter: not registered with the PNG specification
    pub const fn is_private(&self) -> bool {
        self.0[1] & 0x20 != 0
    }

    /// Third letter must be uppercase in conforming files
    pub const fn is_reserved_bit_valid(&self) -> bool {
        self.0[2] & 0x20 == 0
    }

    /// Lowercase fourth letter: editors may copy the chunk even if they
    /// don't understand it
    pub const fn is_safe_to_copy(&self) -> bool {
        self.0[3] & 0x20 != 0
    }
}

impl From<[u8; 4]> for ChunkType {
    fn from(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }
}

impl From<&[u8; 4]> for ChunkType {
    fn from(bytes: &[u8; 4]) -> Self {
        Self(*bytes)
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            write!(f, "{}", b as char)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

/// One PNG chunk: length, type, data and the stored CRC
///
/// Chunks are value records. The CRC is whatever was last written: either
/// computed by [`Chunk::new`] or carried verbatim from a parsed file by
/// [`Chunk::from_raw_parts`]. It is never recomputed behind the caller's back,
/// so a stale CRC read from disk is serialized unchanged.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Chunk {
    length: u32,
    chunk_type: ChunkType,
    data: Vec<u8>,
    crc: u32,
}

impl Chunk {
    /// Build a chunk and compute its CRC over type + data
    ///
    /// Fails with [`Error::DataTooLarge`] if `data` does not fit the 32-bit
    /// length field.
    pub fn new(chunk_type: ChunkType, data: Vec<u8>, engine: &Crc32) -> Result<Self> {
        let length = checked_length(data.len())?;
        let crc = engine.checksum_parts(&[&chunk_type.0[..], &data[..]]);
        Ok(Self {
            length,
            chunk_type,
            data,
            crc,
        })
    }

    /// Build a chunk from parts read off the wire, keeping the stored CRC as is
    ///
    /// Fails with [`Error::DataTooLarge`] if `data` does not fit the 32-bit
    /// length field.
    pub fn from_raw_parts(chunk_type: ChunkType, data: Vec<u8>, crc: u32) -> Result<Self> {
        Ok(Self {
            length: checked_length(data.len())?,
            chunk_type,
            data,
            crc,
        })
    }

    /// Declared data length
    pub fn length(&self) -> u32 {
        self.length
    }

    /// Chunk type tag
    pub fn chunk_type(&self) -> ChunkType {
        self.chunk_type
    }

    /// Chunk data, exactly `length()` bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Stored CRC
    pub fn crc(&self) -> u32 {
        self.crc
    }

    /// Take ownership of the data bytes
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// CRC freshly computed over type + data
    pub fn computed_crc(&self, engine: &Crc32) -> u32 {
        engine.checksum_parts(&[&self.chunk_type.0[..], &self.data[..]])
    }

    /// Whether the stored CRC matches type + data
    pub fn is_crc_valid(&self, engine: &Crc32) -> bool {
        self.crc == self.computed_crc(engine)
    }

    /// Bytes this chunk occupies in a PNG stream
    pub fn encoded_len(&self) -> usize {
        CHUNK_OVERHEAD + self.data.len()
    }

    /// Append the encoded chunk to `out`
    pub(crate) fn encode_into(&self, out: &mut Vec<u8>) {
        let start = out.len();
        let data_end = 8 + self.data.len();
        out.resize(start + self.encoded_len(), 0);

        let buf = &mut out[start..];
        BigEndian::write_u32(&mut buf[0..4], self.length);
        buf[4..8].copy_from_slice(&self.chunk_type.0);
        buf[8..data_end].copy_from_slice(&self.data);
        BigEndian::write_u32(&mut buf[data_end..], self.crc);
    }

    /// Stream the encoded chunk to a writer
    pub(crate) fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        // Write length
        writer.write_u32::<BigEndian>(self.length)?;

        // Write type
        writer.write_all(&self.chunk_type.0)?;

        // Write data
        writer.write_all(&self.data)?;

        // Write the stored CRC (never recomputed here)
        writer.write_u32::<BigEndian>(self.crc)
    }
}

impl fmt::Debug for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chunk")
            .field("chunk_type", &self.chunk_type)
            .field("length", &self.length)
            .field("data", &&self.data[..self.data.len().min(12)])
            .field("crc", &format_args!("{:#010x}", self.crc))
            .finish()
    }
}
