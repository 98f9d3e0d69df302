//! Error types for png-payload

use crate::chunk::ChunkType;
use std::io;

/// Result type for png-payload operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while parsing, editing or serializing a PNG
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error from one of the byte source/sink adapters
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Input does not begin with the 8-byte PNG signature
    #[error("Invalid format: missing PNG signature")]
    MissingSignature,

    /// A chunk's declared length runs past the end of the buffer
    #[error("Truncated chunk at offset {offset}: needs {needed} bytes, {available} available")]
    TruncatedChunk {
        offset: u64,
        needed: u64,
        available: u64,
    },

    /// Stored CRC differs from the one computed over type + data
    #[error(
        "Checksum mismatch in {chunk_type} chunk at offset {offset}: stored {stored:#010x}, computed {computed:#010x}"
    )]
    ChecksumMismatch {
        offset: u64,
        chunk_type: ChunkType,
        stored: u32,
        computed: u32,
    },

    /// Payload bytes could not be converted to or from text
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Payload size exceeds the maximum allowed
    #[error("Data too large: {size} bytes (max: {max})")]
    DataTooLarge { size: usize, max: usize },
}
