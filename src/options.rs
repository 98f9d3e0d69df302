//! Codec options

use crate::chunk::ChunkType;

/// Largest payload the 32-bit chunk length field can describe
pub const MAX_PAYLOAD_LEN: usize = u32::MAX as usize;

/// What the parser does with each chunk's stored CRC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChecksumPolicy {
    /// Carry stored CRCs forward without checking them (default)
    ///
    /// A file with a stale CRC parses cleanly and is re-serialized with the
    /// same stale value.
    #[default]
    Trust,
    /// Check every chunk and log mismatches, but keep the chunk
    Warn,
    /// Fail parsing on the first mismatch
    Verify,
}

/// Options for parsing and editing a [`Png`](crate::Png)
///
/// This struct uses a builder pattern where the default reproduces the plain
/// codec behavior: payload chunk type `coDe`, stored CRCs trusted, payloads
/// limited only by the chunk length field.
///
/// # Example
///
/// ```
/// use png_payload::{ChecksumPolicy, ChunkType, CodecOptions};
///
/// let options = CodecOptions::new()
///     .payload_type(ChunkType(*b"prOg"))
///     .checksum_policy(ChecksumPolicy::Verify)
///     .max_payload_len(1024 * 1024);
///
/// assert_eq!(options.get_payload_type(), ChunkType(*b"prOg"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecOptions {
    pub(crate) payload_type: ChunkType,
    pub(crate) checksum_policy: ChecksumPolicy,
    pub(crate) max_payload_len: usize,
}

impl CodecOptions {
    /// Create options with all defaults
    ///
    /// This is the same as `CodecOptions::default()` but more explicit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different chunk type for the payload chunk
    ///
    /// Pick an ancillary, private tag (lowercase first and second letters) so
    /// that generic PNG tools ignore it.
    pub fn payload_type(mut self, payload_type: ChunkType) -> Self {
        self.payload_type = payload_type;
        self
    }

    /// Set how stored chunk CRCs are handled while parsing
    pub fn checksum_policy(mut self, policy: ChecksumPolicy) -> Self {
        self.checksum_policy = policy;
        self
    }

    /// Cap the payload size accepted by `set_payload_chunk`
    ///
    /// Values above [`MAX_PAYLOAD_LEN`] are clamped to it.
    pub fn max_payload_len(mut self, max: usize) -> Self {
        self.max_payload_len = max.min(MAX_PAYLOAD_LEN);
        self
    }

    /// Configured payload chunk type
    pub fn get_payload_type(&self) -> ChunkType {
        self.payload_type
    }

    /// Configured checksum policy
    pub fn get_checksum_policy(&self) -> ChecksumPolicy {
        self.checksum_policy
    }

    /// Configured payload size limit
    pub fn get_max_payload_len(&self) -> usize {
        self.max_payload_len
    }
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            payload_type: ChunkType::coDe,
            checksum_policy: ChecksumPolicy::default(),
            max_payload_len: MAX_PAYLOAD_LEN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = CodecOptions::default();
        assert_eq!(options.get_payload_type(), ChunkType::coDe);
        assert_eq!(options.get_checksum_policy(), ChecksumPolicy::Trust);
        assert_eq!(options.get_max_payload_len(), MAX_PAYLOAD_LEN);
    }

    #[test]
    fn test_max_payload_len_is_clamped() {
        let options = CodecOptions::new().max_payload_len(usize::MAX);
        assert_eq!(options.get_max_payload_len(), MAX_PAYLOAD_LEN);

        let options = CodecOptions::new().max_payload_len(16);
        assert_eq!(options.get_max_payload_len(), 16);
    }
}
