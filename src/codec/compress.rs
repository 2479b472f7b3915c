//! Compression seam.

use std::io::{Read, Write};

use flate2::{Compression, read::GzDecoder, write::GzEncoder};

use super::CodecError;

/// Lossless compression applied before encryption.
pub trait Compressor: Send + Sync + 'static {
    /// Compress `data`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Compression`] if the stream cannot be written.
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CodecError>;

    /// Decompress `data`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Compression`] if `data` is not a valid stream.
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CodecError>;
}

/// Gzip compression backed by `flate2`.
#[derive(Clone, Copy, Debug, Default)]
pub struct GzipCompressor {
    level: Compression,
}

impl GzipCompressor {
    /// Create a compressor using the given compression level (0-9).
    #[must_use]
    pub fn with_level(level: u32) -> Self {
        Self {
            level: Compression::new(level.min(9)),
        }
    }
}

impl Compressor for GzipCompressor {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2), self.level);
        encoder.write_all(data).map_err(CodecError::Compression)?;
        encoder.finish().map_err(CodecError::Compression)
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::new();
        GzDecoder::new(data)
            .read_to_end(&mut out)
            .map_err(CodecError::Compression)?;
        Ok(out)
    }
}
