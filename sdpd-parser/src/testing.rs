//! Test fixtures
//!
//!     Hand-built PNG byte streams for unit and integration tests. The images are not
//!     decodable (no IDAT, zeroed CRCs) but the chunk framing is exact, which is all the
//!     scanner looks at.
//!
//!     ```rust,ignore
//!     use sdpd_parser::testing::{sd_png, PngBuilder};
//!
//!     let png = sd_png("a cat\nSteps: 20, Seed: 5");
//!     let odd = PngBuilder::new().chunk(*b"zzZz", &[1, 2, 3]).text("parameters", "x").build();
//!     ```

use crate::fields::PROMPT_LABEL;
use crate::png::{ChunkType, SIGNATURE};

/// Builds a PNG byte stream chunk by chunk
#[derive(Debug, Clone)]
pub struct PngBuilder {
    bytes: Vec<u8>,
}

impl PngBuilder {
    pub fn new() -> Self {
        Self {
            bytes: SIGNATURE.to_vec(),
        }
    }

    /// Append a chunk with an arbitrary type tag.
    pub fn chunk(mut self, kind: [u8; 4], payload: &[u8]) -> Self {
        let length = u32::try_from(payload.len()).expect("fixture chunk fits in u32");
        self.bytes.extend_from_slice(&length.to_be_bytes());
        self.bytes.extend_from_slice(&kind);
        self.bytes.extend_from_slice(payload);
        self.bytes.extend_from_slice(&[0; 4]);
        self
    }

    pub fn ihdr(self, width: u32, height: u32) -> Self {
        let mut payload = Vec::with_capacity(13);
        payload.extend_from_slice(&width.to_be_bytes());
        payload.extend_from_slice(&height.to_be_bytes());
        // bit depth 8, truecolor, deflate, adaptive filtering, no interlace
        payload.extend_from_slice(&[8, 2, 0, 0, 0]);
        self.chunk(*ChunkType::IHDR.as_bytes(), &payload)
    }

    /// Append a `tEXt` chunk: keyword, NUL, text.
    pub fn text(self, keyword: &str, text: &str) -> Self {
        let mut payload = Vec::with_capacity(keyword.len() + 1 + text.len());
        payload.extend_from_slice(keyword.as_bytes());
        payload.push(0);
        payload.extend_from_slice(text.as_bytes());
        self.chunk(*ChunkType::TEXT.as_bytes(), &payload)
    }

    pub fn iend(self) -> Self {
        self.chunk(*ChunkType::IEND.as_bytes(), &[])
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }
}

impl Default for PngBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A PNG laid out the way stable-diffusion.cpp writes one, with `parameters` as metadata.
pub fn sd_png(parameters: &str) -> Vec<u8> {
    PngBuilder::new()
        .ihdr(512, 512)
        .text(PROMPT_LABEL, parameters)
        .iend()
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_framing() {
        let bytes = PngBuilder::new().chunk(*b"abcd", &[7, 7]).build();
        assert_eq!(&bytes[..8], &SIGNATURE);
        assert_eq!(&bytes[8..], &[0, 0, 0, 2, b'a', b'b', b'c', b'd', 7, 7, 0, 0, 0, 0]);
    }
}
