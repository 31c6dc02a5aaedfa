//! Prompt extraction
//!
//!     Glue that takes one PNG from bytes on disk to a rendered `sd` command:
//!
//!         1. Check the signature and find the `tEXt` chunk ([crate::png]).
//!         2. Buffer the whole payload.
//!         3. Repair the first field (see below).
//!         4. Split the payload into lines ([crate::tokenizer]).
//!         5. Split the settings line on commas, in place.
//!         6. Render ([crate::render]).
//!
//! Upstream Conventions
//!
//!     stable-diffusion.cpp stores its parameters in a `tEXt` chunk whose keyword is
//!     `parameters`, and PNG separates keyword and text with a NUL byte. We treat the
//!     keyword as the label of the positive prompt, so the NUL is turned into a `:` (or a
//!     `:` is inserted when there is no separator at all).
//!
//!     The prompt and negative prompt each get a line, while every other setting shares
//!     one comma separated line that starts with `Steps`. The negative prompt line is
//!     left out when it is empty, so the settings line is found by its label rather than
//!     by position. Both rules are specific to this writer and kept as is.

use crate::fields::{FieldRegistry, PROMPT_LABEL, SETTINGS_LABEL};
use crate::png::{self, ChunkType, PngError, ScanError};
use crate::render::{self, RenderOptions};
use crate::tokenizer::{self, DelimiterSet, TokenSequence, TokenizeError};
use std::collections::TryReserveError;
use std::fs::File;
use std::io::{self, BufReader, ErrorKind, Read, Seek};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

const LINE_DELIMITERS: &[u8] = b"\n";
const SETTING_DELIMITERS: &[u8] = b",";

const INITIAL_PAYLOAD_RESERVE: usize = 64 * 1024;

/// Errors that abandon one file
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unable to open {}: {source}", .path.display())]
    Open { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Png(#[from] PngError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("unable to allocate {length} bytes for the metadata: {source}")]
    Allocation {
        length: u32,
        source: TryReserveError,
    },

    #[error("unable to fill info buffer with {length} bytes: {source}")]
    ShortPayload { length: u32, source: io::Error },

    #[error("failed to tokenize metadata: {0}")]
    Tokenize(#[from] TokenizeError),
}

/// A tokenized `tEXt` payload
#[derive(Debug, Clone)]
pub struct Metadata {
    payload: Vec<u8>,
    tokens: TokenSequence,
}

impl Metadata {
    /// Load from a PNG file on disk
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ExtractError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ExtractError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(&mut BufReader::new(file))
    }

    /// Load from a PNG stream positioned at its first byte
    pub fn from_reader<R: Read + Seek>(stream: &mut R) -> Result<Self, ExtractError> {
        png::validate_signature(stream)?;
        let length = png::find_chunk(stream, ChunkType::TEXT)?;
        let payload = read_payload(stream, length)?;
        Self::from_payload(payload)
    }

    /// Tokenize a raw `tEXt` payload (keyword, NUL, text)
    pub fn from_payload(mut payload: Vec<u8>) -> Result<Self, ExtractError> {
        repair_prompt_label(&mut payload);

        let mut tokens = tokenizer::tokenize(&payload, &DelimiterSet::new(LINE_DELIMITERS))?;
        if let Some(index) = tokens.position_starting_with(&payload, SETTINGS_LABEL.as_bytes()) {
            tokens.subtokenize(&payload, &DelimiterSet::new(SETTING_DELIMITERS), index)?;
        } else {
            debug!("metadata has no {} line", SETTINGS_LABEL);
        }

        Ok(Self { payload, tokens })
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn tokens(&self) -> &TokenSequence {
        &self.tokens
    }

    /// The bytes of every token, in order
    pub fn fields(&self) -> impl Iterator<Item = &[u8]> + '_ {
        (0..self.tokens.len()).filter_map(move |index| self.tokens.slice(&self.payload, index))
    }

    pub fn render(&self, registry: &FieldRegistry, options: &RenderOptions) -> String {
        render::render(&self.payload, &self.tokens, registry, options)
    }
}

/// Read a PNG from `stream` and render its generation parameters as an `sd` command.
pub fn extract_command<R: Read + Seek>(
    stream: &mut R,
    registry: &FieldRegistry,
    options: &RenderOptions,
) -> Result<String, ExtractError> {
    Ok(Metadata::from_reader(stream)?.render(registry, options))
}

/// Read exactly `length` bytes. The declared length is untrusted, so storage only grows as
/// bytes arrive beyond the first [INITIAL_PAYLOAD_RESERVE].
fn read_payload<R: Read>(stream: &mut R, length: u32) -> Result<Vec<u8>, ExtractError> {
    let size = length as usize;
    let mut payload = Vec::new();
    payload
        .try_reserve_exact(size.min(INITIAL_PAYLOAD_RESERVE))
        .map_err(|source| ExtractError::Allocation { length, source })?;

    stream
        .by_ref()
        .take(u64::from(length))
        .read_to_end(&mut payload)
        .map_err(|source| ExtractError::ShortPayload { length, source })?;

    if payload.len() != size {
        let source = io::Error::new(
            ErrorKind::UnexpectedEof,
            format!("stream ended after {} bytes", payload.len()),
        );
        return Err(ExtractError::ShortPayload { length, source });
    }

    debug!(bytes = size, "read metadata payload");
    Ok(payload)
}

/// Make sure the payload starts with `parameters:`.
fn repair_prompt_label(payload: &mut Vec<u8>) {
    let label = PROMPT_LABEL.as_bytes();
    if !payload.starts_with(label) {
        return;
    }

    match payload.get(label.len()) {
        Some(b':') => {}
        Some(0) => payload[label.len()] = b':',
        _ => payload.insert(label.len(), b':'),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sd_png, PngBuilder};
    use std::io::Cursor;

    fn field_strings(metadata: &Metadata) -> Vec<String> {
        metadata
            .fields()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .collect()
    }

    #[test]
    fn test_nul_separator_becomes_colon() {
        let metadata = Metadata::from_payload(b"parameters\0a cat".to_vec()).unwrap();
        assert_eq!(metadata.payload(), b"parameters:a cat");
    }

    #[test]
    fn test_missing_separator_is_inserted() {
        let metadata = Metadata::from_payload(b"parameters".to_vec()).unwrap();
        assert_eq!(metadata.payload(), b"parameters:");

        let metadata = Metadata::from_payload(b"parametersfoo".to_vec()).unwrap();
        assert_eq!(metadata.payload(), b"parameters:foo");
    }

    #[test]
    fn test_other_keywords_untouched() {
        let metadata = Metadata::from_payload(b"Comment\0hello".to_vec()).unwrap();
        assert_eq!(metadata.payload(), b"Comment\0hello");
    }

    #[test]
    fn test_settings_line_split_on_commas() {
        let metadata = Metadata::from_payload(
            b"parameters\0a cat, steps: 20\nNegative prompt: ugly\nSteps: 20, Seed: 5, Size: 512x768"
                .to_vec(),
        )
        .unwrap();

        assert_eq!(
            field_strings(&metadata),
            vec![
                "parameters:a cat, steps: 20",
                "Negative prompt: ugly",
                "Steps: 20",
                " Seed: 5",
                " Size: 512x768",
            ]
        );
    }

    #[test]
    fn test_settings_found_without_negative_prompt() {
        let metadata =
            Metadata::from_payload(b"parameters\0a dog\nSteps: 4, Seed: 1".to_vec()).unwrap();
        assert_eq!(metadata.tokens().len(), 3);
    }

    #[test]
    fn test_extract_command_from_png() {
        let registry = FieldRegistry::standard().unwrap();
        let png = sd_png("a cat\nNegative prompt: ugly\nSteps: 20, Seed: 5, Size: 512x768");

        let line = extract_command(
            &mut Cursor::new(png),
            &registry,
            &RenderOptions::default(),
        )
        .unwrap();

        assert_eq!(
            line,
            "sd --prompt \"a cat\" --negative-prompt \"ugly\" --steps 20 --seed 5 \
             --width 512 --height 768 --color --output <REPLACE_ME>"
        );
    }

    #[test]
    fn test_missing_text_chunk() {
        let png = PngBuilder::new().ihdr(1, 1).iend().build();
        let err = Metadata::from_reader(&mut Cursor::new(png)).unwrap_err();
        assert!(matches!(err, ExtractError::Scan(ScanError::NotFound(_))));
    }

    #[test]
    fn test_not_a_png() {
        let err = Metadata::from_reader(&mut Cursor::new(b"hello world".to_vec())).unwrap_err();
        assert!(matches!(err, ExtractError::Png(PngError::InvalidSignature)));
    }

    #[test]
    fn test_truncated_payload() {
        let mut png = PngBuilder::new().text("parameters", "a long prompt").build();
        png.truncate(png.len() - 10);

        let err = Metadata::from_reader(&mut Cursor::new(png)).unwrap_err();
        assert!(matches!(err, ExtractError::ShortPayload { length: 24, .. }));
    }

    #[test]
    fn test_oversized_length_fails_without_filling_buffer() {
        let mut png = PngBuilder::new().build();
        png.extend_from_slice(&0xF000_0000u32.to_be_bytes());
        png.extend_from_slice(ChunkType::TEXT.as_bytes());
        png.extend_from_slice(b"param");

        let err = Metadata::from_reader(&mut Cursor::new(png)).unwrap_err();
        match err {
            ExtractError::ShortPayload { length, source } => {
                assert_eq!(length, 0xF000_0000);
                assert_eq!(source.kind(), ErrorKind::UnexpectedEof);
                assert_eq!(source.to_string(), "stream ended after 5 bytes");
            }
            other => panic!("expected a short payload, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_file() {
        let err = Metadata::from_path("/definitely/not/here.png").unwrap_err();
        assert!(matches!(err, ExtractError::Open { .. }));
    }
}
