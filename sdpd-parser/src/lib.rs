//! # sdpd-parser
//!
//! Reads the generation parameters stable-diffusion.cpp embeds in its PNG output and turns
//! them back into an `sd` command line.
//!
//! Layout
//!
//!     The crate is a short pipeline, one module per stage:
//!
//!         png         locate the `tEXt` chunk in the container (plus byte order helpers)
//!         tokenizer   split the payload into spans, re-split the settings line
//!         fields      the known labels and how each one is printed
//!         render      walk the tokens and build the command line
//!         prompt      run all of the above for one file
//!
//!     `testing` holds PNG fixture builders shared by the unit and integration tests.
//!
//! Usage
//!
//!     ```rust,ignore
//!     use sdpd_parser::{FieldRegistry, Metadata, RenderOptions};
//!
//!     let registry = FieldRegistry::standard()?;
//!     let line = Metadata::from_path("cat.png")?.render(&registry, &RenderOptions::default());
//!     println!("{line}");
//!     ```

pub mod fields;
pub mod png;
pub mod prompt;
pub mod render;
pub mod testing;
pub mod tokenizer;

pub use fields::{FieldDefinition, FieldRegistry, Formatter, RegistryError, Switch};
pub use png::{ChunkType, PngError, ScanError};
pub use prompt::{extract_command, ExtractError, Metadata};
pub use render::{render, RenderOptions};
pub use tokenizer::{tokenize, DelimiterSet, Span, TokenSequence, TokenizeError};
