//! Command line rendering
//!
//!     Turns a tokenized metadata block into a single `sd` invocation. Each token is
//!     expected to look like `Label: value`:
//!
//!         1. The label is everything before the first `:` within [LABEL_LIMIT] bytes.
//!            Tokens without a colon in that window are noise and are skipped.
//!         2. Leading blanks are trimmed from the label and it is looked up in the
//!            [FieldRegistry]. Unknown labels are skipped silently.
//!         3. The field's switch (abbreviated when asked to and available) is emitted,
//!            followed by the value run through the field's [Formatter].
//!
//!     After the last token the fixed tail is appended once: the configured VAE and LoRA
//!     paths, `--color`, and the output switch with a placeholder the user is expected to
//!     replace.
//!
//!     Fragments are joined with single spaces. Everything the renderer needs from the
//!     outside world comes in through [RenderOptions].

use crate::fields::{FieldDefinition, FieldRegistry, Formatter, Switch};
use crate::tokenizer::TokenSequence;
use std::path::PathBuf;
use tracing::{debug, trace};

/// A label's colon must sit within this many leading bytes of its token.
pub const LABEL_LIMIT: usize = 62;

pub const OUTPUT_PLACEHOLDER: &str = "<REPLACE_ME>";

pub const DEFAULT_EXE_NAME: &str = "sd";

const OUTPUT: Switch = Switch::with_short("--output", 'o');
const VAE: Switch = Switch::long("--vae");
const LORA: Switch = Switch::long("--lora-model-dir");
const COLOR: &str = "--color";

/// Settings fixed for the whole run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub exe_name: String,
    /// Directory holding the `sd` binary.
    pub bin_dir: Option<PathBuf>,
    /// Directory the encoded model name is resolved against.
    pub model_dir: Option<PathBuf>,
    pub lora_dir: Option<PathBuf>,
    pub vae_path: Option<PathBuf>,
    /// Prefer single character switches.
    pub abbreviate: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            exe_name: DEFAULT_EXE_NAME.to_string(),
            bin_dir: None,
            model_dir: None,
            lora_dir: None,
            vae_path: None,
            abbreviate: false,
        }
    }
}

impl RenderOptions {
    pub fn abbreviated(mut self, abbreviate: bool) -> Self {
        self.abbreviate = abbreviate;
        self
    }

    /// The program to invoke, inside the binary directory when one is set.
    pub fn executable(&self) -> String {
        match &self.bin_dir {
            Some(dir) => dir.join(&self.exe_name).display().to_string(),
            None => self.exe_name.clone(),
        }
    }
}

/// Render every recognized token of `buffer` as one command line (without a newline).
pub fn render(
    buffer: &[u8],
    tokens: &TokenSequence,
    registry: &FieldRegistry,
    options: &RenderOptions,
) -> String {
    let mut fragments = vec![options.executable()];

    for span in tokens {
        let Some(token) = span.slice(buffer) else {
            continue;
        };
        let Some((label, value)) = split_label(token) else {
            trace!(%span, "token has no label");
            continue;
        };
        let Some(field) = registry.lookup(label) else {
            trace!(label, "unrecognized label");
            continue;
        };

        let rendered = field_fragments(field, value, options);
        if rendered.is_empty() {
            debug!(label, "field produced no output");
        }
        fragments.extend(rendered);
    }

    push_tail(&mut fragments, options);
    fragments.join(" ")
}

/// Split a token into its trimmed label and the raw value after the colon.
fn split_label(token: &[u8]) -> Option<(&str, &[u8])> {
    let window = &token[..token.len().min(LABEL_LIMIT)];
    let colon = window.iter().position(|&byte| byte == b':')?;
    let label = std::str::from_utf8(trim_blanks(&token[..colon])).ok()?;
    Some((label, &token[colon + 1..]))
}

fn field_fragments(field: &FieldDefinition, value: &[u8], options: &RenderOptions) -> Vec<String> {
    let value = trim_blanks(value);

    let formatted = match field.formatter {
        Formatter::Suppressed => return Vec::new(),
        Formatter::Quoted => vec![quote(&text(value))],
        Formatter::Verbatim if value.is_empty() => return Vec::new(),
        Formatter::Verbatim => vec![text(value)],
        Formatter::ModelPath if value.is_empty() => return Vec::new(),
        Formatter::ModelPath => {
            let name = text(value);
            match &options.model_dir {
                Some(dir) => vec![dir.join(name).display().to_string()],
                None => vec![name],
            }
        }
        Formatter::Dimensions { width, height } => match split_dimensions(value) {
            Some((w, h)) => vec![
                width.spelling(options.abbreviate).into_owned(),
                text(w),
                height.spelling(options.abbreviate).into_owned(),
                text(h),
            ],
            None => return Vec::new(),
        },
    };

    match field.switch {
        Some(switch) => std::iter::once(switch.spelling(options.abbreviate).into_owned())
            .chain(formatted)
            .collect(),
        None => formatted,
    }
}

fn push_tail(fragments: &mut Vec<String>, options: &RenderOptions) {
    if let Some(vae) = &options.vae_path {
        fragments.push(VAE.spelling(options.abbreviate).into_owned());
        fragments.push(quote(&vae.display().to_string()));
    }

    if let Some(lora) = &options.lora_dir {
        fragments.push(LORA.spelling(options.abbreviate).into_owned());
        fragments.push(quote(&lora.display().to_string()));
    }

    fragments.push(COLOR.to_string());
    fragments.push(OUTPUT.spelling(options.abbreviate).into_owned());
    fragments.push(OUTPUT_PLACEHOLDER.to_string());
}

/// `512x768` into `("512", "768")`. Both halves must be non-empty.
fn split_dimensions(value: &[u8]) -> Option<(&[u8], &[u8])> {
    let x = value.iter().position(|&byte| byte == b'x')?;
    let width = trim_blanks(&value[..x]);
    let height = trim_blanks(&value[x + 1..]);
    (!width.is_empty() && !height.is_empty()).then_some((width, height))
}

fn trim_blanks(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|&byte| byte != b' ' && byte != b'\t')
        .unwrap_or(bytes.len());
    &bytes[start..]
}

fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for ch in value.chars() {
        if ch == '"' || ch == '\\' {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push('"');
    quoted
}
