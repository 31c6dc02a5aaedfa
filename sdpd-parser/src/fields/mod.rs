//! Metadata fields
//!
//!     stable-diffusion.cpp writes its generation settings as `Label: value` pairs. Each
//!     label we understand has a [FieldDefinition] telling the renderer which `sd` switch to
//!     emit and how to format the value. Labels that are not listed here are ignored, so
//!     newer writers adding fields do not break older readers.
//!
//!     The definitions live in [STANDARD_FIELDS] and are loaded into a [FieldRegistry] once
//!     at startup.

pub mod hash;
pub mod registry;

pub use registry::{FieldRegistry, RegistryError};

use std::borrow::Cow;

/// A command-line switch with an optional single character abbreviation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Switch {
    pub long: &'static str,
    pub short: Option<char>,
}

impl Switch {
    pub const fn long(long: &'static str) -> Self {
        Self { long, short: None }
    }

    pub const fn with_short(long: &'static str, short: char) -> Self {
        Self {
            long,
            short: Some(short),
        }
    }

    /// The switch as it should be printed. Falls back to the long form when there is no
    /// abbreviation.
    pub fn spelling(&self, abbreviate: bool) -> Cow<'static, str> {
        match self.short {
            Some(short) if abbreviate => Cow::Owned(format!("-{short}")),
            _ => Cow::Borrowed(self.long),
        }
    }
}

/// How a field value turns into output text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Formatter {
    /// The value with leading blanks removed.
    Verbatim,
    /// As verbatim, wrapped in double quotes.
    Quoted,
    /// A `WxH` value split into two switches of its own.
    Dimensions { width: Switch, height: Switch },
    /// A model file name resolved against the configured model directory.
    ModelPath,
    /// Recognized but never printed. The configured override is appended instead.
    Suppressed,
}

impl Formatter {
    pub fn name(&self) -> &'static str {
        match self {
            Formatter::Verbatim => "verbatim",
            Formatter::Quoted => "quoted",
            Formatter::Dimensions { .. } => "dimensions",
            Formatter::ModelPath => "model-path",
            Formatter::Suppressed => "suppressed",
        }
    }
}

/// A recognized metadata label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDefinition {
    pub label: &'static str,
    /// `None` means the formatted value is emitted on its own.
    pub switch: Option<Switch>,
    pub formatter: Formatter,
}

impl FieldDefinition {
    pub const fn new(label: &'static str, switch: Option<Switch>, formatter: Formatter) -> Self {
        Self {
            label,
            switch,
            formatter,
        }
    }
}

pub const WIDTH: Switch = Switch::with_short("--width", 'W');
pub const HEIGHT: Switch = Switch::with_short("--height", 'H');

/// The label stable-diffusion.cpp uses for the positive prompt, which is also the
/// `tEXt` keyword.
pub const PROMPT_LABEL: &str = "parameters";

/// The label that opens the comma separated run of settings.
pub const SETTINGS_LABEL: &str = "Steps";

pub const STANDARD_FIELDS: &[FieldDefinition] = &[
    FieldDefinition::new(
        PROMPT_LABEL,
        Some(Switch::with_short("--prompt", 'p')),
        Formatter::Quoted,
    ),
    FieldDefinition::new(
        "Negative prompt",
        Some(Switch::with_short("--negative-prompt", 'n')),
        Formatter::Quoted,
    ),
    FieldDefinition::new(
        SETTINGS_LABEL,
        Some(Switch::long("--steps")),
        Formatter::Verbatim,
    ),
    FieldDefinition::new(
        "CFG scale",
        Some(Switch::long("--cfg-scale")),
        Formatter::Verbatim,
    ),
    FieldDefinition::new(
        "Seed",
        Some(Switch::with_short("--seed", 's')),
        Formatter::Verbatim,
    ),
    FieldDefinition::new(
        "Size",
        None,
        Formatter::Dimensions {
            width: WIDTH,
            height: HEIGHT,
        },
    ),
    FieldDefinition::new("RNG", Some(Switch::long("--rng")), Formatter::Verbatim),
    FieldDefinition::new(
        "Sampler",
        Some(Switch::long("--sampling-method")),
        Formatter::Verbatim,
    ),
    FieldDefinition::new(
        "Model",
        Some(Switch::with_short("--model", 'm')),
        Formatter::ModelPath,
    ),
    // Not written by stable-diffusion.cpp today
    FieldDefinition::new("Width", Some(WIDTH), Formatter::Verbatim),
    FieldDefinition::new("Height", Some(HEIGHT), Formatter::Verbatim),
    FieldDefinition::new("VAE path", Some(Switch::long("--vae")), Formatter::Suppressed),
    FieldDefinition::new(
        "LoRA path",
        Some(Switch::long("--lora-model-dir")),
        Formatter::Suppressed,
    ),
];
