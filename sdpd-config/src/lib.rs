//! Shared configuration loader for the sd prompt dumper.
//!
//! `defaults/sdpd.default.toml` is embedded into the binary so that the documented defaults
//! and runtime behavior stay in sync. The CLI layers the user's file and its own flags on
//! top via [`Loader`] before deserializing into [`Settings`].
//!
//! Precedence, lowest first: embedded defaults, the user file
//! (`~/.config/sdPromptDumper/sdPromptDumper.toml`), a file named with `--config`, then
//! individual command-line flags.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, File, FileFormat, ValueKind};
use sdpd_parser::RenderOptions;
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

pub use config::ConfigError;

const DEFAULT_TOML: &str = include_str!("../defaults/sdpd.default.toml");

const USER_CONFIG_DIR: &str = ".config/sdPromptDumper";
const USER_CONFIG_FILE: &str = "sdPromptDumper.toml";

/// Everything the dumper can be configured with.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Settings {
    pub exe_name: String,
    #[serde(default)]
    pub abbreviate: bool,
    #[serde(default)]
    pub bin_dir: Option<PathBuf>,
    #[serde(default)]
    pub model_dir: Option<PathBuf>,
    #[serde(default)]
    pub lora_dir: Option<PathBuf>,
    #[serde(default)]
    pub vae_path: Option<PathBuf>,
}

impl Settings {
    /// The renderer's view of these settings.
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            exe_name: self.exe_name.clone(),
            bin_dir: self.bin_dir.clone(),
            model_dir: self.model_dir.clone(),
            lora_dir: self.lora_dir.clone(),
            vae_path: self.vae_path.clone(),
            abbreviate: self.abbreviate,
        }
    }
}

/// Stacks settings sources, later ones winning, and produces [`Settings`].
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Begins with `defaults/sdpd.default.toml`, so `exe-name` is always set.
    pub fn new() -> Self {
        let defaults = File::from_str(DEFAULT_TOML, FileFormat::Toml);
        Self {
            builder: Config::builder().add_source(defaults),
        }
    }

    /// Adds the TOML file named with `--config`. It has to exist.
    pub fn with_file(self, path: impl AsRef<Path>) -> Self {
        self.with_toml(path.as_ref(), true)
    }

    /// Adds a TOML file that may legitimately be missing.
    pub fn with_optional_file(self, path: impl AsRef<Path>) -> Self {
        self.with_toml(path.as_ref(), false)
    }

    fn with_toml(mut self, path: &Path, required: bool) -> Self {
        let layer = File::from(path).format(FileFormat::Toml).required(required);
        self.builder = self.builder.add_source(layer);
        self
    }

    /// Adds `~/.config/sdPromptDumper/sdPromptDumper.toml` when it exists. Without a home
    /// directory there is nothing to add.
    pub fn with_user_file(self) -> Self {
        match user_config_path() {
            Some(path) => self.with_optional_file(path),
            None => self,
        }
    }

    /// Sets one kebab-case key, taking precedence over every file.
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// As [`Loader::set_override`], for flags the user may have left out.
    pub fn set_override_option<I>(self, key: &str, value: Option<I>) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        match value {
            Some(value) => self.set_override(key, value),
            None => Ok(self),
        }
    }

    /// Merges every layer into [`Settings`]. Fails on unreadable files or mistyped keys.
    pub fn build(self) -> Result<Settings, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Where the per-user configuration file lives, if there is a home directory.
pub fn user_config_path() -> Option<PathBuf> {
    let home = env::var_os("HOME").or_else(|| env::var_os("USERPROFILE"))?;
    Some(
        PathBuf::from(home)
            .join(USER_CONFIG_DIR)
            .join(USER_CONFIG_FILE),
    )
}

/// The settings a run gets with no user file and no flags.
pub fn load_defaults() -> Result<Settings, ConfigError> {
    Loader::new().build()
}
