//! Deployment configuration.
//!
//! `defaults/translator.default.toml` is embedded into the binary. Deployments
//! layer a TOML file, `TRANSLATOR__*` environment variables and explicit
//! overrides on top of it via [`Loader`], then call
//! [`TranslatorConfig::validate`] before serving anything.

use std::path::{Path, PathBuf};

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat, ValueKind};
use regex::Regex;
use serde::Deserialize;

use crate::error::{Result, TranslatorError};
use crate::normalize::ScriptVariant;
use crate::pipeline::Pipeline;
use crate::remap::Mode;

const DEFAULT_TOML: &str = include_str!("../defaults/translator.default.toml");

pub const ENV_PREFIX: &str = "TRANSLATOR";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Deployment {
    Dev,
    Prod,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranslatorConfig {
    pub app_name: String,
    pub deployment: Deployment,
    pub home_url: String,
    pub production_url: String,
    pub debug: bool,

    /// Name of the secret holding the service-account JSON.
    pub secret_name: String,
    /// Root directory of the file-backed secret store.
    pub secrets_dir: PathBuf,
    pub sheet_url: String,
    /// Directory of `<table>.csv` files; when set it replaces the spreadsheet.
    pub mapping_dir: String,

    pub lookup_column: String,
    pub replacement_column: String,
    /// Worksheet with the translation mappings.
    pub mapping_table: String,
    /// Worksheet with the symbol standardization mappings.
    pub symbol_table: String,

    pub mode: Mode,
    pub normalize_script: bool,
    pub script_variant: ScriptVariant,
    pub standardize_symbols: bool,

    /// Name of the textarea submitted by the form page.
    pub form_field: String,
}

impl TranslatorConfig {
    /// Reject settings the request path cannot work without.
    pub fn validate(&self) -> Result<()> {
        let mut required = vec![
            ("app_name", &self.app_name),
            ("lookup_column", &self.lookup_column),
            ("replacement_column", &self.replacement_column),
            ("mapping_table", &self.mapping_table),
            ("form_field", &self.form_field),
        ];
        if !self.uses_local_tables() {
            required.push(("secret_name", &self.secret_name));
            required.push(("sheet_url", &self.sheet_url));
        }
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(TranslatorError::Configuration(format!(
                    "'{}' must be set",
                    key
                )));
            }
        }
        if self.standardize_symbols && self.symbol_table.trim().is_empty() {
            return Err(TranslatorError::Configuration(
                "'symbol_table' must be set when 'standardize_symbols' is enabled".into(),
            ));
        }
        if self.form_action().trim().is_empty() {
            return Err(TranslatorError::Configuration(format!(
                "no URL configured for the {:?} deployment",
                self.deployment
            )));
        }
        if !self.uses_local_tables() {
            self.spreadsheet_id()?;
        }
        Ok(())
    }

    /// Whether mapping tables come from CSV files in `mapping_dir`.
    pub fn uses_local_tables(&self) -> bool {
        !self.mapping_dir.trim().is_empty()
    }

    /// Extract the spreadsheet ID from `sheet_url`; a bare ID passes through.
    pub fn spreadsheet_id(&self) -> Result<String> {
        let url = self.sheet_url.trim();
        let re = Regex::new(r"/d/([a-zA-Z0-9_-]+)")
            .map_err(|e| TranslatorError::Configuration(e.to_string()))?;
        if let Some(caps) = re.captures(url) {
            return Ok(caps[1].to_string());
        }
        let bare = Regex::new(r"^[a-zA-Z0-9_-]+$")
            .map_err(|e| TranslatorError::Configuration(e.to_string()))?;
        if bare.is_match(url) {
            Ok(url.to_string())
        } else {
            Err(TranslatorError::Configuration(format!(
                "cannot find a spreadsheet ID in '{}'",
                url
            )))
        }
    }

    /// Where the form posts to and where the outcome page links back to.
    pub fn form_action(&self) -> &str {
        match self.deployment {
            Deployment::Dev => &self.home_url,
            Deployment::Prod => &self.production_url,
        }
    }

    pub fn pipeline(&self) -> Pipeline {
        Pipeline {
            mode: self.mode,
            normalize_script: self.normalize_script,
            standardize_symbols: self.standardize_symbols,
        }
    }
}

/// Layers configuration sources over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer `<prefix>__<KEY>` environment variables, e.g. `TRANSLATOR__SHEET_URL`.
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        let source = Environment::with_prefix(prefix)
            .prefix_separator("__")
            .try_parsing(true);
        self.builder = self.builder.add_source(source);
        self
    }

    pub fn with_environment(self) -> Self {
        self.with_env_prefix(ENV_PREFIX)
    }

    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    pub fn build(self) -> Result<TranslatorConfig> {
        Ok(self.builder.build()?.try_deserialize()?)
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

pub fn load_defaults() -> Result<TranslatorConfig> {
    Loader::new().build()
}
