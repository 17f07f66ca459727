//! Layered configuration for rebuilding and comparing.
//!
//! Each setting is resolved from up to four sources, later ones winning:
//!
//! 1. Built-in defaults
//! 2. A `sharpdom.json` file (explicit `--config`, else the current directory)
//! 3. `SHARPDOM_*` environment variables
//! 4. CLI flags
//!
//! Every resolved value remembers where it came from.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use sharpdom_core::error::DomError;
use sharpdom_syntax::FormatOptions;

/// File looked up in the current directory when no path is given.
pub const CONFIG_FILE_NAME: &str = "sharpdom.json";

pub const ENV_INDENT_WIDTH: &str = "SHARPDOM_INDENT_WIDTH";
pub const ENV_USE_TABS: &str = "SHARPDOM_USE_TABS";
pub const ENV_NEWLINE: &str = "SHARPDOM_NEWLINE";
pub const ENV_INCLUDE_ANNOTATIONS: &str = "SHARPDOM_INCLUDE_ANNOTATIONS";

// ============================================================================
// Configuration Sources
// ============================================================================

/// Configuration value source (for precedence tracking).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSource {
    /// Built-in default value.
    Default = 0,
    /// From `sharpdom.json`.
    ConfigFile = 1,
    /// From environment variable.
    EnvVar = 2,
    /// From CLI flag (highest precedence).
    CliFlag = 3,
}

/// A configuration value with its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        ConfigValue { value, source }
    }

    /// Merge with another value, preferring higher precedence.
    pub fn merge(self, other: Self) -> Self {
        if other.source >= self.source {
            other
        } else {
            self
        }
    }
}

// ============================================================================
// Settings
// ============================================================================

/// Line terminator written by rebuilds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Newline {
    #[default]
    Lf,
    Crlf,
}

impl Newline {
    pub fn as_str(self) -> &'static str {
        match self {
            Newline::Lf => "\n",
            Newline::Crlf => "\r\n",
        }
    }
}

impl fmt::Display for Newline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Newline::Lf => f.write_str("lf"),
            Newline::Crlf => f.write_str("crlf"),
        }
    }
}

impl FromStr for Newline {
    type Err = DomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lf" => Ok(Newline::Lf),
            "crlf" => Ok(Newline::Crlf),
            other => Err(DomError::config(format!(
                "newline must be `lf` or `crlf`, got `{}`",
                other
            ))),
        }
    }
}

/// Contents of a `sharpdom.json` file. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub indent_width: Option<usize>,
    pub use_tabs: Option<bool>,
    pub newline: Option<Newline>,
    pub include_annotations: Option<bool>,
}

impl ConfigFile {
    pub fn read(path: &Path) -> Result<Self, DomError> {
        if !path.is_file() {
            return Err(DomError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| DomError::config(format!("{}: {}", path.display(), e)))
    }
}

/// Settings given on the command line.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub indent_width: Option<usize>,
    pub use_tabs: Option<bool>,
    pub newline: Option<Newline>,
    pub include_annotations: Option<bool>,
}

/// Resolved configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DomConfig {
    pub indent_width: ConfigValue<usize>,
    pub use_tabs: ConfigValue<bool>,
    pub newline: ConfigValue<Newline>,
    pub include_annotations: ConfigValue<bool>,
}

impl Default for DomConfig {
    fn default() -> Self {
        DomConfig {
            indent_width: ConfigValue::new(4, ConfigSource::Default),
            use_tabs: ConfigValue::new(false, ConfigSource::Default),
            newline: ConfigValue::new(Newline::Lf, ConfigSource::Default),
            include_annotations: ConfigValue::new(false, ConfigSource::Default),
        }
    }
}

impl DomConfig {
    /// Resolve against the process environment and the current directory.
    pub fn load(overrides: &CliOverrides) -> Result<Self, DomError> {
        let file = match &overrides.config_path {
            Some(path) => Some(ConfigFile::read(path)?),
            None => {
                let local = Path::new(CONFIG_FILE_NAME);
                if local.is_file() {
                    Some(ConfigFile::read(local)?)
                } else {
                    None
                }
            }
        };
        Self::resolve(file.as_ref(), |name| std::env::var(name).ok(), overrides)
    }

    /// Resolve from explicit layers. `env` looks up one variable.
    pub fn resolve(
        file: Option<&ConfigFile>,
        env: impl Fn(&str) -> Option<String>,
        overrides: &CliOverrides,
    ) -> Result<Self, DomError> {
        let mut config = DomConfig::default();
        if let Some(file) = file {
            config.apply(
                ConfigSource::ConfigFile,
                file.indent_width,
                file.use_tabs,
                file.newline,
                file.include_annotations,
            );
        }
        config.apply(
            ConfigSource::EnvVar,
            env_value(&env, ENV_INDENT_WIDTH)?,
            env_value(&env, ENV_USE_TABS)?,
            env_value(&env, ENV_NEWLINE)?,
            env_value(&env, ENV_INCLUDE_ANNOTATIONS)?,
        );
        config.apply(
            ConfigSource::CliFlag,
            overrides.indent_width,
            overrides.use_tabs,
            overrides.newline,
            overrides.include_annotations,
        );
        if config.indent_width.value == 0 {
            return Err(DomError::config("indent_width must be at least 1"));
        }
        debug!(?config, "resolved configuration");
        Ok(config)
    }

    fn apply(
        &mut self,
        source: ConfigSource,
        indent_width: Option<usize>,
        use_tabs: Option<bool>,
        newline: Option<Newline>,
        include_annotations: Option<bool>,
    ) {
        if let Some(value) = indent_width {
            self.indent_width = self.indent_width.merge(ConfigValue::new(value, source));
        }
        if let Some(value) = use_tabs {
            self.use_tabs = self.use_tabs.merge(ConfigValue::new(value, source));
        }
        if let Some(value) = newline {
            self.newline = self.newline.merge(ConfigValue::new(value, source));
        }
        if let Some(value) = include_annotations {
            self.include_annotations = self
                .include_annotations
                .merge(ConfigValue::new(value, source));
        }
    }

    pub fn format_options(&self) -> FormatOptions {
        FormatOptions {
            indent_width: self.indent_width.value,
            use_tabs: self.use_tabs.value,
            newline: self.newline.value.as_str().to_string(),
        }
    }
}

/// Parse an environment variable, if set.
fn env_value<T>(env: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>, DomError>
where
    T: EnvParse,
{
    match env(name) {
        Some(raw) => T::parse_env(&raw)
            .map(Some)
            .map_err(|message| DomError::config(format!("{}: {}", name, message))),
        None => Ok(None),
    }
}

trait EnvParse: Sized {
    fn parse_env(raw: &str) -> Result<Self, String>;
}

impl EnvParse for usize {
    fn parse_env(raw: &str) -> Result<Self, String> {
        raw.trim()
            .parse()
            .map_err(|_| format!("expected a number, got `{}`", raw))
    }
}

impl EnvParse for bool {
    fn parse_env(raw: &str) -> Result<Self, String> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(format!("expected a boolean, got `{}`", raw)),
        }
    }
}

impl EnvParse for Newline {
    fn parse_env(raw: &str) -> Result<Self, String> {
        raw.parse().map_err(|e: DomError| e.to_string())
    }
}
