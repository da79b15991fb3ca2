//! Configuration: document options and layered settings
//!
//! Document options travel inside every saved document and are validated on
//! every assignment. Settings configure the tool itself.
//!
//! Settings precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/yggdraw/yggdraw.toml`
//! 3. Environment variables: `YGGDRAW_*` prefix, `__` separating nested keys

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::services::DocumentFormat;
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::GraphConfig;

/// Tree behaviour options.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TreeOptions {
    /// Keep every child list sorted by display id after each edit
    pub sort: bool,
}

/// Drawing options, keys as stored in documents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GraphOptions {
    pub radius: f64,
    pub padding: f64,
    #[serde(rename = "arrowwidth")]
    pub arrow_width: f64,
    #[serde(rename = "arrowlength")]
    pub arrow_length: f64,
    pub normalize: bool,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            radius: 40.0,
            padding: 5.0,
            arrow_width: 5.0,
            arrow_length: 5.0,
            normalize: true,
        }
    }
}

impl GraphOptions {
    pub fn to_graph_config(&self) -> GraphConfig {
        GraphConfig {
            radius: self.radius,
            padding: self.padding,
            arrow_length: self.arrow_length,
            arrow_width: self.arrow_width,
            normalize: self.normalize,
        }
    }
}

/// Inclusive range accepted for a float option.
#[derive(Debug, Clone, Copy)]
struct FloatRange {
    min: f64,
    max: f64,
}

const RADIUS: FloatRange = FloatRange { min: 1.0, max: 500.0 };
const PADDING: FloatRange = FloatRange { min: 0.0, max: 500.0 };
const ARROW: FloatRange = FloatRange { min: 0.0, max: 100.0 };

/// Options stored in a document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Options {
    pub tree: TreeOptions,
    pub graph: GraphOptions,
}

impl Options {
    /// Dotted keys accepted by [`set`](Self::set) and [`get`](Self::get).
    pub const KEYS: [&'static str; 6] = [
        "tree.sort",
        "graph.radius",
        "graph.padding",
        "graph.arrowwidth",
        "graph.arrowlength",
        "graph.normalize",
    ];

    /// Parses and assigns one option.
    ///
    /// The value is validated before assignment, so a rejected value leaves
    /// the stored one untouched.
    pub fn set(&mut self, key: &str, value: &str) -> ApplicationResult<()> {
        match key {
            "tree.sort" => self.tree.sort = parse_bool(key, value)?,
            "graph.radius" => self.graph.radius = parse_float(key, value, RADIUS)?,
            "graph.padding" => self.graph.padding = parse_float(key, value, PADDING)?,
            "graph.arrowwidth" => self.graph.arrow_width = parse_float(key, value, ARROW)?,
            "graph.arrowlength" => self.graph.arrow_length = parse_float(key, value, ARROW)?,
            "graph.normalize" => self.graph.normalize = parse_bool(key, value)?,
            _ => return Err(ApplicationError::UnknownOption(key.to_string())),
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> ApplicationResult<String> {
        let value = match key {
            "tree.sort" => self.tree.sort.to_string(),
            "graph.radius" => self.graph.radius.to_string(),
            "graph.padding" => self.graph.padding.to_string(),
            "graph.arrowwidth" => self.graph.arrow_width.to_string(),
            "graph.arrowlength" => self.graph.arrow_length.to_string(),
            "graph.normalize" => self.graph.normalize.to_string(),
            _ => return Err(ApplicationError::UnknownOption(key.to_string())),
        };
        Ok(value)
    }

    /// Range check for options that did not come through [`set`](Self::set),
    /// e.g. loaded from a document or a config file.
    pub fn validate(&self) -> ApplicationResult<()> {
        check_range("graph.radius", self.graph.radius, RADIUS)?;
        check_range("graph.padding", self.graph.padding, PADDING)?;
        check_range("graph.arrowwidth", self.graph.arrow_width, ARROW)?;
        check_range("graph.arrowlength", self.graph.arrow_length, ARROW)?;
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> ApplicationResult<bool> {
    value
        .trim()
        .parse::<bool>()
        .map_err(|_| validation(key, value, "expected true or false"))
}

fn parse_float(key: &str, value: &str, range: FloatRange) -> ApplicationResult<f64> {
    let parsed = value
        .trim()
        .parse::<f64>()
        .map_err(|_| validation(key, value, "expected a number"))?;
    check_range(key, parsed, range)?;
    Ok(parsed)
}

fn check_range(key: &str, value: f64, range: FloatRange) -> ApplicationResult<()> {
    if !value.is_finite() || value < range.min || value > range.max {
        return Err(validation(
            key,
            &value.to_string(),
            &format!("must be between {} and {}", range.min, range.max),
        ));
    }
    Ok(())
}

fn validation(key: &str, value: &str, reason: &str) -> ApplicationError {
    ApplicationError::Validation {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Settings of the tool itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Options given to newly created documents
    pub options: Options,
    /// Frames produced when animating an edit
    pub animation_steps: u32,
    /// Format used when a file extension does not name one
    pub format: DocumentFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            options: Options::default(),
            animation_steps: 20,
            format: DocumentFormat::Json,
        }
    }
}

/// Get the XDG config directory for yggdraw.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "yggdraw").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("yggdraw.toml"))
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

impl Settings {
    /// Load settings with full layering from the XDG config location.
    pub fn load() -> ApplicationResult<Self> {
        Self::load_from(global_config_path().as_deref())
    }

    /// Load settings with `global` as the config file layer.
    pub fn load_from(global: Option<&Path>) -> ApplicationResult<Self> {
        let defaults = Config::try_from(&Settings::default()).map_err(config_err)?;
        let mut builder = Config::builder().add_source(defaults);

        if let Some(path) = global {
            builder = builder.add_source(File::from(path).required(false));
        }

        builder = builder.add_source(
            Environment::with_prefix("YGGDRAW")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings: Self = builder
            .build()
            .map_err(config_err)?
            .try_deserialize()
            .map_err(config_err)?;
        settings.options.validate().map_err(|e| ApplicationError::Config {
            message: e.to_string(),
        })?;
        Ok(settings)
    }

    /// Settings as TOML, for display.
    pub fn to_toml(&self) -> ApplicationResult<String> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: e.to_string(),
        })
    }
}
