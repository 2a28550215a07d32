//! Codec configuration
//!
//! Loaded from YAML. Every field has a default, so an empty file (or no file
//! at all) yields `CodecConfig::default()`:
//!
//! ```yaml
//! max_depth: 512
//! malformed_nodes: lenient   # or strict
//! legacy_forms: true
//! ```

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Environment variable naming a YAML config file
pub const CONFIG_ENV: &str = "LINO_CODEC_CONFIG";

/// What decode does with a scalar node that lacks its payload child
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedPolicy {
    /// Substitute `false`, `0`, `0.0` or `""` and log a warning
    #[default]
    Lenient,
    /// Fail the decode with `CodecError::MalformedNode`
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CodecConfig {
    /// Deepest nesting accepted by encode, decode and the tree parser
    pub max_depth: usize,

    pub malformed_nodes: MalformedPolicy,

    /// Accept older encodings on decode: `None`/`list`/`dict` kind aliases,
    /// `True`/`False` bool text, `(list obj_N ...)` self labels, untagged
    /// containers and raw (non-base64) `str` payloads
    pub legacy_forms: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_depth: 512,
            malformed_nodes: MalformedPolicy::Lenient,
            legacy_forms: true,
        }
    }
}

impl CodecConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        // serde_yaml reads an empty document as unit, not as an empty map
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: CodecConfig = serde_yaml::from_str(content).context("Failed to parse codec config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading codec configuration from {}", path.display());

        let content =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;

        Self::from_yaml_str(&content).with_context(|| format!("Failed to load {}", path.display()))
    }

    /// Load from the file named by `LINO_CODEC_CONFIG`, or defaults when unset
    pub fn from_env() -> Result<Self> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            bail!("max_depth must be at least 1");
        }
        Ok(())
    }

    /// Parser limit matching `max_depth`: each mapping level costs two
    /// parenthesis levels (container plus entry) and scalars add one more
    pub(crate) fn parse_options(&self) -> lino_tree::ParseOptions {
        lino_tree::ParseOptions {
            max_depth: self.max_depth.saturating_mul(2).saturating_add(2),
        }
    }
}
