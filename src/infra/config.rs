//! Configuration management infrastructure.
//!
//! The verification policy (fallback signature algorithm, parent CA flag,
//! timestamp precision, two-digit year base) lives in an optional TOML or
//! JSON file read by [`ConfigManager`].

use crate::domain::constants::DEFAULT_SIGNATURE_ALGORITHM;
use crate::domain::crypto::SignatureAlgorithm;
use crate::infra::error::{VerifyError, VerifyResult};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Verification policy shared by certificates and preservation records
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Algorithm used when a caller does not name one
    pub signature_algorithm: String,

    /// Require the BasicConstraints CA flag on parents supplied as PEM
    pub require_parent_ca_flag: bool,

    /// Compare timestamps at whole-second precision
    pub timestamp_precision_seconds: bool,

    /// Century added to two-digit years
    pub year_base: i32,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            signature_algorithm: DEFAULT_SIGNATURE_ALGORITHM.to_string(),
            require_parent_ca_flag: true,
            timestamp_precision_seconds: true,
            year_base: 2000,
        }
    }
}

impl VerifierConfig {
    /// Parsed form of `signature_algorithm`.
    pub fn algorithm(&self) -> VerifyResult<SignatureAlgorithm> {
        self.signature_algorithm.parse()
    }

    /// Validate configuration values
    pub fn validate(&self) -> VerifyResult<()> {
        self.algorithm().map_err(|_| {
            VerifyError::ConfigurationError(format!(
                "Invalid signature algorithm: {}",
                self.signature_algorithm
            ))
        })?;

        if self.year_base % 100 != 0 || self.year_base < 1900 {
            return Err(VerifyError::ConfigurationError(format!(
                "Year base must be a century of 1900 or later, got {}",
                self.year_base
            )));
        }

        Ok(())
    }
}

/// Encodings a policy file may use, picked from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// `.json` files are JSON; anything else is read as TOML.
    #[must_use]
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ConfigFormat::Json,
            _ => ConfigFormat::Toml,
        }
    }

    /// Parse and validate a policy document.
    pub fn parse(self, content: &str) -> VerifyResult<VerifierConfig> {
        let config: VerifierConfig = match self {
            ConfigFormat::Toml => toml::from_str(content).map_err(|e| {
                VerifyError::ConfigurationError(format!("invalid TOML policy: {e}"))
            })?,
            ConfigFormat::Json => serde_json::from_str(content).map_err(|e| {
                VerifyError::ConfigurationError(format!("invalid JSON policy: {e}"))
            })?,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Locates and reads the verification policy file.
pub struct ConfigManager {
    config_path: PathBuf,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    /// Manager for the policy file under the platform config directory.
    #[must_use]
    pub fn new() -> Self {
        Self::with_path(Self::default_config_path())
    }

    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            config_path: path.as_ref().to_path_buf(),
        }
    }

    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir().map_or_else(
            || PathBuf::from("nom151-verify.toml"),
            |dir| dir.join("nom151-verify").join("config.toml"),
        )
    }

    #[must_use]
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Read the policy; a missing file yields the default policy.
    pub fn load(&self) -> VerifyResult<VerifierConfig> {
        if !self.config_path.exists() {
            log::debug!(
                "No policy file at {}, using defaults",
                self.config_path.display()
            );
            return Ok(VerifierConfig::default());
        }

        log::info!("Loading verification policy from {}", self.config_path.display());
        let content = fs::read_to_string(&self.config_path).map_err(|e| {
            VerifyError::ConfigurationError(format!(
                "Failed to read policy file {}: {e}",
                self.config_path.display()
            ))
        })?;
        ConfigFormat::for_path(&self.config_path).parse(&content)
    }
}
