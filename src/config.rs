// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Harness configuration (TOML).
//!
//! ```text
//! min_input_len = 100
//!
//! [chain]
//! chain_len = 256
//! bank_key_hex = "b71c71a6..."
//!
//! [versions]
//! min = 2
//! max = 4
//! ```
//!
//! Every field is optional; missing fields take the defaults the fuzz target uses.

use crate::les::protocol::{LPV2, LPV4};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Private key of the funded account that signs fixture and fuzzer transactions.
pub const DEFAULT_BANK_KEY_HEX: &str =
    "b71c71a67e1177ad4e901695e1b4b9ee17ae16c6668d313eac2f96dbcda3f291";

/// Inputs shorter than this are not worth generating from.
pub const DEFAULT_MIN_INPUT_LEN: usize = 100;

/// Default number of blocks after genesis.
pub const DEFAULT_CHAIN_LEN: u64 = 256;

/// Config errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config")]
    Read,
    #[error("parse config: {0}")]
    Parse(String),
    #[error("chain_len must be non-zero")]
    EmptyChain,
    #[error("bank key must be 32 bytes of hex")]
    BadKey,
    #[error("version range is empty or unsupported")]
    BadVersions,
}

/// Root config.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Minimum input length; shorter inputs are skipped.
    pub min_input_len: usize,
    /// Reference chain settings.
    pub chain: ChainConfig,
    /// Protocol versions requests are dispatched under.
    pub versions: VersionRange,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            min_input_len: DEFAULT_MIN_INPUT_LEN,
            chain: ChainConfig::default(),
            versions: VersionRange::default(),
        }
    }
}

/// Reference chain settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Blocks after genesis.
    pub chain_len: u64,
    /// Funded account key (hex, 32 bytes).
    pub bank_key_hex: String,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            chain_len: DEFAULT_CHAIN_LEN,
            bank_key_hex: DEFAULT_BANK_KEY_HEX.to_string(),
        }
    }
}

/// Inclusive protocol version range.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionRange {
    /// Lowest version.
    pub min: u64,
    /// Highest version.
    pub max: u64,
}

impl Default for VersionRange {
    fn default() -> Self {
        Self {
            min: LPV2,
            max: LPV4,
        }
    }
}

impl VersionRange {
    /// Number of versions in the range, at least 1 and saturating at `u64::MAX`.
    pub fn span(&self) -> u64 {
        self.max.saturating_sub(self.min).saturating_add(1)
    }
}

impl HarnessConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let cfg: HarnessConfig =
            toml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|_| ConfigError::Read)?;
        Self::from_toml_str(&raw)
    }

    /// Check invariants the harness relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chain.chain_len == 0 {
            return Err(ConfigError::EmptyChain);
        }
        let key = self.chain.bank_key_hex.trim();
        let key = key.strip_prefix("0x").unwrap_or(key);
        if key.len() != 64 || hex::decode(key).is_err() {
            return Err(ConfigError::BadKey);
        }
        if self.versions.min > self.versions.max
            || self.versions.min < LPV2
            || self.versions.max > LPV4
        {
            return Err(ConfigError::BadVersions);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let cfg = HarnessConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.min_input_len, 100);
        assert_eq!(cfg.chain.chain_len, 256);
        assert_eq!(cfg.versions.span(), 3);
    }

    #[test]
    fn partial_sections_merge_with_defaults() {
        let cfg = HarnessConfig::from_toml_str("[chain]\nchain_len = 16\n").unwrap();
        assert_eq!(cfg.chain.chain_len, 16);
        assert_eq!(cfg.chain.bank_key_hex, DEFAULT_BANK_KEY_HEX);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            HarnessConfig::from_toml_str("[chain]\nchain_len = 0\n"),
            Err(ConfigError::EmptyChain)
        ));
        assert!(matches!(
            HarnessConfig::from_toml_str("[chain]\nbank_key_hex = \"abcd\"\n"),
            Err(ConfigError::BadKey)
        ));
        assert!(matches!(
            HarnessConfig::from_toml_str("[versions]\nmin = 4\nmax = 2\n"),
            Err(ConfigError::BadVersions)
        ));
        assert!(matches!(
            HarnessConfig::from_toml_str("min_input_len = \"x\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn span_saturates_and_never_drops_below_one() {
        assert_eq!(VersionRange { min: 0, max: u64::MAX }.span(), u64::MAX);
        assert_eq!(VersionRange { min: 9, max: 2 }.span(), 1);
        assert_eq!(VersionRange { min: 3, max: 3 }.span(), 1);
    }
}
