use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::bencode::{DecoderOptions, DuplicateKeys};

pub const DEFAULT_CONFIG_PATH: &str = "rusbit.toml";

/// Decoder policy, loadable from a TOML file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub max_depth: usize, // 0 = unbounded
    pub strict_integers: bool,
    pub duplicate_keys: DuplicateKeys,
    pub require_sorted_keys: bool,
    pub allow_whitespace: bool,
    pub allow_trailing_data: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_options(&DecoderOptions::default())
    }
}

impl Config {
    /// Reads `path`; a missing file yields the defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let path = path.as_ref();
        if path.exists() {
            let contents = fs::read_to_string(path)?;
            let config: Config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            log::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }

    fn from_options(options: &DecoderOptions) -> Self {
        Self {
            max_depth: options.max_depth.unwrap_or(0),
            strict_integers: options.strict_integers,
            duplicate_keys: options.duplicate_keys,
            require_sorted_keys: options.require_sorted_keys,
            allow_whitespace: options.allow_whitespace,
            allow_trailing_data: options.allow_trailing_data,
        }
    }

    pub fn decoder_options(&self) -> DecoderOptions {
        DecoderOptions {
            max_depth: (self.max_depth > 0).then_some(self.max_depth),
            strict_integers: self.strict_integers,
            allow_whitespace: self.allow_whitespace,
            duplicate_keys: self.duplicate_keys,
            require_sorted_keys: self.require_sorted_keys,
            allow_trailing_data: self.allow_trailing_data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_decoder_defaults() {
        assert_eq!(Config::default().decoder_options(), DecoderOptions::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config: Config = toml::from_str("duplicate_keys = \"last_wins\"\nmax_depth = 0\n").unwrap();
        assert_eq!(config.duplicate_keys, DuplicateKeys::LastWins);
        assert!(config.strict_integers);

        let options = config.decoder_options();
        assert_eq!(options.max_depth, None);
        assert_eq!(options.duplicate_keys, DuplicateKeys::LastWins);
    }

    #[test]
    fn test_load_missing_and_present() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rusbit.toml");
        assert_eq!(Config::load(&path).unwrap(), Config::default());

        let config = Config {
            require_sorted_keys: true,
            ..Config::default()
        };
        fs::write(&path, config.to_toml().unwrap()).unwrap();
        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rusbit.toml");
        fs::write(&path, "duplicate_keys = \"sometimes\"").unwrap();
        assert!(Config::load(&path).is_err());
    }
}
