use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::logging::LoggingConfig;
use crate::output::OutputConfig;
use crate::run::RunConfig;
use crate::validate;

/// Resolved generator configuration (`datagen.toml`).
///
/// Every section may be omitted; the defaults reproduce the stock fixture
/// run: 20 archives of ~60 000 records each, 10 concurrent writers, a
/// 10-day timestamp window, written under `test_inputs/`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenConfig {
    pub output: OutputConfig,
    pub run: RunConfig,
    pub logging: LoggingConfig,
}

impl GenConfig {
    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.as_ref().display()))?;
        content.parse()
    }

    /// Re-run validation, e.g. after command-line overrides were applied.
    pub fn validate(&self) -> anyhow::Result<()> {
        validate::validate(self)
    }
}

impl FromStr for GenConfig {
    type Err = anyhow::Error;

    fn from_str(toml_str: &str) -> anyhow::Result<Self> {
        let config: GenConfig = toml::from_str(toml_str)?;
        validate::validate(&config)?;
        Ok(config)
    }
}
