use crate::constants::{
    CONFIG_ENV_PREFIX, DEFAULT_DISCOVER_WORKLOAD_PATH, DEFAULT_WORKLOAD_SIZE_LIMIT,
};
use crate::digest::DigestPolicy;
use crate::errors::{AttestError, Result};
use config::{Config as RConfig, ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Attestation policy. Instances are shared read-only through [`super::ConfigStore`]
/// snapshots and are never mutated once published.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct AttestationConfig {
    /// Emit `path` and `sha256` selectors. Needs permission to read the workload binary.
    pub discover_workload_path: bool,
    /// `< 0` unlimited, `0` digesting disabled, `> 0` maximum bytes hashed.
    pub workload_size_limit: i64,
}

impl AttestationConfig {
    pub fn digest_policy(&self) -> DigestPolicy {
        DigestPolicy::from_limit(self.workload_size_limit)
    }
}

impl Default for AttestationConfig {
    fn default() -> Self {
        Self {
            discover_workload_path: DEFAULT_DISCOVER_WORKLOAD_PATH,
            workload_size_limit: DEFAULT_WORKLOAD_SIZE_LIMIT,
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load_default_config() -> Result<AttestationConfig> {
        Self::load(Self::defaults()?)
    }

    pub fn load_from_file(path: &Path) -> Result<AttestationConfig> {
        let builder = Self::defaults()?
            .add_source(File::from(path).format(FileFormat::Toml).required(true));
        Self::load(builder)
    }

    fn defaults() -> Result<ConfigBuilder<config::builder::DefaultState>> {
        Ok(RConfig::builder()
            .set_default("discover_workload_path", DEFAULT_DISCOVER_WORKLOAD_PATH)?
            .set_default("workload_size_limit", DEFAULT_WORKLOAD_SIZE_LIMIT)?)
    }

    fn load(builder: ConfigBuilder<config::builder::DefaultState>) -> Result<AttestationConfig> {
        // environment always wins over the file
        let config: AttestationConfig = builder
            .add_source(Environment::with_prefix(CONFIG_ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()
            .map_err(|err| {
                AttestError::InvalidConfiguration(format!("failed to parse config: {err}"))
            })?;

        tracing::debug!(?config, "loaded attestation config");
        Ok(config)
    }
}
