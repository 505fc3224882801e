use crate::error::{CliError, Result};
use mkite_conformer::core::forcefield::provider::ForceFieldKind;
use serde::Deserialize;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Generation settings as read from a TOML config file. Every key is
/// optional; unknown keys are rejected.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileConfig {
    pub force_field: Option<ForceFieldKind>,
    pub num_conformers_returned: Option<usize>,
    pub num_conformers_generated: Option<usize>,
    pub num_attempts: Option<usize>,
    pub prune_threshold: Option<f64>,
    pub cluster_rmsd_tol: Option<f64>,
    pub threads: Option<usize>,
    pub random_coords: Option<bool>,
    pub random_seed: Option<u64>,
    pub forcefield_params: Option<PathBuf>,
}

impl FileConfig {
    /// Reads a config file. A relative `forcefield-params` path is taken
    /// relative to the file's directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })?;

        if let (Some(params), Some(dir)) = (&config.forcefield_params, path.parent()) {
            if params.is_relative() {
                config.forcefield_params = Some(dir.join(params));
            }
        }
        Ok(config)
    }

    /// Applies `KEY=VALUE` overrides using the config file's key names.
    pub fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let (key, value) = kv_pair.split_once('=').ok_or_else(|| {
                CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                ))
            })?;
            let (key, value) = (key.trim(), value.trim());

            match key {
                "force-field" => self.force_field = Some(parse_value(key, value)?),
                "num-conformers-returned" => {
                    self.num_conformers_returned = Some(parse_value(key, value)?)
                }
                "num-conformers-generated" => {
                    self.num_conformers_generated = Some(parse_value(key, value)?)
                }
                "num-attempts" => self.num_attempts = Some(parse_value(key, value)?),
                "prune-threshold" => self.prune_threshold = Some(parse_value(key, value)?),
                "cluster-rmsd-tol" => self.cluster_rmsd_tol = Some(parse_value(key, value)?),
                "threads" => self.threads = Some(parse_value(key, value)?),
                "random-coords" => self.random_coords = Some(parse_value(key, value)?),
                "random-seed" => self.random_seed = Some(parse_value(key, value)?),
                "forcefield-params" => self.forcefield_params = Some(PathBuf::from(value)),
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

fn parse_value<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .parse()
        .map_err(|e| CliError::Config(format!("Invalid value for {}: '{}' ({})", key, value, e)))
}
