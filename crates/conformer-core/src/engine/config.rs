use crate::core::forcefield::provider::ForceFieldKind;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Invalid value for '{parameter}': {reason}")]
    Invalid {
        parameter: &'static str,
        reason: String,
    },
}

pub const DEFAULT_NUM_CONFORMERS_RETURNED: usize = 20;
pub const DEFAULT_NUM_CONFORMERS_GENERATED: usize = 200;
pub const DEFAULT_NUM_ATTEMPTS: usize = 5;
pub const DEFAULT_PRUNE_THRESHOLD: f64 = 0.1;
pub const DEFAULT_CLUSTER_RMSD_TOL: f64 = 2.0;
pub const DEFAULT_THREADS: usize = 1;

/// Parameters of one conformer generation run.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    /// Requested force field; MMFF94 falls back to UFF.
    pub force_field: ForceFieldKind,
    /// Upper bound on the number of conformers in the result.
    pub num_conformers_returned: usize,
    /// Number of conformers to embed before pruning.
    pub num_conformers_generated: usize,
    /// Embedding attempts per conformer.
    pub num_attempts: usize,
    /// Heavy-atom RMSD below which embedded conformers count as duplicates.
    pub prune_threshold: f64,
    /// Distance threshold for Butina clustering.
    pub cluster_rmsd_tol: f64,
    /// Worker threads; `0` uses every available core.
    pub threads: usize,
    /// Start embedding from random coordinates instead of eigenvectors.
    pub random_coords: bool,
    /// Seed for the embedding RNG. A random seed is drawn when unset.
    pub random_seed: Option<u64>,
    /// TOML file overriding or extending the built-in UFF parameters.
    pub forcefield_params: Option<PathBuf>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            force_field: ForceFieldKind::Mmff94,
            num_conformers_returned: DEFAULT_NUM_CONFORMERS_RETURNED,
            num_conformers_generated: DEFAULT_NUM_CONFORMERS_GENERATED,
            num_attempts: DEFAULT_NUM_ATTEMPTS,
            prune_threshold: DEFAULT_PRUNE_THRESHOLD,
            cluster_rmsd_tol: DEFAULT_CLUSTER_RMSD_TOL,
            threads: DEFAULT_THREADS,
            random_coords: false,
            random_seed: None,
            forcefield_params: None,
        }
    }
}

#[derive(Default)]
pub struct GenerationConfigBuilder {
    force_field: Option<ForceFieldKind>,
    num_conformers_returned: Option<usize>,
    num_conformers_generated: Option<usize>,
    num_attempts: Option<usize>,
    prune_threshold: Option<f64>,
    cluster_rmsd_tol: Option<f64>,
    threads: Option<usize>,
    random_coords: Option<bool>,
    random_seed: Option<u64>,
    forcefield_params: Option<PathBuf>,
}

impl GenerationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn force_field(mut self, kind: ForceFieldKind) -> Self {
        self.force_field = Some(kind);
        self
    }
    pub fn num_conformers_returned(mut self, n: usize) -> Self {
        self.num_conformers_returned = Some(n);
        self
    }
    pub fn num_conformers_generated(mut self, n: usize) -> Self {
        self.num_conformers_generated = Some(n);
        self
    }
    pub fn num_attempts(mut self, n: usize) -> Self {
        self.num_attempts = Some(n);
        self
    }
    pub fn prune_threshold(mut self, threshold: f64) -> Self {
        self.prune_threshold = Some(threshold);
        self
    }
    pub fn cluster_rmsd_tol(mut self, tol: f64) -> Self {
        self.cluster_rmsd_tol = Some(tol);
        self
    }
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }
    pub fn random_coords(mut self, enabled: bool) -> Self {
        self.random_coords = Some(enabled);
        self
    }
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }
    pub fn forcefield_params(mut self, path: PathBuf) -> Self {
        self.forcefield_params = Some(path);
        self
    }

    /// Fills unset values with the defaults and validates the result.
    pub fn build(self) -> Result<GenerationConfig, ConfigError> {
        let defaults = GenerationConfig::default();
        let config = GenerationConfig {
            force_field: self.force_field.unwrap_or(defaults.force_field),
            num_conformers_returned: self
                .num_conformers_returned
                .unwrap_or(defaults.num_conformers_returned),
            num_conformers_generated: self
                .num_conformers_generated
                .unwrap_or(defaults.num_conformers_generated),
            num_attempts: self.num_attempts.unwrap_or(defaults.num_attempts),
            prune_threshold: self.prune_threshold.unwrap_or(defaults.prune_threshold),
            cluster_rmsd_tol: self.cluster_rmsd_tol.unwrap_or(defaults.cluster_rmsd_tol),
            threads: self.threads.unwrap_or(defaults.threads),
            random_coords: self.random_coords.unwrap_or(defaults.random_coords),
            random_seed: self.random_seed,
            forcefield_params: self.forcefield_params,
        };
        config.validate()?;
        Ok(config)
    }
}

fn positive(parameter: &'static str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Invalid {
            parameter,
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(())
}

fn non_negative(parameter: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::Invalid {
            parameter,
            reason: format!("must be a finite, non-negative number (got {value})"),
        });
    }
    Ok(())
}

impl GenerationConfig {
    pub fn builder() -> GenerationConfigBuilder {
        GenerationConfigBuilder::new()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("num_conformers_returned", self.num_conformers_returned)?;
        positive("num_conformers_generated", self.num_conformers_generated)?;
        positive("num_attempts", self.num_attempts)?;
        non_negative("prune_threshold", self.prune_threshold)?;
        non_negative("cluster_rmsd_tol", self.cluster_rmsd_tol)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_the_recipe_options() {
        let config = GenerationConfig::default();
        assert_eq!(config.force_field, ForceFieldKind::Mmff94);
        assert_eq!(config.num_conformers_returned, 20);
        assert_eq!(config.num_conformers_generated, 200);
        assert_eq!(config.num_attempts, 5);
        assert_eq!(config.prune_threshold, 0.1);
        assert_eq!(config.cluster_rmsd_tol, 2.0);
        assert_eq!(config.threads, 1);
        assert!(!config.random_coords);
        assert_eq!(config.random_seed, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_overrides_only_given_values() {
        let config = GenerationConfig::builder()
            .force_field(ForceFieldKind::Uff)
            .num_conformers_generated(50)
            .random_seed(42)
            .threads(4)
            .build()
            .unwrap();
        assert_eq!(config.force_field, ForceFieldKind::Uff);
        assert_eq!(config.num_conformers_generated, 50);
        assert_eq!(config.random_seed, Some(42));
        assert_eq!(config.threads, 4);
        assert_eq!(config.num_conformers_returned, 20);
    }

    #[test]
    fn builder_rejects_invalid_values() {
        let err = GenerationConfig::builder()
            .num_conformers_returned(0)
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                parameter: "num_conformers_returned",
                reason: "must be at least 1".to_string(),
            }
        );

        let err = GenerationConfig::builder()
            .prune_threshold(-0.5)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                parameter: "prune_threshold",
                ..
            }
        ));

        assert!(
            GenerationConfig::builder()
                .cluster_rmsd_tol(f64::NAN)
                .build()
                .is_err()
        );
    }

    #[test]
    fn zero_threads_is_allowed() {
        let config = GenerationConfig::builder().threads(0).build().unwrap();
        assert_eq!(config.threads, 0);
    }
}
