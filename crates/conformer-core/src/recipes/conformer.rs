use super::Recipe;
use super::error::RecipeError;
use super::job::{ConformerAttributes, ConformerNode, JobInfo, JobResults, RunStats};
use crate::core::forcefield::provider::ForceFieldKind;
use crate::engine::config::GenerationConfig;
use crate::engine::progress::ProgressReporter;
use crate::workflows::generate::{ConformerGenerator, GenerationResult};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Instant;
use tracing::{info, instrument};

/// Options a job may set for conformer generation. Anything unset keeps
/// its default.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConformerGenerationOptions {
    pub force_field: Option<ForceFieldKind>,
    pub num_conformers_returned: Option<usize>,
    pub num_conformers_generated: Option<usize>,
    pub num_attempts: Option<usize>,
    pub prune_threshold: Option<f64>,
    pub cluster_rmsd_tol: Option<f64>,
    pub threads: Option<usize>,
    pub random_coords: Option<bool>,
    pub random_seed: Option<u64>,
}

impl ConformerGenerationOptions {
    pub fn from_map(options: &Map<String, Value>) -> Result<Self, RecipeError> {
        serde_json::from_value(Value::Object(options.clone()))
            .map_err(|e| RecipeError::Options(e.to_string()))
    }

    pub fn into_config(self) -> Result<GenerationConfig, RecipeError> {
        let mut builder = GenerationConfig::builder();
        if let Some(kind) = self.force_field {
            builder = builder.force_field(kind);
        }
        if let Some(n) = self.num_conformers_returned {
            builder = builder.num_conformers_returned(n);
        }
        if let Some(n) = self.num_conformers_generated {
            builder = builder.num_conformers_generated(n);
        }
        if let Some(n) = self.num_attempts {
            builder = builder.num_attempts(n);
        }
        if let Some(threshold) = self.prune_threshold {
            builder = builder.prune_threshold(threshold);
        }
        if let Some(tol) = self.cluster_rmsd_tol {
            builder = builder.cluster_rmsd_tol(tol);
        }
        if let Some(threads) = self.threads {
            builder = builder.threads(threads);
        }
        if let Some(enabled) = self.random_coords {
            builder = builder.random_coords(enabled);
        }
        if let Some(seed) = self.random_seed {
            builder = builder.random_seed(seed);
        }
        builder
            .build()
            .map_err(|e| RecipeError::Options(e.to_string()))
    }
}

/// Generates a conformer ensemble for the molecule given as the job's first
/// input.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConformerGenerationRecipe;

impl ConformerGenerationRecipe {
    pub fn new() -> Self {
        Self
    }

    fn input_smiles(info: &JobInfo) -> Result<&str, RecipeError> {
        let input = info
            .inputs
            .first()
            .ok_or_else(|| RecipeError::Input("job has no inputs".to_string()))?;
        input
            .get("smiles")
            .and_then(Value::as_str)
            .ok_or_else(|| RecipeError::Input("first input has no 'smiles' string".to_string()))
    }

    fn postprocess(result: &GenerationResult) -> Vec<ConformerNode> {
        let species: Vec<String> = result
            .molecule
            .species()
            .into_iter()
            .map(str::to_string)
            .collect();
        let force_field = String::from(result.force_field);

        result
            .molecule
            .conformers()
            .iter()
            .zip(&result.energies)
            .enumerate()
            .map(|(index, (conformer, &energy))| ConformerNode {
                smiles: result.smiles.clone(),
                species: species.clone(),
                coords: conformer.positions().iter().map(|p| [p.x, p.y, p.z]).collect(),
                attributes: ConformerAttributes {
                    energy,
                    force_field: force_field.clone(),
                    index,
                },
            })
            .collect()
    }
}

impl Recipe for ConformerGenerationRecipe {
    fn name(&self) -> &'static str {
        super::CONFORMER_GENERATION
    }

    #[instrument(skip_all, name = "conformer_generation_recipe")]
    fn run_with_progress(
        &self,
        info: &JobInfo,
        reporter: &ProgressReporter,
    ) -> Result<JobResults, RecipeError> {
        let start = Instant::now();
        let smiles = Self::input_smiles(info)?;
        let config = ConformerGenerationOptions::from_map(&info.options)?.into_config()?;

        let generator = ConformerGenerator::new(smiles, config)?;
        let result = generator.run(reporter)?;
        let nodes = Self::postprocess(&result);

        info!(
            smiles = %result.smiles,
            conformers = nodes.len(),
            "Recipe finished."
        );

        Ok(JobResults {
            job: info.job.clone(),
            runstats: RunStats::new(start.elapsed().as_secs_f64(), result.threads),
            nodes,
        })
    }
}
