use super::file::FileConfig;
use super::models::AppConfig;
use crate::cli::GenerateArgs;
use crate::error::{CliError, Result};
use mkite_conformer::core::forcefield::provider::ForceFieldKind;
use mkite_conformer::engine::config::GenerationConfig;

/// Merges CLI flags, `--set` overrides, the config file and the defaults into
/// a validated generation config. `threads` is the global `-j` flag.
pub fn build_config(args: &GenerateArgs, threads: Option<usize>) -> Result<AppConfig> {
    let mut file_config = match &args.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };
    file_config.apply_set_values(&args.set_values)?;

    let force_field = args
        .force_field
        .as_deref()
        .map(str::parse::<ForceFieldKind>)
        .transpose()
        .map_err(|e| CliError::Argument(e.to_string()))?
        .or(file_config.force_field);

    let mut builder = GenerationConfig::builder();
    if let Some(kind) = force_field {
        builder = builder.force_field(kind);
    }
    if let Some(n) = args
        .num_conformers_returned
        .or(file_config.num_conformers_returned)
    {
        builder = builder.num_conformers_returned(n);
    }
    if let Some(n) = args
        .num_conformers_generated
        .or(file_config.num_conformers_generated)
    {
        builder = builder.num_conformers_generated(n);
    }
    if let Some(n) = args.num_attempts.or(file_config.num_attempts) {
        builder = builder.num_attempts(n);
    }
    if let Some(threshold) = args.prune_threshold.or(file_config.prune_threshold) {
        builder = builder.prune_threshold(threshold);
    }
    if let Some(tol) = args.cluster_rmsd_tol.or(file_config.cluster_rmsd_tol) {
        builder = builder.cluster_rmsd_tol(tol);
    }
    if let Some(n) = threads.or(file_config.threads) {
        builder = builder.threads(n);
    }
    if args.random_coords {
        builder = builder.random_coords(true);
    } else if let Some(enabled) = file_config.random_coords {
        builder = builder.random_coords(enabled);
    }
    if let Some(seed) = args.seed.or(file_config.random_seed) {
        builder = builder.random_seed(seed);
    }
    if let Some(path) = args
        .forcefield_params
        .clone()
        .or(file_config.forcefield_params)
    {
        builder = builder.forcefield_params(path);
    }

    let core_config = builder
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    Ok(AppConfig {
        smiles: args.smiles.clone(),
        output_path: args.output.clone(),
        energies_path: args.energies.clone(),
        core_config,
    })
}
