use crate::cli::GenerateArgs;
use crate::config::builder::build_config;
use crate::error::{CliError, Result};
use crate::ui::{CliProgressHandler, UiEvent};
use mkite_conformer::{
    core::io::{OutputFormat, energies::write_energies_path, write_conformers},
    engine::progress::ProgressReporter,
    workflows::generate::ConformerGenerator,
};
use tokio::sync::mpsc;
use tracing::{info, warn};

pub async fn run(
    args: GenerateArgs,
    threads: Option<usize>,
    ui_sender: mpsc::Sender<UiEvent>,
) -> Result<()> {
    info!("Merging configuration from file and CLI arguments...");
    let app = build_config(&args, threads)?;

    // Reject an unsupported output extension before doing any work.
    OutputFormat::from_path(&app.output_path).map_err(|e| CliError::Argument(e.to_string()))?;

    let generator = ConformerGenerator::new(&app.smiles, app.core_config)?;
    info!(
        "Canonical SMILES: {} ({} atoms with hydrogens)",
        generator.smiles(),
        generator.molecule().num_atoms()
    );

    let progress_handler = CliProgressHandler::new(ui_sender);
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Generating conformers for {} (seed {})...",
        generator.smiles(),
        generator.seed()
    );
    let result = tokio::task::block_in_place(|| generator.run(&reporter))?;

    let count = result.energies.len();
    if count == 0 {
        warn!("Workflow completed but returned no conformers.");
        println!("Warning: no conformers were produced.");
        return Ok(());
    }

    let force_field = result.force_field.to_string();
    let format = write_conformers(
        &app.output_path,
        &result.molecule,
        &result.smiles,
        &result.energies,
        Some(&force_field),
    )
    .map_err(|e| CliError::FileParsing {
        path: app.output_path.clone(),
        source: e.into(),
    })?;
    info!("Wrote {} conformer(s) as {:?} to {:?}", count, format, &app.output_path);

    if let Some(path) = &app.energies_path {
        write_energies_path(path, &result.energies).map_err(|e| CliError::FileParsing {
            path: path.clone(),
            source: e.into(),
        })?;
        info!("Wrote energy table to {:?}", path);
    }

    println!(
        "✓ {} conformer(s) from {} cluster(s) written to: {}",
        count,
        result.num_clusters,
        app.output_path.display()
    );
    println!(
        "  Lowest energy: {:.4} kcal/mol ({})",
        result.energies[0], force_field
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn small_args(output: std::path::PathBuf) -> GenerateArgs {
        GenerateArgs {
            smiles: "OCC".to_string(),
            output,
            num_conformers_generated: Some(8),
            num_conformers_returned: Some(3),
            cluster_rmsd_tol: Some(0.5),
            seed: Some(3),
            ..Default::default()
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn writes_xyz_and_energy_table() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("ethanol.xyz");
        let energies = dir.path().join("energies.csv");
        let mut args = small_args(output.clone());
        args.energies = Some(energies.clone());

        let (sender, _receiver) = mpsc::channel(4096);
        run(args, Some(1), sender).await.unwrap();

        let xyz = fs::read_to_string(&output).unwrap();
        let frames = xyz.lines().filter(|l| l.trim() == "9").count();
        assert!((1..=3).contains(&frames));
        assert!(xyz.contains("CCO conformer=0"));

        let table = fs::read_to_string(&energies).unwrap();
        assert!(table.starts_with("index,energy\n"));
        assert_eq!(table.lines().count(), frames + 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unsupported_extension_is_rejected_up_front() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("ethanol.pdb");
        let (sender, _receiver) = mpsc::channel(16);

        let err = run(small_args(output.clone()), None, sender).await.unwrap_err();
        assert!(matches!(err, CliError::Argument(_)));
        assert!(!output.exists());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn invalid_smiles_is_an_engine_error() {
        let dir = tempdir().unwrap();
        let mut args = small_args(dir.path().join("out.sdf"));
        args.smiles = "C1CC".to_string();
        let (sender, _receiver) = mpsc::channel(16);

        let err = run(args, None, sender).await.unwrap_err();
        assert!(matches!(err, CliError::Engine(_)));
    }
}
