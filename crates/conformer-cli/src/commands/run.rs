use crate::cli::RunArgs;
use crate::error::Result;
use crate::ui::{CliProgressHandler, UiEvent};
use mkite_conformer::{
    engine::progress::ProgressReporter,
    recipes::{NAMESPACE, error::RecipeError, job::JobInfo, registry::RecipeRegistry},
};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::info;

pub async fn run(
    args: RunArgs,
    threads: Option<usize>,
    ui_sender: mpsc::Sender<UiEvent>,
) -> Result<()> {
    info!("Loading job description from {:?}", &args.info);
    let mut job_info = JobInfo::from_path(&args.info)?;
    if let Some(n) = threads {
        job_info
            .options
            .insert("threads".to_string(), Value::from(n as u64));
    }

    let registry = RecipeRegistry::with_builtin();
    let recipe = registry.resolve(NAMESPACE, &args.recipe)?;
    info!("Resolved recipe '{}'.", recipe.name());

    let progress_handler = CliProgressHandler::new(ui_sender);
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    let results =
        tokio::task::block_in_place(|| recipe.run_with_progress(&job_info, &reporter))?;
    info!(
        "Recipe finished in {:.2}s with {} node(s).",
        results.runstats.duration,
        results.nodes.len()
    );

    match &args.output {
        Some(path) => {
            results.to_path(path)?;
            println!(
                "✓ {} conformer(s) written to: {}",
                results.nodes.len(),
                path.display()
            );
        }
        None => {
            let json = serde_json::to_string_pretty(&results).map_err(RecipeError::from)?;
            println!("{}", json);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use mkite_conformer::recipes::job::JobResults;
    use serde_json::json;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn write_job(dir: &std::path::Path, job: Value) -> PathBuf {
        let path = dir.join("jobinfo.json");
        fs::write(&path, serde_json::to_string(&job).unwrap()).unwrap();
        path
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn runs_job_and_writes_results() {
        let dir = tempdir().unwrap();
        let info = write_job(
            dir.path(),
            json!({
                "job": { "id": 3 },
                "options": {
                    "num_conformers_generated": 6,
                    "num_conformers_returned": 2,
                    "random_seed": 21
                },
                "inputs": [{ "smiles": "CO" }]
            }),
        );
        let output = dir.path().join("jobresults.json");
        let args = RunArgs {
            info,
            output: Some(output.clone()),
            recipe: "conformer.generation".to_string(),
        };
        let (sender, _receiver) = mpsc::channel(4096);

        run(args, Some(2), sender).await.unwrap();

        let results: JobResults =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(results.job, json!({ "id": 3 }));
        assert_eq!(results.runstats.ncores, 2);
        assert!(!results.nodes.is_empty() && results.nodes.len() <= 2);
        assert!(results.nodes.iter().all(|n| n.species.len() == 6));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unknown_recipe_is_reported() {
        let dir = tempdir().unwrap();
        let info = write_job(dir.path(), json!({ "inputs": [{ "smiles": "C" }] }));
        let args = RunArgs {
            info,
            output: None,
            recipe: "conformer.sampling".to_string(),
        };
        let (sender, _receiver) = mpsc::channel(16);

        let err = run(args, None, sender).await.unwrap_err();
        assert!(matches!(
            err,
            CliError::Recipe(RecipeError::UnknownRecipe { .. })
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn missing_job_file_is_reported() {
        let args = RunArgs {
            info: PathBuf::from("/nonexistent/jobinfo.json"),
            output: None,
            recipe: "conformer.generation".to_string(),
        };
        let (sender, _receiver) = mpsc::channel(16);

        let err = run(args, None, sender).await.unwrap_err();
        assert!(matches!(err, CliError::Recipe(RecipeError::Io { .. })));
    }
}
