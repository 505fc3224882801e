use clap::{Args, Parser, Subcommand};
use mkite_conformer::recipes::CONFORMER_GENERATION;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "mkite developers",
    version,
    about = "mkite-conformer CLI - Generate low-energy, diverse 3D conformers from SMILES, standalone or as an mkite recipe.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of worker threads for embedding and optimization.
    /// 0 uses every available core. Overrides config files and job options.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a recipe on an mkite job description (JSON).
    Run(RunArgs),
    /// Generate conformers for a single SMILES string and write them to a file.
    Generate(GenerateArgs),
    /// List the recipes this package registers.
    Recipes,
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the job description file (jobinfo.json).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub info: PathBuf,

    /// Path for the job results file. Printed to stdout when omitted.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Recipe key to run, resolved in the `mkite.recipes` namespace.
    #[arg(short, long, default_value = CONFORMER_GENERATION, value_name = "KEY")]
    pub recipe: String,
}

/// Arguments for the `generate` subcommand.
#[derive(Args, Debug, Default)]
pub struct GenerateArgs {
    // --- Core Arguments ---
    /// SMILES string of the molecule.
    #[arg(short, long, required = true, value_name = "SMILES")]
    pub smiles: String,

    /// Output file; the format follows the extension (.sdf, .mol or .xyz).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Also write a CSV table of conformer energies to this path.
    #[arg(long, value_name = "PATH")]
    pub energies: Option<PathBuf>,

    // --- Force Field Overrides ---
    /// Force field for optimization ('mmff' or 'uff', default 'mmff').
    /// MMFF94 is not parameterized yet, so 'mmff' always falls back to UFF
    /// and the results report "uff".
    #[arg(short = 'f', long, value_name = "NAME")]
    pub force_field: Option<String>,

    /// TOML file overriding or extending the built-in UFF parameters.
    #[arg(long, value_name = "PATH")]
    pub forcefield_params: Option<PathBuf>,

    // --- Sampling Overrides ---
    /// Maximum number of conformers returned.
    #[arg(short = 'n', long, value_name = "INT")]
    pub num_conformers_returned: Option<usize>,

    /// Number of conformers embedded before pruning and clustering.
    #[arg(short = 'g', long, value_name = "INT")]
    pub num_conformers_generated: Option<usize>,

    /// Embedding attempts per conformer.
    #[arg(long, value_name = "INT")]
    pub num_attempts: Option<usize>,

    /// Heavy-atom RMSD below which embedded conformers are duplicates.
    #[arg(long, value_name = "FLOAT")]
    pub prune_threshold: Option<f64>,

    /// RMSD threshold for Butina clustering.
    #[arg(long, value_name = "FLOAT")]
    pub cluster_rmsd_tol: Option<f64>,

    /// Seed for the embedding random number generator.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Start embedding from random coordinates.
    #[arg(long)]
    pub random_coords: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S cluster-rmsd-tol=1.5
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}
