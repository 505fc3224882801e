use mkite_conformer::engine::config::GenerationConfig;
use std::path::PathBuf;

pub struct AppConfig {
    pub smiles: String,
    pub output_path: PathBuf,
    pub energies_path: Option<PathBuf>,
    pub core_config: GenerationConfig,
}
