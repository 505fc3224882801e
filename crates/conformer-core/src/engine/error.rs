use thiserror::Error;

use super::config::ConfigError;
use super::embedding::EmbeddingError;
use crate::core::forcefield::params::ParamLoadError;
use crate::core::forcefield::uff::ForceFieldError;
use crate::core::smiles::SmilesError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid SMILES: {0}")]
    Smiles(#[from] SmilesError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Force field setup failed: {0}")]
    ForceField(#[from] ForceFieldError),

    #[error("Failed to load force field parameters: {0}")]
    Parameters(#[from] ParamLoadError),

    #[error("Internal logic error: {0}")]
    Internal(String),
}
