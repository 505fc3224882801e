use crate::engine::error::EngineError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("No recipes are registered under namespace '{0}'")]
    UnknownNamespace(String),

    #[error("Recipe '{key}' is not registered under namespace '{namespace}'")]
    UnknownRecipe { namespace: String, key: String },

    #[error("Invalid job input: {0}")]
    Input(String),

    #[error("Invalid recipe options: {0}")]
    Options(String),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Failed to (de)serialize job data: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
