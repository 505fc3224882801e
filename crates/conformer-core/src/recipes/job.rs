//! Job description and result documents exchanged with the workflow host.
//!
//! Both are plain JSON. The host owns the `job` object and hands it back
//! untouched; a recipe only reads `options` and `inputs` and fills `nodes`.

use super::error::RecipeError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Input document of a recipe run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobInfo {
    #[serde(default)]
    pub job: Value,
    #[serde(default)]
    pub options: Map<String, Value>,
    #[serde(default)]
    pub inputs: Vec<Value>,
}

impl JobInfo {
    /// A job with a single molecule input given by its SMILES.
    pub fn for_smiles(smiles: &str) -> Self {
        let mut input = Map::new();
        input.insert("smiles".to_string(), Value::String(smiles.to_string()));
        Self {
            job: Value::Object(Map::new()),
            options: Map::new(),
            inputs: vec![Value::Object(input)],
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, RecipeError> {
        let file = File::open(path).map_err(|source| RecipeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

/// Bookkeeping the host records alongside every result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub host: String,
    /// Wall-clock duration of the run, in seconds.
    pub duration: f64,
    pub ncores: usize,
    pub pkgversion: String,
}

impl RunStats {
    pub fn new(duration: f64, ncores: usize) -> Self {
        Self {
            host: std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string()),
            duration,
            ncores,
            pkgversion: format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConformerAttributes {
    /// Optimized energy in kcal/mol.
    pub energy: f64,
    pub force_field: String,
    /// Rank of the conformer in the returned ensemble.
    pub index: usize,
}

/// One conformer in the result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConformerNode {
    pub smiles: String,
    pub species: Vec<String>,
    pub coords: Vec<[f64; 3]>,
    pub attributes: ConformerAttributes,
}

/// Output document of a recipe run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResults {
    pub job: Value,
    pub runstats: RunStats,
    pub nodes: Vec<ConformerNode>,
}

impl JobResults {
    pub fn to_path(&self, path: &Path) -> Result<(), RecipeError> {
        let io_error = |source| RecipeError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = File::create(path).map_err(io_error)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush().map_err(io_error)?;
        Ok(())
    }
}
