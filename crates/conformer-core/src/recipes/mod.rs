//! Recipe registration for the `mkite` workflow host.
//!
//! The package advertises a single entry point: key
//! [`CONFORMER_GENERATION`] in namespace [`NAMESPACE`]. A host resolves it
//! through [`registry::RecipeRegistry`] and drives the returned [`Recipe`]
//! with a [`job::JobInfo`] document.

pub mod conformer;
pub mod error;
pub mod job;
pub mod registry;

use crate::engine::progress::ProgressReporter;
use error::RecipeError;
use job::{JobInfo, JobResults};
use serde::Serialize;

/// Entry-point namespace the host scans for recipes.
pub const NAMESPACE: &str = "mkite.recipes";

pub const CONFORMER_GENERATION: &str = "conformer.generation";

/// Import target advertised for [`CONFORMER_GENERATION`].
pub const CONFORMER_GENERATION_TARGET: &str =
    "mkite_conformer.recipes.rdkit:ConformerGenerationRecipe";

/// A namespaced key mapped to an implementation target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct EntryPoint {
    pub namespace: &'static str,
    pub key: &'static str,
    pub target: &'static str,
}

static ENTRY_POINTS: [EntryPoint; 1] = [EntryPoint {
    namespace: NAMESPACE,
    key: CONFORMER_GENERATION,
    target: CONFORMER_GENERATION_TARGET,
}];

/// Every entry point this package declares.
pub fn entry_points() -> &'static [EntryPoint] {
    &ENTRY_POINTS
}

/// A unit of work the host can schedule.
pub trait Recipe: Send + Sync {
    /// The entry-point key this recipe is registered under.
    fn name(&self) -> &'static str;

    fn run_with_progress(
        &self,
        info: &JobInfo,
        reporter: &ProgressReporter,
    ) -> Result<JobResults, RecipeError>;

    fn run(&self, info: &JobInfo) -> Result<JobResults, RecipeError> {
        self.run_with_progress(info, &ProgressReporter::new())
    }
}
