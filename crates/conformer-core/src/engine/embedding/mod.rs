//! Distance-geometry embedding of 3D coordinates from a molecular graph.
//!
//! [`bounds`] turns the graph into a smoothed matrix of lower and upper pair
//! distances; [`embed`] samples a distance matrix inside those bounds, projects
//! it to three dimensions and refines the result against the bounds.
//! [`stereo`] holds the chiral volumes and double-bond configurations an
//! embedding must reproduce.
//!
//! This is plain distance geometry: no experimental torsion preferences or
//! ring templates bias the sampled geometries.

pub mod bounds;
pub mod embed;
pub mod stereo;

use crate::core::forcefield::uff::ForceFieldError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum EmbeddingError {
    #[error("Distance bounds between atoms {i} and {j} are inconsistent")]
    InconsistentBounds { i: usize, j: usize },
    #[error("No geometric parameters for the molecule: {0}")]
    Parameters(#[from] ForceFieldError),
    #[error("Failed to embed any conformer after {attempts} attempt(s) per conformer")]
    NoConformers { attempts: usize },
    #[error("Molecule has no atoms")]
    EmptyMolecule,
}
