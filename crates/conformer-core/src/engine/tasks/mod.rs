//! Steps of the conformer generation pipeline.
//!
//! Each task is a function over an owned [`Molecule`](crate::core::models::molecule::Molecule)
//! or the values produced by the previous step. Tasks that work per conformer
//! run in parallel when the `parallel` feature is enabled.

pub mod align;
pub mod cluster;
pub mod downselect;
pub mod embed;
pub mod optimize;
