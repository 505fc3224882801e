//! # mkite-conformer
//!
//! Conformer generation for the `mkite` workflow system: a SMILES string goes
//! in, a small set of low-energy, structurally diverse 3D conformers comes out.
//!
//! ## Architecture
//!
//! The library follows a layered design, each layer depending only on the
//! ones below it.
//!
//! - **[`core`]: The Foundation.** Stateless molecular models, the SMILES
//!   reader, chemical perception, the UFF force field and file writers.
//!
//! - **[`engine`]: The Logic Core.** Distance-geometry embedding, BFGS
//!   minimization and the individual pipeline tasks (embed, optimize, align,
//!   cluster, down-select), plus configuration and progress reporting.
//!
//! - **[`workflows`]: The Public API.** [`workflows::generate::ConformerGenerator`]
//!   runs the complete pipeline for one molecule.
//!
//! - **[`recipes`]: The Host Contract.** The `conformer.generation` entry
//!   point in the `mkite.recipes` namespace, and the job documents a host
//!   exchanges with it.

pub mod core;
pub mod engine;
pub mod recipes;
pub mod workflows;
