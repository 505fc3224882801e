//! # Workflows Module
//!
//! High-level entry points that tie the [`crate::core`] toolkit and the
//! [`crate::engine`] tasks together into complete procedures.
//!
//! - **Conformer Generation** ([`generate`]) - Canonicalize a SMILES string, add
//!   hydrogens, embed, optimize, align, cluster and down-select conformers.
//!
//! ```ignore
//! use mkite_conformer::engine::config::GenerationConfig;
//! use mkite_conformer::engine::progress::ProgressReporter;
//! use mkite_conformer::workflows::generate::ConformerGenerator;
//!
//! let generator = ConformerGenerator::new("CCO", GenerationConfig::default())?;
//! let result = generator.run(&ProgressReporter::new())?;
//! println!("{} conformers, lowest energy {:?}", result.molecule.num_conformers(), result.energies.first());
//! ```

pub mod generate;
