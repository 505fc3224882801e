//! # Force Field Module
//!
//! This module provides the molecular mechanics force field used to optimize and
//! rank conformers in mkite-conformer. It implements UFF atom typing, parameter
//! management, the individual energy terms with analytic gradients, and the
//! selection logic between the requested and the available force field.
//!
//! ## Overview
//!
//! The Universal Force Field covers every element the toolkit supports, which
//! makes it the fallback for any molecule. A force field is set up once per
//! molecule and then evaluated on flat coordinate arrays, one per conformer:
//!
//! - **Bond stretching** with bond-order and electronegativity corrected rest lengths
//! - **Angle bending** in Fourier form, with linear and trigonal special cases
//! - **Torsions** chosen by the hybridization of the central bond
//! - **Inversion** terms keeping sp2 carbon and nitrogen planar
//! - **Van der Waals** interactions using a Lennard-Jones 12-6 potential
//!
//! ## Key Components
//!
//! - [`params`] - Built-in UFF parameters and TOML overrides
//! - [`typing`] - UFF atom type assignment
//! - [`contributions`] - Individual energy terms and their gradients
//! - [`uff`] - Force field setup and evaluation
//! - [`provider`] - Force field selection with MMFF94 to UFF fallback
//! - [`term`] - Energy breakdown by term type
//!
//! ## Usage
//!
//! ```ignore
//! use mkite_conformer::core::forcefield::{params::UffParameterSet, uff::ForceField};
//!
//! let ff = ForceField::uff(&molecule, &UffParameterSet::builtin())?;
//! let energy = ff.energy(&conformer.to_flat());
//! ```

pub mod contributions;
pub mod params;
pub(crate) mod potentials;
pub mod provider;
pub mod term;
pub mod typing;
pub mod uff;
