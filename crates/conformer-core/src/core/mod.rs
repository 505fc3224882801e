//! # Core Module
//!
//! This module provides the cheminformatics building blocks of mkite-conformer:
//! the molecular graph, SMILES input and output, chemical perception, the UFF
//! force field, geometry utilities and conformer writers.
//!
//! ## Overview
//!
//! Everything in `core` is stateless with respect to a generation run. Types here
//! describe a molecule and evaluate it; the [`crate::engine`] layer decides what
//! to do with them.
//!
//! - **Molecular Representation** ([`models`]) - Elements, atoms, bonds, molecules and conformers
//! - **SMILES** ([`smiles`]) - Parsing, sanitization and canonical output
//! - **Perception** ([`perception`]) - Rings, implicit hydrogens, hybridization and hydrogen addition
//! - **Energy Calculations** ([`forcefield`]) - UFF typing, parameters, energy terms and gradients
//! - **Geometry** ([`utils`]) - Kabsch superposition and RMSD
//! - **File Output** ([`io`]) - SDF, XYZ and energy table writers

pub mod forcefield;
pub mod io;
pub mod models;
pub mod perception;
pub mod smiles;
pub mod utils;
