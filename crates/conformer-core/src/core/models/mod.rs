//! # Core Models Module
//!
//! This module contains the data structures used to represent small molecules and
//! their conformers in mkite-conformer.
//!
//! ## Overview
//!
//! A [`molecule::Molecule`] is a plain molecular graph: atoms and bonds addressed by
//! insertion index, plus an ordered list of [`conformer::Conformer`] geometries. The
//! graph is what SMILES parsing produces and what the force field and the embedder
//! consume; conformers are what the generation pipeline produces.
//!
//! ## Key Components
//!
//! - [`element`] - Supported elements with radii and default valences
//! - [`atom`] - Atom representation with charge, aromaticity, hydrogens and hybridization
//! - [`topology`] - Bonds and bond orders
//! - [`molecule`] - The molecular graph and its conformers
//! - [`conformer`] - A single 3D geometry
//!
//! ## Usage
//!
//! ```ignore
//! use mkite_conformer::core::models::{atom::Atom, element::Element, molecule::Molecule};
//! use mkite_conformer::core::models::topology::BondOrder;
//!
//! let mut mol = Molecule::new();
//! let c = mol.add_atom(Atom::new(Element::C));
//! let o = mol.add_atom(Atom::new(Element::O));
//! mol.add_bond(c, o, BondOrder::Double)?;
//! ```

pub mod atom;
pub mod conformer;
pub mod element;
pub mod molecule;
pub mod topology;
