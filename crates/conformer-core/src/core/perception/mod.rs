//! # Chemical Perception Module
//!
//! Derives the chemistry a bare molecular graph does not state explicitly:
//! implicit hydrogen counts, ring membership, hybridization and which
//! stereo marks describe real stereo elements.
//!
//! ## Overview
//!
//! [`sanitize`] runs every perception step in the order they depend on each
//! other and is called by the SMILES parser on every molecule it returns.
//! The individual steps are public so callers building molecules by hand can
//! run only what they need.
//!
//! ## Key Components
//!
//! - [`valence`] - Implicit hydrogens from default valences
//! - [`rings`] - Smallest ring sizes per atom and bond
//! - [`hybridization`] - sp/sp2/sp3 perception
//! - [`hydrogens`] - Conversion of hydrogen counts into explicit atoms
//! - [`symmetry`] - Graph symmetry classes
//! - [`stereo`] - Validation of chirality tags and cis/trans double bonds

pub mod hybridization;
pub mod hydrogens;
pub mod rings;
pub mod stereo;
pub mod symmetry;
pub mod valence;

use crate::core::models::molecule::Molecule;
use crate::core::models::topology::BondOrder;
use rings::RingInfo;
use thiserror::Error;
use tracing::trace;
use valence::ValenceError;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SanitizeError {
    #[error(transparent)]
    Valence(#[from] ValenceError),
    #[error("Non-ring atom {0} marked aromatic")]
    AromaticOutsideRing(usize),
    #[error("Aromatic bond {0} joins a non-aromatic atom")]
    AromaticBondMismatch(usize),
}

/// Assigns implicit hydrogens and hybridization, checks that aromatic flags
/// are consistent with ring membership and drops stereo marks that do not
/// describe a stereo element.
pub fn sanitize(mol: &mut Molecule) -> Result<RingInfo, SanitizeError> {
    valence::assign_implicit_hydrogens(mol)?;

    let rings = RingInfo::perceive(mol);
    for (idx, atom) in mol.atoms().iter().enumerate() {
        if atom.is_aromatic && !rings.is_ring_atom(idx) {
            return Err(SanitizeError::AromaticOutsideRing(idx));
        }
    }
    for (idx, bond) in mol.bonds().iter().enumerate() {
        if bond.order == BondOrder::Aromatic
            && !(mol.atoms()[bond.atom1].is_aromatic && mol.atoms()[bond.atom2].is_aromatic)
        {
            return Err(SanitizeError::AromaticBondMismatch(idx));
        }
    }

    hybridization::assign_hybridization(mol);
    stereo::perceive_stereo(mol, &rings);
    trace!(
        atoms = mol.num_atoms(),
        ring_bonds = rings.num_ring_bonds(),
        "Sanitized molecule"
    );
    Ok(rings)
}
