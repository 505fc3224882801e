//! # SMILES Module
//!
//! Reading and writing of SMILES line notation.
//!
//! [`parse`] accepts the organic subset, bracket atoms, branches, ring closures
//! (including `%nn` labels) and dot-separated fragments, and returns a sanitized
//! [`Molecule`](crate::core::models::molecule::Molecule). [`canonical_smiles`]
//! writes a string that does not depend on the input atom order.
//!
//! Tetrahedral chirality (`@`, `@@`) and cis/trans double bonds (`/`, `\`)
//! are read onto the graph and written back, so a canonical string names the
//! same stereoisomer as its input.

pub mod parser;
pub mod writer;

pub use parser::{parse, parse_graph};
pub use writer::canonical_smiles;

use crate::core::models::molecule::MoleculeError;
use crate::core::perception::SanitizeError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SmilesError {
    #[error("Empty SMILES string")]
    Empty,
    #[error("Unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { pos: usize, ch: char },
    #[error("Unexpected end of SMILES string")]
    UnexpectedEnd,
    #[error("Unsupported element '{symbol}' at position {pos}")]
    UnknownElement { pos: usize, symbol: String },
    #[error("Branch opened with '(' is never closed")]
    UnclosedBranch,
    #[error("Unmatched ')' at position {0}")]
    UnmatchedParen(usize),
    #[error("Ring closure {0} is never closed")]
    UnclosedRing(u16),
    #[error("Conflicting bond orders on ring closure {0}")]
    RingBondConflict(u16),
    #[error("Bond at position {0} is not followed by an atom")]
    DanglingBond(usize),
    #[error("Charge at position {pos} is outside -15..=15")]
    InvalidCharge { pos: usize },
    #[error("Isotope at position {pos} is out of range")]
    InvalidIsotope { pos: usize },
    #[error("Invalid molecular graph: {0}")]
    Graph(#[from] MoleculeError),
    #[error("Chemically invalid molecule: {0}")]
    Sanitize(#[from] SanitizeError),
}

/// Parses `smiles` and writes it back in canonical form.
pub fn canonicalize(smiles: &str) -> Result<String, SmilesError> {
    canonical_smiles(&parse(smiles)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalize_normalizes_equivalent_inputs() {
        assert_eq!(canonicalize("OCC").unwrap(), canonicalize("C(C)O").unwrap());
    }

    #[test]
    fn canonicalize_keeps_stereoisomers_apart() {
        let r = canonicalize("C[C@H](N)O").unwrap();
        let s = canonicalize("C[C@@H](N)O").unwrap();
        assert_ne!(r, s);
        assert!(r.contains('@') && s.contains('@'));
        assert_ne!(
            canonicalize("F/C=C/F").unwrap(),
            canonicalize("F/C=C\\F").unwrap()
        );
    }

    #[test]
    fn canonicalize_reports_parse_errors() {
        assert_eq!(canonicalize("C1CC").unwrap_err(), SmilesError::UnclosedRing(1));
    }
}
