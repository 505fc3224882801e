//! Writers for generated conformer ensembles.
//!
//! Every writer implements [`traits::ConformerFile`] and emits all conformers of
//! a molecule in conformer id order. [`OutputFormat`] picks a writer from a file
//! extension, and [`energies`] writes the per-conformer energy table as CSV.

pub mod energies;
pub mod sdf;
pub mod traits;
pub mod xyz;

use crate::core::models::molecule::Molecule;
use std::path::Path;
use thiserror::Error;
use traits::ConformerFile;

#[derive(Debug, Error)]
pub enum ConformerIoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Expected {expected} energies (one per conformer), found {found}")]
    EnergyCount { expected: usize, found: usize },
    #[error("Molecule with {atoms} atoms and {bonds} bonds exceeds the V2000 limit of 999")]
    TooLarge { atoms: usize, bonds: usize },
    #[error("Cannot infer an output format from '{0}' (expected .sdf, .mol or .xyz)")]
    UnknownFormat(String),
}

pub(crate) fn check_energies(mol: &Molecule, energies: &[f64]) -> Result<(), ConformerIoError> {
    if energies.len() != mol.num_conformers() {
        return Err(ConformerIoError::EnergyCount {
            expected: mol.num_conformers(),
            found: energies.len(),
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Sdf,
    Xyz,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Result<Self, ConformerIoError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("sdf") | Some("mol") => Ok(Self::Sdf),
            Some("xyz") => Ok(Self::Xyz),
            _ => Err(ConformerIoError::UnknownFormat(
                path.display().to_string(),
            )),
        }
    }
}

/// Writes every conformer of `mol` to `path`, choosing the format from the
/// file extension.
pub fn write_conformers(
    path: &Path,
    mol: &Molecule,
    title: &str,
    energies: &[f64],
    force_field: Option<&str>,
) -> Result<OutputFormat, ConformerIoError> {
    let format = OutputFormat::from_path(path)?;
    match format {
        OutputFormat::Sdf => sdf::SdfFile::write_to_path(
            mol,
            &sdf::SdfMetadata {
                title: title.to_string(),
                energies: energies.to_vec(),
                force_field: force_field.map(str::to_string),
            },
            path,
        )?,
        OutputFormat::Xyz => xyz::XyzFile::write_to_path(
            mol,
            &xyz::XyzMetadata {
                title: title.to_string(),
                energies: energies.to_vec(),
            },
            path,
        )?,
    }
    Ok(format)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::conformer::Conformer;
    use crate::core::models::element::Element;
    use crate::core::models::topology::BondOrder;
    use nalgebra::Point3;
    use tempfile::tempdir;

    pub(crate) fn water_with_two_conformers() -> Molecule {
        let mut mol = Molecule::new();
        let o = mol.add_atom(Atom::new(Element::O));
        let h1 = mol.add_atom(Atom::new(Element::H));
        let h2 = mol.add_atom(Atom::new(Element::H));
        mol.add_bond(o, h1, BondOrder::Single).unwrap();
        mol.add_bond(o, h2, BondOrder::Single).unwrap();
        mol.add_conformer(Conformer::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.9572, 0.0, 0.0),
            Point3::new(-0.24, 0.927, 0.0),
        ]))
        .unwrap();
        mol.add_conformer(Conformer::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.9572, 0.0),
            Point3::new(0.927, -0.24, 0.0),
        ]))
        .unwrap();
        mol
    }

    #[test]
    fn format_is_inferred_from_extension() {
        assert_eq!(
            OutputFormat::from_path(Path::new("out.SDF")).unwrap(),
            OutputFormat::Sdf
        );
        assert_eq!(
            OutputFormat::from_path(Path::new("a/b.xyz")).unwrap(),
            OutputFormat::Xyz
        );
        assert!(matches!(
            OutputFormat::from_path(Path::new("out.pdb")),
            Err(ConformerIoError::UnknownFormat(_))
        ));
        assert!(OutputFormat::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn write_conformers_creates_the_file() {
        let dir = tempdir().unwrap();
        let mol = water_with_two_conformers();
        let path = dir.path().join("water.sdf");
        let format = write_conformers(&path, &mol, "O", &[0.0, 1.0], Some("uff")).unwrap();
        assert_eq!(format, OutputFormat::Sdf);
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches("$$$$").count(), 2);
    }
}
