use super::ConformerIoError;
use super::traits::ConformerFile;
use crate::core::models::molecule::Molecule;
use std::io::Write;

/// Per-file metadata for XYZ output: a title and one energy per conformer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XyzMetadata {
    pub title: String,
    pub energies: Vec<f64>,
}

/// Multi-frame XYZ writer. Each conformer becomes one frame whose comment
/// line carries the title, the conformer id and its energy.
pub struct XyzFile;

impl ConformerFile for XyzFile {
    type Metadata = XyzMetadata;
    type Error = ConformerIoError;

    fn write_to(
        mol: &Molecule,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        super::check_energies(mol, &metadata.energies)?;

        for (id, conformer) in mol.conformers().iter().enumerate() {
            writeln!(writer, "{}", mol.num_atoms())?;
            writeln!(
                writer,
                "{} conformer={} energy={:.6}",
                metadata.title, id, metadata.energies[id]
            )?;
            for (atom, pos) in mol.atoms().iter().zip(conformer.positions()) {
                writeln!(
                    writer,
                    "{:<2} {:>14.8} {:>14.8} {:>14.8}",
                    atom.element.symbol(),
                    pos.x,
                    pos.y,
                    pos.z
                )?;
            }
        }
        Ok(())
    }
}
