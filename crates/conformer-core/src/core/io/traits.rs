use crate::core::models::molecule::Molecule;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Defines the interface for writing conformer ensembles to a file format.
///
/// Implementors write every conformer of a molecule, in conformer id order,
/// using format-specific metadata such as per-conformer energies.
pub trait ConformerFile {
    /// The type of metadata associated with the file format.
    type Metadata;

    /// The error type for I/O operations.
    type Error: Error + From<io::Error>;

    /// Writes all conformers of `mol` to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if the metadata does not match the molecule or
    /// writing fails.
    fn write_to(
        mol: &Molecule,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error>;

    /// Writes all conformers of `mol` to a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or writing fails.
    fn write_to_path<P: AsRef<Path>>(
        mol: &Molecule,
        metadata: &Self::Metadata,
        path: P,
    ) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(mol, metadata, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
