use super::ConformerIoError;
use super::traits::ConformerFile;
use crate::core::models::molecule::Molecule;
use crate::core::models::topology::BondOrder;
use std::io::Write;

/// Per-file metadata for SDF output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SdfMetadata {
    /// Written on the header line of every record.
    pub title: String,
    /// One energy per conformer, stored in the `<ENERGY>` data field.
    pub energies: Vec<f64>,
    /// Name of the force field, stored in the `<FORCE_FIELD>` data field when set.
    pub force_field: Option<String>,
}

/// SDF writer producing one V2000 record per conformer.
pub struct SdfFile;

const PROGRAM_LINE: &str = "  mkite-conformer    3D";

fn charge_code(charge: i8) -> u8 {
    match charge {
        3 => 1,
        2 => 2,
        1 => 3,
        -1 => 5,
        -2 => 6,
        -3 => 7,
        _ => 0,
    }
}

fn bond_code(order: BondOrder) -> u8 {
    match order {
        BondOrder::Single => 1,
        BondOrder::Double => 2,
        BondOrder::Triple => 3,
        BondOrder::Aromatic => 4,
    }
}

fn write_charge_lines(mol: &Molecule, writer: &mut impl Write) -> std::io::Result<()> {
    let charged: Vec<(usize, i8)> = mol
        .atoms()
        .iter()
        .enumerate()
        .filter(|(_, atom)| atom.formal_charge != 0)
        .map(|(idx, atom)| (idx + 1, atom.formal_charge))
        .collect();
    // The property block allows at most eight entries per line.
    for chunk in charged.chunks(8) {
        write!(writer, "M  CHG{:>3}", chunk.len())?;
        for (serial, charge) in chunk {
            write!(writer, " {:>3} {:>3}", serial, charge)?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

impl ConformerFile for SdfFile {
    type Metadata = SdfMetadata;
    type Error = ConformerIoError;

    fn write_to(
        mol: &Molecule,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        super::check_energies(mol, &metadata.energies)?;
        if mol.num_atoms() > 999 || mol.num_bonds() > 999 {
            return Err(ConformerIoError::TooLarge {
                atoms: mol.num_atoms(),
                bonds: mol.num_bonds(),
            });
        }

        for (id, conformer) in mol.conformers().iter().enumerate() {
            writeln!(writer, "{}", metadata.title)?;
            writeln!(writer, "{}", PROGRAM_LINE)?;
            writeln!(writer)?;
            writeln!(
                writer,
                "{:>3}{:>3}  0  0  0  0  0  0  0  0999 V2000",
                mol.num_atoms(),
                mol.num_bonds()
            )?;
            for (atom, pos) in mol.atoms().iter().zip(conformer.positions()) {
                writeln!(
                    writer,
                    "{:>10.4}{:>10.4}{:>10.4} {:<3} 0{:>3}  0  0  0  0  0  0  0  0  0  0",
                    pos.x,
                    pos.y,
                    pos.z,
                    atom.element.symbol(),
                    charge_code(atom.formal_charge)
                )?;
            }
            for bond in mol.bonds() {
                writeln!(
                    writer,
                    "{:>3}{:>3}{:>3}  0",
                    bond.atom1 + 1,
                    bond.atom2 + 1,
                    bond_code(bond.order)
                )?;
            }
            write_charge_lines(mol, writer)?;
            writeln!(writer, "M  END")?;

            writeln!(writer, ">  <ENERGY>")?;
            writeln!(writer, "{:.6}", metadata.energies[id])?;
            writeln!(writer)?;
            writeln!(writer, ">  <CONFORMER_ID>")?;
            writeln!(writer, "{}", id)?;
            writeln!(writer)?;
            if let Some(ff) = &metadata.force_field {
                writeln!(writer, ">  <FORCE_FIELD>")?;
                writeln!(writer, "{}", ff)?;
                writeln!(writer)?;
            }
            writeln!(writer, "$$$$")?;
        }
        Ok(())
    }
}
