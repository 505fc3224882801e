use super::ConformerIoError;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::Path;

/// One row of the energy table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyRecord {
    pub index: usize,
    pub energy: f64,
}

/// Writes an `index,energy` CSV table, one row per conformer.
pub fn write_energies<W: Write>(writer: W, energies: &[f64]) -> Result<(), ConformerIoError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for (index, &energy) in energies.iter().enumerate() {
        csv_writer.serialize(EnergyRecord { index, energy })?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_energies_path<P: AsRef<Path>>(
    path: P,
    energies: &[f64],
) -> Result<(), ConformerIoError> {
    let file = std::fs::File::create(path)?;
    write_energies(file, energies)
}

/// Reads an energy table written by [`write_energies`].
pub fn read_energies<R: Read>(reader: R) -> Result<Vec<EnergyRecord>, ConformerIoError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut records = Vec::new();
    for result in csv_reader.deserialize() {
        records.push(result?);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn writes_header_and_rows() {
        let mut buffer = Vec::new();
        write_energies(&mut buffer, &[-3.5, 0.25]).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text, "index,energy\n0,-3.5\n1,0.25\n");
    }

    #[test]
    fn table_written_to_disk_reads_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("energies.csv");
        write_energies_path(&path, &[1.0, 2.0, 4.5]).unwrap();

        let records = read_energies(std::fs::File::open(&path).unwrap()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(
            records[2],
            EnergyRecord {
                index: 2,
                energy: 4.5
            }
        );
    }

    #[test]
    fn malformed_rows_are_reported() {
        let data = "index,energy\n0,abc\n";
        let err = read_energies(data.as_bytes()).unwrap_err();
        assert!(matches!(err, ConformerIoError::Csv(_)));
    }
}
