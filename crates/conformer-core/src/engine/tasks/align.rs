use crate::core::models::molecule::Molecule;
use crate::core::utils::geometry::superpose;
use tracing::{debug, instrument};

/// Superposes every conformer onto conformer 0 using all atoms and returns
/// the RMSD of each conformer to the reference (zero for the reference).
#[instrument(skip_all, name = "align_task")]
pub fn run(mol: &mut Molecule) -> Vec<f64> {
    let Some(reference) = mol.conformers().first().map(|c| c.positions().to_vec()) else {
        return Vec::new();
    };

    let mut rmsd = Vec::with_capacity(mol.num_conformers());
    rmsd.push(0.0);
    for conformer in mol.conformers_mut().iter_mut().skip(1) {
        match superpose(conformer.positions(), &reference) {
            Some(fit) => {
                fit.apply(conformer.positions_mut());
                rmsd.push(fit.rmsd);
            }
            None => rmsd.push(0.0),
        }
    }
    debug!(conformers = rmsd.len(), "Conformers aligned onto conformer 0.");
    rmsd
}
