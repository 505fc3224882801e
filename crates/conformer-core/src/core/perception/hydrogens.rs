use crate::core::models::atom::{Atom, Hybridization};
use crate::core::models::element::Element;
use crate::core::models::molecule::{Molecule, MoleculeError};
use crate::core::models::topology::BondOrder;

/// Returns a copy of `mol` with every implicit and bracket hydrogen turned
/// into an explicit atom.
///
/// New hydrogens are appended after the existing atoms, grouped by parent in
/// parent index order, so heavy-atom indices are preserved. Conformers are not
/// carried over because the new atoms have no coordinates.
pub fn add_hydrogens(mol: &Molecule) -> Result<Molecule, MoleculeError> {
    let mut out = mol.without_conformers();
    for parent in 0..mol.num_atoms() {
        let count = mol.atoms()[parent].hydrogen_count();
        for _ in 0..count {
            let mut hydrogen = Atom::new(Element::H);
            hydrogen.no_implicit = true;
            hydrogen.hybridization = Hybridization::S;
            let h = out.add_atom(hydrogen);
            out.add_bond(parent, h, BondOrder::Single)?;
        }
        if let Some(atom) = out.atom_mut(parent) {
            atom.explicit_hydrogens = 0;
            atom.implicit_hydrogens = 0;
        }
    }
    Ok(out)
}

/// Number of hydrogens the molecule carries, explicit atoms and counts alike.
pub fn total_hydrogen_count(mol: &Molecule) -> usize {
    mol.atoms()
        .iter()
        .map(|a| {
            if a.is_hydrogen() {
                1
            } else {
                a.hydrogen_count() as usize
            }
        })
        .sum()
}
