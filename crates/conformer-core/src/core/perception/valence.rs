use crate::core::models::atom::Atom;
use crate::core::models::element::Element;
use crate::core::models::molecule::Molecule;
use crate::core::models::topology::BondOrder;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValenceError {
    #[error(
        "Explicit valence {valence} for atom {atom} ({element}) is greater than the permitted maximum of {max}"
    )]
    ExceedsMaximum {
        atom: usize,
        element: Element,
        valence: u8,
        max: u8,
    },
}

/// Computes the implicit hydrogen count of every atom from its bonds, its
/// bracket hydrogens and the allowed valences of its element.
pub fn assign_implicit_hydrogens(mol: &mut Molecule) -> Result<(), ValenceError> {
    let counts = (0..mol.num_atoms())
        .map(|idx| implicit_hydrogens_for(mol, idx))
        .collect::<Result<Vec<_>, _>>()?;

    for (atom, count) in mol.atoms_mut().iter_mut().zip(counts) {
        atom.implicit_hydrogens = count;
    }
    Ok(())
}

/// Implicit hydrogen count the atom would receive given its current bonds.
pub fn implicit_hydrogens_for(mol: &Molecule, idx: usize) -> Result<u8, ValenceError> {
    let atom = &mol.atoms()[idx];
    let has_aromatic_bond = mol
        .neighbor_bonds(idx)
        .iter()
        .any(|&(_, b)| mol.bonds()[b].order == BondOrder::Aromatic);
    let bond_valence = mol.explicit_bond_valence(idx);
    default_implicit_count(idx, atom, bond_valence, has_aromatic_bond)
}

pub(crate) fn default_implicit_count(
    idx: usize,
    atom: &Atom,
    bond_valence: u8,
    has_aromatic_bond: bool,
) -> Result<u8, ValenceError> {
    let valences = atom.element.valences_with_charge(atom.formal_charge);
    let lowest = valences[0];
    let max = valences[valences.len() - 1];

    let mut total = bond_valence + atom.explicit_hydrogens;
    // One extra electron goes into the pi system when the lowest valence
    // leaves room for it (carbon and pyridine-type nitrogen, but not furan O
    // or thiophene S).
    if atom.is_aromatic && has_aromatic_bond && total < lowest {
        total += 1;
    }

    if total > max {
        return Err(ValenceError::ExceedsMaximum {
            atom: idx,
            element: atom.element,
            valence: total,
            max,
        });
    }
    if atom.no_implicit {
        return Ok(0);
    }

    let target = valences
        .iter()
        .copied()
        .find(|&v| v >= total)
        .unwrap_or(max);
    Ok(target - total)
}
