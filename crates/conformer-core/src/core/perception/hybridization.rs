use crate::core::models::atom::Hybridization;
use crate::core::models::element::Element;
use crate::core::models::molecule::Molecule;
use crate::core::models::topology::BondOrder;

/// Perceives and stores the hybridization of every atom.
pub fn assign_hybridization(mol: &mut Molecule) {
    let perceived: Vec<Hybridization> = (0..mol.num_atoms())
        .map(|idx| perceive(mol, idx))
        .collect();
    for (atom, hybridization) in mol.atoms_mut().iter_mut().zip(perceived) {
        atom.hybridization = hybridization;
    }
}

fn perceive(mol: &Molecule, idx: usize) -> Hybridization {
    let atom = &mol.atoms()[idx];
    if atom.element == Element::H || atom.element.is_halogen() {
        return Hybridization::S;
    }

    let (doubles, triples) = multiple_bond_counts(mol, idx);
    let total_degree = mol.total_degree(idx);

    match atom.element {
        Element::B | Element::C | Element::N | Element::O => {
            if triples > 0 || doubles > 1 {
                Hybridization::Sp
            } else if atom.is_aromatic || doubles == 1 {
                Hybridization::Sp2
            } else if atom.element == Element::B && total_degree <= 3 {
                Hybridization::Sp2
            } else if atom.element == Element::N
                && total_degree == 3
                && atom.formal_charge == 0
                && is_conjugated_to_pi_system(mol, idx)
            {
                Hybridization::Sp2
            } else {
                Hybridization::Sp3
            }
        }
        // Heavier main-group atoms use d-orbital valences for their extra
        // double bonds and stay tetrahedral (sulfones, phosphates).
        _ => {
            if atom.is_aromatic || (doubles == 1 && total_degree <= 2) {
                Hybridization::Sp2
            } else {
                Hybridization::Sp3
            }
        }
    }
}

fn multiple_bond_counts(mol: &Molecule, idx: usize) -> (usize, usize) {
    mol.neighbor_bonds(idx)
        .iter()
        .fold((0, 0), |(d, t), &(_, b)| match mol.bonds()[b].order {
            BondOrder::Double => (d + 1, t),
            BondOrder::Triple => (d, t + 1),
            _ => (d, t),
        })
}

/// Whether any neighbor of `idx` takes part in a double or aromatic bond,
/// as in amides and anilines.
fn is_conjugated_to_pi_system(mol: &Molecule, idx: usize) -> bool {
    mol.neighbors(idx).any(|n| {
        mol.atoms()[n].is_aromatic
            || mol.neighbor_bonds(n).iter().any(|&(_, b)| {
                matches!(
                    mol.bonds()[b].order,
                    BondOrder::Double | BondOrder::Aromatic
                )
            })
    })
}
