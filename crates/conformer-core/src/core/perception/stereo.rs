use crate::core::models::element::Element;
use crate::core::models::molecule::Molecule;
use crate::core::models::topology::BondOrder;
use crate::core::perception::rings::RingInfo;
use crate::core::perception::symmetry::symmetry_classes;
use tracing::trace;

/// Double bonds in rings smaller than this are always cis.
const MIN_STEREO_RING: usize = 8;

/// Whether `to` is an odd permutation of `from`. `None` when the two are not
/// permutations of each other or contain repeats.
pub fn permutation_parity<T: PartialEq>(from: &[T], to: &[T]) -> Option<bool> {
    if from.len() != to.len() {
        return None;
    }
    let mut perm = Vec::with_capacity(to.len());
    for item in to {
        let mut hits = from.iter().enumerate().filter(|(_, f)| *f == item);
        let (pos, _) = hits.next()?;
        if hits.next().is_some() {
            return None;
        }
        perm.push(pos);
    }

    let mut seen = vec![false; perm.len()];
    let mut odd = false;
    for start in 0..perm.len() {
        if seen[start] {
            continue;
        }
        let mut len = 0;
        let mut k = start;
        while !seen[k] {
            seen[k] = true;
            k = perm[k];
            len += 1;
        }
        if len % 2 == 0 {
            odd = !odd;
        }
    }
    Some(odd)
}

/// Ligands a chirality tag refers to, in order: graph neighbors by bond,
/// then `None` standing for the hydrogen count or the lone pair of a
/// three-coordinate center.
pub fn chiral_reference_order(mol: &Molecule, atom: usize) -> Vec<Option<usize>> {
    let mut order: Vec<Option<usize>> = mol.neighbors(atom).map(Some).collect();
    if mol.atoms()[atom].hydrogen_count() > 0 || mol.degree(atom) == 3 {
        order.push(None);
    }
    order
}

/// Clears chirality tags and double-bond configurations that do not describe
/// a stereo element of the graph.
pub fn perceive_stereo(mol: &mut Molecule, rings: &RingInfo) {
    let classes = symmetry_classes(mol, rings);

    let invalid_centers: Vec<usize> = (0..mol.num_atoms())
        .filter(|&i| mol.atoms()[i].chirality.is_specified())
        .filter(|&i| !is_stereocenter(mol, i, rings, &classes))
        .collect();
    for atom in invalid_centers {
        trace!(atom, "Ignoring chirality on a non-stereogenic atom");
        if let Some(a) = mol.atom_mut(atom) {
            a.chirality = Default::default();
        }
    }

    let invalid_bonds: Vec<usize> = (0..mol.num_bonds())
        .filter(|&b| mol.bonds()[b].stereo.is_some())
        .filter(|&b| !is_stereo_double_bond(mol, b, rings, &classes))
        .collect();
    for bond in invalid_bonds {
        trace!(bond, "Ignoring cis/trans marks on a non-stereogenic bond");
        if let Some(b) = mol.bond_mut(bond) {
            b.stereo = None;
        }
    }
}

fn attached_hydrogens(mol: &Molecule, atom: usize) -> usize {
    mol.atoms()[atom].hydrogen_count() as usize
        + mol
            .neighbors(atom)
            .filter(|&n| mol.atoms()[n].is_hydrogen())
            .count()
}

fn all_distinct(mut classes: Vec<usize>) -> bool {
    classes.sort_unstable();
    classes.windows(2).all(|w| w[0] != w[1])
}

/// A tetrahedral center with four different ligands. Ring atoms only need a
/// valid shape, since their configuration can be relative to another center.
fn is_stereocenter(mol: &Molecule, atom: usize, rings: &RingInfo, classes: &[usize]) -> bool {
    let a = &mol.atoms()[atom];
    if a.is_aromatic || attached_hydrogens(mol, atom) > 1 {
        return false;
    }
    let shape = match mol.total_degree(atom) {
        4 => true,
        3 => a.hydrogen_count() == 0 && matches!(a.element, Element::S | Element::P),
        _ => false,
    };
    shape
        && (rings.is_ring_atom(atom) || all_distinct(mol.neighbors(atom).map(|n| classes[n]).collect()))
}

fn is_stereo_double_bond(mol: &Molecule, bond: usize, rings: &RingInfo, classes: &[usize]) -> bool {
    let b = &mol.bonds()[bond];
    let Some(stereo) = b.stereo else {
        return false;
    };
    if b.order != BondOrder::Double
        || rings.bond_ring_size(bond).is_some_and(|size| size < MIN_STEREO_RING)
    {
        return false;
    }

    [(b.atom1, b.atom2, stereo.refs.0), (b.atom2, b.atom1, stereo.refs.1)]
        .into_iter()
        .all(|(end, partner, reference)| {
            let substituents: Vec<usize> = mol.neighbors(end).filter(|&n| n != partner).collect();
            let total = mol.total_degree(end);
            substituents.contains(&reference)
                && (2..=3).contains(&total)
                && attached_hydrogens(mol, end) <= 1
                && all_distinct(substituents.iter().map(|&n| classes[n]).collect())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Chirality;
    use crate::core::models::topology::StereoKind;
    use crate::core::smiles::parse;

    fn double_bond(mol: &Molecule) -> usize {
        mol.bonds()
            .iter()
            .position(|b| b.order == BondOrder::Double)
            .unwrap()
    }

    #[test]
    fn permutation_parity_counts_transpositions() {
        assert_eq!(permutation_parity(&[1, 2, 3, 4], &[1, 2, 3, 4]), Some(false));
        assert_eq!(permutation_parity(&[1, 2, 3, 4], &[2, 1, 3, 4]), Some(true));
        assert_eq!(permutation_parity(&[1, 2, 3, 4], &[2, 3, 1, 4]), Some(false));
        assert_eq!(permutation_parity(&[1, 2, 3, 4], &[4, 3, 2, 1]), Some(false));
        assert_eq!(permutation_parity(&[1, 2, 3], &[1, 2, 4]), None);
        assert_eq!(permutation_parity(&[1, 1, 3], &[1, 3, 1]), None);
    }

    #[test]
    fn reference_order_puts_the_hydrogen_last() {
        let mol = parse("C[C@H](N)O").unwrap();
        assert_eq!(
            chiral_reference_order(&mol, 1),
            vec![Some(0), Some(2), Some(3), None]
        );
    }

    #[test]
    fn asymmetric_center_keeps_its_tag() {
        let mol = parse("C[C@H](N)O").unwrap();
        assert!(mol.atoms()[1].chirality.is_specified());
    }

    #[test]
    fn symmetric_center_loses_its_tag() {
        let mol = parse("C[C@H](C)O").unwrap();
        assert_eq!(mol.atoms()[1].chirality, Chirality::Unspecified);
        let mol = parse("[C@H2](F)Cl").unwrap();
        assert_eq!(mol.atoms()[0].chirality, Chirality::Unspecified);
    }

    #[test]
    fn ring_centers_keep_relative_configuration() {
        let mol = parse("C[C@H]1CC[C@@H](C)CC1").unwrap();
        assert!(mol.atoms()[1].chirality.is_specified());
        assert!(mol.atoms()[4].chirality.is_specified());
    }

    #[test]
    fn double_bond_with_distinct_ends_keeps_its_configuration() {
        let mol = parse("F/C=C/F").unwrap();
        let stereo = mol.bonds()[double_bond(&mol)].stereo.unwrap();
        assert_eq!(stereo.kind, StereoKind::Trans);
    }

    #[test]
    fn degenerate_double_bonds_are_cleared() {
        for smiles in ["C/C(C)=C/F", "C1CCC/C=C/C1"] {
            let mol = parse(smiles).unwrap();
            assert_eq!(mol.bonds()[double_bond(&mol)].stereo, None, "{smiles}");
        }
    }

    #[test]
    fn large_ring_double_bond_keeps_its_configuration() {
        let mol = parse("C1CCCC/C=C/CCC1").unwrap();
        assert!(mol.bonds()[double_bond(&mol)].stereo.is_some());
    }
}
