use crate::core::models::molecule::Molecule;
use crate::core::perception::rings::RingInfo;

/// Dense ranks of `keys`, equal keys sharing a rank.
pub(crate) fn dense_ranks<K: Ord>(keys: &[K]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..keys.len()).collect();
    order.sort_by(|&a, &b| keys[a].cmp(&keys[b]));
    let mut ranks = vec![0; keys.len()];
    let mut rank = 0;
    for (pos, &idx) in order.iter().enumerate() {
        if pos > 0 && keys[idx] != keys[order[pos - 1]] {
            rank += 1;
        }
        ranks[idx] = rank;
    }
    ranks
}

pub(crate) fn class_count(ranks: &[usize]) -> usize {
    ranks.iter().max().map_or(0, |&m| m + 1)
}

/// Splits rank classes by the sorted ranks of their neighbors until stable.
pub(crate) fn refine(mol: &Molecule, mut ranks: Vec<usize>) -> Vec<usize> {
    loop {
        let keys: Vec<(usize, Vec<(usize, u8)>)> = (0..mol.num_atoms())
            .map(|i| {
                let mut neighborhood: Vec<(usize, u8)> = mol
                    .neighbor_bonds(i)
                    .iter()
                    .map(|&(n, b)| (ranks[n], mol.bonds()[b].order as u8))
                    .collect();
                neighborhood.sort_unstable();
                (ranks[i], neighborhood)
            })
            .collect();
        let next = dense_ranks(&keys);
        if class_count(&next) == class_count(&ranks) {
            return next;
        }
        ranks = next;
    }
}

/// Graph symmetry classes: atoms share a class when their element, charge,
/// hydrogens, ring membership and (iteratively) neighborhoods agree.
pub fn symmetry_classes(mol: &Molecule, rings: &RingInfo) -> Vec<usize> {
    let invariants: Vec<_> = mol
        .atoms()
        .iter()
        .enumerate()
        .map(|(i, a)| {
            (
                mol.degree(i),
                a.element.atomic_number(),
                a.is_aromatic,
                a.formal_charge,
                a.hydrogen_count(),
                a.isotope.unwrap_or(0),
                rings.is_ring_atom(i),
            )
        })
        .collect();
    refine(mol, dense_ranks(&invariants))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::smiles::parse;

    fn classes(smiles: &str) -> Vec<usize> {
        let mol = parse(smiles).unwrap();
        symmetry_classes(&mol, &RingInfo::perceive(&mol))
    }

    #[test]
    fn dense_ranks_share_ranks_for_equal_keys() {
        assert_eq!(dense_ranks(&[5, 1, 5, 3]), vec![2, 0, 2, 1]);
        assert_eq!(class_count(&[2, 0, 2, 1]), 3);
        assert_eq!(class_count(&[]), 0);
    }

    #[test]
    fn equivalent_atoms_share_a_class() {
        let c = classes("CC(C)O");
        assert_eq!(c[0], c[2]);
        assert_ne!(c[0], c[1]);
        assert_ne!(c[1], c[3]);
    }

    #[test]
    fn refinement_separates_by_neighborhood() {
        // Both methyls of butan-2-ol differ by what lies two bonds away.
        let c = classes("CC(O)CC");
        assert_ne!(c[0], c[4]);
        assert_eq!(class_count(&c), 5);
    }
}
