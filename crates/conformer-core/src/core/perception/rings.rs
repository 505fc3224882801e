use crate::core::models::molecule::Molecule;
use std::collections::VecDeque;

/// Ring membership of atoms and bonds.
///
/// Only the size of the smallest ring through each bond and atom is kept,
/// which is all the embedder and the atom typer need.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RingInfo {
    bond_ring_size: Vec<Option<usize>>,
    atom_ring_size: Vec<Option<usize>>,
}

impl RingInfo {
    pub fn perceive(mol: &Molecule) -> Self {
        let bond_ring_size: Vec<Option<usize>> = mol
            .bonds()
            .iter()
            .enumerate()
            .map(|(idx, bond)| {
                shortest_path_len(mol, bond.atom1, bond.atom2, |_, b| b == idx, None)
                    .map(|len| len + 1)
            })
            .collect();

        let atom_ring_size = (0..mol.num_atoms())
            .map(|atom| {
                mol.neighbor_bonds(atom)
                    .iter()
                    .filter_map(|&(_, b)| bond_ring_size[b])
                    .min()
            })
            .collect();

        Self {
            bond_ring_size,
            atom_ring_size,
        }
    }

    pub fn is_ring_bond(&self, bond: usize) -> bool {
        self.bond_ring_size.get(bond).copied().flatten().is_some()
    }

    pub fn is_ring_atom(&self, atom: usize) -> bool {
        self.atom_ring_size.get(atom).copied().flatten().is_some()
    }

    /// Size of the smallest ring containing the bond.
    pub fn bond_ring_size(&self, bond: usize) -> Option<usize> {
        self.bond_ring_size.get(bond).copied().flatten()
    }

    /// Size of the smallest ring containing the atom.
    pub fn atom_ring_size(&self, atom: usize) -> Option<usize> {
        self.atom_ring_size.get(atom).copied().flatten()
    }

    pub fn num_ring_bonds(&self) -> usize {
        self.bond_ring_size.iter().filter(|s| s.is_some()).count()
    }
}

/// Size of the smallest ring that contains the path `a-center-b`, searching
/// rings of at most `max_size` atoms.
pub fn smallest_ring_through(
    mol: &Molecule,
    a: usize,
    center: usize,
    b: usize,
    max_size: usize,
) -> Option<usize> {
    let max_len = max_size.checked_sub(2)?;
    shortest_path_len(mol, a, b, |atom, _| atom == center, Some(max_len)).map(|len| len + 2)
}

/// Number of bonds on the shortest path from `from` to `to`, skipping
/// edges for which `excluded(neighbor, bond)` holds.
fn shortest_path_len<F>(
    mol: &Molecule,
    from: usize,
    to: usize,
    excluded: F,
    max_len: Option<usize>,
) -> Option<usize>
where
    F: Fn(usize, usize) -> bool,
{
    let mut dist = vec![usize::MAX; mol.num_atoms()];
    let mut queue = VecDeque::new();
    dist[from] = 0;
    queue.push_back(from);

    while let Some(atom) = queue.pop_front() {
        let next = dist[atom] + 1;
        if max_len.is_some_and(|m| next > m) {
            continue;
        }
        for &(neighbor, bond) in mol.neighbor_bonds(atom) {
            if excluded(neighbor, bond) || dist[neighbor] != usize::MAX {
                continue;
            }
            if neighbor == to {
                return Some(next);
            }
            dist[neighbor] = next;
            queue.push_back(neighbor);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::smiles;

    #[test]
    fn benzene_bonds_are_all_in_six_membered_ring() {
        let mol = smiles::parse("c1ccccc1").unwrap();
        let rings = RingInfo::perceive(&mol);
        assert_eq!(rings.num_ring_bonds(), 6);
        for b in 0..mol.num_bonds() {
            assert_eq!(rings.bond_ring_size(b), Some(6));
        }
    }

    #[test]
    fn chain_bonds_are_not_ring_bonds() {
        let mol = smiles::parse("CCCO").unwrap();
        let rings = RingInfo::perceive(&mol);
        assert_eq!(rings.num_ring_bonds(), 0);
        assert!(!rings.is_ring_atom(0));
    }

    #[test]
    fn substituent_on_ring_is_not_a_ring_atom() {
        let mol = smiles::parse("CC1CC1").unwrap();
        let rings = RingInfo::perceive(&mol);
        assert!(!rings.is_ring_atom(0));
        assert!(!rings.is_ring_bond(0));
        assert_eq!(rings.atom_ring_size(1), Some(3));
        assert_eq!(rings.atom_ring_size(3), Some(3));
    }

    #[test]
    fn fused_ring_bond_reports_smallest_ring() {
        // Bicyclo[2.2.0]hexane: two four-membered rings sharing the 2-5 bond,
        // with a six-membered envelope around both.
        let mol = smiles::parse("C1CC2CCC12").unwrap();
        let rings = RingInfo::perceive(&mol);
        let shared = mol.bond_between(2, 5).unwrap();
        let outer = mol.bond_between(0, 5).unwrap();
        assert_eq!(rings.bond_ring_size(shared), Some(4));
        assert_eq!(rings.bond_ring_size(outer), Some(4));
    }

    #[test]
    fn smallest_ring_through_angle_in_cyclopentane() {
        let mol = smiles::parse("C1CCCC1").unwrap();
        assert_eq!(smallest_ring_through(&mol, 0, 1, 2, 8), Some(5));
        assert_eq!(smallest_ring_through(&mol, 0, 1, 2, 4), None);
    }
}
