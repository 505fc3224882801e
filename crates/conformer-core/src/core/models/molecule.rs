use super::atom::Atom;
use super::conformer::Conformer;
use super::element::Element;
use super::topology::{Bond, BondOrder};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoleculeError {
    #[error("Atom index {0} is out of range")]
    AtomOutOfRange(usize),
    #[error("Cannot bond atom {0} to itself")]
    SelfBond(usize),
    #[error("Atoms {0} and {1} are already bonded")]
    DuplicateBond(usize, usize),
    #[error("Conformer has {found} positions but the molecule has {expected} atoms")]
    ConformerSize { expected: usize, found: usize },
    #[error("Conformer {0} does not exist")]
    ConformerNotFound(usize),
}

/// A molecular graph with an ordered list of 3D conformers.
///
/// Atoms and bonds are addressed by their insertion index. Conformer ids are
/// positions in the conformer list and are always contiguous, starting at zero.
#[derive(Debug, Clone, Default)]
pub struct Molecule {
    /// Atoms in insertion order.
    atoms: Vec<Atom>,
    /// Bonds in insertion order.
    bonds: Vec<Bond>,
    /// Per-atom list of `(neighbor, bond index)` pairs.
    adjacency: Vec<Vec<(usize, usize)>>,
    /// Geometries, each holding one position per atom.
    conformers: Vec<Conformer>,
}

impl Molecule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an atom and returns its index.
    pub fn add_atom(&mut self, atom: Atom) -> usize {
        self.atoms.push(atom);
        self.adjacency.push(Vec::new());
        self.atoms.len() - 1
    }

    /// Connects two existing atoms and returns the bond index.
    pub fn add_bond(
        &mut self,
        atom1: usize,
        atom2: usize,
        order: BondOrder,
    ) -> Result<usize, MoleculeError> {
        for idx in [atom1, atom2] {
            if idx >= self.atoms.len() {
                return Err(MoleculeError::AtomOutOfRange(idx));
            }
        }
        if atom1 == atom2 {
            return Err(MoleculeError::SelfBond(atom1));
        }
        if self.bond_between(atom1, atom2).is_some() {
            return Err(MoleculeError::DuplicateBond(atom1, atom2));
        }

        let bond_idx = self.bonds.len();
        self.bonds.push(Bond::new(atom1, atom2, order));
        self.adjacency[atom1].push((atom2, bond_idx));
        self.adjacency[atom2].push((atom1, bond_idx));
        Ok(bond_idx)
    }

    pub fn atom(&self, idx: usize) -> Option<&Atom> {
        self.atoms.get(idx)
    }

    pub fn atom_mut(&mut self, idx: usize) -> Option<&mut Atom> {
        self.atoms.get_mut(idx)
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn atoms_mut(&mut self) -> &mut [Atom] {
        &mut self.atoms
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn bond(&self, idx: usize) -> Option<&Bond> {
        self.bonds.get(idx)
    }

    pub fn bond_mut(&mut self, idx: usize) -> Option<&mut Bond> {
        self.bonds.get_mut(idx)
    }

    pub fn num_atoms(&self) -> usize {
        self.atoms.len()
    }

    pub fn num_bonds(&self) -> usize {
        self.bonds.len()
    }

    pub fn num_heavy_atoms(&self) -> usize {
        self.atoms.iter().filter(|a| !a.is_hydrogen()).count()
    }

    pub fn heavy_atom_indices(&self) -> Vec<usize> {
        self.atoms
            .iter()
            .enumerate()
            .filter(|(_, a)| !a.is_hydrogen())
            .map(|(i, _)| i)
            .collect()
    }

    /// Neighbor atom indices of `atom`, in bond insertion order.
    pub fn neighbors(&self, atom: usize) -> impl Iterator<Item = usize> + '_ {
        self.adjacency[atom].iter().map(|&(n, _)| n)
    }

    /// `(neighbor, bond index)` pairs of `atom`.
    pub fn neighbor_bonds(&self, atom: usize) -> &[(usize, usize)] {
        &self.adjacency[atom]
    }

    /// Number of explicit graph neighbors.
    pub fn degree(&self, atom: usize) -> usize {
        self.adjacency[atom].len()
    }

    /// Graph neighbors plus hydrogens carried as counts.
    pub fn total_degree(&self, atom: usize) -> usize {
        self.degree(atom) + self.atoms[atom].hydrogen_count() as usize
    }

    pub fn bond_between(&self, atom1: usize, atom2: usize) -> Option<usize> {
        self.adjacency
            .get(atom1)?
            .iter()
            .find(|&&(n, _)| n == atom2)
            .map(|&(_, b)| b)
    }

    /// Sum of bond valence contributions over the explicit bonds of `atom`.
    pub fn explicit_bond_valence(&self, atom: usize) -> u8 {
        self.adjacency[atom]
            .iter()
            .map(|&(_, b)| self.bonds[b].order.valence_contribution())
            .sum()
    }

    /// Element symbols in atom order.
    pub fn species(&self) -> Vec<&'static str> {
        self.atoms.iter().map(|a| a.element.symbol()).collect()
    }

    pub fn count_element(&self, element: Element) -> usize {
        self.atoms.iter().filter(|a| a.element == element).count()
    }

    pub fn conformers(&self) -> &[Conformer] {
        &self.conformers
    }

    pub fn conformers_mut(&mut self) -> &mut [Conformer] {
        &mut self.conformers
    }

    pub fn conformer(&self, id: usize) -> Option<&Conformer> {
        self.conformers.get(id)
    }

    pub fn num_conformers(&self) -> usize {
        self.conformers.len()
    }

    /// Appends a conformer and returns its id.
    pub fn add_conformer(&mut self, conformer: Conformer) -> Result<usize, MoleculeError> {
        if conformer.len() != self.atoms.len() {
            return Err(MoleculeError::ConformerSize {
                expected: self.atoms.len(),
                found: conformer.len(),
            });
        }
        self.conformers.push(conformer);
        Ok(self.conformers.len() - 1)
    }

    pub fn clear_conformers(&mut self) {
        self.conformers.clear();
    }

    /// Copies the molecular graph without any conformers.
    pub fn without_conformers(&self) -> Self {
        Self {
            atoms: self.atoms.clone(),
            bonds: self.bonds.clone(),
            adjacency: self.adjacency.clone(),
            conformers: Vec::new(),
        }
    }

    /// Copies the molecular graph keeping only the listed conformers, in the
    /// given order. The copies are renumbered from zero.
    pub fn with_conformers(&self, ids: &[usize]) -> Result<Self, MoleculeError> {
        let mut copy = self.without_conformers();
        for &id in ids {
            let conformer = self
                .conformers
                .get(id)
                .ok_or(MoleculeError::ConformerNotFound(id))?;
            copy.conformers.push(conformer.clone());
        }
        Ok(copy)
    }

    /// Connected components as sorted lists of atom indices, ordered by their
    /// lowest atom index.
    pub fn fragments(&self) -> Vec<Vec<usize>> {
        let mut seen = vec![false; self.atoms.len()];
        let mut fragments = Vec::new();
        for start in 0..self.atoms.len() {
            if seen[start] {
                continue;
            }
            let mut stack = vec![start];
            let mut fragment = Vec::new();
            seen[start] = true;
            while let Some(atom) = stack.pop() {
                fragment.push(atom);
                for n in self.neighbors(atom) {
                    if !seen[n] {
                        seen[n] = true;
                        stack.push(n);
                    }
                }
            }
            fragment.sort_unstable();
            fragments.push(fragment);
        }
        fragments
    }
}
