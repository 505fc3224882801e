use super::contributions::{
    AngleBend, AngleForm, BondStretch, Contribution, Inversion, Torsion, VdwPair,
};
use super::params::{UffAtomParams, UffParameterSet};
use super::term::EnergyTerm;
use super::typing::{self, TypingError};
use crate::core::models::atom::Hybridization;
use crate::core::models::conformer::Conformer;
use crate::core::models::element::Element;
use crate::core::models::molecule::Molecule;
use thiserror::Error;
use tracing::{debug, instrument};

/// Twice the UFF electrostatic constant `G`, in kcal·Å/mol.
const FORCE_CONSTANT_SCALE: f64 = 664.12;
const BOND_ORDER_CORRECTION: f64 = 0.1332;

#[derive(Debug, Error, PartialEq)]
pub enum ForceFieldError {
    #[error(transparent)]
    Typing(#[from] TypingError),
    #[error("No UFF parameters for atom type '{0}'")]
    MissingParameters(String),
    #[error("Coordinate array has {found} values, expected {expected}")]
    CoordinateSize { expected: usize, found: usize },
}

/// UFF rest length of a bond between two atom types.
pub fn bond_rest_length(a: &UffAtomParams, b: &UffAtomParams, order: f64) -> f64 {
    let r_bo = -BOND_ORDER_CORRECTION * (a.r1 + b.r1) * order.ln();
    let r_en = a.r1 * b.r1 * (a.xi.sqrt() - b.xi.sqrt()).powi(2) / (a.xi * a.r1 + b.xi * b.r1);
    a.r1 + b.r1 + r_bo - r_en
}

fn bond_force_constant(a: &UffAtomParams, b: &UffAtomParams, rest_length: f64) -> f64 {
    FORCE_CONSTANT_SCALE * a.z1 * b.z1 / rest_length.powi(3)
}

fn angle_force_constant(theta0: f64, r12: f64, r23: f64, z1: f64, z3: f64) -> f64 {
    let cos0 = theta0.cos();
    let r13 = (r12 * r12 + r23 * r23 - 2.0 * r12 * r23 * cos0).sqrt();
    let beta = FORCE_CONSTANT_SCALE / (r12 * r23);
    let prefactor = beta * z1 * z3 / r13.powi(5);
    let r_term = r12 * r23;
    let inner = 3.0 * r_term * (1.0 - cos0 * cos0) - r13 * r13 * cos0;
    prefactor * r_term * inner
}

/// UFF type labels and parameters for every atom of `mol`.
pub fn atom_parameters(
    mol: &Molecule,
    params: &UffParameterSet,
) -> Result<(Vec<&'static str>, Vec<UffAtomParams>), ForceFieldError> {
    let atom_types = typing::assign_uff_types(mol)?;
    let atom_params = atom_types
        .iter()
        .map(|&label| {
            params
                .get(label)
                .copied()
                .ok_or_else(|| ForceFieldError::MissingParameters(label.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok((atom_types, atom_params))
}

/// A UFF force field set up for one molecule with explicit hydrogens.
///
/// Coordinates are passed as flat `[x0, y0, z0, x1, ...]` arrays so the same
/// setup can score every conformer of the molecule.
#[derive(Debug, Clone)]
pub struct ForceField {
    num_atoms: usize,
    atom_types: Vec<&'static str>,
    bonds: Vec<BondStretch>,
    angles: Vec<AngleBend>,
    torsions: Vec<Torsion>,
    inversions: Vec<Inversion>,
    vdw: Vec<VdwPair>,
}

impl ForceField {
    #[instrument(skip_all, name = "uff_setup", fields(atoms = mol.num_atoms()))]
    pub fn uff(mol: &Molecule, params: &UffParameterSet) -> Result<Self, ForceFieldError> {
        let (atom_types, atom_params) = atom_parameters(mol, params)?;

        let mut ff = Self {
            num_atoms: mol.num_atoms(),
            atom_types,
            bonds: Vec::new(),
            angles: Vec::new(),
            torsions: Vec::new(),
            inversions: Vec::new(),
            vdw: Vec::new(),
        };
        ff.add_bonds(mol, &atom_params);
        ff.add_angles(mol, &atom_params);
        ff.add_torsions(mol, &atom_params);
        ff.add_inversions(mol);
        ff.add_vdw(mol, &atom_params);

        debug!(
            bonds = ff.bonds.len(),
            angles = ff.angles.len(),
            torsions = ff.torsions.len(),
            inversions = ff.inversions.len(),
            vdw = ff.vdw.len(),
            "UFF terms assembled"
        );
        Ok(ff)
    }

    fn add_bonds(&mut self, mol: &Molecule, p: &[UffAtomParams]) {
        for bond in mol.bonds() {
            let (a, b) = (&p[bond.atom1], &p[bond.atom2]);
            let rest_length = bond_rest_length(a, b, bond.order.as_f64());
            self.bonds.push(BondStretch {
                i: bond.atom1,
                j: bond.atom2,
                rest_length,
                force_constant: bond_force_constant(a, b, rest_length),
            });
        }
    }

    fn add_angles(&mut self, mol: &Molecule, p: &[UffAtomParams]) {
        for j in 0..mol.num_atoms() {
            let neighbors = mol.neighbor_bonds(j);
            let theta0_deg = p[j].theta0;
            let theta0 = theta0_deg.to_radians();
            let form = if (theta0_deg - 180.0).abs() < 1e-3 {
                AngleForm::Linear
            } else if (theta0_deg - 120.0).abs() < 1e-3
                && mol.atoms()[j].hybridization == Hybridization::Sp2
            {
                AngleForm::Trigonal
            } else {
                AngleForm::general(theta0)
            };

            for (x, &(i, bond_ij)) in neighbors.iter().enumerate() {
                for &(k, bond_jk) in &neighbors[x + 1..] {
                    let r12 = bond_rest_length(&p[i], &p[j], mol.bonds()[bond_ij].order.as_f64());
                    let r23 = bond_rest_length(&p[j], &p[k], mol.bonds()[bond_jk].order.as_f64());
                    self.angles.push(AngleBend {
                        i,
                        j,
                        k,
                        force_constant: angle_force_constant(theta0, r12, r23, p[i].z1, p[k].z1),
                        form,
                    });
                }
            }
        }
    }

    fn add_torsions(&mut self, mol: &Molecule, p: &[UffAtomParams]) {
        for bond in mol.bonds() {
            let (j, k) = (bond.atom1, bond.atom2);
            let (deg_j, deg_k) = (mol.degree(j), mol.degree(k));
            if deg_j < 2 || deg_k < 2 {
                continue;
            }
            let Some((barrier, periodicity, cos_term)) =
                torsion_parameters(mol, j, k, &p[j], &p[k], bond.order.as_f64())
            else {
                continue;
            };
            let force_constant = barrier / ((deg_j - 1) * (deg_k - 1)) as f64;

            for i in mol.neighbors(j).filter(|&i| i != k) {
                for l in mol.neighbors(k).filter(|&l| l != j && l != i) {
                    self.torsions.push(Torsion {
                        i,
                        j,
                        k,
                        l,
                        force_constant,
                        periodicity,
                        cos_term,
                    });
                }
            }
        }
    }

    fn add_inversions(&mut self, mol: &Molecule) {
        for j in 0..mol.num_atoms() {
            if mol.degree(j) != 3 || !matches!(self.atom_types[j], "C_2" | "C_R" | "N_2" | "N_R") {
                continue;
            }
            let n: Vec<usize> = mol.neighbors(j).collect();
            let to_carbonyl_oxygen = mol.atoms()[j].element == Element::C
                && n.iter().any(|&x| self.atom_types[x] == "O_2");
            let barrier = if to_carbonyl_oxygen { 50.0 } else { 6.0 };
            let force_constant = barrier / 3.0;
            for (i, k, l) in [(n[0], n[1], n[2]), (n[1], n[2], n[0]), (n[2], n[0], n[1])] {
                self.inversions.push(Inversion {
                    i,
                    j,
                    k,
                    l,
                    force_constant,
                });
            }
        }
    }

    fn add_vdw(&mut self, mol: &Molecule, p: &[UffAtomParams]) {
        let n = mol.num_atoms();
        let mut excluded = vec![false; n];
        for i in 0..n {
            excluded.iter_mut().for_each(|e| *e = false);
            for a in mol.neighbors(i) {
                excluded[a] = true;
                for b in mol.neighbors(a) {
                    excluded[b] = true;
                }
            }
            for j in (i + 1)..n {
                if excluded[j] {
                    continue;
                }
                self.vdw.push(VdwPair {
                    i,
                    j,
                    r_min: (p[i].x1 * p[j].x1).sqrt(),
                    well_depth: (p[i].d1 * p[j].d1).sqrt(),
                });
            }
        }
    }

    pub fn num_atoms(&self) -> usize {
        self.num_atoms
    }

    pub fn atom_types(&self) -> &[&'static str] {
        &self.atom_types
    }

    pub fn num_terms(&self) -> usize {
        self.bonds.len()
            + self.angles.len()
            + self.torsions.len()
            + self.inversions.len()
            + self.vdw.len()
    }

    pub fn check_coordinates(&self, coords: &[f64]) -> Result<(), ForceFieldError> {
        if coords.len() != 3 * self.num_atoms {
            return Err(ForceFieldError::CoordinateSize {
                expected: 3 * self.num_atoms,
                found: coords.len(),
            });
        }
        Ok(())
    }

    /// Energy split by term type.
    pub fn energy_terms(&self, coords: &[f64]) -> EnergyTerm {
        fn sum<C: Contribution>(terms: &[C], coords: &[f64]) -> f64 {
            terms.iter().map(|t| t.energy(coords)).sum()
        }
        EnergyTerm::new(
            sum(&self.bonds, coords),
            sum(&self.angles, coords),
            sum(&self.torsions, coords),
            sum(&self.inversions, coords),
            sum(&self.vdw, coords),
        )
    }

    /// Total energy in kcal/mol.
    pub fn energy(&self, coords: &[f64]) -> f64 {
        self.energy_terms(coords).total()
    }

    /// Writes the energy gradient into `grad`, overwriting its contents.
    pub fn gradient(&self, coords: &[f64], grad: &mut [f64]) {
        grad.iter_mut().for_each(|g| *g = 0.0);
        fn add<C: Contribution>(terms: &[C], coords: &[f64], grad: &mut [f64]) {
            terms.iter().for_each(|t| t.gradient(coords, grad));
        }
        add(&self.bonds, coords, grad);
        add(&self.angles, coords, grad);
        add(&self.torsions, coords, grad);
        add(&self.inversions, coords, grad);
        add(&self.vdw, coords, grad);
    }

    pub fn conformer_energy(&self, conformer: &Conformer) -> Result<f64, ForceFieldError> {
        let coords = conformer.to_flat();
        self.check_coordinates(&coords)?;
        Ok(self.energy(&coords))
    }
}

fn is_chalcogen(element: Element) -> bool {
    matches!(element, Element::O | Element::S)
}

/// Barrier, periodicity and `cos(n phi0)` for torsions about the `j-k` bond.
fn torsion_parameters(
    mol: &Molecule,
    j: usize,
    k: usize,
    pj: &UffAtomParams,
    pk: &UffAtomParams,
    bond_order: f64,
) -> Option<(f64, u32, f64)> {
    let (aj, ak) = (&mol.atoms()[j], &mol.atoms()[k]);
    let sp2_barrier = || 5.0 * (pj.u1 * pk.u1).sqrt() * (1.0 + 4.18 * bond_order.ln());

    match (aj.hybridization, ak.hybridization) {
        (Hybridization::Sp3, Hybridization::Sp3) => {
            if is_chalcogen(aj.element) && is_chalcogen(ak.element) {
                let v = |e: Element| -> f64 { if e == Element::O { 2.0 } else { 6.8 } };
                Some(((v(aj.element) * v(ak.element)).sqrt(), 2, -1.0))
            } else {
                Some(((pj.v1 * pk.v1).sqrt(), 3, -1.0))
            }
        }
        (Hybridization::Sp2, Hybridization::Sp2) => Some((sp2_barrier(), 2, 1.0)),
        (Hybridization::Sp2, Hybridization::Sp3) | (Hybridization::Sp3, Hybridization::Sp2) => {
            let sp3 = if aj.hybridization == Hybridization::Sp3 { aj } else { ak };
            if is_chalcogen(sp3.element) {
                Some((sp2_barrier(), 2, -1.0))
            } else {
                Some((1.0, 6, 1.0))
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::perception::hydrogens::add_hydrogens;
    use crate::core::smiles::parse;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn setup(smiles: &str) -> (Molecule, ForceField) {
        let mol = add_hydrogens(&parse(smiles).unwrap()).unwrap();
        let ff = ForceField::uff(&mol, &UffParameterSet::builtin()).unwrap();
        (mol, ff)
    }

    /// Atoms spread along a noisy helix, so no pair is close to overlapping.
    fn random_coords(n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .flat_map(|i| {
                let t = 1.7 * i as f64;
                [
                    1.5 * t.cos() + rng.gen_range(-0.2..0.2),
                    1.5 * t.sin() + rng.gen_range(-0.2..0.2),
                    0.9 * i as f64 + rng.gen_range(-0.2..0.2),
                ]
            })
            .collect()
    }

    #[test]
    fn carbon_carbon_single_bond_rest_length() {
        let params = UffParameterSet::builtin();
        let c3 = params.get("C_3").unwrap();
        assert!((bond_rest_length(c3, c3, 1.0) - 1.514).abs() < 1e-9);
        assert!(bond_rest_length(c3, c3, 2.0) < 1.514);
    }

    #[test]
    fn ethane_term_counts() {
        let (_, ff) = setup("CC");
        assert_eq!(ff.bonds.len(), 7);
        assert_eq!(ff.angles.len(), 12);
        assert_eq!(ff.torsions.len(), 9);
        assert_eq!(ff.inversions.len(), 0);
        // 3 x 3 H-H pairs across the C-C bond.
        assert_eq!(ff.vdw.len(), 9);
    }

    #[test]
    fn formaldehyde_carbon_has_strong_inversion() {
        let (_, ff) = setup("C=O");
        assert_eq!(ff.inversions.len(), 3);
        assert!(ff.inversions.iter().all(|inv| (inv.force_constant - 50.0 / 3.0).abs() < 1e-12));
    }

    #[test]
    fn isolated_bond_at_rest_length_has_zero_energy() {
        let (_, ff) = setup("[H][H]");
        let r0 = ff.bonds[0].rest_length;
        let coords = [0.0, 0.0, 0.0, r0, 0.0, 0.0];
        assert!(ff.energy(&coords).abs() < 1e-12);
    }

    #[test]
    fn total_gradient_matches_finite_differences() {
        for smiles in ["CCO", "C=CC(=O)N", "c1ccccc1C"] {
            let (mol, ff) = setup(smiles);
            let coords = random_coords(mol.num_atoms(), 7);
            let mut analytic = vec![0.0; coords.len()];
            ff.gradient(&coords, &mut analytic);

            let h = 1e-6;
            let mut x = coords.clone();
            for d in 0..coords.len() {
                let orig = x[d];
                x[d] = orig + h;
                let plus = ff.energy(&x);
                x[d] = orig - h;
                let minus = ff.energy(&x);
                x[d] = orig;
                let numeric = (plus - minus) / (2.0 * h);
                assert!(
                    (numeric - analytic[d]).abs() < 1e-3 * (1.0 + numeric.abs()),
                    "{smiles} component {d}: analytic {}, numeric {numeric}",
                    analytic[d]
                );
            }
        }
    }

    #[test]
    fn energy_terms_sum_to_total() {
        let (mol, ff) = setup("CC(C)O");
        let coords = random_coords(mol.num_atoms(), 3);
        let terms = ff.energy_terms(&coords);
        assert!((terms.total() - ff.energy(&coords)).abs() < 1e-9);
    }

    #[test]
    fn coordinate_size_is_checked_for_conformers() {
        let (_, ff) = setup("C");
        let conformer = Conformer::from_flat(&[0.0; 6]);
        assert_eq!(
            ff.conformer_energy(&conformer),
            Err(ForceFieldError::CoordinateSize {
                expected: 15,
                found: 6
            })
        );
    }

    #[test]
    fn parameter_overrides_change_rest_lengths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("uff.toml");
        std::fs::write(
            &path,
            "[types.C_3]\nr1 = 0.9\ntheta0 = 109.47\nx1 = 3.851\nd1 = 0.105\n\
             zeta = 12.73\nz1 = 1.912\nv1 = 2.119\nu1 = 2.0\nxi = 5.343\n",
        )
        .unwrap();
        let params = UffParameterSet::load(&path).unwrap();

        let mol = add_hydrogens(&parse("CC").unwrap()).unwrap();
        let ff = ForceField::uff(&mol, &params).unwrap();
        assert_eq!(ff.atom_types()[0], "C_3");
        assert!((ff.bonds[0].rest_length - 1.8).abs() < 1e-9);
    }
}
