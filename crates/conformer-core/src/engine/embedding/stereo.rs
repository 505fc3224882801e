use crate::core::models::atom::Chirality;
use crate::core::models::molecule::Molecule;
use crate::core::models::topology::StereoKind;
use crate::core::perception::stereo::chiral_reference_order;
use crate::core::utils::geometry::{dihedral_angle, signed_volume};
use nalgebra::{Point3, Vector3};

/// Signed volume, in Å³, a chiral center is pushed past during refinement.
const MIN_CHIRAL_VOLUME: f64 = 0.5;
const CHIRAL_WEIGHT: f64 = 0.1;

/// A tetrahedral center whose ligands must span a volume of a given sign.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChiralCenter {
    /// Ligands in tag order. A three-coordinate center stands in for its
    /// missing fourth ligand.
    pub points: [usize; 4],
    /// `1.0` when the signed volume must be positive, `-1.0` otherwise.
    pub sign: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DoubleBondConfig {
    /// Reference substituent, double-bond atoms, reference substituent.
    pub atoms: [usize; 4],
    pub cis: bool,
}

/// Configuration every accepted embedding has to reproduce.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StereoConstraints {
    pub chiral: Vec<ChiralCenter>,
    pub double_bonds: Vec<DoubleBondConfig>,
}

#[inline]
fn position(x: &[f64], i: usize) -> Point3<f64> {
    Point3::new(x[3 * i], x[3 * i + 1], x[3 * i + 2])
}

impl StereoConstraints {
    pub fn from_molecule(mol: &Molecule) -> Self {
        let chiral = (0..mol.num_atoms())
            .filter_map(|atom| {
                let sign = match mol.atoms()[atom].chirality {
                    Chirality::CounterClockwise => -1.0,
                    Chirality::Clockwise => 1.0,
                    Chirality::Unspecified => return None,
                };
                let ligands = chiral_reference_order(mol, atom);
                if ligands.len() != 4 {
                    return None;
                }
                let mut points = [atom; 4];
                for (slot, ligand) in points.iter_mut().zip(ligands) {
                    *slot = ligand.unwrap_or(atom);
                }
                Some(ChiralCenter { points, sign })
            })
            .collect();

        let double_bonds = mol
            .bonds()
            .iter()
            .filter_map(|bond| {
                let stereo = bond.stereo?;
                Some(DoubleBondConfig {
                    atoms: [stereo.refs.0, bond.atom1, bond.atom2, stereo.refs.1],
                    cis: stereo.kind == StereoKind::Cis,
                })
            })
            .collect();

        Self {
            chiral,
            double_bonds,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.chiral.is_empty() && self.double_bonds.is_empty()
    }

    fn volume(&self, x: &[f64], center: &ChiralCenter) -> f64 {
        let [a, b, c, d] = center.points.map(|i| position(x, i));
        signed_volume(&a, &b, &c, &d)
    }

    /// Penalty on chiral centers whose signed volume has not yet cleared
    /// the minimum on the required side.
    pub fn value(&self, x: &[f64]) -> f64 {
        self.chiral
            .iter()
            .map(|center| {
                let t = center.sign * self.volume(x, center) - MIN_CHIRAL_VOLUME;
                if t < 0.0 { CHIRAL_WEIGHT * t * t } else { 0.0 }
            })
            .sum()
    }

    /// Adds the gradient of [`Self::value`] to `grad`.
    pub fn add_gradient(&self, x: &[f64], grad: &mut [f64]) {
        for center in &self.chiral {
            let [p0, p1, p2, p3] = center.points.map(|i| position(x, i));
            let (v1, v2, v3) = (p1 - p0, p2 - p0, p3 - p0);
            let t = center.sign * v1.dot(&v2.cross(&v3)) - MIN_CHIRAL_VOLUME;
            if t >= 0.0 {
                continue;
            }
            let factor = 2.0 * CHIRAL_WEIGHT * t * center.sign;
            let d1 = v2.cross(&v3);
            let d2 = v3.cross(&v1);
            let d3 = v1.cross(&v2);
            let d0: Vector3<f64> = -(d1 + d2 + d3);
            for (atom, dv) in center.points.iter().zip([d0, d1, d2, d3]) {
                for axis in 0..3 {
                    grad[3 * atom + axis] += factor * dv[axis];
                }
            }
        }
    }

    /// Centers whose volume currently has the wrong sign.
    pub fn inverted_centers(&self, x: &[f64]) -> usize {
        self.chiral
            .iter()
            .filter(|center| center.sign * self.volume(x, center) <= 0.0)
            .count()
    }

    /// Whether every chiral center has its handedness and every double bond
    /// its configuration.
    pub fn satisfied(&self, x: &[f64]) -> bool {
        self.inverted_centers(x) == 0
            && self.double_bonds.iter().all(|config| {
                let [a, b, c, d] = config.atoms.map(|i| position(x, i));
                (dihedral_angle(&a, &b, &c, &d) < 90.0) == config.cis
            })
    }
}

/// Reflects flat coordinates through the yz plane, inverting every center.
pub(crate) fn mirror(x: &mut [f64]) {
    for p in x.chunks_exact_mut(3) {
        p[0] = -p[0];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::perception::hydrogens::add_hydrogens;
    use crate::core::smiles::parse;

    fn constraints(smiles: &str) -> (Molecule, StereoConstraints) {
        let mol = add_hydrogens(&parse(smiles).unwrap()).unwrap();
        let stereo = StereoConstraints::from_molecule(&mol);
        (mol, stereo)
    }

    /// Tetrahedron with ligands 1..=4 around atom 0 at the origin.
    fn tetrahedron() -> Vec<f64> {
        vec![
            0.0, 0.0, 0.0, //
            1.0, 1.0, 1.0, //
            1.0, -1.0, -1.0, //
            -1.0, 1.0, -1.0, //
            -1.0, -1.0, 1.0,
        ]
    }

    #[test]
    fn chiral_centers_follow_the_tag() {
        let (mol, stereo) = constraints("C[C@@H](N)O");
        assert_eq!(stereo.chiral.len(), 1);
        let center = stereo.chiral[0];
        assert_eq!(&center.points[..3], &[0, 2, 3]);
        assert!(mol.atoms()[center.points[3]].is_hydrogen());
        assert_eq!(center.sign, 1.0);

        let (_, mirrored) = constraints("C[C@H](N)O");
        assert_eq!(mirrored.chiral[0].sign, -1.0);
        assert!(constraints("CC(N)O").1.is_empty());
    }

    #[test]
    fn double_bond_configuration_is_recorded() {
        let (_, stereo) = constraints("F/C=C\\F");
        assert_eq!(
            stereo.double_bonds,
            vec![DoubleBondConfig {
                atoms: [0, 1, 2, 3],
                cis: true
            }]
        );
    }

    #[test]
    fn mirroring_inverts_every_center() {
        let stereo = StereoConstraints {
            chiral: vec![ChiralCenter {
                points: [1, 2, 3, 4],
                sign: 1.0,
            }],
            double_bonds: Vec::new(),
        };
        let mut x = tetrahedron();
        let positive = stereo.volume(&x, &stereo.chiral[0]) > 0.0;
        if !positive {
            mirror(&mut x);
        }
        assert!(stereo.satisfied(&x));
        assert_eq!(stereo.value(&x), 0.0);
        mirror(&mut x);
        assert_eq!(stereo.inverted_centers(&x), 1);
        assert!(!stereo.satisfied(&x));
        assert!(stereo.value(&x) > 0.0);
    }

    #[test]
    fn chiral_gradient_matches_finite_differences() {
        let stereo = StereoConstraints {
            chiral: vec![ChiralCenter {
                points: [0, 1, 2, 3],
                sign: -1.0,
            }],
            double_bonds: Vec::new(),
        };
        let x = vec![0.1, -0.2, 0.3, 1.2, 0.1, 0.4, -0.3, 1.1, 0.2, 0.5, -0.4, 1.3];
        assert!(stereo.value(&x) > 0.0);

        let mut analytic = vec![0.0; x.len()];
        stereo.add_gradient(&x, &mut analytic);
        let h = 1e-6;
        for k in 0..x.len() {
            let mut plus = x.clone();
            let mut minus = x.clone();
            plus[k] += h;
            minus[k] -= h;
            let numeric = (stereo.value(&plus) - stereo.value(&minus)) / (2.0 * h);
            assert!(
                (numeric - analytic[k]).abs() < 1e-5 * (1.0 + numeric.abs()),
                "component {k}: {numeric} vs {}",
                analytic[k]
            );
        }
    }
}
