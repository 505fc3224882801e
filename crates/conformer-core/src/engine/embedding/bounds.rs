use super::EmbeddingError;
use crate::core::forcefield::params::UffAtomParams;
use crate::core::forcefield::uff::bond_rest_length;
use crate::core::models::atom::Hybridization;
use crate::core::models::molecule::Molecule;
use crate::core::models::topology::StereoKind;
use crate::core::perception::rings::{RingInfo, smallest_ring_through};
use itertools::Itertools;
use tracing::trace;

/// Upper bound for atom pairs with no geometric constraint.
pub const DEFAULT_UPPER: f64 = 1000.0;
const BOND_TOLERANCE: f64 = 0.01;
const ANGLE_TOLERANCE: f64 = 0.04;
const PLANAR_TORSION_TOLERANCE: f64 = 0.06;
const SMALL_RING_MAX: usize = 5;
const PLANAR_RING_MAX: usize = 6;

/// How tightly a pair distance is already constrained. Lower levels are
/// tighter and are never overwritten by looser ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Level {
    Bond,
    Angle,
    Torsion,
    Free,
}

/// Symmetric lower and upper distance bounds for every atom pair.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundsMatrix {
    n: usize,
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl BoundsMatrix {
    pub fn new(n: usize) -> Self {
        Self {
            n,
            lower: vec![0.0; n * n],
            upper: vec![DEFAULT_UPPER; n * n],
        }
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    #[inline]
    pub fn lower(&self, i: usize, j: usize) -> f64 {
        self.lower[i * self.n + j]
    }

    #[inline]
    pub fn upper(&self, i: usize, j: usize) -> f64 {
        self.upper[i * self.n + j]
    }

    pub fn set(&mut self, i: usize, j: usize, lower: f64, upper: f64) {
        let n = self.n;
        self.lower[i * n + j] = lower;
        self.lower[j * n + i] = lower;
        self.upper[i * n + j] = upper;
        self.upper[j * n + i] = upper;
    }

    /// Tightens the bounds so they satisfy the triangle inequality
    /// (Floyd-Warshall over upper and lower bounds).
    pub fn smooth(&mut self) -> Result<(), EmbeddingError> {
        let n = self.n;
        for k in 0..n {
            for i in 0..n {
                if i == k {
                    continue;
                }
                let u_ik = self.upper(i, k);
                let l_ik = self.lower(i, k);
                for j in (i + 1)..n {
                    if j == k {
                        continue;
                    }
                    let u_kj = self.upper(k, j);
                    let l_kj = self.lower(k, j);

                    let mut upper = self.upper(i, j);
                    if upper > u_ik + u_kj {
                        upper = u_ik + u_kj;
                    }
                    let lower = self.lower(i, j).max(l_ik - u_kj).max(l_kj - u_ik);
                    if lower > upper {
                        return Err(EmbeddingError::InconsistentBounds { i, j });
                    }
                    self.set(i, j, lower, upper);
                }
            }
        }
        Ok(())
    }
}

fn rest_length(mol: &Molecule, p: &[UffAtomParams], a: usize, b: usize) -> Option<f64> {
    let bond = mol.bond_between(a, b)?;
    Some(bond_rest_length(&p[a], &p[b], mol.bonds()[bond].order.as_f64()))
}

/// Ideal `i-j-k` angle in radians.
fn ideal_angle(mol: &Molecule, p: &[UffAtomParams], i: usize, j: usize, k: usize) -> f64 {
    if let Some(size) = smallest_ring_through(mol, i, j, k, SMALL_RING_MAX) {
        return ring_angle(size);
    }
    let center = &mol.atoms()[j];
    if center.hybridization == Hybridization::Sp2 && mol.degree(j) == 3 {
        // Exocyclic angle at a planar small-ring atom.
        for (a, b) in neighbor_pairs(mol, j) {
            if let Some(size) = smallest_ring_through(mol, a, j, b, SMALL_RING_MAX) {
                return (2.0 * std::f64::consts::PI - ring_angle(size)) / 2.0;
            }
        }
    }
    p[j].theta0.to_radians()
}

/// Unordered pairs of distinct neighbours of `center`.
fn neighbor_pairs(mol: &Molecule, center: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
    mol.neighbor_bonds(center)
        .iter()
        .map(|&(n, _)| n)
        .tuple_combinations()
}

fn ring_angle(size: usize) -> f64 {
    (size as f64 - 2.0) * std::f64::consts::PI / size as f64
}

fn law_of_cosines(a: f64, b: f64, theta: f64) -> f64 {
    (a * a + b * b - 2.0 * a * b * theta.cos()).max(0.0).sqrt()
}

/// Distance between the ends of `i-j-k-l` at dihedral 0 (cis) or 180 (trans).
fn torsion_distance(a: f64, b: f64, c: f64, theta1: f64, theta2: f64, cis: bool) -> f64 {
    let dx = b - c * theta2.cos() - a * theta1.cos();
    let sign = if cis { 1.0 } else { -1.0 };
    let dy = sign * c * theta2.sin() - a * theta1.sin();
    (dx * dx + dy * dy).sqrt()
}

fn is_planar(mol: &Molecule, atom: usize) -> bool {
    let a = &mol.atoms()[atom];
    a.is_aromatic || a.hybridization == Hybridization::Sp2
}

/// Builds the distance bounds for `mol` from its topology and UFF rest
/// geometry. Pairs more than three bonds apart get a lower bound of
/// `vdw_scale` times the sum of their van der Waals radii.
pub fn build_bounds(
    mol: &Molecule,
    rings: &RingInfo,
    params: &[UffAtomParams],
    vdw_scale: f64,
) -> BoundsMatrix {
    let n = mol.num_atoms();
    let mut bounds = BoundsMatrix::new(n);
    let mut level = vec![Level::Free; n * n];
    let mut assign = |bounds: &mut BoundsMatrix, i: usize, j: usize, lo: f64, hi: f64, l: Level| {
        if level[i * n + j] <= l {
            return;
        }
        level[i * n + j] = l;
        level[j * n + i] = l;
        bounds.set(i, j, lo, hi);
    };

    for bond in mol.bonds() {
        let r = bond_rest_length(
            &params[bond.atom1],
            &params[bond.atom2],
            bond.order.as_f64(),
        );
        assign(
            &mut bounds,
            bond.atom1,
            bond.atom2,
            r - BOND_TOLERANCE,
            r + BOND_TOLERANCE,
            Level::Bond,
        );
    }

    for j in 0..n {
        for (i, k) in neighbor_pairs(mol, j) {
            let (Some(a), Some(b)) = (rest_length(mol, params, i, j), rest_length(mol, params, j, k))
            else {
                continue;
            };
            let d = law_of_cosines(a, b, ideal_angle(mol, params, i, j, k));
            assign(
                &mut bounds,
                i,
                k,
                (d - ANGLE_TOLERANCE).max(0.0),
                d + ANGLE_TOLERANCE,
                Level::Angle,
            );
        }
    }

    for (bond_idx, bond) in mol.bonds().iter().enumerate() {
        let (j, k) = (bond.atom1, bond.atom2);
        let Some(b) = rest_length(mol, params, j, k) else {
            continue;
        };
        let planar_ring = rings
            .bond_ring_size(bond_idx)
            .is_some_and(|size| size <= PLANAR_RING_MAX)
            && is_planar(mol, j)
            && is_planar(mol, k);

        for i in mol.neighbors(j).filter(|&i| i != k) {
            for l in mol.neighbors(k).filter(|&l| l != j && l != i) {
                let (Some(a), Some(c)) = (rest_length(mol, params, i, j), rest_length(mol, params, k, l))
                else {
                    continue;
                };
                let theta1 = ideal_angle(mol, params, i, j, k);
                let theta2 = ideal_angle(mol, params, j, k, l);
                let cis = torsion_distance(a, b, c, theta1, theta2, true);
                let trans = torsion_distance(a, b, c, theta1, theta2, false);

                let (lo, hi) = if planar_ring {
                    let i_in_ring =
                        smallest_ring_through(mol, i, j, k, PLANAR_RING_MAX).is_some();
                    let l_in_ring =
                        smallest_ring_through(mol, j, k, l, PLANAR_RING_MAX).is_some();
                    let d = if i_in_ring == l_in_ring { cis } else { trans };
                    (d - PLANAR_TORSION_TOLERANCE, d + PLANAR_TORSION_TOLERANCE)
                } else if let Some(stereo) = bond.stereo {
                    let d = match stereo.relation(i, l) {
                        StereoKind::Cis => cis,
                        StereoKind::Trans => trans,
                    };
                    (d - PLANAR_TORSION_TOLERANCE, d + PLANAR_TORSION_TOLERANCE)
                } else {
                    (cis.min(trans), cis.max(trans))
                };
                assign(&mut bounds, i, l, lo, hi, Level::Torsion);
            }
        }
    }

    for i in 0..n {
        for j in (i + 1)..n {
            if level[i * n + j] != Level::Free {
                continue;
            }
            let lower = vdw_scale
                * (mol.atoms()[i].element.vdw_radius() + mol.atoms()[j].element.vdw_radius());
            bounds.set(i, j, lower, DEFAULT_UPPER);
        }
    }

    trace!(atoms = n, vdw_scale, "distance bounds assigned");
    bounds
}

/// Caps the upper bounds of pairs in different fragments so random distances
/// stay on the scale of the molecule. Call after a first smoothing pass.
pub fn cap_disconnected(bounds: &mut BoundsMatrix, mol: &Molecule) {
    let fragments = mol.fragments();
    if fragments.len() < 2 {
        return;
    }
    let mut fragment_of = vec![0; mol.num_atoms()];
    for (f, atoms) in fragments.iter().enumerate() {
        for &a in atoms {
            fragment_of[a] = f;
        }
    }
    let n = bounds.len();
    let mut span: f64 = 0.0;
    for i in 0..n {
        for j in (i + 1)..n {
            if fragment_of[i] == fragment_of[j] {
                span = span.max(bounds.upper(i, j));
            }
        }
    }
    for i in 0..n {
        for j in (i + 1)..n {
            if fragment_of[i] != fragment_of[j] {
                let lower = bounds.lower(i, j);
                bounds.set(i, j, lower, lower + 2.0 * span + 2.0);
            }
        }
    }
}
