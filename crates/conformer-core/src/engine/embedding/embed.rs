use super::EmbeddingError;
use super::bounds::{BoundsMatrix, build_bounds, cap_disconnected};
use super::stereo::{StereoConstraints, mirror};
use crate::core::forcefield::params::UffParameterSet;
use crate::core::forcefield::uff::atom_parameters;
use crate::core::models::molecule::Molecule;
use crate::core::perception::rings::RingInfo;
use crate::engine::minimize::{BfgsOptions, Objective, minimize};
use nalgebra::{DMatrix, Point3, SymmetricEigen};
use rand::Rng;
use tracing::{debug, trace};

/// Lower-bound scales tried in turn until the bounds can be smoothed.
const VDW_SCALES: [f64; 3] = [0.7, 0.5, 0.0];

/// Builds and smooths the distance bounds used to embed `mol`.
pub fn prepare_bounds(
    mol: &Molecule,
    params: &UffParameterSet,
) -> Result<BoundsMatrix, EmbeddingError> {
    if mol.num_atoms() == 0 {
        return Err(EmbeddingError::EmptyMolecule);
    }
    let rings = RingInfo::perceive(mol);
    let (_, atom_params) = atom_parameters(mol, params)?;

    let mut last_error = None;
    for scale in VDW_SCALES {
        let mut bounds = build_bounds(mol, &rings, &atom_params, scale);
        match bounds.smooth() {
            Ok(()) => {
                cap_disconnected(&mut bounds, mol);
                bounds.smooth()?;
                debug!(vdw_scale = scale, "distance bounds smoothed");
                return Ok(bounds);
            }
            Err(e) => {
                trace!(vdw_scale = scale, error = %e, "bounds smoothing failed, relaxing");
                last_error = Some(e);
            }
        }
    }
    Err(last_error.unwrap_or(EmbeddingError::EmptyMolecule))
}

/// Squared-distance violation of the bounds, summed over all atom pairs.
///
/// Pairs longer than their upper bound contribute `(d²/u² - 1)²`, pairs
/// shorter than their lower bound `(2l²/(l² + d²) - 1)²`. Chiral centers
/// added with [`DistanceViolation::with_stereo`] contribute a penalty while
/// their signed volume is on the wrong side.
#[derive(Debug, Clone)]
pub struct DistanceViolation {
    num_atoms: usize,
    pairs: Vec<(usize, usize, f64, f64)>,
    stereo: StereoConstraints,
}

impl DistanceViolation {
    pub fn new(bounds: &BoundsMatrix) -> Self {
        let n = bounds.len();
        let mut pairs = Vec::with_capacity(n * n.saturating_sub(1) / 2);
        for i in 0..n {
            for j in (i + 1)..n {
                let l = bounds.lower(i, j);
                let u = bounds.upper(i, j);
                pairs.push((i, j, l * l, u * u));
            }
        }
        Self {
            num_atoms: n,
            pairs,
            stereo: StereoConstraints::default(),
        }
    }

    pub fn with_stereo(mut self, stereo: StereoConstraints) -> Self {
        self.stereo = stereo;
        self
    }

    pub fn stereo(&self) -> &StereoConstraints {
        &self.stereo
    }
}

#[inline]
fn squared_distance(x: &[f64], i: usize, j: usize) -> (f64, [f64; 3]) {
    let d = [
        x[3 * i] - x[3 * j],
        x[3 * i + 1] - x[3 * j + 1],
        x[3 * i + 2] - x[3 * j + 2],
    ];
    (d[0] * d[0] + d[1] * d[1] + d[2] * d[2], d)
}

impl Objective for DistanceViolation {
    fn dimension(&self) -> usize {
        3 * self.num_atoms
    }

    fn value(&self, x: &[f64]) -> f64 {
        self.pairs
            .iter()
            .map(|&(i, j, l2, u2)| {
                let (d2, _) = squared_distance(x, i, j);
                if d2 > u2 {
                    let t = d2 / u2 - 1.0;
                    t * t
                } else if d2 < l2 {
                    let t = 2.0 * l2 / (l2 + d2) - 1.0;
                    t * t
                } else {
                    0.0
                }
            })
            .sum::<f64>()
            + self.stereo.value(x)
    }

    fn gradient(&self, x: &[f64], grad: &mut [f64]) {
        grad.iter_mut().for_each(|g| *g = 0.0);
        for &(i, j, l2, u2) in &self.pairs {
            let (d2, diff) = squared_distance(x, i, j);
            let factor = if d2 > u2 {
                4.0 * (d2 / u2 - 1.0) / u2
            } else if d2 < l2 {
                let denom = l2 + d2;
                let t = 2.0 * l2 / denom - 1.0;
                -8.0 * t * l2 / (denom * denom)
            } else {
                continue;
            };
            for axis in 0..3 {
                grad[3 * i + axis] += factor * diff[axis];
                grad[3 * j + axis] -= factor * diff[axis];
            }
        }
        self.stereo.add_gradient(x, grad);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmbedOptions {
    /// Start from uniform random coordinates instead of the metric matrix
    /// projection.
    pub random_coords: bool,
    pub max_attempts: usize,
    /// Largest accepted bounds violation per atom after refinement.
    pub max_error_per_atom: f64,
    pub refinement: BfgsOptions,
}

impl Default for EmbedOptions {
    fn default() -> Self {
        Self {
            random_coords: false,
            max_attempts: 5,
            max_error_per_atom: 0.05,
            refinement: BfgsOptions {
                max_iterations: 400,
                gradient_tolerance: 1e-3,
                value_tolerance: 1e-14,
                max_step: 0.5,
            },
        }
    }
}

/// Embeds one conformer, retrying up to `options.max_attempts` times.
///
/// All randomness comes from `rng`, so a seeded generator reproduces the
/// same geometry. A start with most chiral centers inverted is mirrored
/// before refinement, and a result that misses any configuration in
/// `objective`'s stereo constraints is rejected.
pub fn embed_conformer<R: Rng>(
    bounds: &BoundsMatrix,
    objective: &DistanceViolation,
    rng: &mut R,
    options: &EmbedOptions,
) -> Option<Vec<Point3<f64>>> {
    let n = bounds.len();
    if n == 1 {
        return Some(vec![Point3::origin()]);
    }
    for attempt in 0..options.max_attempts.max(1) {
        let mut coords = if options.random_coords {
            random_coordinates(n, rng)
        } else {
            match metric_coordinates(bounds, rng) {
                Some(c) => c,
                None => continue,
            }
        };

        let stereo = objective.stereo();
        if 2 * stereo.inverted_centers(&coords) > stereo.chiral.len() {
            mirror(&mut coords);
        }

        let Ok(report) = minimize(objective, &mut coords, &options.refinement) else {
            continue;
        };
        let per_atom = report.value / n as f64;
        if !stereo.satisfied(&coords) {
            trace!(attempt, "embedding attempt has the wrong stereo configuration");
            continue;
        }
        if per_atom <= options.max_error_per_atom && coords.iter().all(|c| c.is_finite()) {
            return Some(
                coords
                    .chunks_exact(3)
                    .map(|c| Point3::new(c[0], c[1], c[2]))
                    .collect(),
            );
        }
        trace!(attempt, per_atom, "embedding attempt rejected");
    }
    None
}

fn random_coordinates<R: Rng>(n: usize, rng: &mut R) -> Vec<f64> {
    let half_width = 2.0 * (n as f64).cbrt();
    (0..3 * n)
        .map(|_| rng.gen_range(-half_width..half_width))
        .collect()
}

/// Samples distances inside the bounds and projects the resulting metric
/// matrix onto its three largest eigenvectors.
fn metric_coordinates<R: Rng>(bounds: &BoundsMatrix, rng: &mut R) -> Option<Vec<f64>> {
    let n = bounds.len();
    let mut d2 = DMatrix::<f64>::zeros(n, n);
    for i in 0..n {
        for j in (i + 1)..n {
            let (l, u) = (bounds.lower(i, j), bounds.upper(i, j));
            let d = l + rng.r#gen::<f64>() * (u - l);
            d2[(i, j)] = d * d;
            d2[(j, i)] = d * d;
        }
    }

    let nf = n as f64;
    let total: f64 = (0..n)
        .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
        .map(|(i, j)| d2[(i, j)])
        .sum::<f64>()
        / (nf * nf);
    let to_center: Vec<f64> = (0..n)
        .map(|i| d2.row(i).sum() / nf - total)
        .collect();

    let metric = DMatrix::from_fn(n, n, |i, j| 0.5 * (to_center[i] + to_center[j] - d2[(i, j)]));
    let eigen = SymmetricEigen::new(metric);

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| eigen.eigenvalues[b].total_cmp(&eigen.eigenvalues[a]));
    if eigen.eigenvalues[order[0]] <= 0.0 {
        return None;
    }

    let mut coords = vec![0.0; 3 * n];
    for axis in 0..3 {
        let (lambda, column) = match order.get(axis) {
            Some(&k) => (eigen.eigenvalues[k], Some(k)),
            None => (0.0, None),
        };
        for i in 0..n {
            coords[3 * i + axis] = match column {
                Some(k) if lambda > 1e-6 => lambda.sqrt() * eigen.eigenvectors[(i, k)],
                // Degenerate direction: jitter so refinement can leave the plane.
                _ => rng.gen_range(-0.5..0.5),
            };
        }
    }
    Some(coords)
}
