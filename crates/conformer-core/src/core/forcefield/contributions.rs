use super::potentials;
use nalgebra::Vector3;

const DEGENERATE: f64 = 1e-8;

#[inline]
pub(crate) fn position(coords: &[f64], atom: usize) -> Vector3<f64> {
    Vector3::new(coords[3 * atom], coords[3 * atom + 1], coords[3 * atom + 2])
}

#[inline]
pub(crate) fn accumulate(grad: &mut [f64], atom: usize, v: &Vector3<f64>) {
    grad[3 * atom] += v.x;
    grad[3 * atom + 1] += v.y;
    grad[3 * atom + 2] += v.z;
}

/// One energy contribution over a flat `[x0, y0, z0, x1, ...]` coordinate array.
pub trait Contribution {
    fn energy(&self, coords: &[f64]) -> f64;
    /// Adds the gradient of [`Contribution::energy`] into `grad`.
    fn gradient(&self, coords: &[f64], grad: &mut [f64]);
}

#[derive(Debug, Clone, PartialEq)]
pub struct BondStretch {
    pub i: usize,
    pub j: usize,
    pub rest_length: f64,
    pub force_constant: f64,
}

impl Contribution for BondStretch {
    fn energy(&self, coords: &[f64]) -> f64 {
        let dist = (position(coords, self.i) - position(coords, self.j)).norm();
        potentials::harmonic(dist, self.rest_length, self.force_constant).0
    }

    fn gradient(&self, coords: &[f64], grad: &mut [f64]) {
        let r = position(coords, self.i) - position(coords, self.j);
        let dist = r.norm();
        if dist < DEGENERATE {
            return;
        }
        let (_, de_dr) = potentials::harmonic(dist, self.rest_length, self.force_constant);
        let g = r * (de_dr / dist);
        accumulate(grad, self.i, &g);
        accumulate(grad, self.j, &-g);
    }
}

/// Angular form of a bend term, chosen from the ideal geometry at the
/// central atom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AngleForm {
    /// Three-term Fourier expansion around an arbitrary ideal angle.
    General { c0: f64, c1: f64, c2: f64 },
    /// `1 + cos(theta)`, minimal at 180 degrees.
    Linear,
    /// `(1 - cos(3 theta)) / 9`, minimal at 120 degrees.
    Trigonal,
}

impl AngleForm {
    pub fn general(theta0: f64) -> Self {
        let (sin0, cos0) = theta0.sin_cos();
        let c2 = 1.0 / (4.0 * sin0 * sin0);
        Self::General {
            c0: c2 * (2.0 * cos0 * cos0 + 1.0),
            c1: -4.0 * c2 * cos0,
            c2,
        }
    }

    /// Value and derivative with respect to `cos(theta)`.
    fn evaluate(&self, c: f64) -> (f64, f64) {
        match *self {
            Self::General { c0, c1, c2 } => (c0 + c1 * c + c2 * (2.0 * c * c - 1.0), c1 + 4.0 * c2 * c),
            Self::Linear => (1.0 + c, 1.0),
            Self::Trigonal => {
                let (cos3, dcos3) = potentials::chebyshev_cos(3, c);
                ((1.0 - cos3) / 9.0, -dcos3 / 9.0)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AngleBend {
    pub i: usize,
    /// Central atom.
    pub j: usize,
    pub k: usize,
    pub force_constant: f64,
    pub form: AngleForm,
}

impl AngleBend {
    fn geometry(&self, coords: &[f64]) -> Option<(f64, Vector3<f64>, Vector3<f64>, f64, f64)> {
        let center = position(coords, self.j);
        let u = position(coords, self.i) - center;
        let v = position(coords, self.k) - center;
        let (lu, lv) = (u.norm(), v.norm());
        if lu < DEGENERATE || lv < DEGENERATE {
            return None;
        }
        let c = (u.dot(&v) / (lu * lv)).clamp(-1.0, 1.0);
        Some((c, u, v, lu, lv))
    }
}

impl Contribution for AngleBend {
    fn energy(&self, coords: &[f64]) -> f64 {
        match self.geometry(coords) {
            Some((c, ..)) => self.force_constant * self.form.evaluate(c).0,
            None => 0.0,
        }
    }

    fn gradient(&self, coords: &[f64], grad: &mut [f64]) {
        let Some((c, u, v, lu, lv)) = self.geometry(coords) else {
            return;
        };
        let de_dc = self.force_constant * self.form.evaluate(c).1;
        let dc_di = v / (lu * lv) - u * (c / (lu * lu));
        let dc_dk = u / (lu * lv) - v * (c / (lv * lv));
        let gi = dc_di * de_dc;
        let gk = dc_dk * de_dc;
        accumulate(grad, self.i, &gi);
        accumulate(grad, self.k, &gk);
        accumulate(grad, self.j, &-(gi + gk));
    }
}

/// Dihedral term `V/2 (1 - cos(n phi0) cos(n phi))` about the `j-k` bond.
#[derive(Debug, Clone, PartialEq)]
pub struct Torsion {
    pub i: usize,
    pub j: usize,
    pub k: usize,
    pub l: usize,
    pub force_constant: f64,
    pub periodicity: u32,
    /// `cos(n phi0)`, which is always +1 or -1 for UFF torsions.
    pub cos_term: f64,
}

struct DihedralFrame {
    cos_phi: f64,
    b1: Vector3<f64>,
    b2: Vector3<f64>,
    b3: Vector3<f64>,
    a: Vector3<f64>,
    b: Vector3<f64>,
    la: f64,
    lb: f64,
}

impl Torsion {
    fn frame(&self, coords: &[f64]) -> Option<DihedralFrame> {
        let b1 = position(coords, self.j) - position(coords, self.i);
        let b2 = position(coords, self.k) - position(coords, self.j);
        let b3 = position(coords, self.l) - position(coords, self.k);
        let a = b1.cross(&b2);
        let b = b2.cross(&b3);
        let (la, lb) = (a.norm(), b.norm());
        if la < DEGENERATE || lb < DEGENERATE {
            return None;
        }
        let cos_phi = (a.dot(&b) / (la * lb)).clamp(-1.0, 1.0);
        Some(DihedralFrame {
            cos_phi,
            b1,
            b2,
            b3,
            a,
            b,
            la,
            lb,
        })
    }

    fn evaluate(&self, cos_phi: f64) -> (f64, f64) {
        let (cos_n, dcos_n) = potentials::chebyshev_cos(self.periodicity, cos_phi);
        let half = 0.5 * self.force_constant;
        (
            half * (1.0 - self.cos_term * cos_n),
            -half * self.cos_term * dcos_n,
        )
    }
}

impl Contribution for Torsion {
    fn energy(&self, coords: &[f64]) -> f64 {
        match self.frame(coords) {
            Some(frame) => self.evaluate(frame.cos_phi).0,
            None => 0.0,
        }
    }

    fn gradient(&self, coords: &[f64], grad: &mut [f64]) {
        let Some(f) = self.frame(coords) else {
            return;
        };
        let de_dc = self.evaluate(f.cos_phi).1;
        let a_hat = f.a / f.la;
        let b_hat = f.b / f.lb;
        let g_a = (b_hat - a_hat * f.cos_phi) * (de_dc / f.la);
        let g_b = (a_hat - b_hat * f.cos_phi) * (de_dc / f.lb);

        let g_b1 = f.b2.cross(&g_a);
        let g_b2 = g_a.cross(&f.b1) + f.b3.cross(&g_b);
        let g_b3 = g_b.cross(&f.b2);

        accumulate(grad, self.i, &-g_b1);
        accumulate(grad, self.j, &(g_b1 - g_b2));
        accumulate(grad, self.k, &(g_b2 - g_b3));
        accumulate(grad, self.l, &g_b3);
    }
}

/// Out-of-plane term `K (1 - cos Y)`, where `Y` is the angle between the
/// `j-l` bond and the plane through `i`, `j` and `k`.
#[derive(Debug, Clone, PartialEq)]
pub struct Inversion {
    pub i: usize,
    /// Central atom.
    pub j: usize,
    pub k: usize,
    /// Out-of-plane neighbor.
    pub l: usize,
    pub force_constant: f64,
}

struct InversionFrame {
    sin_y: f64,
    a: Vector3<f64>,
    b: Vector3<f64>,
    n: Vector3<f64>,
    u: Vector3<f64>,
    ln: f64,
    lu: f64,
}

impl Inversion {
    fn frame(&self, coords: &[f64]) -> Option<InversionFrame> {
        let center = position(coords, self.j);
        let a = position(coords, self.i) - center;
        let b = position(coords, self.k) - center;
        let u = position(coords, self.l) - center;
        let n = a.cross(&b);
        let (ln, lu) = (n.norm(), u.norm());
        if ln < DEGENERATE || lu < DEGENERATE {
            return None;
        }
        let sin_y = (n.dot(&u) / (ln * lu)).clamp(-1.0, 1.0);
        Some(InversionFrame {
            sin_y,
            a,
            b,
            n,
            u,
            ln,
            lu,
        })
    }
}

impl Contribution for Inversion {
    fn energy(&self, coords: &[f64]) -> f64 {
        match self.frame(coords) {
            Some(f) => self.force_constant * (1.0 - (1.0 - f.sin_y * f.sin_y).max(0.0).sqrt()),
            None => 0.0,
        }
    }

    fn gradient(&self, coords: &[f64], grad: &mut [f64]) {
        let Some(f) = self.frame(coords) else {
            return;
        };
        let s = f.sin_y;
        let cos_y = (1.0 - s * s).max(0.0).sqrt().max(DEGENERATE);
        let de_ds = self.force_constant * s / cos_y;
        let n_hat = f.n / f.ln;
        let u_hat = f.u / f.lu;
        let g_u = (n_hat - u_hat * s) * (de_ds / f.lu);
        let g_n = (u_hat - n_hat * s) * (de_ds / f.ln);
        let g_a = f.b.cross(&g_n);
        let g_b = g_n.cross(&f.a);

        accumulate(grad, self.i, &g_a);
        accumulate(grad, self.k, &g_b);
        accumulate(grad, self.l, &g_u);
        accumulate(grad, self.j, &-(g_a + g_b + g_u));
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VdwPair {
    pub i: usize,
    pub j: usize,
    pub r_min: f64,
    pub well_depth: f64,
}

impl Contribution for VdwPair {
    fn energy(&self, coords: &[f64]) -> f64 {
        let dist = (position(coords, self.i) - position(coords, self.j)).norm();
        potentials::lennard_jones_12_6(dist, self.r_min, self.well_depth)
    }

    fn gradient(&self, coords: &[f64], grad: &mut [f64]) {
        let r = position(coords, self.i) - position(coords, self.j);
        let dist = r.norm();
        if dist < DEGENERATE {
            return;
        }
        let de_dr = potentials::lennard_jones_12_6_derivative(dist, self.r_min, self.well_depth);
        let g = r * (de_dr / dist);
        accumulate(grad, self.i, &g);
        accumulate(grad, self.j, &-g);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn numeric_gradient(term: &dyn Contribution, coords: &[f64]) -> Vec<f64> {
        let h = 1e-6;
        let mut x = coords.to_vec();
        (0..coords.len())
            .map(|d| {
                let orig = x[d];
                x[d] = orig + h;
                let plus = term.energy(&x);
                x[d] = orig - h;
                let minus = term.energy(&x);
                x[d] = orig;
                (plus - minus) / (2.0 * h)
            })
            .collect()
    }

    fn assert_gradient_matches(term: &dyn Contribution, coords: &[f64]) {
        let mut analytic = vec![0.0; coords.len()];
        term.gradient(coords, &mut analytic);
        let numeric = numeric_gradient(term, coords);
        for (d, (a, n)) in analytic.iter().zip(&numeric).enumerate() {
            assert!(
                (a - n).abs() < 1e-4 * (1.0 + n.abs()),
                "component {d}: analytic {a}, numeric {n}"
            );
        }
    }

    const SKEWED: [f64; 12] = [
        0.1, 1.2, -0.3, //
        0.0, 0.0, 0.0, //
        1.4, 0.1, 0.2, //
        1.9, 0.9, 1.1,
    ];

    #[test]
    fn bond_energy_is_zero_at_rest_length() {
        let bond = BondStretch {
            i: 0,
            j: 1,
            rest_length: 1.5,
            force_constant: 700.0,
        };
        assert_eq!(bond.energy(&[0.0, 0.0, 0.0, 1.5, 0.0, 0.0]), 0.0);
        assert_gradient_matches(&bond, &SKEWED[..6]);
    }

    #[test]
    fn angle_forms_are_minimal_at_their_ideal_angle() {
        let at = |theta: f64| [theta.cos(), theta.sin(), 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0];
        let make = |form| AngleBend {
            i: 0,
            j: 1,
            k: 2,
            force_constant: 100.0,
            form,
        };
        let theta0 = 109.47_f64.to_radians();
        let general = make(AngleForm::general(theta0));
        assert!(general.energy(&at(theta0)).abs() < 1e-9);
        assert!(general.energy(&at(theta0 + 0.1)) > 0.0);
        assert!(make(AngleForm::Linear).energy(&at(PI)).abs() < 1e-9);
        assert!(make(AngleForm::Trigonal).energy(&at(2.0 * PI / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn angle_gradients_match_finite_differences() {
        for form in [
            AngleForm::general(104.51_f64.to_radians()),
            AngleForm::Linear,
            AngleForm::Trigonal,
        ] {
            let angle = AngleBend {
                i: 0,
                j: 1,
                k: 2,
                force_constant: 80.0,
                form,
            };
            assert_gradient_matches(&angle, &SKEWED[..9]);
        }
    }

    #[test]
    fn torsion_minima_follow_periodicity() {
        let dihedral = |phi: f64| {
            [
                1.0,
                0.0,
                0.0,
                0.0,
                0.0,
                0.0,
                0.0,
                0.0,
                1.5,
                phi.cos(),
                phi.sin(),
                1.5,
            ]
        };
        let staggered = Torsion {
            i: 0,
            j: 1,
            k: 2,
            l: 3,
            force_constant: 2.0,
            periodicity: 3,
            cos_term: -1.0,
        };
        assert!(staggered.energy(&dihedral(PI)).abs() < 1e-9);
        assert!((staggered.energy(&dihedral(0.0)) - 2.0).abs() < 1e-9);

        let planar = Torsion {
            periodicity: 2,
            cos_term: 1.0,
            ..staggered.clone()
        };
        assert!(planar.energy(&dihedral(0.0)).abs() < 1e-9);
        assert!((planar.energy(&dihedral(PI / 2.0)) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn torsion_gradients_match_finite_differences() {
        for (n, cos_term) in [(2, 1.0), (3, -1.0), (6, 1.0)] {
            let torsion = Torsion {
                i: 0,
                j: 1,
                k: 2,
                l: 3,
                force_constant: 3.0,
                periodicity: n,
                cos_term,
            };
            assert_gradient_matches(&torsion, &SKEWED);
        }
    }

    #[test]
    fn inversion_is_zero_for_planar_center() {
        let inversion = Inversion {
            i: 0,
            j: 1,
            k: 2,
            l: 3,
            force_constant: 2.0,
        };
        let planar = [1.0, 0.0, 0.0, 0.0, 0.0, 0.0, -0.5, 0.8, 0.0, -0.5, -0.8, 0.0];
        assert!(inversion.energy(&planar).abs() < 1e-12);
        assert!(inversion.energy(&SKEWED) > 0.0);
        assert_gradient_matches(&inversion, &SKEWED);
    }

    #[test]
    fn vdw_gradient_matches_finite_difference() {
        let pair = VdwPair {
            i: 0,
            j: 1,
            r_min: 3.8,
            well_depth: 0.1,
        };
        assert_gradient_matches(&pair, &[0.0, 0.0, 0.0, 2.9, 1.0, -0.4]);
    }
}
