/// Harmonic stretch `k/2 (r - r0)^2` and its derivative with respect to `r`.
#[inline]
pub fn harmonic(dist: f64, r0: f64, k: f64) -> (f64, f64) {
    let dr = dist - r0;
    (0.5 * k * dr * dr, k * dr)
}

#[inline]
pub fn lennard_jones_12_6(dist: f64, r_min: f64, well_depth: f64) -> f64 {
    if dist < 1e-6 {
        return 1e10;
    }
    let rho = r_min / dist;
    let rho6 = rho.powi(6);
    let rho12 = rho6 * rho6;
    well_depth * (rho12 - 2.0 * rho6)
}

/// Derivative of [`lennard_jones_12_6`] with respect to the distance.
#[inline]
pub fn lennard_jones_12_6_derivative(dist: f64, r_min: f64, well_depth: f64) -> f64 {
    if dist < 1e-6 {
        return 0.0;
    }
    let rho = r_min / dist;
    let rho6 = rho.powi(6);
    let rho12 = rho6 * rho6;
    12.0 * well_depth * (rho6 - rho12) / dist
}

/// `cos(n x)` written as a Chebyshev polynomial in `c = cos(x)`, together with
/// its derivative with respect to `c`. Supports the periodicities UFF uses.
#[inline]
pub fn chebyshev_cos(n: u32, c: f64) -> (f64, f64) {
    match n {
        1 => (c, 1.0),
        2 => (2.0 * c * c - 1.0, 4.0 * c),
        3 => (c * (4.0 * c * c - 3.0), 12.0 * c * c - 3.0),
        6 => {
            let c2 = c * c;
            let c4 = c2 * c2;
            (
                32.0 * c4 * c2 - 48.0 * c4 + 18.0 * c2 - 1.0,
                c * (192.0 * c4 - 192.0 * c2 + 36.0),
            )
        }
        _ => {
            let x = c.clamp(-1.0, 1.0).acos();
            let nf = n as f64;
            let sin_x = x.sin();
            let d = if sin_x.abs() < 1e-12 {
                nf * nf * c.signum().powi(n as i32 + 1)
            } else {
                nf * (nf * x).sin() / sin_x
            };
            ((nf * x).cos(), d)
        }
    }
}
