use nalgebra::{Matrix3, Point3, Rotation3, Vector3};

/// Rigid-body transform that best superposes one point set onto another.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Superposition {
    pub rotation: Rotation3<f64>,
    /// Centroid of the mobile set before the transform.
    pub mobile_centroid: Point3<f64>,
    /// Centroid of the reference set.
    pub reference_centroid: Point3<f64>,
    /// RMSD between the transformed mobile set and the reference.
    pub rmsd: f64,
}

impl Superposition {
    #[inline]
    pub fn transform_point(&self, p: &Point3<f64>) -> Point3<f64> {
        self.reference_centroid + self.rotation * (p - self.mobile_centroid)
    }

    pub fn apply(&self, points: &mut [Point3<f64>]) {
        for p in points.iter_mut() {
            *p = self.transform_point(p);
        }
    }
}

fn centroid(points: &[Point3<f64>]) -> Point3<f64> {
    let sum: Vector3<f64> = points.iter().map(|p| p.coords).sum();
    Point3::from(sum / points.len() as f64)
}

/// Optimal rotation and translation of `mobile` onto `reference` (Kabsch
/// algorithm, with the reflection case corrected to a proper rotation).
///
/// Returns `None` when the sets differ in length or are empty.
pub fn superpose(mobile: &[Point3<f64>], reference: &[Point3<f64>]) -> Option<Superposition> {
    if mobile.len() != reference.len() || mobile.is_empty() {
        return None;
    }
    let mobile_centroid = centroid(mobile);
    let reference_centroid = centroid(reference);

    let mut covariance = Matrix3::zeros();
    for (m, r) in mobile.iter().zip(reference) {
        covariance += (m - mobile_centroid) * (r - reference_centroid).transpose();
    }

    let svd = covariance.svd(true, true);
    let (u, v_t) = (svd.u?, svd.v_t?);
    let v = v_t.transpose();
    let d = (v * u.transpose()).determinant().signum();
    let correction = Matrix3::from_diagonal(&Vector3::new(1.0, 1.0, d));
    let rotation = Rotation3::from_matrix_unchecked(v * correction * u.transpose());

    let mut superposition = Superposition {
        rotation,
        mobile_centroid,
        reference_centroid,
        rmsd: 0.0,
    };
    let squared: f64 = mobile
        .iter()
        .zip(reference)
        .map(|(m, r)| (superposition.transform_point(m) - r).norm_squared())
        .sum();
    superposition.rmsd = (squared / mobile.len() as f64).sqrt();
    Some(superposition)
}

pub fn calculate_rmsd(coords1: &[Point3<f64>], coords2: &[Point3<f64>]) -> Option<f64> {
    if coords1.len() != coords2.len() || coords1.is_empty() {
        return None;
    }
    let n = coords1.len() as f64;
    let squared_dist_sum: f64 = coords1
        .iter()
        .zip(coords2.iter())
        .map(|(p1, p2)| (p1 - p2).norm_squared())
        .sum();
    Some((squared_dist_sum / n).sqrt())
}

/// Dihedral angle of `a-b-c-d` in degrees, in `[0, 180]`.
pub fn dihedral_angle(
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
    d: &Point3<f64>,
) -> f64 {
    let n1 = (b - a).cross(&(c - b));
    let n2 = (c - b).cross(&(d - c));
    n1.angle(&n2).to_degrees()
}

/// Signed volume spanned by `b`, `c` and `d` as seen from `a`.
pub fn signed_volume(
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
    d: &Point3<f64>,
) -> f64 {
    (b - a).dot(&(c - a).cross(&(d - a)))
}

/// RMSD after optimal superposition, restricted to the listed atom indices.
pub fn aligned_rmsd_subset(
    a: &[Point3<f64>],
    b: &[Point3<f64>],
    indices: &[usize],
) -> Option<f64> {
    let pick = |points: &[Point3<f64>]| -> Option<Vec<Point3<f64>>> {
        indices.iter().map(|&i| points.get(i).copied()).collect()
    };
    superpose(&pick(a)?, &pick(b)?).map(|s| s.rmsd)
}
