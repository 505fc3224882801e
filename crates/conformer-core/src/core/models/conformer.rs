use nalgebra::{Point3, Vector3};

/// One 3D geometry of a molecule: a position for every atom, in Angstroms.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Conformer {
    positions: Vec<Point3<f64>>,
}

impl Conformer {
    pub fn new(positions: Vec<Point3<f64>>) -> Self {
        Self { positions }
    }

    /// Builds a conformer from a flat `[x0, y0, z0, x1, ...]` coordinate array.
    pub fn from_flat(coords: &[f64]) -> Self {
        let positions = coords
            .chunks_exact(3)
            .map(|c| Point3::new(c[0], c[1], c[2]))
            .collect();
        Self { positions }
    }

    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    pub fn positions_mut(&mut self) -> &mut [Point3<f64>] {
        &mut self.positions
    }

    pub fn position(&self, atom: usize) -> Option<&Point3<f64>> {
        self.positions.get(atom)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn to_flat(&self) -> Vec<f64> {
        self.positions
            .iter()
            .flat_map(|p| [p.x, p.y, p.z])
            .collect()
    }

    pub fn centroid(&self) -> Option<Point3<f64>> {
        if self.positions.is_empty() {
            return None;
        }
        let sum: Vector3<f64> = self.positions.iter().map(|p| p.coords).sum();
        Some(Point3::from(sum / self.positions.len() as f64))
    }

    pub fn distance(&self, a: usize, b: usize) -> f64 {
        (self.positions[a] - self.positions[b]).norm()
    }

    pub fn is_finite(&self) -> bool {
        self.positions
            .iter()
            .all(|p| p.x.is_finite() && p.y.is_finite() && p.z.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_coordinates_convert_both_ways() {
        let flat = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let conformer = Conformer::from_flat(&flat);
        assert_eq!(conformer.len(), 2);
        assert_eq!(conformer.positions()[1], Point3::new(3.0, 4.0, 5.0));
        assert_eq!(conformer.to_flat(), flat.to_vec());
    }

    #[test]
    fn centroid_is_mean_position() {
        let conformer = Conformer::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 4.0, -6.0),
        ]);
        assert_eq!(conformer.centroid(), Some(Point3::new(1.0, 2.0, -3.0)));
        assert_eq!(Conformer::default().centroid(), None);
    }

    #[test]
    fn is_finite_detects_nan_positions() {
        let mut conformer = Conformer::new(vec![Point3::origin(); 2]);
        assert!(conformer.is_finite());
        conformer.positions_mut()[1].y = f64::NAN;
        assert!(!conformer.is_finite());
    }

    #[test]
    fn distance_between_atoms() {
        let conformer = Conformer::new(vec![Point3::origin(), Point3::new(3.0, 4.0, 0.0)]);
        assert!((conformer.distance(0, 1) - 5.0).abs() < 1e-12);
    }
}
