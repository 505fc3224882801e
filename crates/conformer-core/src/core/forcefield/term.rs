/// Force-field energy split by interaction type, in kcal/mol.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EnergyTerm {
    pub bond: f64,
    pub angle: f64,
    pub torsion: f64,
    pub inversion: f64,
    pub vdw: f64,
}

impl EnergyTerm {
    pub fn new(bond: f64, angle: f64, torsion: f64, inversion: f64, vdw: f64) -> Self {
        Self {
            bond,
            angle,
            torsion,
            inversion,
            vdw,
        }
    }

    #[inline]
    pub fn bonded(&self) -> f64 {
        self.bond + self.angle + self.torsion + self.inversion
    }

    #[inline]
    pub fn total(&self) -> f64 {
        self.bonded() + self.vdw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_sums_bonded_and_nonbonded_parts() {
        let term = EnergyTerm::new(1.0, 2.0, 3.0, 0.5, -1.5);
        assert_eq!(term.bonded(), 6.5);
        assert_eq!(term.total(), 5.0);
    }

    #[test]
    fn default_is_zero() {
        assert_eq!(EnergyTerm::default().total(), 0.0);
    }
}
