#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum BondOrder {
    #[default]
    Single,
    Double,
    Triple,
    Aromatic,
}

impl BondOrder {
    /// Bond order as a real number, used by UFF rest-length corrections.
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Single => 1.0,
            Self::Double => 2.0,
            Self::Triple => 3.0,
            Self::Aromatic => 1.5,
        }
    }

    /// Contribution of the bond to the explicit valence of each endpoint.
    ///
    /// Aromatic bonds count as one; the extra pi contribution is added per
    /// atom during valence perception.
    pub fn valence_contribution(&self) -> u8 {
        match self {
            Self::Single | Self::Aromatic => 1,
            Self::Double => 2,
            Self::Triple => 3,
        }
    }
}

/// Relative placement of two substituents across a double bond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StereoKind {
    Cis,
    Trans,
}

impl StereoKind {
    pub fn flipped(self) -> Self {
        match self {
            Self::Cis => Self::Trans,
            Self::Trans => Self::Cis,
        }
    }
}

/// Double-bond configuration, stated for one reference neighbor of each end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BondStereo {
    pub kind: StereoKind,
    /// Reference neighbor of `atom1` and of `atom2`.
    pub refs: (usize, usize),
}

impl BondStereo {
    /// Configuration of substituent `a` on the first end and `b` on the
    /// second. Each end carries at most two substituents, so any other
    /// neighbor than the reference one sits on the opposite side.
    pub fn relation(&self, a: usize, b: usize) -> StereoKind {
        if (a != self.refs.0) != (b != self.refs.1) {
            self.kind.flipped()
        } else {
            self.kind
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bond {
    pub atom1: usize,     // Index of the first atom
    pub atom2: usize,     // Index of the second atom
    pub order: BondOrder, // Bond order (e.g., single, double, etc.)
    /// Cis/trans configuration of a stereo double bond.
    pub stereo: Option<BondStereo>,
}

impl Bond {
    pub fn new(atom1: usize, atom2: usize, order: BondOrder) -> Self {
        Self {
            atom1,
            atom2,
            order,
            stereo: None,
        }
    }

    pub fn contains(&self, atom: usize) -> bool {
        self.atom1 == atom || self.atom2 == atom
    }

    /// Returns the endpoint opposite to `atom`, if `atom` is part of the bond.
    pub fn other(&self, atom: usize) -> Option<usize> {
        if self.atom1 == atom {
            Some(self.atom2)
        } else if self.atom2 == atom {
            Some(self.atom1)
        } else {
            None
        }
    }
}
