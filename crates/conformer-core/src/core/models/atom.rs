use super::element::Element;

/// Orbital hybridization of an atom, as used for geometry and atom typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Hybridization {
    /// No hybrid orbitals (hydrogen, halogens).
    S,
    /// Linear, e.g. alkyne or nitrile carbons.
    Sp,
    /// Trigonal planar, e.g. alkene, carbonyl and aromatic atoms.
    Sp2,
    /// Tetrahedral.
    Sp3,
    /// Not yet perceived.
    #[default]
    Unspecified,
}

/// Tetrahedral chirality tag.
///
/// The tag is relative to the atom's graph neighbors in bond order, followed
/// by its hydrogen count (or, for a three-coordinate center, its lone pair).
/// Looking from the first of these toward the atom, the rest turn
/// counterclockwise or clockwise. The SMILES parser and writer convert to and
/// from the written neighbor order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Chirality {
    #[default]
    Unspecified,
    /// `@` in SMILES.
    CounterClockwise,
    /// `@@` in SMILES.
    Clockwise,
}

impl Chirality {
    /// The tag of the mirror image.
    pub fn inverted(self) -> Self {
        match self {
            Self::Unspecified => Self::Unspecified,
            Self::CounterClockwise => Self::Clockwise,
            Self::Clockwise => Self::CounterClockwise,
        }
    }

    pub fn is_specified(self) -> bool {
        self != Self::Unspecified
    }
}

/// Represents an atom in a molecular graph.
///
/// Hydrogens can be carried either as explicit atoms in the graph or as
/// counts on their heavy-atom neighbor. `explicit_hydrogens` holds the count
/// written inside a SMILES bracket (`[NH4+]`), `implicit_hydrogens` the count
/// derived from default valences during sanitization.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// The chemical element.
    pub element: Element,
    /// Formal charge in elementary charge units.
    pub formal_charge: i8,
    /// Whether the atom was written as part of an aromatic system.
    pub is_aromatic: bool,
    /// Mass number, when one was given.
    pub isotope: Option<u16>,
    /// Tetrahedral chirality tag.
    pub chirality: Chirality,
    /// Hydrogen count written in a bracket atom.
    pub explicit_hydrogens: u8,
    /// Hydrogen count derived from default valences.
    pub implicit_hydrogens: u8,
    /// Bracket atoms never receive implicit hydrogens.
    pub no_implicit: bool,
    /// Perceived hybridization.
    pub hybridization: Hybridization,
}

impl Atom {
    /// Creates a neutral, non-aromatic atom of the given element.
    pub fn new(element: Element) -> Self {
        Self {
            element,
            formal_charge: 0,
            is_aromatic: false,
            isotope: None,
            chirality: Chirality::default(),
            explicit_hydrogens: 0,
            implicit_hydrogens: 0,
            no_implicit: false,
            hybridization: Hybridization::default(),
        }
    }

    pub fn aromatic(element: Element) -> Self {
        Self {
            is_aromatic: true,
            ..Self::new(element)
        }
    }

    /// Hydrogens attached to this atom that are not explicit graph atoms.
    #[inline]
    pub fn hydrogen_count(&self) -> u8 {
        self.explicit_hydrogens + self.implicit_hydrogens
    }

    #[inline]
    pub fn is_hydrogen(&self) -> bool {
        self.element == Element::H
    }
}
