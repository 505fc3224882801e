use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A chemical element supported by the conformer toolkit.
///
/// The set covers the SMILES organic subset plus hydrogen and silicon, which is
/// everything the UFF atom typer knows how to parameterize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Element {
    H,
    B,
    C,
    N,
    O,
    F,
    Si,
    P,
    S,
    Cl,
    Br,
    I,
}

static ELEMENTS_BY_SYMBOL: phf::Map<&'static str, Element> = phf::phf_map! {
    "H" => Element::H,
    "B" => Element::B,
    "C" => Element::C,
    "N" => Element::N,
    "O" => Element::O,
    "F" => Element::F,
    "Si" => Element::Si,
    "P" => Element::P,
    "S" => Element::S,
    "Cl" => Element::Cl,
    "Br" => Element::Br,
    "I" => Element::I,
};

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unsupported element symbol: '{0}'")]
pub struct ParseElementError(pub String);

impl Element {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        ELEMENTS_BY_SYMBOL.get(symbol).copied()
    }

    pub fn from_atomic_number(number: u8) -> Option<Self> {
        Some(match number {
            1 => Self::H,
            5 => Self::B,
            6 => Self::C,
            7 => Self::N,
            8 => Self::O,
            9 => Self::F,
            14 => Self::Si,
            15 => Self::P,
            16 => Self::S,
            17 => Self::Cl,
            35 => Self::Br,
            53 => Self::I,
            _ => return None,
        })
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::H => "H",
            Self::B => "B",
            Self::C => "C",
            Self::N => "N",
            Self::O => "O",
            Self::F => "F",
            Self::Si => "Si",
            Self::P => "P",
            Self::S => "S",
            Self::Cl => "Cl",
            Self::Br => "Br",
            Self::I => "I",
        }
    }

    pub fn atomic_number(&self) -> u8 {
        match self {
            Self::H => 1,
            Self::B => 5,
            Self::C => 6,
            Self::N => 7,
            Self::O => 8,
            Self::F => 9,
            Self::Si => 14,
            Self::P => 15,
            Self::S => 16,
            Self::Cl => 17,
            Self::Br => 35,
            Self::I => 53,
        }
    }

    /// Covalent radius in Angstroms.
    pub fn covalent_radius(&self) -> f64 {
        match self {
            Self::H => 0.31,
            Self::B => 0.84,
            Self::C => 0.76,
            Self::N => 0.71,
            Self::O => 0.66,
            Self::F => 0.57,
            Self::Si => 1.11,
            Self::P => 1.07,
            Self::S => 1.05,
            Self::Cl => 1.02,
            Self::Br => 1.20,
            Self::I => 1.39,
        }
    }

    /// Van der Waals radius in Angstroms.
    pub fn vdw_radius(&self) -> f64 {
        match self {
            Self::H => 1.20,
            Self::B => 1.92,
            Self::C => 1.70,
            Self::N => 1.55,
            Self::O => 1.52,
            Self::F => 1.47,
            Self::Si => 2.10,
            Self::P => 1.80,
            Self::S => 1.80,
            Self::Cl => 1.75,
            Self::Br => 1.85,
            Self::I => 1.98,
        }
    }

    /// Allowed valences of the neutral element, smallest first.
    pub fn default_valences(&self) -> &'static [u8] {
        match self {
            Self::H | Self::F | Self::Cl | Self::Br | Self::I => &[1],
            Self::B => &[3],
            Self::C | Self::Si => &[4],
            Self::N => &[3],
            Self::O => &[2],
            Self::P => &[3, 5],
            Self::S => &[2, 4, 6],
        }
    }

    /// Allowed valences after accounting for a formal charge.
    ///
    /// A charged atom takes the valences of its isoelectronic neutral
    /// neighbor in the periodic table (N+ behaves like C, O- like F).
    pub fn valences_with_charge(&self, charge: i8) -> &'static [u8] {
        if charge == 0 {
            return self.default_valences();
        }
        let shifted = self.atomic_number() as i16 - charge as i16;
        match u8::try_from(shifted).ok().and_then(Self::from_atomic_number) {
            Some(iso) if iso.is_same_period(self) => iso.default_valences(),
            _ => self.default_valences(),
        }
    }

    /// Whether the element can be written without brackets in SMILES.
    pub fn is_organic_subset(&self) -> bool {
        !matches!(self, Self::H | Self::Si)
    }

    /// Whether the element may appear in lowercase aromatic form.
    pub fn can_be_aromatic(&self) -> bool {
        matches!(self, Self::B | Self::C | Self::N | Self::O | Self::P | Self::S)
    }

    pub fn is_halogen(&self) -> bool {
        matches!(self, Self::F | Self::Cl | Self::Br | Self::I)
    }

    fn period(&self) -> u8 {
        match self.atomic_number() {
            1..=2 => 1,
            3..=10 => 2,
            11..=18 => 3,
            19..=36 => 4,
            _ => 5,
        }
    }

    fn is_same_period(&self, other: &Self) -> bool {
        self.period() == other.period()
    }
}

impl FromStr for Element {
    type Err = ParseElementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_symbol(s).ok_or_else(|| ParseElementError(s.to_string()))
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
