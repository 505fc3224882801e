use super::params::UffParameterSet;
use super::uff::{ForceField, ForceFieldError};
use crate::core::models::molecule::Molecule;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

/// Force field requested for conformer optimization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ForceFieldKind {
    Mmff94,
    #[default]
    Uff,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown force field '{0}' (expected 'mmff', 'mmff94' or 'uff')")]
pub struct ParseForceFieldError(pub String);

impl FromStr for ForceFieldKind {
    type Err = ParseForceFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mmff" | "mmff94" => Ok(Self::Mmff94),
            "uff" => Ok(Self::Uff),
            _ => Err(ParseForceFieldError(s.to_string())),
        }
    }
}

impl TryFrom<String> for ForceFieldKind {
    type Error = ParseForceFieldError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ForceFieldKind> for String {
    fn from(kind: ForceFieldKind) -> Self {
        kind.to_string()
    }
}

impl fmt::Display for ForceFieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Mmff94 => "mmff",
            Self::Uff => "uff",
        })
    }
}

/// Builds the force field for `mol`, falling back from MMFF94 to UFF when
/// MMFF94 cannot parameterize the molecule.
///
/// Returns the force field together with the kind actually used.
pub fn build_force_field(
    requested: ForceFieldKind,
    mol: &Molecule,
    params: &UffParameterSet,
) -> Result<(ForceField, ForceFieldKind), ForceFieldError> {
    if requested == ForceFieldKind::Mmff94 {
        // No MMFF94 parameter tables are bundled, so every molecule takes the
        // fallback path.
        warn!("MMFF94 parameters are unavailable for this molecule, falling back to UFF");
    }
    let ff = ForceField::uff(mol, params)?;
    Ok((ff, ForceFieldKind::Uff))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::perception::hydrogens::add_hydrogens;
    use crate::core::smiles::parse;

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("MMFF".parse(), Ok(ForceFieldKind::Mmff94));
        assert_eq!("mmff94".parse(), Ok(ForceFieldKind::Mmff94));
        assert_eq!(" Uff ".parse(), Ok(ForceFieldKind::Uff));
        assert_eq!(
            "gaff".parse::<ForceFieldKind>(),
            Err(ParseForceFieldError("gaff".to_string()))
        );
    }

    #[test]
    fn display_round_trips_through_parse() {
        for kind in [ForceFieldKind::Mmff94, ForceFieldKind::Uff] {
            assert_eq!(kind.to_string().parse(), Ok(kind));
        }
    }

    #[test]
    fn serde_uses_string_names() {
        let kind: ForceFieldKind = serde_json::from_str("\"MMFF\"").unwrap();
        assert_eq!(kind, ForceFieldKind::Mmff94);
        assert_eq!(serde_json::to_string(&ForceFieldKind::Uff).unwrap(), "\"uff\"");
        assert!(serde_json::from_str::<ForceFieldKind>("\"amber\"").is_err());
    }

    #[test]
    fn mmff_request_falls_back_to_uff() {
        let mol = add_hydrogens(&parse("CCO").unwrap()).unwrap();
        let params = UffParameterSet::builtin();
        let (ff, used) = build_force_field(ForceFieldKind::Mmff94, &mol, &params).unwrap();
        assert_eq!(used, ForceFieldKind::Uff);
        assert_eq!(ff.num_atoms(), 9);

        let (_, used) = build_force_field(ForceFieldKind::Uff, &mol, &params).unwrap();
        assert_eq!(used, ForceFieldKind::Uff);
    }
}
