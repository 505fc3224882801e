use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Per-type UFF parameters (Rappé et al., 1992).
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct UffAtomParams {
    /// Valence bond radius in Angstroms.
    pub r1: f64,
    /// Natural valence angle in degrees.
    pub theta0: f64,
    /// Nonbonded distance in Angstroms.
    pub x1: f64,
    /// Nonbonded well depth in kcal/mol.
    pub d1: f64,
    /// Nonbonded shape parameter.
    pub zeta: f64,
    /// Effective charge.
    pub z1: f64,
    /// sp3 torsional barrier.
    pub v1: f64,
    /// sp2 torsional barrier.
    pub u1: f64,
    /// GMP electronegativity.
    pub xi: f64,
}

const fn p(
    r1: f64,
    theta0: f64,
    x1: f64,
    d1: f64,
    zeta: f64,
    z1: f64,
    v1: f64,
    u1: f64,
    xi: f64,
) -> UffAtomParams {
    UffAtomParams {
        r1,
        theta0,
        x1,
        d1,
        zeta,
        z1,
        v1,
        u1,
        xi,
    }
}

static BUILTIN_UFF: phf::Map<&'static str, UffAtomParams> = phf::phf_map! {
    "H_" => p(0.354, 180.0, 2.886, 0.044, 12.0, 0.712, 0.0, 0.0, 4.528),
    "B_3" => p(0.838, 109.47, 4.083, 0.180, 12.052, 1.755, 0.0, 0.0, 5.110),
    "B_2" => p(0.828, 120.0, 4.083, 0.180, 12.052, 1.755, 0.0, 0.0, 5.110),
    "C_3" => p(0.757, 109.47, 3.851, 0.105, 12.73, 1.912, 2.119, 2.0, 5.343),
    "C_R" => p(0.729, 120.0, 3.851, 0.105, 12.73, 1.912, 0.0, 2.0, 5.343),
    "C_2" => p(0.732, 120.0, 3.851, 0.105, 12.73, 1.912, 0.0, 2.0, 5.343),
    "C_1" => p(0.706, 180.0, 3.851, 0.105, 12.73, 1.912, 0.0, 2.0, 5.343),
    "N_3" => p(0.700, 106.7, 3.660, 0.069, 13.407, 2.544, 0.450, 2.0, 6.899),
    "N_R" => p(0.699, 120.0, 3.660, 0.069, 13.407, 2.544, 0.0, 2.0, 6.899),
    "N_2" => p(0.685, 111.2, 3.660, 0.069, 13.407, 2.544, 0.0, 2.0, 6.899),
    "N_1" => p(0.656, 180.0, 3.660, 0.069, 13.407, 2.544, 0.0, 2.0, 6.899),
    "O_3" => p(0.658, 104.51, 3.500, 0.060, 14.085, 2.300, 0.018, 2.0, 8.741),
    "O_R" => p(0.680, 110.0, 3.500, 0.060, 14.085, 2.300, 0.0, 2.0, 8.741),
    "O_2" => p(0.634, 120.0, 3.500, 0.060, 14.085, 2.300, 0.0, 2.0, 8.741),
    "O_1" => p(0.639, 180.0, 3.500, 0.060, 14.085, 2.300, 0.0, 2.0, 8.741),
    "F_" => p(0.668, 180.0, 3.364, 0.050, 14.762, 1.735, 0.0, 2.0, 10.874),
    "Si3" => p(1.117, 109.47, 4.295, 0.402, 12.175, 2.323, 1.225, 1.25, 4.168),
    "P_3+3" => p(1.101, 93.8, 4.147, 0.305, 13.072, 2.863, 2.400, 1.25, 5.463),
    "P_3+5" => p(1.056, 109.47, 4.147, 0.305, 13.072, 2.863, 2.400, 1.25, 5.463),
    "S_3+2" => p(1.064, 92.1, 4.035, 0.274, 13.969, 2.703, 0.484, 1.25, 6.928),
    "S_3+4" => p(1.049, 103.2, 4.035, 0.274, 13.969, 2.703, 0.484, 1.25, 6.928),
    "S_3+6" => p(1.027, 109.47, 4.035, 0.274, 13.969, 2.703, 0.484, 1.25, 6.928),
    "S_R" => p(1.077, 92.2, 4.035, 0.274, 13.969, 2.703, 0.0, 1.25, 6.928),
    "S_2" => p(0.854, 120.0, 4.035, 0.274, 13.969, 2.703, 0.0, 1.25, 6.928),
    "Cl" => p(1.044, 180.0, 3.947, 0.227, 14.866, 2.348, 0.0, 1.25, 8.564),
    "Br" => p(1.192, 180.0, 4.189, 0.251, 15.0, 2.519, 0.0, 0.7, 7.790),
    "I_" => p(1.382, 180.0, 4.500, 0.339, 15.0, 2.650, 0.0, 0.2, 6.822),
};

#[derive(Debug, Error)]
pub enum ParamLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ParameterFile {
    #[serde(default)]
    types: HashMap<String, UffAtomParams>,
}

/// The UFF parameter table: built-in values, optionally overridden or
/// extended per atom type from a TOML file.
#[derive(Debug, Clone, Default)]
pub struct UffParameterSet {
    overrides: HashMap<String, UffAtomParams>,
}

impl UffParameterSet {
    /// The built-in table without overrides.
    pub fn builtin() -> Self {
        Self::default()
    }

    /// Loads overrides from a TOML file with one `[types.<label>]` table per
    /// atom type.
    pub fn load(path: &Path) -> Result<Self, ParamLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| ParamLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let file: ParameterFile = toml::from_str(&content).map_err(|e| ParamLoadError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Ok(Self {
            overrides: file.types,
        })
    }

    pub fn get(&self, label: &str) -> Option<&UffAtomParams> {
        self.overrides
            .get(label)
            .or_else(|| BUILTIN_UFF.get(label))
    }

    pub fn num_overrides(&self) -> usize {
        self.overrides.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn builtin_table_covers_common_types() {
        let params = UffParameterSet::builtin();
        for label in ["H_", "C_3", "C_R", "N_3", "O_2", "S_3+2", "Cl"] {
            assert!(params.get(label).is_some(), "{label}");
        }
        assert_eq!(params.get("C_3").unwrap().theta0, 109.47);
        assert!(params.get("Xx").is_none());
    }

    #[test]
    fn load_overrides_and_extends_builtin_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("uff.toml");
        fs::write(
            &path,
            r#"
            [types.C_3]
            r1 = 0.8
            theta0 = 109.47
            x1 = 3.851
            d1 = 0.105
            zeta = 12.73
            z1 = 1.912
            v1 = 2.119
            u1 = 2.0
            xi = 5.343

            [types."Se3+2"]
            r1 = 1.19
            theta0 = 90.6
            x1 = 4.205
            d1 = 0.291
            zeta = 14.0
            z1 = 2.764
            v1 = 0.335
            u1 = 0.7
            xi = 6.42
            "#,
        )
        .unwrap();

        let params = UffParameterSet::load(&path).unwrap();
        assert_eq!(params.num_overrides(), 2);
        assert_eq!(params.get("C_3").unwrap().r1, 0.8);
        assert_eq!(params.get("Se3+2").unwrap().theta0, 90.6);
        assert_eq!(params.get("N_3").unwrap().r1, 0.700);
    }

    #[test]
    fn load_fails_for_missing_file() {
        let dir = tempdir().unwrap();
        let result = UffParameterSet::load(&dir.path().join("missing.toml"));
        assert!(matches!(result, Err(ParamLoadError::Io { .. })));
    }

    #[test]
    fn load_fails_for_malformed_or_incomplete_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "this is not toml").unwrap();
        assert!(matches!(
            UffParameterSet::load(&path),
            Err(ParamLoadError::Toml { .. })
        ));

        fs::write(&path, "[types.C_3]\nr1 = 0.8\n").unwrap();
        assert!(matches!(
            UffParameterSet::load(&path),
            Err(ParamLoadError::Toml { .. })
        ));
    }
}
