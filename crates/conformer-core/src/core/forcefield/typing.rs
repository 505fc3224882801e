use crate::core::models::atom::Hybridization;
use crate::core::models::element::Element;
use crate::core::models::molecule::Molecule;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("No UFF atom type for atom {atom} ({element}, {hybridization:?})")]
pub struct TypingError {
    pub atom: usize,
    pub element: Element,
    pub hybridization: Hybridization,
}

/// Assigns a UFF atom type label to every atom of a molecule whose
/// hybridization has been perceived.
pub fn assign_uff_types(mol: &Molecule) -> Result<Vec<&'static str>, TypingError> {
    (0..mol.num_atoms()).map(|idx| uff_type(mol, idx)).collect()
}

fn uff_type(mol: &Molecule, idx: usize) -> Result<&'static str, TypingError> {
    let atom = &mol.atoms()[idx];
    let hybridization = atom.hybridization;
    let valence = mol.explicit_bond_valence(idx) + atom.hydrogen_count();

    let label = match (atom.element, hybridization) {
        (Element::H, _) => Some("H_"),
        (Element::F, _) => Some("F_"),
        (Element::Cl, _) => Some("Cl"),
        (Element::Br, _) => Some("Br"),
        (Element::I, _) => Some("I_"),
        (Element::B, Hybridization::Sp2) => Some("B_2"),
        (Element::B, Hybridization::Sp3) => Some("B_3"),
        (Element::C | Element::N | Element::O | Element::S, _) if atom.is_aromatic => {
            Some(match atom.element {
                Element::C => "C_R",
                Element::N => "N_R",
                Element::O => "O_R",
                _ => "S_R",
            })
        }
        (Element::C, Hybridization::Sp) => Some("C_1"),
        (Element::C, Hybridization::Sp2) => Some("C_2"),
        (Element::C, Hybridization::Sp3) => Some("C_3"),
        (Element::N, Hybridization::Sp) => Some("N_1"),
        (Element::N, Hybridization::Sp2) => Some("N_2"),
        (Element::N, Hybridization::Sp3) => Some("N_3"),
        (Element::O, Hybridization::Sp) => Some("O_1"),
        (Element::O, Hybridization::Sp2) => Some("O_2"),
        (Element::O, Hybridization::Sp3) => Some("O_3"),
        (Element::Si, Hybridization::Sp3) => Some("Si3"),
        (Element::P, Hybridization::Sp3 | Hybridization::Sp2) => {
            Some(if valence >= 5 { "P_3+5" } else { "P_3+3" })
        }
        (Element::S, Hybridization::Sp2) => Some("S_2"),
        (Element::S, Hybridization::Sp3) => Some(match valence {
            0..=2 => "S_3+2",
            3..=4 => "S_3+4",
            _ => "S_3+6",
        }),
        _ => None,
    };

    label.ok_or(TypingError {
        atom: idx,
        element: atom.element,
        hybridization,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::perception::hydrogens::add_hydrogens;
    use crate::core::smiles::parse;

    fn types(smiles: &str) -> Vec<&'static str> {
        assign_uff_types(&parse(smiles).unwrap()).unwrap()
    }

    #[test]
    fn types_follow_hybridization() {
        assert_eq!(types("CC=CC#N"), vec!["C_3", "C_2", "C_2", "C_1", "N_1"]);
        assert_eq!(types("CO"), vec!["C_3", "O_3"]);
        assert_eq!(types("CC=O"), vec!["C_3", "C_2", "O_2"]);
    }

    #[test]
    fn aromatic_atoms_get_resonance_types() {
        assert_eq!(types("c1ccncc1"), vec!["C_R", "C_R", "C_R", "N_R", "C_R", "C_R"]);
        assert_eq!(types("c1ccsc1")[3], "S_R");
    }

    #[test]
    fn sulfur_and_phosphorus_types_follow_valence() {
        assert_eq!(types("CSC")[1], "S_3+2");
        assert_eq!(types("CS(=O)C")[1], "S_3+4");
        assert_eq!(types("CS(=O)(=O)C")[1], "S_3+6");
        assert_eq!(types("CP(C)C")[1], "P_3+3");
        assert_eq!(types("OP(=O)(O)O")[1], "P_3+5");
    }

    #[test]
    fn explicit_hydrogens_keep_parent_types() {
        let mol = add_hydrogens(&parse("CCO").unwrap()).unwrap();
        let labels = assign_uff_types(&mol).unwrap();
        assert_eq!(&labels[..3], &["C_3", "C_3", "O_3"]);
        assert!(labels[3..].iter().all(|&l| l == "H_"));
    }

    #[test]
    fn unperceived_atoms_are_rejected() {
        let mol = crate::core::smiles::parse_graph("CC").unwrap();
        let err = assign_uff_types(&mol).unwrap_err();
        assert_eq!(err.atom, 0);
        assert_eq!(err.hybridization, Hybridization::Unspecified);
    }
}
