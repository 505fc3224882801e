use crate::core::models::conformer::Conformer;
use crate::core::models::molecule::Molecule;
use crate::core::utils::geometry::aligned_rmsd_subset;
use crate::engine::embedding::EmbeddingError;
use crate::engine::embedding::bounds::BoundsMatrix;
use crate::engine::embedding::embed::{DistanceViolation, EmbedOptions, embed_conformer};
use crate::engine::embedding::stereo::StereoConstraints;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use nalgebra::Point3;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Debug, Clone, PartialEq)]
pub struct EmbedSettings {
    pub num_conformers: usize,
    /// Conformer `i` draws from a generator seeded with `seed + i`.
    pub seed: u64,
    /// Heavy-atom RMSD below which a conformer duplicates an earlier one.
    pub prune_threshold: f64,
    pub options: EmbedOptions,
}

/// Embeds up to `settings.num_conformers` conformers into `mol`, replacing
/// any existing ones, and returns how many survived pruning.
#[instrument(skip_all, name = "embed_task", fields(requested = settings.num_conformers))]
pub fn run(
    mol: &mut Molecule,
    bounds: &BoundsMatrix,
    settings: &EmbedSettings,
    reporter: &ProgressReporter,
) -> Result<usize, EngineError> {
    if bounds.len() != mol.num_atoms() {
        return Err(EngineError::Internal(format!(
            "bounds cover {} atoms but the molecule has {}",
            bounds.len(),
            mol.num_atoms()
        )));
    }
    let stereo = StereoConstraints::from_molecule(mol);
    debug!(
        chiral_centers = stereo.chiral.len(),
        stereo_double_bonds = stereo.double_bonds.len(),
        "stereo constraints collected"
    );
    let objective = DistanceViolation::new(bounds).with_stereo(stereo);

    reporter.report(Progress::TaskStart {
        total_steps: settings.num_conformers as u64,
    });

    #[cfg(not(feature = "parallel"))]
    let iterator = 0..settings.num_conformers;

    #[cfg(feature = "parallel")]
    let iterator = (0..settings.num_conformers).into_par_iter();

    let embedded: Vec<Option<Vec<Point3<f64>>>> = iterator
        .map(|i| {
            let mut rng = StdRng::seed_from_u64(settings.seed.wrapping_add(i as u64));
            let coords = embed_conformer(bounds, &objective, &mut rng, &settings.options);
            reporter.report(Progress::TaskIncrement);
            coords
        })
        .collect();

    reporter.report(Progress::TaskFinish);

    let failed = embedded.iter().filter(|c| c.is_none()).count();
    let kept = prune(mol, embedded.into_iter().flatten(), settings.prune_threshold);

    mol.clear_conformers();
    for positions in kept {
        mol.add_conformer(Conformer::new(positions))
            .map_err(|e| EngineError::Internal(e.to_string()))?;
    }

    if mol.num_conformers() == 0 {
        return Err(EmbeddingError::NoConformers {
            attempts: settings.options.max_attempts,
        }
        .into());
    }

    info!(
        embedded = settings.num_conformers - failed,
        failed,
        kept = mol.num_conformers(),
        "Conformer embedding complete."
    );
    Ok(mol.num_conformers())
}

/// Keeps conformers, in order, whose heavy-atom RMSD to every kept conformer
/// is at least `threshold`.
fn prune(
    mol: &Molecule,
    candidates: impl Iterator<Item = Vec<Point3<f64>>>,
    threshold: f64,
) -> Vec<Vec<Point3<f64>>> {
    let mut atoms = mol.heavy_atom_indices();
    if atoms.is_empty() {
        atoms = (0..mol.num_atoms()).collect();
    }

    let mut kept: Vec<Vec<Point3<f64>>> = Vec::new();
    for candidate in candidates {
        let duplicate = kept.iter().any(|existing| {
            aligned_rmsd_subset(&candidate, existing, &atoms).is_some_and(|rmsd| rmsd < threshold)
        });
        if duplicate {
            debug!(kept = kept.len(), "pruned duplicate conformer");
        } else {
            kept.push(candidate);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::forcefield::params::UffParameterSet;
    use crate::core::perception::hydrogens::add_hydrogens;
    use crate::core::smiles::parse;
    use crate::engine::embedding::embed::prepare_bounds;

    fn setup(smiles: &str) -> (Molecule, BoundsMatrix) {
        let mol = add_hydrogens(&parse(smiles).unwrap()).unwrap();
        let bounds = prepare_bounds(&mol, &UffParameterSet::builtin()).unwrap();
        (mol, bounds)
    }

    fn settings(n: usize, prune_threshold: f64) -> EmbedSettings {
        EmbedSettings {
            num_conformers: n,
            seed: 1234,
            prune_threshold,
            options: EmbedOptions::default(),
        }
    }

    #[test]
    fn embeds_requested_number_without_pruning() {
        let (mut mol, bounds) = setup("CCO");
        let kept = run(&mut mol, &bounds, &settings(6, 0.0), &ProgressReporter::new()).unwrap();
        assert_eq!(kept, 6);
        assert_eq!(mol.num_conformers(), 6);
        assert!(mol.conformers().iter().all(|c| c.is_finite()));
    }

    #[test]
    fn rigid_molecule_collapses_to_one_conformer() {
        // Every benzene embedding has the same heavy-atom geometry.
        let (mut mol, bounds) = setup("c1ccccc1");
        let kept = run(&mut mol, &bounds, &settings(5, 0.3), &ProgressReporter::new()).unwrap();
        assert_eq!(kept, 1);
    }

    #[test]
    fn results_are_reproducible_for_a_seed() {
        let (mut a, bounds) = setup("CCCO");
        let mut b = a.clone();
        run(&mut a, &bounds, &settings(4, 0.0), &ProgressReporter::new()).unwrap();
        run(&mut b, &bounds, &settings(4, 0.0), &ProgressReporter::new()).unwrap();
        assert_eq!(a.conformers(), b.conformers());
    }

    #[test]
    fn prune_keeps_first_of_near_duplicates() {
        let (mol, _) = setup("CC");
        let base: Vec<Point3<f64>> = (0..mol.num_atoms())
            .map(|i| Point3::new(i as f64, (i * i) as f64 * 0.3, 0.1 * i as f64))
            .collect();
        let shifted: Vec<Point3<f64>> = base.iter().map(|p| p + nalgebra::Vector3::x()).collect();
        let different: Vec<Point3<f64>> = base
            .iter()
            .enumerate()
            .map(|(i, p)| if i == 1 { p + nalgebra::Vector3::y() * 2.0 } else { *p })
            .collect();

        let kept = prune(
            &mol,
            vec![base.clone(), shifted, different.clone()].into_iter(),
            0.1,
        );
        assert_eq!(kept, vec![base, different]);
    }
}
