use crate::core::forcefield::uff::ForceField;
use crate::core::models::conformer::Conformer;
use crate::core::models::molecule::Molecule;
use crate::engine::minimize::{BfgsOptions, MinimizationError, minimize};
use crate::engine::progress::{Progress, ProgressReporter};
use tracing::{info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

fn optimize_one(
    conformer: &mut Conformer,
    ff: &ForceField,
    options: &BfgsOptions,
) -> Result<f64, MinimizationError> {
    let mut coords = conformer.to_flat();
    let report = minimize(ff, &mut coords, options)?;
    *conformer = Conformer::from_flat(&coords);
    Ok(report.value)
}

/// Minimizes every conformer of `mol` in place and returns their energies in
/// conformer order.
///
/// If any minimization fails, a warning is logged and every conformer is
/// assigned an energy of zero so the remaining pipeline can proceed.
#[instrument(skip_all, name = "optimize_task", fields(conformers = mol.num_conformers()))]
pub fn run(
    mol: &mut Molecule,
    ff: &ForceField,
    options: &BfgsOptions,
    reporter: &ProgressReporter,
) -> Vec<f64> {
    let count = mol.num_conformers();
    reporter.report(Progress::TaskStart {
        total_steps: count as u64,
    });

    #[cfg(not(feature = "parallel"))]
    let iterator = mol.conformers_mut().iter_mut();

    #[cfg(feature = "parallel")]
    let iterator = mol.conformers_mut().par_iter_mut();

    let results: Vec<Result<f64, MinimizationError>> = iterator
        .map(|conformer| {
            let result = optimize_one(conformer, ff, options);
            reporter.report(Progress::TaskIncrement);
            result
        })
        .collect();

    reporter.report(Progress::TaskFinish);

    match results.into_iter().collect::<Result<Vec<f64>, _>>() {
        Ok(energies) => {
            info!(
                lowest = energies.iter().copied().fold(f64::INFINITY, f64::min),
                "Conformer optimization complete."
            );
            energies
        }
        Err(e) => {
            warn!(error = %e, "Error minimizing the molecule, assigning zero energies");
            vec![0.0; count]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::forcefield::params::UffParameterSet;
    use crate::core::perception::hydrogens::add_hydrogens;
    use crate::core::smiles::parse;
    use nalgebra::Point3;

    fn stretched_water() -> (Molecule, ForceField) {
        let mut mol = add_hydrogens(&parse("O").unwrap()).unwrap();
        let ff = ForceField::uff(&mol, &UffParameterSet::builtin()).unwrap();
        for scale in [1.2, 0.8] {
            mol.add_conformer(Conformer::new(vec![
                Point3::origin(),
                Point3::new(0.99 * scale, 0.0, 0.0),
                Point3::new(-0.25 * scale, 0.96 * scale, 0.0),
            ]))
            .unwrap();
        }
        (mol, ff)
    }

    #[test]
    fn every_conformer_is_minimized() {
        let (mut mol, ff) = stretched_water();
        let before: Vec<f64> = mol
            .conformers()
            .iter()
            .map(|c| ff.conformer_energy(c).unwrap())
            .collect();

        let energies = run(&mut mol, &ff, &BfgsOptions::default(), &ProgressReporter::new());

        assert_eq!(energies.len(), 2);
        for (id, (after, start)) in energies.iter().zip(&before).enumerate() {
            assert!(after < start);
            let current = ff.conformer_energy(&mol.conformers()[id]).unwrap();
            assert!((current - after).abs() < 1e-9);
        }
        // Both starting points relax to the same minimum.
        assert!((energies[0] - energies[1]).abs() < 1e-3);
    }

    #[test]
    fn failed_minimization_yields_zero_energies() {
        let (mut mol, ff) = stretched_water();
        // A NaN coordinate makes the energy non-finite.
        mol.conformers_mut()[1].positions_mut()[2].x = f64::NAN;

        let energies = run(&mut mol, &ff, &BfgsOptions::default(), &ProgressReporter::new());
        assert_eq!(energies, vec![0.0, 0.0]);
    }
}
