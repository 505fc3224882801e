use crate::core::forcefield::params::UffParameterSet;
use crate::core::forcefield::provider::{ForceFieldKind, build_force_field};
use crate::core::models::molecule::Molecule;
use crate::core::perception::hydrogens::add_hydrogens;
use crate::core::smiles;
use crate::engine::config::GenerationConfig;
use crate::engine::embedding::embed::{EmbedOptions, prepare_bounds};
use crate::engine::error::EngineError;
use crate::engine::minimize::BfgsOptions;
use crate::engine::progress::ProgressReporter;
use crate::engine::tasks;
use rand::Rng;
use tracing::{info, instrument};

/// Range random seeds are drawn from when none is configured.
const SEED_RANGE: std::ops::RangeInclusive<u64> = 1..=10_000_000;

/// Output of one generation run.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    /// Canonical SMILES of the input molecule.
    pub smiles: String,
    /// The molecule with explicit hydrogens, holding only the selected
    /// conformers in ascending energy order.
    pub molecule: Molecule,
    /// Energy of each selected conformer, in kcal/mol.
    pub energies: Vec<f64>,
    /// Force field actually used for optimization.
    pub force_field: ForceFieldKind,
    /// Seed the embedding used.
    pub seed: u64,
    /// Conformers left after embedding and pruning.
    pub num_embedded: usize,
    pub num_clusters: usize,
    /// Worker threads the run actually had, never zero.
    pub threads: usize,
}

/// Generates low-energy, diverse conformers for one molecule.
///
/// The molecule is canonicalized and given explicit hydrogens on
/// construction; [`ConformerGenerator::run`] then embeds, optimizes, aligns,
/// clusters and down-selects its conformers.
#[derive(Debug, Clone)]
pub struct ConformerGenerator {
    smiles: String,
    molecule: Molecule,
    config: GenerationConfig,
    seed: u64,
}

impl ConformerGenerator {
    pub fn new(smiles: &str, config: GenerationConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let canonical = smiles::canonicalize(smiles)?;
        let molecule = Self::prepare_molecule(&canonical)?;
        let seed = config
            .random_seed
            .unwrap_or_else(|| rand::thread_rng().gen_range(SEED_RANGE));
        Ok(Self {
            smiles: canonical,
            molecule,
            config,
            seed,
        })
    }

    fn prepare_molecule(smiles: &str) -> Result<Molecule, EngineError> {
        let graph = smiles::parse(smiles)?;
        add_hydrogens(&graph).map_err(|e| EngineError::Internal(e.to_string()))
    }

    pub fn smiles(&self) -> &str {
        &self.smiles
    }

    pub fn molecule(&self) -> &Molecule {
        &self.molecule
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn parameters(&self) -> Result<UffParameterSet, EngineError> {
        match &self.config.forcefield_params {
            Some(path) => Ok(UffParameterSet::load(path)?),
            None => Ok(UffParameterSet::builtin()),
        }
    }

    #[instrument(skip_all, name = "conformer_generation_workflow", fields(smiles = %self.smiles, seed = self.seed))]
    pub fn run(&self, reporter: &ProgressReporter) -> Result<GenerationResult, EngineError> {
        let params = self.parameters()?;

        #[cfg(feature = "parallel")]
        let result = {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.threads)
                .build()
                .map_err(|e| EngineError::Internal(format!("failed to build thread pool: {e}")))?;
            pool.install(|| self.run_pipeline(&params, reporter, rayon::current_num_threads()))
        };

        #[cfg(not(feature = "parallel"))]
        let result = self.run_pipeline(&params, reporter, 1);

        result
    }

    fn run_pipeline(
        &self,
        params: &UffParameterSet,
        reporter: &ProgressReporter,
        threads: usize,
    ) -> Result<GenerationResult, EngineError> {
        let mut mol = self.molecule.without_conformers();

        // === Phase 1: Embedding ===
        let num_embedded = reporter.phase("Embedding", || -> Result<usize, EngineError> {
            let bounds = prepare_bounds(&mol, params)?;
            let settings = tasks::embed::EmbedSettings {
                num_conformers: self.config.num_conformers_generated,
                seed: self.seed,
                prune_threshold: self.config.prune_threshold,
                options: EmbedOptions {
                    random_coords: self.config.random_coords,
                    max_attempts: self.config.num_attempts,
                    ..Default::default()
                },
            };
            tasks::embed::run(&mut mol, &bounds, &settings, reporter)
        })?;

        // === Phase 2: Force field optimization ===
        let (energies, force_field) = reporter.phase("Optimization", || -> Result<_, EngineError> {
            let (ff, used) = build_force_field(self.config.force_field, &mol, params)?;
            let energies = tasks::optimize::run(&mut mol, &ff, &BfgsOptions::default(), reporter);
            Ok((energies, used))
        })?;

        // === Phase 3: Alignment and clustering ===
        let clusters = reporter.phase("Clustering", || {
            tasks::align::run(&mut mol);
            tasks::cluster::run(&mol, self.config.cluster_rmsd_tol)
        })?;

        // === Phase 4: Down-selection ===
        let selected =
            tasks::downselect::run(&energies, &clusters, self.config.num_conformers_returned);
        let molecule = mol
            .with_conformers(&selected)
            .map_err(|e| EngineError::Internal(e.to_string()))?;
        let selected_energies: Vec<f64> = selected.iter().map(|&id| energies[id]).collect();

        info!(
            embedded = num_embedded,
            clusters = clusters.len(),
            returned = selected.len(),
            force_field = %force_field,
            "Conformer generation complete."
        );

        Ok(GenerationResult {
            smiles: self.smiles.clone(),
            molecule,
            energies: selected_energies,
            force_field,
            seed: self.seed,
            num_embedded,
            num_clusters: clusters.len(),
            threads,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::forcefield::params::UffParameterSet;
    use crate::core::forcefield::uff::bond_rest_length;
    use crate::core::forcefield::uff::atom_parameters;
    use crate::core::models::element::Element;
    use crate::core::utils::geometry::{dihedral_angle, signed_volume};
    use crate::engine::embedding::stereo::StereoConstraints;
    use crate::engine::progress::Progress;
    use std::sync::Mutex;

    fn small_config(threads: usize) -> GenerationConfig {
        GenerationConfig::builder()
            .num_conformers_generated(12)
            .num_conformers_returned(4)
            .cluster_rmsd_tol(0.5)
            .random_seed(42)
            .threads(threads)
            .build()
            .unwrap()
    }

    #[test]
    fn ethanol_end_to_end() {
        let generator = ConformerGenerator::new("OCC", small_config(1)).unwrap();
        assert_eq!(generator.smiles(), "CCO");
        assert_eq!(generator.molecule().num_atoms(), 9);
        assert_eq!(generator.seed(), 42);

        let result = generator.run(&ProgressReporter::new()).unwrap();
        let mol = &result.molecule;

        assert!(mol.num_conformers() >= 1 && mol.num_conformers() <= 4);
        assert_eq!(result.energies.len(), mol.num_conformers());
        assert!(result.energies.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(result.force_field, ForceFieldKind::Uff);
        assert!(result.num_clusters >= mol.num_conformers());

        let (_, params) = atom_parameters(mol, &UffParameterSet::builtin()).unwrap();
        for conformer in mol.conformers() {
            for bond in mol.bonds() {
                let rest = bond_rest_length(
                    &params[bond.atom1],
                    &params[bond.atom2],
                    bond.order.as_f64(),
                );
                let length = conformer.distance(bond.atom1, bond.atom2);
                assert!((length - rest).abs() < 0.05, "bond {length} vs rest {rest}");
            }
        }
    }

    #[test]
    fn thread_count_does_not_change_the_result() {
        let one = ConformerGenerator::new("CCO", small_config(1))
            .unwrap()
            .run(&ProgressReporter::new())
            .unwrap();
        let four = ConformerGenerator::new("CCO", small_config(4))
            .unwrap()
            .run(&ProgressReporter::new())
            .unwrap();
        assert_eq!(one.energies, four.energies);
        assert_eq!(one.molecule.conformers(), four.molecule.conformers());
    }

    #[test]
    fn zero_threads_records_the_pool_size() {
        let result = ConformerGenerator::new("CCO", small_config(0))
            .unwrap()
            .run(&ProgressReporter::new())
            .unwrap();
        assert!(result.threads >= 1);

        let single = ConformerGenerator::new("CCO", small_config(1))
            .unwrap()
            .run(&ProgressReporter::new())
            .unwrap();
        assert_eq!(single.threads, 1);
    }

    #[test]
    fn trans_double_bond_stays_trans() {
        let result = ConformerGenerator::new("F/C=C/F", small_config(1))
            .unwrap()
            .run(&ProgressReporter::new())
            .unwrap();
        assert_eq!(result.smiles.matches('/').count(), 2);

        let mol = &result.molecule;
        let fluorines: Vec<usize> = (0..mol.num_atoms())
            .filter(|&i| mol.atoms()[i].element == Element::F)
            .collect();
        let carbon = |f: usize| mol.neighbors(f).next().unwrap();
        let (f1, f2) = (fluorines[0], fluorines[1]);
        let (c1, c2) = (carbon(f1), carbon(f2));
        assert!(mol.num_conformers() >= 1);
        for conformer in mol.conformers() {
            let p = |i: usize| conformer.positions()[i];
            let torsion = dihedral_angle(&p(f1), &p(c1), &p(c2), &p(f2));
            assert!(torsion > 170.0, "F-C=C-F dihedral {torsion}");
        }
    }

    #[test]
    fn enantiomers_keep_their_handedness() {
        let generate = |smiles: &str| {
            ConformerGenerator::new(smiles, small_config(1))
                .unwrap()
                .run(&ProgressReporter::new())
                .unwrap()
        };
        let left = generate("C[C@H](N)O");
        let right = generate("C[C@@H](N)O");
        assert_ne!(left.smiles, right.smiles);

        for result in [&left, &right] {
            let stereo = StereoConstraints::from_molecule(&result.molecule);
            assert_eq!(stereo.chiral.len(), 1);
            let center = stereo.chiral[0];
            for conformer in result.molecule.conformers() {
                let [a, b, c, d] = center.points.map(|i| conformer.positions()[i]);
                assert!(center.sign * signed_volume(&a, &b, &c, &d) > 0.0);
            }
        }
    }

    #[test]
    fn reports_every_phase() {
        let events = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|e| {
            if let Progress::PhaseStart { name } = e {
                events.lock().unwrap().push(name);
            }
        }));
        ConformerGenerator::new("C", small_config(1))
            .unwrap()
            .run(&reporter)
            .unwrap();
        drop(reporter);
        assert_eq!(
            events.into_inner().unwrap(),
            vec!["Embedding", "Optimization", "Clustering"]
        );
    }

    #[test]
    fn unseeded_runs_draw_a_seed_in_range() {
        let config = GenerationConfig::default();
        let generator = ConformerGenerator::new("C", config).unwrap();
        assert!(SEED_RANGE.contains(&generator.seed()));
    }

    #[test]
    fn invalid_smiles_is_reported() {
        let err = ConformerGenerator::new("C1CC", GenerationConfig::default()).unwrap_err();
        assert!(matches!(err, EngineError::Smiles(_)));
    }

    #[test]
    fn missing_parameter_file_is_reported() {
        let config = GenerationConfig {
            forcefield_params: Some("/nonexistent/uff.toml".into()),
            random_seed: Some(1),
            ..Default::default()
        };
        let generator = ConformerGenerator::new("C", config).unwrap();
        let err = generator.run(&ProgressReporter::new()).unwrap_err();
        assert!(matches!(err, EngineError::Parameters(_)));
    }
}
