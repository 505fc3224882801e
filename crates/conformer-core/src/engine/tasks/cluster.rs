use crate::core::models::molecule::Molecule;
use crate::core::utils::geometry::calculate_rmsd;
use crate::engine::error::EngineError;
use std::collections::HashSet;
use tracing::{info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Pairwise RMSD between conformers on their current coordinates, as a
/// lower triangle in the order (1,0), (2,0), (2,1), (3,0), ...
///
/// Conformers are expected to be aligned onto conformer 0 already, so the
/// entries against conformer 0 are the alignment RMSDs.
#[instrument(skip_all, name = "rms_matrix_task", fields(conformers = mol.num_conformers()))]
pub fn rms_matrix(mol: &Molecule) -> Vec<f64> {
    let n = mol.num_conformers();
    let pairs: Vec<(usize, usize)> = (1..n).flat_map(|i| (0..i).map(move |j| (i, j))).collect();
    let conformers = mol.conformers();

    #[cfg(not(feature = "parallel"))]
    let iterator = pairs.iter();

    #[cfg(feature = "parallel")]
    let iterator = pairs.par_iter();

    iterator
        .map(|&(i, j)| {
            calculate_rmsd(conformers[i].positions(), conformers[j].positions()).unwrap_or(0.0)
        })
        .collect()
}

/// Butina clustering of `n` points from a lower-triangle distance list.
///
/// Points within `threshold` of each other are neighbours. Points with the
/// most neighbours become cluster centroids first (ties go to the higher
/// index), and every cluster lists its centroid first followed by its
/// unassigned neighbours in ascending order. With `reordering`, the
/// neighbour counts of unassigned points are recomputed after each cluster.
pub fn butina(
    distances: &[f64],
    n: usize,
    threshold: f64,
    reordering: bool,
) -> Result<Vec<Vec<usize>>, EngineError> {
    let expected = n * n.saturating_sub(1) / 2;
    if distances.len() != expected {
        return Err(EngineError::Internal(format!(
            "distance list has {} entries, expected {} for {} points",
            distances.len(),
            expected,
            n
        )));
    }

    let mut neighbors: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut idx = 0;
    for i in 0..n {
        for j in 0..i {
            if distances[idx] <= threshold {
                neighbors[i].push(j);
                neighbors[j].push(i);
            }
            idx += 1;
        }
    }
    for list in &mut neighbors {
        list.sort_unstable();
    }

    let mut candidates: Vec<(usize, usize)> = neighbors
        .iter()
        .enumerate()
        .map(|(point, list)| (list.len(), point))
        .collect();
    candidates.sort_unstable_by(|a, b| b.cmp(a));

    let mut assigned = vec![false; n];
    let mut clusters = Vec::new();
    while !candidates.is_empty() {
        let (_, centroid) = candidates.remove(0);
        if assigned[centroid] {
            continue;
        }
        assigned[centroid] = true;
        let mut cluster = vec![centroid];
        for &neighbor in &neighbors[centroid] {
            if !assigned[neighbor] {
                assigned[neighbor] = true;
                cluster.push(neighbor);
            }
        }

        if reordering {
            let affected: HashSet<usize> = cluster
                .iter()
                .flat_map(|&member| neighbors[member].iter().copied())
                .collect();
            for entry in candidates.iter_mut() {
                let point = entry.1;
                if assigned[point] || !affected.contains(&point) {
                    continue;
                }
                neighbors[point].retain(|p| !cluster.contains(p));
                entry.0 = neighbors[point].len();
            }
            candidates.sort_unstable_by(|a, b| b.cmp(a));
        }
        clusters.push(cluster);
    }
    Ok(clusters)
}

/// Clusters the conformers of `mol` with Butina's algorithm (with
/// reordering) on their pairwise RMSD.
#[instrument(skip_all, name = "cluster_task")]
pub fn run(mol: &Molecule, threshold: f64) -> Result<Vec<Vec<usize>>, EngineError> {
    let distances = rms_matrix(mol);
    let clusters = butina(&distances, mol.num_conformers(), threshold, true)?;
    info!(
        conformers = mol.num_conformers(),
        clusters = clusters.len(),
        "Conformer clustering complete."
    );
    Ok(clusters)
}
