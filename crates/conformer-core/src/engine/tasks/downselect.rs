use tracing::{debug, instrument};

/// Picks the lowest-energy member of every cluster, sorts the picks by
/// energy and keeps at most `max_returned` of them.
///
/// Ties within a cluster go to the member listed first, which is the
/// cluster centroid when it is among the tied members.
#[instrument(skip_all, name = "downselect_task", fields(clusters = clusters.len()))]
pub fn run(energies: &[f64], clusters: &[Vec<usize>], max_returned: usize) -> Vec<usize> {
    let energy = |id: usize| energies.get(id).copied().unwrap_or(f64::INFINITY);

    let mut selected: Vec<usize> = clusters
        .iter()
        .filter_map(|members| {
            members
                .iter()
                .copied()
                .min_by(|&a, &b| energy(a).total_cmp(&energy(b)))
        })
        .collect();

    selected.sort_by(|&a, &b| energy(a).total_cmp(&energy(b)));
    selected.truncate(max_returned);
    debug!(selected = ?selected, "Conformers selected.");
    selected
}
