//! METRIC P4: PHYLOGENETIC DIVERSITY
//!
//! Mean pairwise Euclidean distance over the leading phylogenetic
//! eigenvector components, squashed with tanh(d/3). Distances come from the
//! eigen-decomposition of the phylogeny, so same-family/different-genus
//! guilds are ranked by how deep their divergence actually is rather than
//! by family counts.

use serde::Serialize;

use crate::config::MetricConstants;
use crate::guild::Guild;
use crate::utils::saturate;

/// Result of P4 calculation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct P4Result {
    pub raw: f64,
    pub mean_distance: f64,
    /// Pairs where both members have eigenvectors
    pub pairs: usize,
    pub data_available: bool,
}

pub fn calculate_p4(guild: &Guild<'_>, constants: &MetricConstants) -> P4Result {
    let k = constants.eigenvector_count;
    let vectors: Vec<&[f64]> = guild
        .members()
        .iter()
        .filter_map(|m| m.phylo_eigenvectors.as_deref())
        .map(|ev| &ev[..ev.len().min(k)])
        .collect();

    let mut total = 0.0;
    let mut pairs = 0;
    for i in 0..vectors.len() {
        for j in i + 1..vectors.len() {
            total += euclidean(vectors[i], vectors[j]);
            pairs += 1;
        }
    }

    if pairs == 0 {
        return P4Result {
            raw: 0.0,
            mean_distance: 0.0,
            pairs: 0,
            data_available: false,
        };
    }

    let mean_distance = total / pairs as f64;
    P4Result {
        raw: saturate(mean_distance, constants.p4_scale),
        mean_distance,
        pairs,
        data_available: true,
    }
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}
