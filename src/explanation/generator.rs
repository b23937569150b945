//! Explanation generator
//!
//! Consumes a finished `GuildScoreResult` and never changes a score.

use std::cmp::Reverse;

use super::fragments::{data_gap, network, soil, structure, veto};
use super::types::Explanation;
use crate::scorer::GuildScoreResult;

/// Human-readable feedback for a scored or vetoed guild, most severe first
/// and in metric order within one severity. Guild-wide notes precede metric
/// notes of the same severity.
pub fn explain(result: &GuildScoreResult) -> Vec<Explanation> {
    let scored = match result {
        GuildScoreResult::Veto(report) => return vec![veto::explain_veto(report)],
        GuildScoreResult::Scored(scored) => scored,
    };

    let mut explanations = Vec::new();
    explanations.extend(veto::explain_drift(scored));
    explanations.extend(network::explain_network(scored));
    explanations.extend(structure::explain_structure(scored));
    explanations.extend(soil::explain_soil(scored));
    explanations.extend(scored.low_confidence.iter().copied().map(data_gap));

    explanations.sort_by_key(|e| (Reverse(e.severity), e.metric));
    explanations
}
