//! METRIC P6: SHARED POLLINATORS
//!
//! Pollinators and flower visitors carried by two or more members sustain a
//! larger shared pollinator population. Same quadratic-overlap construction
//! as N2 with the opposite intent.

use serde::Serialize;

use crate::config::MetricConstants;
use crate::guild::Guild;
use crate::types::OrganismProfile;
use crate::utils::{count_shared_organisms, saturate, shared_organisms, SharedOrganism};

/// Result of P6 calculation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct P6Result {
    pub raw: f64,
    pub overlap: f64,
    pub shared: Vec<SharedOrganism>,
    pub data_available: bool,
}

pub fn calculate_p6(guild: &Guild<'_>, constants: &MetricConstants) -> P6Result {
    let n = guild.len() as f64;
    let counts = count_shared_organisms(guild.profiles(), OrganismProfile::visitors);
    let shared = shared_organisms(&counts, 2);

    let overlap: f64 = shared
        .iter()
        .map(|o| {
            let fraction = o.count as f64 / n;
            fraction * fraction
        })
        .sum();

    P6Result {
        raw: saturate(overlap, constants.p6_scale),
        overlap,
        shared,
        data_available: !counts.is_empty(),
    }
}
