//! METRIC N2: SHARED HERBIVORES
//!
//! Same construction as N1 over herbivores, with a lower per-organism
//! severity. Any organism that pollinates or visits the flowers of a guild
//! member is dropped first, so N2 and P6 work on largely disjoint sets.

use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::config::MetricConstants;
use crate::guild::Guild;
use crate::utils::{count_shared_organisms, saturate, shared_organisms, SharedOrganism};

/// Result of N2 calculation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct N2Result {
    pub raw: f64,
    pub penalty: f64,
    pub shared: Vec<SharedOrganism>,
    /// Herbivore records dropped because the organism visits a member's flowers
    pub excluded_visitors: usize,
    pub data_available: bool,
}

pub fn calculate_n2(guild: &Guild<'_>, constants: &MetricConstants) -> N2Result {
    let n = guild.len() as f64;

    let visitors: FxHashSet<&str> = guild.profiles().iter().flat_map(|p| p.visitors()).collect();
    let visitors = &visitors;

    let excluded_visitors = guild
        .profiles()
        .iter()
        .flat_map(|p| p.herbivores.iter())
        .filter(|h| visitors.contains(h.as_str()))
        .map(String::as_str)
        .collect::<FxHashSet<&str>>()
        .len();

    let counts = count_shared_organisms(guild.profiles(), move |p| {
        p.herbivores
            .iter()
            .map(String::as_str)
            .filter(move |h| !visitors.contains(h))
    });

    let shared = shared_organisms(&counts, 2);
    let penalty: f64 = shared
        .iter()
        .map(|o| {
            let overlap = o.count as f64 / n;
            overlap * overlap * constants.herbivore_severity
        })
        .sum();

    N2Result {
        raw: saturate(penalty, constants.n2_scale),
        penalty,
        shared,
        excluded_visitors,
        // Only herbivores that survive the visitor filter count as data
        data_available: !counts.is_empty(),
    }
}
