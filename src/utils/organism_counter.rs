//! Shared Organism Counter Utility
//!
//! Counts how many guild members host/associate with each organism. Guild-level
//! metrics (N1, N2, P3, P6) are all built on these counts rather than on
//! pairwise comparisons.

use rustc_hash::FxHashMap;
use serde::Serialize;
use smallvec::SmallVec;

use crate::types::OrganismProfile;

/// An organism carried by `count` members of the guild
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SharedOrganism {
    pub name: String,
    pub count: usize,
}

/// Count organisms across guild members
///
/// `select` yields the organisms of interest for one member; an organism
/// listed several times on one member (e.g. as both pollinator and flower
/// visitor) counts once for that member.
///
/// Returns a map of organism → member count
pub fn count_shared_organisms<'a, F, I>(
    profiles: &[&'a OrganismProfile],
    select: F,
) -> FxHashMap<&'a str, usize>
where
    F: Fn(&'a OrganismProfile) -> I,
    I: Iterator<Item = &'a str>,
{
    let mut counts: FxHashMap<&'a str, usize> = FxHashMap::default();

    for profile in profiles {
        // Most members carry fewer than 16 organisms of one kind
        let mut member_organisms: SmallVec<[&'a str; 16]> =
            select(*profile).filter(|o| !o.trim().is_empty()).collect();

        member_organisms.sort_unstable();
        member_organisms.dedup();

        for organism in member_organisms {
            *counts.entry(organism).or_insert(0) += 1;
        }
    }

    counts
}

/// Organisms carried by at least `min_count` members, most widely shared
/// first (ties by name)
pub fn shared_organisms(counts: &FxHashMap<&str, usize>, min_count: usize) -> Vec<SharedOrganism> {
    let mut shared: Vec<SharedOrganism> = counts
        .iter()
        .filter(|&(_, &count)| count >= min_count)
        .map(|(&name, &count)| SharedOrganism {
            name: name.to_string(),
            count,
        })
        .collect();

    shared.sort_unstable_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    shared
}
