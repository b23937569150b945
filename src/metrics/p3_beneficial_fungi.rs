//! METRIC P3: SHARED BENEFICIAL FUNGI
//!
//! Common mycorrhizal and endophyte networks linking members. A fungus can
//! play several roles at once (pathogenic on one host, endophytic on
//! another); its roles across the guild are merged and their signed
//! contributions summed, so a fungus only counts when its net role is
//! beneficial.
//!
//!   network  = Σ (count/n) × net weight, over fungi on ≥2 members
//!   coverage = members with ≥1 beneficial fungus / n
//!   raw      = tanh((0.6·network + 0.4·coverage) / 3)
//!
//! Beneficial fungi cannot compensate for a devastating shared pathogen
//! load: when saturated N1 exceeds the dampening threshold the result is
//! halved.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::MetricConstants;
use crate::guild::Guild;
use crate::types::FungalRoles;
use crate::utils::{count_shared_organisms, saturate, SharedOrganism};

/// Result of P3 calculation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct P3Result {
    pub raw: f64,
    /// Value before N1 dampening
    pub undampened: f64,
    pub network: f64,
    pub coverage: f64,
    /// Beneficial fungi on ≥2 members
    pub shared: Vec<SharedOrganism>,
    pub dampened: bool,
    pub data_available: bool,
}

pub fn calculate_p3(guild: &Guild<'_>, constants: &MetricConstants, n1_raw: f64) -> P3Result {
    let n = guild.len() as f64;
    let profiles = guild.profiles();

    let mut guild_roles: BTreeMap<&str, FungalRoles> = BTreeMap::new();
    for profile in profiles {
        for (fungus, roles) in &profile.fungi {
            let merged = guild_roles.entry(fungus.as_str()).or_default();
            *merged = merged.union(*roles);
        }
    }

    let counts = count_shared_organisms(profiles, |p| p.fungi.keys().map(String::as_str));

    let mut network = 0.0;
    let mut shared = Vec::new();
    // BTreeMap order keeps the floating-point sum reproducible
    for (fungus, roles) in &guild_roles {
        let count = counts.get(fungus).copied().unwrap_or(0);
        let weight = roles.net_benefit();
        if count >= 2 && weight > 0.0 {
            network += (count as f64 / n) * weight;
            shared.push(SharedOrganism {
                name: fungus.to_string(),
                count,
            });
        }
    }
    shared.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));

    // Judged by each fungus's merged role, not the role it plays on this member
    let covered = profiles
        .iter()
        .filter(|p| {
            p.fungi.keys().any(|fungus| {
                guild_roles
                    .get(fungus.as_str())
                    .is_some_and(|roles| roles.net_benefit() > 0.0)
            })
        })
        .count();
    let coverage = covered as f64 / n;

    let undampened = saturate(0.6 * network + 0.4 * coverage, constants.p3_scale);
    let dampened = n1_raw > constants.p3_dampening_threshold;
    let raw = if dampened {
        undampened * constants.p3_dampening_factor
    } else {
        undampened
    };

    P3Result {
        raw,
        undampened,
        network,
        coverage,
        shared,
        dampened,
        data_available: !guild_roles.is_empty(),
    }
}
