//! METRIC N5: NITROGEN FIXATION DEFICIT
//!
//! A guild with no nitrogen fixer depends entirely on external inputs.
//! Fixers are species rated High or Moderate-High:
//!   0 fixers  1.0
//!   1 fixer   0.5
//!   ≥2        0.0
//!
//! More than two fixers raises an over-fixation warning (excess nitrate
//! favours weeds and leaches), but does not add to the risk score.

use serde::Serialize;

use crate::guild::Guild;

pub const OVER_FIXATION_ABOVE: usize = 2;

/// Result of N5 calculation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct N5Result {
    pub raw: f64,
    /// Member ids rated as fixers
    pub fixers: Vec<String>,
    pub over_fixation: bool,
    pub data_available: bool,
}

pub fn calculate_n5(guild: &Guild<'_>) -> N5Result {
    let fixers: Vec<String> = guild
        .members()
        .iter()
        .filter(|m| m.nitrogen_fixation.map_or(false, |rating| rating.is_fixer()))
        .map(|m| m.id.clone())
        .collect();

    let raw = match fixers.len() {
        0 => 1.0,
        1 => 0.5,
        _ => 0.0,
    };

    N5Result {
        raw,
        over_fixation: fixers.len() > OVER_FIXATION_ABOVE,
        fixers,
        data_available: guild.members().iter().any(|m| m.nitrogen_fixation.is_some()),
    }
}
