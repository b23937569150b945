//! METRIC N6: SOIL pH INCOMPATIBILITY
//!
//! Members whose preferred surface soil pH differs widely cannot all be
//! satisfied by one bed. Range over members with pH data:
//!   >2.5  1.0 (incompatible)
//!   >1.5  0.5
//!   else  0.0

use serde::Serialize;

use crate::guild::Guild;

pub const INCOMPATIBLE_ABOVE: f64 = 2.5;
pub const STRAINED_ABOVE: f64 = 1.5;

/// Result of N6 calculation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct N6Result {
    pub raw: f64,
    pub ph_min: Option<f64>,
    pub ph_max: Option<f64>,
    pub range: f64,
    pub data_available: bool,
}

pub fn calculate_n6(guild: &Guild<'_>) -> N6Result {
    let values: Vec<f64> = guild.members().iter().filter_map(|m| m.soil_ph).collect();

    if values.len() < 2 {
        return N6Result {
            raw: 0.0,
            ph_min: values.first().copied(),
            ph_max: values.first().copied(),
            range: 0.0,
            data_available: false,
        };
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    let raw = if range > INCOMPATIBLE_ABOVE {
        1.0
    } else if range > STRAINED_ABOVE {
        0.5
    } else {
        0.0
    };

    N6Result {
        raw,
        ph_min: Some(min),
        ph_max: Some(max),
        range,
        data_available: true,
    }
}
