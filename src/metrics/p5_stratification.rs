//! METRIC P5: VERTICAL STRATIFICATION
//!
//! Rewards height layering only where the shorter plant can live with it.
//! For every pair whose height difference exceeds 2m, the shorter plant's
//! light preference decides:
//!   <4     valid (shade-tolerant, thrives under the canopy)
//!   4–7    valid at 0.6 weight
//!   >7     invalid (sun-loving, will be shaded out)
//!   missing valid at 0.5 weight
//!
//!   quality = valid height sum / (valid + invalid height sum)
//!   raw     = 0.7·quality + 0.3·(distinct growth forms − 1)/5
//!
//! Kept separate from N4 even though both read height, form and light: N4
//! answers "change the strategy mix?", P5 answers "change the layering?".

use serde::Serialize;
use std::collections::BTreeSet;

use crate::guild::Guild;
use crate::types::GrowthForm;

pub const LAYER_SEPARATION_M: f64 = 2.0;
pub const SHADE_TOLERANT_BELOW: f64 = 4.0;
pub const SUN_DEMANDING_ABOVE: f64 = 7.0;

/// Result of P5 calculation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct P5Result {
    pub raw: f64,
    pub quality: f64,
    pub valid_height: f64,
    pub invalid_height: f64,
    pub distinct_forms: usize,
    /// Shorter members of invalid pairs (shaded-out sun lovers)
    pub shaded_out: Vec<String>,
    pub data_available: bool,
}

pub fn calculate_p5(guild: &Guild<'_>) -> P5Result {
    // Sorted by height; id order (from the guild) breaks ties
    let mut layered: Vec<(f64, Option<f64>, &str)> = guild
        .members()
        .iter()
        .filter_map(|m| m.height_m.map(|h| (h, m.light_pref, m.id.as_str())))
        .collect();
    layered.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut valid_height = 0.0;
    let mut invalid_height = 0.0;
    let mut shaded_out = BTreeSet::new();

    for i in 0..layered.len() {
        for j in i + 1..layered.len() {
            let (short_height, short_light, short_id) = layered[i];
            let diff = layered[j].0 - short_height;
            if diff <= LAYER_SEPARATION_M {
                continue;
            }
            match short_light {
                None => valid_height += diff * 0.5,
                Some(light) if light < SHADE_TOLERANT_BELOW => valid_height += diff,
                Some(light) if light > SUN_DEMANDING_ABOVE => {
                    invalid_height += diff;
                    shaded_out.insert(short_id.to_string());
                }
                Some(_) => valid_height += diff * 0.6,
            }
        }
    }

    let total = valid_height + invalid_height;
    let quality = if total > 0.0 { valid_height / total } else { 0.0 };

    let forms: BTreeSet<GrowthForm> = guild
        .members()
        .iter()
        .map(|m| m.growth_form)
        .filter(|f| *f != GrowthForm::Other)
        .collect();
    let distinct_forms = forms.len();
    let form_diversity = distinct_forms.saturating_sub(1) as f64 / 5.0;

    P5Result {
        raw: (0.7 * quality + 0.3 * form_diversity).clamp(0.0, 1.0),
        quality,
        valid_height,
        invalid_height,
        distinct_forms,
        shaded_out: shaded_out.into_iter().collect(),
        data_available: layered.len() >= 2,
    }
}
