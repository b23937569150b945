//! Score composer
//!
//! ```text
//! negative_risk    = Σ w_i · normalized(N_i)    i ∈ {N1, N2, N4, N5, N6}
//! positive_benefit = Σ w_j · normalized(P_j)    j ∈ {P1 .. P6}
//! guild_score      = clamp(positive_benefit - negative_risk, -1, 1)
//! ```
//!
//! N4 (CSR conflict) and P5 (stratification) partly measure the same thing:
//! tall competitors shading out the rest of the guild. `n4_p5_overlap_discount`
//! shrinks both weights by that factor and hands the removed mass to the
//! other metrics on the same side, so each side still sums to 1.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::metrics::{MetricId, MetricMap};

const SUM_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    #[serde(default = "default_n1")]
    pub n1: f64,
    #[serde(default = "default_n2")]
    pub n2: f64,
    #[serde(default = "default_n4")]
    pub n4: f64,
    #[serde(default = "default_n5")]
    pub n5: f64,
    #[serde(default = "default_n6")]
    pub n6: f64,
    #[serde(default = "default_p1")]
    pub p1: f64,
    #[serde(default = "default_p2")]
    pub p2: f64,
    #[serde(default = "default_p3")]
    pub p3: f64,
    #[serde(default = "default_p4")]
    pub p4: f64,
    #[serde(default = "default_p5")]
    pub p5: f64,
    #[serde(default = "default_p6")]
    pub p6: f64,
    /// Fraction in [0, 1) removed from the N4 and P5 weights
    #[serde(default)]
    pub n4_p5_overlap_discount: f64,
}

fn default_n1() -> f64 { 0.35 }
fn default_n2() -> f64 { 0.35 }
fn default_n4() -> f64 { 0.18 }
fn default_n5() -> f64 { 0.06 }
fn default_n6() -> f64 { 0.06 }
fn default_p1() -> f64 { 0.25 }
fn default_p2() -> f64 { 0.20 }
fn default_p3() -> f64 { 0.15 }
fn default_p4() -> f64 { 0.20 }
fn default_p5() -> f64 { 0.11 }
fn default_p6() -> f64 { 0.09 }

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            n1: default_n1(),
            n2: default_n2(),
            n4: default_n4(),
            n5: default_n5(),
            n6: default_n6(),
            p1: default_p1(),
            p2: default_p2(),
            p3: default_p3(),
            p4: default_p4(),
            p5: default_p5(),
            p6: default_p6(),
            n4_p5_overlap_discount: 0.0,
        }
    }
}

impl ScoreWeights {
    /// Configured weight, before the overlap discount
    pub fn base(&self, metric: MetricId) -> f64 {
        match metric {
            MetricId::N1 => self.n1,
            MetricId::N2 => self.n2,
            MetricId::N4 => self.n4,
            MetricId::N5 => self.n5,
            MetricId::N6 => self.n6,
            MetricId::P1 => self.p1,
            MetricId::P2 => self.p2,
            MetricId::P3 => self.p3,
            MetricId::P4 => self.p4,
            MetricId::P5 => self.p5,
            MetricId::P6 => self.p6,
        }
    }

    /// Weights actually applied, after the overlap discount
    pub fn effective(&self) -> MetricMap {
        let mut weights = MetricMap::new();
        for (side, discounted) in [(&MetricId::RISKS[..], MetricId::N4), (&MetricId::BENEFITS[..], MetricId::P5)] {
            let removed = self.base(discounted) * self.n4_p5_overlap_discount;
            let others: f64 = side
                .iter()
                .filter(|m| **m != discounted)
                .map(|m| self.base(*m))
                .sum();
            let boost = if others > 0.0 { 1.0 + removed / others } else { 1.0 };

            for &metric in side {
                let weight = if metric == discounted {
                    self.base(metric) - removed
                } else {
                    self.base(metric) * boost
                };
                weights.insert(metric, weight);
            }
        }
        weights
    }

    pub fn validate(&self) -> Result<()> {
        let d = self.n4_p5_overlap_discount;
        if !(0.0..1.0).contains(&d) {
            bail!("weights.n4_p5_overlap_discount must be in [0, 1), got {}", d);
        }

        for (name, side) in [("risk", &MetricId::RISKS[..]), ("benefit", &MetricId::BENEFITS[..])] {
            if let Some(m) = side.iter().find(|m| self.base(**m) < 0.0) {
                bail!("weights.{} is negative", m);
            }
            let sum: f64 = side.iter().map(|m| self.base(*m)).sum();
            if (sum - 1.0).abs() > SUM_TOLERANCE {
                bail!("{} weights must sum to 1.0, got {:.6}", name, sum);
            }
        }
        Ok(())
    }
}

/// Final score with its two components
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComposedScore {
    pub guild_score: f64,
    pub negative_risk: f64,
    pub positive_benefit: f64,
}

/// Combine normalized metrics (each in [0, 1]) into the final score
pub fn compose(normalized: &MetricMap, weights: &ScoreWeights) -> ComposedScore {
    let effective = weights.effective();
    let side_sum = |side: &[MetricId]| -> f64 {
        side.iter()
            .map(|m| effective[m] * normalized.get(m).copied().unwrap_or(0.0))
            .sum()
    };

    let negative_risk = side_sum(&MetricId::RISKS);
    let positive_benefit = side_sum(&MetricId::BENEFITS);

    ComposedScore {
        guild_score: (positive_benefit - negative_risk).clamp(-1.0, 1.0),
        negative_risk,
        positive_benefit,
    }
}
