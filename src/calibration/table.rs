//! Calibration artifacts

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

use super::{CalibrationError, FORMULA_VERSION};
use crate::climate::ClimateTier;
use crate::config::MetricConstants;
use crate::error::ScoringError;
use crate::metrics::MetricId;
use crate::utils::percentile_normalize;

/// `chrono` format of version ids; lexical order is chronological
pub const VERSION_FORMAT: &str = "%Y%m%dT%H%M%S%3fZ";

/// Percentiles recorded for every metric
pub const PERCENTILE_POINTS: [f64; 21] = [
    1.0, 5.0, 10.0, 15.0, 20.0, 25.0, 30.0, 35.0, 40.0, 45.0, 50.0,
    55.0, 60.0, 65.0, 70.0, 75.0, 80.0, 85.0, 90.0, 95.0, 99.0,
];

/// Conventional profile name for a guild size (`"5plant"`)
pub fn profile_name(guild_size: usize) -> String {
    format!("{}plant", guild_size)
}

fn point_key(point: f64) -> String {
    format!("p{}", point as u32)
}

/// Raw metric value at each of `PERCENTILE_POINTS`
///
/// Serialized as `{"p1": .., "p5": .., ..., "p99": ..}`.
#[derive(Debug, Clone, PartialEq)]
pub struct PercentileTable {
    values: Vec<f64>,
}

impl PercentileTable {
    /// Empirical percentiles of a sample: value at p is
    /// sorted[round(p/100 × (len-1))]. Non-finite samples are dropped.
    pub fn from_samples(mut samples: Vec<f64>) -> Option<Self> {
        samples.retain(|v| v.is_finite());
        if samples.is_empty() {
            return None;
        }
        samples.sort_by(f64::total_cmp);

        let last = (samples.len() - 1) as f64;
        let values = PERCENTILE_POINTS
            .iter()
            .map(|p| {
                let idx = (p / 100.0 * last).round() as usize;
                samples[idx.min(samples.len() - 1)]
            })
            .collect();
        Some(Self { values })
    }

    /// Table from explicit values, one per percentile point
    pub fn from_values(values: Vec<f64>) -> Result<Self, CalibrationError> {
        let table = Self { values };
        table.check("-", "-")?;
        Ok(table)
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Raw value recorded at percentile `point`, if it is a table point
    pub fn value_at(&self, point: f64) -> Option<f64> {
        PERCENTILE_POINTS
            .iter()
            .position(|p| *p == point)
            .map(|i| self.values[i])
    }

    /// Percentile rank of `raw` in [0, 1]
    pub fn normalize(&self, raw: f64) -> f64 {
        percentile_normalize(raw, &PERCENTILE_POINTS, &self.values) / 100.0
    }

    pub fn is_monotonic(&self) -> bool {
        self.values.windows(2).all(|w| w[0] <= w[1])
    }

    fn check(&self, tier: &str, metric: &str) -> Result<(), CalibrationError> {
        if self.values.len() != PERCENTILE_POINTS.len() {
            return Err(CalibrationError::WrongLength {
                tier: tier.to_string(),
                metric: metric.to_string(),
                found: self.values.len(),
                expected: PERCENTILE_POINTS.len(),
            });
        }
        if !self.is_monotonic() {
            return Err(CalibrationError::NonMonotonic {
                tier: tier.to_string(),
                metric: metric.to_string(),
            });
        }
        Ok(())
    }
}

impl Serialize for PercentileTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (point, value) in PERCENTILE_POINTS.iter().zip(&self.values) {
            map.serialize_entry(&point_key(*point), value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PercentileTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: BTreeMap<String, f64> = BTreeMap::deserialize(deserializer)?;
        let values = PERCENTILE_POINTS
            .iter()
            .map(|p| {
                let key = point_key(*p);
                raw.get(&key)
                    .copied()
                    .ok_or_else(|| D::Error::custom(format!("missing percentile {}", key)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { values })
    }
}

/// Percentile tables for one climate tier at one guild size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationTable {
    pub tier: ClimateTier,
    pub guild_size: usize,
    pub n_samples: usize,
    pub seed: u64,
    pub metrics: BTreeMap<MetricId, PercentileTable>,
}

impl CalibrationTable {
    pub fn metric(&self, metric: MetricId) -> Result<&PercentileTable, ScoringError> {
        self.metrics.get(&metric).ok_or_else(|| ScoringError::MissingMetric {
            tier: self.tier.to_string(),
            metric: metric.to_string(),
        })
    }

    pub fn validate(&self) -> Result<(), CalibrationError> {
        for (metric, table) in &self.metrics {
            table.check(self.tier.column(), metric.key())?;
        }
        Ok(())
    }
}

/// All tier tables for one guild size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationProfile {
    pub guild_size: usize,
    pub tiers: BTreeMap<ClimateTier, CalibrationTable>,
}

impl CalibrationProfile {
    pub fn table(&self, name: &str, tier: ClimateTier) -> Result<&CalibrationTable, ScoringError> {
        self.tiers.get(&tier).ok_or_else(|| ScoringError::MissingTier {
            profile: name.to_string(),
            tier: tier.to_string(),
        })
    }
}

/// A published calibration version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSet {
    pub formula_version: u32,
    pub version: String,
    pub created_at: DateTime<Utc>,
    /// `GuildData::fingerprint` of the data the samples were drawn from
    pub data_fingerprint: String,
    /// Metric constants every sample was scored with
    pub constants: MetricConstants,
    pub profiles: BTreeMap<String, CalibrationProfile>,
}

impl CalibrationSet {
    pub fn new(
        data_fingerprint: String,
        constants: MetricConstants,
        profiles: BTreeMap<String, CalibrationProfile>,
    ) -> Self {
        let created_at = Utc::now();
        Self {
            formula_version: FORMULA_VERSION,
            version: created_at.format(VERSION_FORMAT).to_string(),
            created_at,
            data_fingerprint,
            constants,
            profiles,
        }
    }

    /// Tables ranked against raw values from other constants are meaningless
    pub fn check_constants(&self, current: &MetricConstants) -> Result<(), CalibrationError> {
        let fields = self.constants.differences(current);
        if fields.is_empty() {
            return Ok(());
        }
        Err(CalibrationError::ConstantsMismatch {
            fields: fields.into_iter().map(str::to_string).collect(),
        })
    }

    pub fn profile(&self, name: &str) -> Result<&CalibrationProfile, ScoringError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ScoringError::UnknownProfile(name.to_string()))
    }

    /// Reject sets from another formula version or with broken tables
    pub fn validate(&self) -> Result<(), CalibrationError> {
        if self.formula_version != FORMULA_VERSION {
            return Err(CalibrationError::StaleFormula {
                found: self.formula_version,
                expected: FORMULA_VERSION,
            });
        }
        for profile in self.profiles.values() {
            for table in profile.tiers.values() {
                table.validate()?;
            }
        }
        Ok(())
    }
}
