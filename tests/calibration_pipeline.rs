//! Calibrate, publish, promote, then score against the loaded tables

mod common;

use common::{ids, names, FixtureBuilder, Plant};
use guild_compat::calibration::{profile_name, CalibrationError};
use guild_compat::config::MetricConstants;
use guild_compat::types::{FungalRole, GrowthForm};
use guild_compat::{
    CalibrationSet, CalibrationStore, Calibrator, ClimateTier, EngineConfig, GuildData, GuildScorer, GuildWarning,
    MetricId,
};
use std::sync::Arc;
use tempfile::tempdir;

const FAMILIES: [&str; 5] = ["Rosaceae", "Fabaceae", "Fagaceae", "Lamiaceae", "Poaceae"];
const FORMS: [GrowthForm; 3] = [GrowthForm::Herb, GrowthForm::Shrub, GrowthForm::Tree];

/// Thirty deterministic species; the first ten are also arid-tolerant and
/// two are tropical only
fn species_pool() -> Vec<Plant> {
    let pathogens = names("pathogen", 6);
    let herbivores = names("herbivore", 8);
    let bees = names("bee", 4);

    let mut plants: Vec<Plant> = (0..30)
        .map(|i| {
            let tiers: &[ClimateTier] = if i < 10 {
                &[ClimateTier::HumidTemperate, ClimateTier::Arid]
            } else {
                &[ClimateTier::HumidTemperate]
            };
            let mut plant = Plant::new(&format!("wfo-{:03}", i), FAMILIES[i % FAMILIES.len()])
                .tiers(tiers)
                .form(FORMS[i % FORMS.len()], 0.5 + (i % 7) as f64 * 2.0, 2.0 + (i % 6) as f64)
                .csr(20.0 + (i * 7 % 60) as f64, 30.0, 50.0 - (i * 7 % 60) as f64 / 2.0)
                .ph(5.0 + (i % 5) as f64 * 0.5)
                .eigenvectors(vec![(i % 3) as f64, (i % 5) as f64 * 0.5, (i % 7) as f64 * 0.25])
                .fungi(FungalRole::Pathogenic, &pathogens[i % 3..i % 3 + 2])
                .fungi(FungalRole::Amf, &["glomus"][..(i % 2)])
                .herbivores(&herbivores[i % 4..i % 4 + 3])
                .pollinators(&bees[..(i % 4)]);
            if i % 4 == 0 {
                plant = plant.fixer();
            }
            if i % 6 == 0 {
                plant = plant.predators(&["lacewing"]);
            }
            plant
        })
        .collect();

    plants.push(Plant::new("wfo-palm-1", "Arecaceae").tiers(&[ClimateTier::Tropical]));
    plants.push(Plant::new("wfo-palm-2", "Arecaceae").tiers(&[ClimateTier::Tropical]));
    plants
}

fn fixture() -> (Vec<Plant>, GuildData) {
    let plants = species_pool();
    let builder = names("herbivore", 8)
        .iter()
        .fold(FixtureBuilder::new().plants(plants.clone()), |b, h| {
            b.herbivore_predators(h, &["lacewing"])
        });
    (plants, builder.build())
}

fn calibrate(data: &GuildData, seed: u64) -> CalibrationSet {
    Calibrator::new(data, &EngineConfig::default())
        .with_seed(seed)
        .calibrate_set(&[3, 5], 300, &ClimateTier::ALL)
        .unwrap()
}

#[test]
fn test_calibration_covers_qualifying_tiers_only() {
    let (_, data) = fixture();
    let set = calibrate(&data, 7);

    let profile = set.profile("5plant").unwrap();
    let tiers: Vec<ClimateTier> = profile.tiers.keys().copied().collect();
    assert_eq!(tiers, vec![ClimateTier::HumidTemperate, ClimateTier::Arid]);

    let table = &profile.tiers[&ClimateTier::HumidTemperate];
    assert_eq!(table.n_samples, 300);
    assert_eq!(table.seed, 7);
    assert_eq!(table.metrics.len(), MetricId::ALL.len());
    for (metric, percentiles) in &table.metrics {
        assert!(percentiles.is_monotonic(), "{} not monotonic", metric);
    }
    assert!(set.validate().is_ok());
}

#[test]
fn test_fixed_seed_reproduces_tables() {
    let (_, data) = fixture();
    let a = calibrate(&data, 1234);
    let b = calibrate(&data, 1234);
    let c = calibrate(&data, 4321);

    assert_eq!(a.profiles, b.profiles);
    assert_ne!(a.profiles, c.profiles);
}

#[test]
fn test_publish_promote_and_score() {
    let (plants, data) = fixture();
    let dir = tempdir().unwrap();
    let store = CalibrationStore::new(dir.path().join("calibration"));

    let set = calibrate(&data, 99);
    let path = store.publish(&set).unwrap();
    assert!(path.exists());
    assert_eq!(store.current_version().unwrap(), None);

    store.promote(&set.version).unwrap();
    assert_eq!(store.current_version().unwrap().as_deref(), Some(set.version.as_str()));
    assert_eq!(store.list_versions().unwrap(), vec![set.version.clone()]);

    let loaded = store.load_current().unwrap();
    assert_eq!(loaded.version, set.version);
    assert_eq!(loaded.data_fingerprint, set.data_fingerprint);
    assert_eq!(
        loaded.profiles.keys().collect::<Vec<_>>(),
        vec![&profile_name(3), &profile_name(5)]
    );

    let scorer = GuildScorer::new(Arc::new(data), Arc::new(loaded), &EngineConfig::default()).unwrap();
    assert!(!scorer.calibration_drift());

    let guild = ids(&plants[..5]);
    let result = scorer.score_guild(&guild, "5plant").unwrap();
    let scored = result.scored().unwrap();
    assert_eq!(scored.calibration_version, set.version);
    assert_eq!(scored.calibration_tier, ClimateTier::HumidTemperate);
    assert!((-1.0..=1.0).contains(&scored.guild_score));
    assert!(!scored
        .warnings
        .iter()
        .any(|w| matches!(w, GuildWarning::CalibrationDrift { .. })));
}

#[test]
fn test_changed_data_is_reported_as_drift() {
    let (mut plants, data) = fixture();
    let set = Arc::new(calibrate(&data, 5));

    plants[0] = plants[0].clone().ph(8.0);
    let refreshed = FixtureBuilder::new().plants(plants.clone()).build();
    assert_ne!(refreshed.fingerprint(), data.fingerprint());

    let scorer = GuildScorer::new(Arc::new(refreshed), set, &EngineConfig::default()).unwrap();
    assert!(scorer.calibration_drift());

    let result = scorer.score_guild(&ids(&plants[..3]), "3plant").unwrap();
    let warning = result
        .scored()
        .unwrap()
        .warnings
        .iter()
        .find(|w| matches!(w, GuildWarning::CalibrationDrift { .. }))
        .cloned();
    assert!(matches!(warning, Some(GuildWarning::CalibrationDrift { .. })));
}

#[test]
fn test_published_version_is_never_overwritten() {
    let (_, data) = fixture();
    let dir = tempdir().unwrap();
    let store = CalibrationStore::new(dir.path());

    let set = calibrate(&data, 3);
    store.publish(&set).unwrap();
    assert!(store.publish(&set).is_err());
    assert_eq!(store.list_versions().unwrap().len(), 1);
}

#[test]
fn test_stale_formula_is_rejected_on_load() {
    let (_, data) = fixture();
    let dir = tempdir().unwrap();
    let store = CalibrationStore::new(dir.path());

    let mut set = calibrate(&data, 11);
    set.formula_version = 0;
    std::fs::write(store.path_for(&set.version).unwrap(), serde_json::to_vec(&set).unwrap()).unwrap();

    let err = store.load(&set.version).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CalibrationError>(),
        Some(CalibrationError::StaleFormula { found: 0, .. })
    ));
    assert!(store.promote(&set.version).is_err());
    assert_eq!(store.current_version().unwrap(), None);
}

#[test]
fn test_retuned_constants_refuse_published_calibration() {
    let (plants, data) = fixture();
    let dir = tempdir().unwrap();
    let store = CalibrationStore::new(dir.path());

    let set = calibrate(&data, 21);
    assert_eq!(set.constants, MetricConstants::default());
    store.publish(&set).unwrap();
    store.promote(&set.version).unwrap();

    let retuned = EngineConfig {
        constants: MetricConstants {
            n1_scale: 0.5,
            generalist_severity: 3.0,
            ..MetricConstants::default()
        },
        ..EngineConfig::default()
    };

    let loaded = Arc::new(store.load_current().unwrap());
    let data = Arc::new(data);
    assert!(matches!(
        GuildScorer::new(Arc::clone(&data), Arc::clone(&loaded), &retuned),
        Err(CalibrationError::ConstantsMismatch { .. })
    ));

    let err = store
        .clone()
        .with_constants(retuned.constants.clone())
        .load_current()
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CalibrationError>(),
        Some(CalibrationError::ConstantsMismatch { fields }) if fields == &["n1_scale", "generalist_severity"]
    ));

    // The scorer matching the sampling constants still serves results
    let scorer = GuildScorer::new(data, loaded, &EngineConfig::default()).unwrap();
    assert!(scorer.score_guild(&ids(&plants[..3]), "3plant").unwrap().scored().is_some());
}
