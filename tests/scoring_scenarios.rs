//! End-to-end scoring against hand-checkable fixtures
//!
//! All fixtures use the identity calibration from `common`, so normalized
//! values equal raw values (clamped to 0 below 0.01 and 1 above 0.99).

mod common;

use approx::assert_relative_eq;
use common::{ids, names, scorer, FixtureBuilder, Plant};
use guild_compat::types::{FungalRole, GrowthForm};
use guild_compat::{explain, GuildScoreResult, GuildWarning, MetricId, Severity};

fn axis(i: usize, scale: f64) -> Vec<f64> {
    let mut ev = vec![0.0; 10];
    ev[i] = scale;
    ev
}

/// Five congeners sharing 40 pathogenic fungi and 10 herbivores, all
/// competitors in one canopy layer
fn monoculture_guild() -> Vec<Plant> {
    let fungi = names("fusarium", 40);
    let herbivores = names("weevil", 10);
    (1..=5)
        .map(|i| {
            Plant::new(&format!("wfo-rosa-{}", i), "Rosaceae")
                .csr(70.0, 20.0, 10.0)
                .eigenvectors(vec![0.5; 10])
                .fungi(FungalRole::Pathogenic, &fungi)
                .herbivores(&herbivores)
        })
        .collect()
}

/// Three families, two pathogens shared by two members each, no shared
/// herbivores, a common mycorrhizal partner and pollinators, layered canopy
fn diverse_guild() -> Vec<Plant> {
    let bees = names("bombus", 3);
    let glomus = ["glomus-intraradices"];
    vec![
        Plant::new("wfo-a", "Fabaceae")
            .form(GrowthForm::Herb, 0.5, 3.0)
            .fixer()
            .ph(6.0)
            .eigenvectors(axis(0, 2.2))
            .fungi(FungalRole::Pathogenic, &["pf-1"])
            .herbivores(&["aphid-a"]),
        Plant::new("wfo-b", "Fabaceae")
            .form(GrowthForm::Herb, 0.6, 3.0)
            .fixer()
            .ph(6.2)
            .eigenvectors(axis(1, 2.2))
            .fungi(FungalRole::Pathogenic, &["pf-1", "pf-2"])
            .herbivores(&["aphid-b"]),
        Plant::new("wfo-c", "Rosaceae")
            .form(GrowthForm::Shrub, 3.0, 3.5)
            .ph(6.4)
            .eigenvectors(axis(2, 2.2))
            .fungi(FungalRole::Pathogenic, &["pf-2"])
            .herbivores(&["aphid-c"]),
        Plant::new("wfo-d", "Rosaceae")
            .form(GrowthForm::Shrub, 3.5, 5.0)
            .ph(6.6)
            .eigenvectors(axis(3, 2.2))
            .herbivores(&["aphid-d"]),
        Plant::new("wfo-e", "Fagaceae")
            .form(GrowthForm::Tree, 12.0, 6.0)
            .ph(6.8)
            .eigenvectors(axis(4, 2.2))
            .herbivores(&["aphid-e"])
            .predators(&["ladybird"]),
    ]
    .into_iter()
    .map(|p| p.fungi(FungalRole::Amf, &glomus).pollinators(&bees))
    .collect()
}

fn diverse_fixture() -> FixtureBuilder {
    ["aphid-a", "aphid-b", "aphid-c", "aphid-d"]
        .into_iter()
        .fold(FixtureBuilder::new().plants(diverse_guild()), |b, aphid| {
            b.herbivore_predators(aphid, &["ladybird"])
        })
}

/// Five families sharing 60 herbivores; every member hosts a predator of all
/// of them
fn pest_pressure_guild(with_predators: bool) -> (Vec<Plant>, FixtureBuilder) {
    let herbivores = names("caterpillar", 60);
    let families = ["Fabaceae", "Rosaceae", "Fagaceae", "Lamiaceae", "Poaceae"];
    let plants: Vec<Plant> = families
        .iter()
        .enumerate()
        .map(|(i, family)| {
            let mut plant = Plant::new(&format!("wfo-{}", family.to_lowercase()), family)
                .eigenvectors(axis(i, 2.2))
                .herbivores(&herbivores);
            if i < 2 {
                plant = plant.fixer();
            }
            if with_predators {
                plant = plant.predators(&["trichogramma"]);
            }
            plant
        })
        .collect();

    let builder = herbivores
        .iter()
        .fold(FixtureBuilder::new().plants(plants.clone()), |b, h| {
            b.herbivore_predators(h, &["trichogramma"])
        });
    (plants, builder)
}

fn scored(result: &GuildScoreResult) -> &guild_compat::ScoredGuild {
    result.scored().expect("guild should not be vetoed")
}

#[test]
fn test_shared_pathogen_monoculture_scores_strongly_negative() {
    let plants = monoculture_guild();
    let scorer = scorer(FixtureBuilder::new().plants(plants.clone()).build(), &[5]);

    let result = scorer.score_guild(&ids(&plants), "5plant").unwrap();
    let s = scored(&result);

    assert!((-1.0..=-0.5).contains(&s.guild_score), "score {}", s.guild_score);
    assert_relative_eq!(s.per_metric_normalized[&MetricId::N1], 1.0);
    assert_relative_eq!(s.per_metric_normalized[&MetricId::N4], 1.0);
    assert_relative_eq!(s.positive_benefit, 0.0);
    assert!(s.warnings.contains(&GuildWarning::P3Dampened));

    let explanations = explain(&result);
    assert_eq!(explanations[0].severity, Severity::Critical);
    assert_eq!(explanations[0].metric, Some(MetricId::N1));
    assert_eq!(explanations[0].organisms.len(), 5);
}

#[test]
fn test_diverse_guild_scores_moderately_positive() {
    let plants = diverse_guild();
    let scorer = scorer(diverse_fixture().build(), &[5]);

    let result = scorer.score_guild(&ids(&plants), "5plant").unwrap();
    let s = scored(&result);

    assert!((0.2..=0.6).contains(&s.guild_score), "score {}", s.guild_score);
    assert_relative_eq!(s.guild_score, 0.3837, epsilon = 1e-3);

    assert_eq!(s.details.n1.shared.len(), 2);
    assert!(s.details.n2.shared.is_empty());
    assert_relative_eq!(s.per_metric_raw[&MetricId::P1], 0.2, epsilon = 1e-12);
    assert_relative_eq!(s.per_metric_raw[&MetricId::P5], 0.82, epsilon = 1e-12);
    assert_eq!(s.details.p1.specific_pairs, 4);
    assert!(s.warnings.is_empty());
}

#[test]
fn test_biocontrol_offsets_but_does_not_negate_pest_pressure() {
    let (plants, builder) = pest_pressure_guild(true);
    let scorer = scorer(builder.build(), &[5]);
    let result = scorer.score_guild(&ids(&plants), "5plant").unwrap();
    let s = scored(&result);

    assert!(s.details.n2.shared.len() > 50);
    assert_relative_eq!(s.per_metric_raw[&MetricId::P1], 1.0, epsilon = 1e-12);
    assert!((-0.1..=0.15).contains(&s.guild_score), "score {}", s.guild_score);

    let (plants, builder) = pest_pressure_guild(false);
    let unprotected = common::scorer(builder.build(), &[5]);
    let baseline = unprotected.score_guild(&ids(&plants), "5plant").unwrap();
    assert!(scored(&baseline).guild_score < s.guild_score);
    assert_relative_eq!(scored(&baseline).negative_risk, s.negative_risk, epsilon = 1e-12);
}

#[test]
fn test_single_family_shared_fungi_scores_below_diverse_guild() {
    let shared = names("phytophthora", 3);
    let families = ["Rosaceae", "Fabaceae", "Fagaceae", "Rosaceae", "Fabaceae"];

    let clustered: Vec<Plant> = (1..=5)
        .map(|i| Plant::new(&format!("wfo-r{}", i), "Rosaceae").fungi(FungalRole::Pathogenic, &shared))
        .collect();
    let spread: Vec<Plant> = families
        .iter()
        .enumerate()
        .map(|(i, f)| {
            let plant = Plant::new(&format!("wfo-s{}", i), f);
            if i < 2 {
                plant.fungi(FungalRole::Pathogenic, &["phytophthora-1"])
            } else {
                plant.fungi(FungalRole::Pathogenic, &[format!("endemic-{}", i)])
            }
        })
        .collect();

    let scorer = scorer(
        FixtureBuilder::new().plants(clustered.clone()).plants(spread.clone()).build(),
        &[5],
    );
    let clustered = scorer.score_guild(&ids(&clustered), "5plant").unwrap();
    let spread = scorer.score_guild(&ids(&spread), "5plant").unwrap();

    assert!(scored(&clustered).negative_risk > scored(&spread).negative_risk);
    assert!(scored(&clustered).guild_score < scored(&spread).guild_score);
}

#[test]
fn test_adding_a_pathogen_sharing_species_raises_risk() {
    let existing: Vec<Plant> = (1..=4)
        .map(|i| Plant::new(&format!("wfo-m{}", i), "Lamiaceae").fungi(FungalRole::Pathogenic, &[format!("rust-{}", i)]))
        .collect();
    let newcomer = Plant::new("wfo-new", "Lamiaceae").fungi(FungalRole::Pathogenic, &names("rust", 4));

    let scorer = scorer(
        FixtureBuilder::new().plants(existing.clone()).plant(newcomer.clone()).build(),
        &[4, 5],
    );

    let before = scorer.score_guild(&ids(&existing), "4plant").unwrap();
    let mut grown = ids(&existing);
    grown.push(newcomer.record.id.clone());
    let after = scorer.score_guild(&grown, "5plant").unwrap();

    assert_relative_eq!(scored(&before).per_metric_raw[&MetricId::N1], 0.0);
    assert!(scored(&after).negative_risk > scored(&before).negative_risk);
}

#[test]
fn test_scoring_is_bit_identical_across_calls_and_orders() {
    let plants = diverse_guild();
    let scorer = scorer(diverse_fixture().build(), &[5]);

    let ids = ids(&plants);
    let mut reversed = ids.clone();
    reversed.reverse();

    let first = scorer.score_guild(&ids, "5plant").unwrap();
    let second = scorer.score_guild(&ids, "5plant").unwrap();
    let shuffled = scorer.score_guild(&reversed, "5plant").unwrap();

    assert_eq!(first, second);
    assert_eq!(first, shuffled);
    assert_eq!(
        scored(&first).guild_score.to_bits(),
        scored(&shuffled).guild_score.to_bits()
    );
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_low_confidence_metrics_are_flagged() {
    // No eigenvectors and no pollinators anywhere
    let plants: Vec<Plant> = ["Rosaceae", "Fabaceae", "Fagaceae"]
        .iter()
        .enumerate()
        .map(|(i, f)| Plant::new(&format!("wfo-{}", i), f))
        .collect();
    let scorer = scorer(FixtureBuilder::new().plants(plants.clone()).build(), &[3]);

    let result = scorer.score_guild(&ids(&plants), "3plant").unwrap();
    let s = scored(&result);
    assert!(s.low_confidence.contains(&MetricId::P4));
    assert!(s.low_confidence.contains(&MetricId::P6));
    assert_relative_eq!(s.per_metric_raw[&MetricId::P4], 0.0);

    let explanations = explain(&result);
    assert!(explanations
        .iter()
        .any(|e| e.metric == Some(MetricId::P4) && e.low_confidence));
}
