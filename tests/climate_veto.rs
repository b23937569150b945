//! Climate veto behaviour through the public scorer

mod common;

use common::{ids, scorer, FixtureBuilder, Plant};
use guild_compat::climate::{check_climate, ClimateCheck};
use guild_compat::{ClimateTier, GuildScoreResult};
use proptest::prelude::*;

use ClimateTier::*;

fn tiers_from_mask(mask: u8) -> Vec<ClimateTier> {
    ClimateTier::ALL
        .into_iter()
        .enumerate()
        .filter(|(i, _)| mask & (1 << i) != 0)
        .map(|(_, tier)| tier)
        .collect()
}

fn plants_from_masks(masks: &[u8]) -> Vec<Plant> {
    masks
        .iter()
        .enumerate()
        .map(|(i, &mask)| Plant::new(&format!("wfo-{:02}", i), "Rosaceae").tiers(&tiers_from_mask(mask)))
        .collect()
}

#[test]
fn test_single_outlier_is_vetoed_and_named() {
    let mut plants: Vec<Plant> = (1..=4)
        .map(|i| Plant::new(&format!("wfo-oak-{}", i), "Fagaceae").tiers(&[HumidTemperate, Continental]))
        .collect();
    plants.push(Plant::new("wfo-cactus", "Cactaceae").tiers(&[Arid]));

    let scorer = scorer(FixtureBuilder::new().plants(plants.clone()).build(), &[5]);
    let result = scorer.score_guild(&ids(&plants), "5plant").unwrap();

    let GuildScoreResult::Veto(report) = &result else {
        panic!("expected a veto, got {:?}", result);
    };
    assert_eq!(report.outlier_species, vec!["wfo-cactus"]);
    assert_eq!(report.majority_tier, Some(HumidTemperate));
    assert_eq!(report.member_tiers["wfo-cactus"], vec![Arid]);
    assert!(result.guild_score().is_none());

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["status"], "veto");
    assert_eq!(json["majority_tier"], "tier_3_humid_temperate");
}

#[test]
fn test_calibration_tier_prefers_largest_pool() {
    // Six extra continental species make that pool the largest
    let mut plants = vec![
        Plant::new("wfo-a", "Rosaceae").tiers(&[HumidTemperate, Continental]),
        Plant::new("wfo-b", "Fabaceae").tiers(&[HumidTemperate, Continental, Mediterranean]),
    ];
    plants.extend((1..=6).map(|i| Plant::new(&format!("wfo-pad-{}", i), "Poaceae").tiers(&[Continental])));

    let scorer = scorer(FixtureBuilder::new().plants(plants).build(), &[2]);
    let result = scorer.score_guild(&["wfo-b", "wfo-a"], "2plant").unwrap();

    assert_eq!(result.scored().unwrap().calibration_tier, Continental);
}

#[test]
fn test_member_without_tiers_vetoes_any_guild() {
    let plants = vec![
        Plant::new("wfo-a", "Rosaceae"),
        Plant::new("wfo-b", "Rosaceae").tiers(&[]),
    ];
    let scorer = scorer(FixtureBuilder::new().plants(plants.clone()).build(), &[2]);

    let result = scorer.score_guild(&ids(&plants), "2plant").unwrap();
    assert!(result.is_veto());
}

proptest! {
    #[test]
    fn veto_is_independent_of_member_order(
        masks in prop::collection::vec(0u8..64, 2..=7),
        rotation in 0usize..7,
    ) {
        let plants = plants_from_masks(&masks);
        let data = FixtureBuilder::new().plants(plants.clone()).build();

        let forward = ids(&plants);
        let mut reversed = forward.clone();
        reversed.reverse();
        let mut rotated = forward.clone();
        rotated.rotate_left(rotation % forward.len());

        let resolve = |order: &[String]| -> ClimateCheck {
            let members: Vec<_> = order.iter().filter_map(|id| data.species(id)).collect();
            check_climate(&members, data.organizer())
        };
        let baseline = resolve(&forward);
        prop_assert_eq!(&baseline, &resolve(&reversed));
        prop_assert_eq!(&baseline, &resolve(&rotated));

        let shared = masks.iter().fold(0b11_1111u8, |acc, m| acc & m);
        prop_assert_eq!(matches!(baseline, ClimateCheck::Veto(_)), shared == 0);

        let scorer = scorer(data, &[masks.len()]);
        let profile = guild_compat::calibration::profile_name(masks.len());
        let a = scorer.score_guild(&forward, &profile).unwrap();
        let b = scorer.score_guild(&rotated, &profile).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn outliers_never_include_majority_members(masks in prop::collection::vec(0u8..64, 2..=7)) {
        let plants = plants_from_masks(&masks);
        let data = FixtureBuilder::new().plants(plants.clone()).build();
        let members: Vec<_> = plants.iter().filter_map(|p| data.species(&p.record.id)).collect();

        if let ClimateCheck::Veto(report) = check_climate(&members, data.organizer()) {
            let mut sorted = report.outlier_species.clone();
            sorted.sort();
            prop_assert_eq!(&sorted, &report.outlier_species);
            match report.majority_tier {
                Some(tier) => {
                    for member in &members {
                        let is_outlier = report.outlier_species.contains(&member.id);
                        prop_assert_eq!(is_outlier, !member.climate_tiers.contains(tier));
                    }
                }
                None => prop_assert_eq!(report.outlier_species.len(), members.len()),
            }
        }
    }
}
