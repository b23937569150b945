//! Guild resolution
//!
//! A guild is an unordered set of species ids. Resolution validates the
//! request (size, duplicates, unknown ids) before any computation and sorts
//! members by id, so every downstream metric sees the same member order no
//! matter how the request listed them.

use rustc_hash::FxHashSet;

use crate::config::GuildLimits;
use crate::data::GuildData;
use crate::error::ScoringError;
use crate::types::{OrganismProfile, SpeciesRecord};

#[derive(Debug, Clone)]
pub struct Guild<'a> {
    members: Vec<&'a SpeciesRecord>,
    profiles: Vec<&'a OrganismProfile>,
}

impl<'a> Guild<'a> {
    pub fn resolve<S: AsRef<str>>(
        species_ids: &[S],
        data: &'a GuildData,
        limits: &GuildLimits,
    ) -> Result<Self, ScoringError> {
        let size = species_ids.len();
        if size < limits.min_size || size > limits.max_size {
            return Err(ScoringError::GuildSize {
                size,
                min: limits.min_size,
                max: limits.max_size,
            });
        }

        let mut seen: FxHashSet<&str> = FxHashSet::default();
        for id in species_ids {
            let id = id.as_ref();
            if !seen.insert(id) {
                return Err(ScoringError::DuplicateSpecies(id.to_string()));
            }
        }

        let mut members = species_ids
            .iter()
            .map(|id| {
                let id = id.as_ref();
                data.species(id)
                    .ok_or_else(|| ScoringError::UnknownSpecies(id.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        members.sort_unstable_by(|a, b| a.id.cmp(&b.id));

        let profiles = members.iter().map(|m| data.profile(&m.id)).collect();

        Ok(Self { members, profiles })
    }

    /// Build directly from records, sorting by id. Callers guarantee the
    /// members are distinct.
    pub fn from_records(mut pairs: Vec<(&'a SpeciesRecord, &'a OrganismProfile)>) -> Self {
        pairs.sort_unstable_by(|a, b| a.0.id.cmp(&b.0.id));
        let (members, profiles) = pairs.into_iter().unzip();
        Self { members, profiles }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[&'a SpeciesRecord] {
        &self.members
    }

    pub fn profiles(&self) -> &[&'a OrganismProfile] {
        &self.profiles
    }

    pub fn member_ids(&self) -> Vec<String> {
        self.members.iter().map(|m| m.id.clone()).collect()
    }

    /// n·(n-1)/2
    pub fn unordered_pairs(&self) -> usize {
        let n = self.len();
        n * n.saturating_sub(1) / 2
    }

    /// n·(n-1)
    pub fn ordered_pairs(&self) -> usize {
        let n = self.len();
        n * n.saturating_sub(1)
    }
}
