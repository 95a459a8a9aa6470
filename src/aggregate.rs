use std::collections::{BTreeMap, HashSet};

use enum_map::EnumMap;
use getset::{CopyGetters, Getters};
use indexmap::IndexMap;
use itertools::Itertools;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::schema::{ArtworkKind, CardEntry, CardGroup, CardKey};

/// Merges entries into one group per `(code, artwork)`.
///
/// Groups come out in the order their key was first seen, and names are
/// taken from that first entry. Every entry adds its rarity to its group.
pub fn aggregate<'a>(
    entries: impl IntoIterator<Item = &'a CardEntry>,
) -> IndexMap<CardKey, CardGroup> {
    let mut groups = IndexMap::<CardKey, CardGroup>::new();
    for entry in entries {
        groups
            .entry(CardKey::of(entry))
            .or_insert_with(|| CardGroup::seed(entry))
            .insert_rarity(&entry.rarity);
    }
    groups
}

/// Number of groups per artwork.
pub fn artwork_distribution<'a>(
    groups: impl IntoIterator<Item = &'a CardGroup>,
) -> EnumMap<ArtworkKind, usize> {
    let mut distribution = EnumMap::default();
    for group in groups {
        distribution[group.artwork()] += 1;
    }
    distribution
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct DuplicateCode {
    pub code: String,
    pub count: usize,
}

/// Figures over the flat entry list of one batch. Informational only.
#[derive(Clone, PartialEq, Eq, Debug, Getters, CopyGetters, Serialize, Deserialize)]
pub struct BatchStatistics {
    #[getset(get_copy = "pub")]
    total_entries: usize,
    #[getset(get_copy = "pub")]
    unique_codes: usize,
    #[getset(get = "pub")]
    rarity_counts: BTreeMap<String, usize>,
    #[getset(get = "pub")]
    artwork_counts: EnumMap<ArtworkKind, usize>,
    /// Codes seen more than once, in order of first appearance.
    #[getset(get = "pub")]
    duplicate_codes: Vec<DuplicateCode>,
    /// Sum of `count - 1` over `duplicate_codes`.
    #[getset(get_copy = "pub")]
    duplicates: usize,
}

impl BatchStatistics {
    pub fn from_entries(entries: &[CardEntry]) -> Self {
        let mut rarity_counts = BTreeMap::<String, usize>::new();
        let mut artwork_counts = EnumMap::<ArtworkKind, usize>::default();
        let mut occurrences = IndexMap::<&str, usize>::new();
        for entry in entries {
            *rarity_counts.entry(entry.rarity.clone()).or_default() += 1;
            artwork_counts[entry.artwork] += 1;
            *occurrences.entry(&entry.code).or_default() += 1;
        }

        let duplicate_codes = occurrences
            .iter()
            .filter(|(_, &count)| count > 1)
            .map(|(&code, &count)| DuplicateCode {
                code: code.to_owned(),
                count,
            })
            .collect_vec();
        let duplicates = duplicate_codes.iter().map(|d| d.count - 1).sum();

        Self {
            total_entries: entries.len(),
            unique_codes: occurrences.len(),
            rarity_counts,
            artwork_counts,
            duplicate_codes,
            duplicates,
        }
    }

    pub fn log_summary(&self) {
        info!(
            "{} entries, {} distinct codes, artworks: {:?}",
            self.total_entries,
            self.unique_codes,
            self.artwork_counts.iter().collect_vec()
        );
        if self.duplicates > 0 {
            let shown = self.duplicate_codes.iter().take(5).map(|d| &d.code);
            warn!(
                "{} duplicated entries over {} codes, e.g. {:?}",
                self.duplicates,
                self.duplicate_codes.len(),
                shown.collect_vec()
            );
        }
    }
}

/// Distinct `(code, artwork)` pairs of a batch, without building the groups.
pub fn distinct_keys(entries: &[CardEntry]) -> usize {
    entries
        .iter()
        .map(|entry| (entry.code.as_str(), entry.artwork))
        .collect::<HashSet<_>>()
        .len()
}
