//! Persistence of ingested series.
//!
//! The store is always an explicit handle passed by the caller. [`save_series`]
//! runs a whole batch inside [`SeriesStore::transaction`], so a failing batch
//! leaves nothing behind.

use chrono::{DateTime, Utc};
use derive_more::{Display, From, Into};
use getset::{CopyGetters, Getters};
use indexmap::{IndexMap, IndexSet};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use typed_builder::TypedBuilder;
use url::Url;

use crate::{
    language::LanguageCode,
    schema::{ArtworkKind, CardGroup},
};

#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Display, From, Into, Serialize, Deserialize,
)]
pub struct SeriesId(u32);
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Display, From, Into, Serialize, Deserialize,
)]
pub struct CardId(u32);
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Display, From, Into, Serialize, Deserialize,
)]
pub struct RarityId(u32);

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Series {code} ({language}) already exists")]
    SeriesConflict { code: String, language: LanguageCode },
    #[error("Series {0} does not exist")]
    UnknownSeries(SeriesId),
    #[error("Card {0} does not exist")]
    UnknownCard(CardId),
    #[error("Rarity {0} does not exist")]
    UnknownRarity(RarityId),
}

/// What the caller wants to store about the series itself.
#[derive(Clone, Debug, TypedBuilder, Getters, CopyGetters, Serialize, Deserialize)]
pub struct SeriesSubmission {
    #[builder(setter(into))]
    #[getset(get = "pub")]
    code: String,
    #[builder(setter(into))]
    #[getset(get = "pub")]
    name: String,
    #[builder(default)]
    #[getset(get = "pub")]
    source_url: Option<Url>,
    #[getset(get_copy = "pub")]
    language: LanguageCode,
    /// Number of entries (card × rarity) the batch was made of.
    #[getset(get_copy = "pub")]
    entry_count: usize,
}

#[derive(Clone, PartialEq, Eq, Debug, CopyGetters, Serialize, Deserialize)]
#[getset(get_copy = "pub")]
pub struct SaveReport {
    series: SeriesId,
    cards_created: usize,
    rarities_processed: usize,
    links_created: usize,
}

pub trait SeriesStore {
    fn find_series(&self, code: &str, language: LanguageCode) -> Option<SeriesId>;
    /// Fails with [`StoreError::SeriesConflict`] if `(code, language)` is taken.
    fn create_series(&mut self, submission: &SeriesSubmission) -> Result<SeriesId, StoreError>;
    fn upsert_rarity(&mut self, name: &str) -> RarityId;
    /// Returns the card for `(series, code, artwork)` and whether it was just created.
    fn upsert_card(
        &mut self,
        series: SeriesId,
        group: &CardGroup,
    ) -> Result<(CardId, bool), StoreError>;
    /// Returns whether a new link was created.
    fn link_rarity(&mut self, card: CardId, rarity: RarityId) -> Result<bool, StoreError>;
    /// Runs `f` so that either all of its writes persist or none do.
    fn transaction<T, F>(&mut self, f: F) -> Result<T, StoreError>
    where
        Self: Sized,
        F: FnOnce(&mut Self) -> Result<T, StoreError>;
}

/// Stores one batch of card groups as a new series.
pub fn save_series<S: SeriesStore>(
    store: &mut S,
    submission: &SeriesSubmission,
    groups: &[CardGroup],
) -> Result<SaveReport, StoreError> {
    store.transaction(|store| {
        let series = store.create_series(submission)?;
        info!(
            "Created series {series}: {} ({})",
            submission.name(),
            submission.language()
        );

        let rarity_names = groups
            .iter()
            .flat_map(|group| group.rarities())
            .collect::<IndexSet<_>>();
        let rarities = rarity_names
            .into_iter()
            .map(|name| (name, store.upsert_rarity(name)))
            .collect::<IndexMap<_, _>>();

        let mut cards_created = 0;
        let mut links_created = 0;
        for group in groups {
            let (card, created) = store.upsert_card(series, group)?;
            cards_created += usize::from(created);
            for rarity_name in group.rarities() {
                links_created += usize::from(store.link_rarity(card, rarities[rarity_name])?);
            }
        }
        info!(
            "Series {series}: {cards_created} cards, {} rarities, {links_created} links",
            rarities.len()
        );
        Ok(SaveReport {
            series,
            cards_created,
            rarities_processed: rarities.len(),
            links_created,
        })
    })
}

#[derive(Clone, PartialEq, Eq, Debug, Getters, CopyGetters, Serialize, Deserialize)]
pub struct SeriesRecord {
    #[getset(get_copy = "pub")]
    id: SeriesId,
    #[getset(get = "pub")]
    code: String,
    #[getset(get = "pub")]
    name: String,
    #[getset(get = "pub")]
    source_url: Option<Url>,
    #[getset(get_copy = "pub")]
    language: LanguageCode,
    #[getset(get_copy = "pub")]
    entry_count: usize,
    #[getset(get_copy = "pub")]
    added_at: DateTime<Utc>,
}

#[derive(Clone, PartialEq, Eq, Debug, Getters, CopyGetters, Serialize, Deserialize)]
pub struct RarityRecord {
    #[getset(get_copy = "pub")]
    id: RarityId,
    #[getset(get = "pub")]
    name: String,
    #[getset(get_copy = "pub")]
    sort_order: u32,
}

#[derive(Clone, PartialEq, Eq, Debug, Getters, CopyGetters, Serialize, Deserialize)]
pub struct CardRecord {
    #[getset(get_copy = "pub")]
    id: CardId,
    #[getset(get_copy = "pub")]
    series: SeriesId,
    #[getset(get = "pub")]
    code: String,
    /// Localized name if there is one, English otherwise.
    #[getset(get = "pub")]
    name: String,
    #[getset(get_copy = "pub")]
    artwork: ArtworkKind,
}

#[derive(Clone, PartialEq, Eq, Debug, Getters, CopyGetters, Serialize, Deserialize)]
pub struct CardRarityLink {
    #[getset(get_copy = "pub")]
    card: CardId,
    #[getset(get_copy = "pub")]
    rarity: RarityId,
    #[getset(get_copy = "pub")]
    owned: bool,
    #[getset(get = "pub")]
    condition: String,
}

/// A store that lives in memory and can be saved as JSON.
#[derive(Clone, Default, Debug, Getters, Serialize, Deserialize)]
#[getset(get = "pub")]
pub struct InMemoryStore {
    series: Vec<SeriesRecord>,
    rarities: Vec<RarityRecord>,
    cards: Vec<CardRecord>,
    links: Vec<CardRarityLink>,
}

fn next_id(len: usize) -> u32 {
    len as u32 + 1
}

impl InMemoryStore {
    pub fn cards_of(&self, series: SeriesId) -> impl Iterator<Item = &CardRecord> {
        self.cards.iter().filter(move |card| card.series == series)
    }

    pub fn rarities_of(&self, card: CardId) -> impl Iterator<Item = &RarityRecord> {
        self.links
            .iter()
            .filter(move |link| link.card == card)
            .filter_map(move |link| self.rarities.iter().find(|r| r.id == link.rarity))
    }
}

impl SeriesStore for InMemoryStore {
    fn find_series(&self, code: &str, language: LanguageCode) -> Option<SeriesId> {
        self.series
            .iter()
            .find(|series| series.code == code && series.language == language)
            .map(|series| series.id)
    }

    fn create_series(&mut self, submission: &SeriesSubmission) -> Result<SeriesId, StoreError> {
        if self
            .find_series(submission.code(), submission.language())
            .is_some()
        {
            return Err(StoreError::SeriesConflict {
                code: submission.code().clone(),
                language: submission.language(),
            });
        }
        let id = SeriesId(next_id(self.series.len()));
        self.series.push(SeriesRecord {
            id,
            code: submission.code().clone(),
            name: submission.name().clone(),
            source_url: submission.source_url().clone(),
            language: submission.language(),
            entry_count: submission.entry_count(),
            added_at: Utc::now(),
        });
        Ok(id)
    }

    fn upsert_rarity(&mut self, name: &str) -> RarityId {
        if let Some(rarity) = self.rarities.iter().find(|r| r.name == name) {
            return rarity.id;
        }
        let id = RarityId(next_id(self.rarities.len()));
        debug!("New rarity {id}: {name}");
        self.rarities.push(RarityRecord {
            id,
            name: name.to_owned(),
            sort_order: 0,
        });
        id
    }

    fn upsert_card(
        &mut self,
        series: SeriesId,
        group: &CardGroup,
    ) -> Result<(CardId, bool), StoreError> {
        if !self.series.iter().any(|s| s.id == series) {
            return Err(StoreError::UnknownSeries(series));
        }
        if let Some(card) = self.cards.iter().find(|card| {
            card.series == series && &card.code == group.code() && card.artwork == group.artwork()
        }) {
            warn!("Card {} ({}) is already stored", group.code(), group.artwork());
            return Ok((card.id, false));
        }
        let id = CardId(next_id(self.cards.len()));
        self.cards.push(CardRecord {
            id,
            series,
            code: group.code().clone(),
            name: group.display_name().to_owned(),
            artwork: group.artwork(),
        });
        Ok((id, true))
    }

    fn link_rarity(&mut self, card: CardId, rarity: RarityId) -> Result<bool, StoreError> {
        if !self.cards.iter().any(|c| c.id == card) {
            return Err(StoreError::UnknownCard(card));
        }
        if !self.rarities.iter().any(|r| r.id == rarity) {
            return Err(StoreError::UnknownRarity(rarity));
        }
        if self
            .links
            .iter()
            .any(|link| link.card == card && link.rarity == rarity)
        {
            return Ok(false);
        }
        self.links.push(CardRarityLink {
            card,
            rarity,
            owned: false,
            condition: "NM".to_owned(),
        });
        Ok(true)
    }

    fn transaction<T, F>(&mut self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Self) -> Result<T, StoreError>,
    {
        let snapshot = self.clone();
        let result = f(self);
        if result.is_err() {
            *self = snapshot;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use super::{save_series, InMemoryStore, SeriesStore, SeriesSubmission, StoreError};
    use crate::{
        aggregate::aggregate,
        language::LanguageCode,
        schema::{ArtworkKind, CardEntry, CardGroup},
    };

    fn groups() -> Vec<CardGroup> {
        let entry = |code: &str, artwork, rarity: &str| CardEntry {
            code: code.to_owned(),
            name_english: "Dark Magician".to_owned(),
            name_localized: if code.ends_with('2') {
                String::new()
            } else {
                "Magicien Sombre".to_owned()
            },
            rarity: rarity.to_owned(),
            card_type: "Normal Monster".to_owned(),
            artwork,
        };
        let entries = [
            entry("BLMM-FR001", ArtworkKind::None, "Secret Rare"),
            entry("BLMM-FR001", ArtworkKind::None, "Starlight Rare"),
            entry("BLMM-FR001", ArtworkKind::Alternative, "Secret Rare"),
            entry("BLMM-FR002", ArtworkKind::None, "Ultra Rare"),
        ];
        aggregate(&entries).into_values().collect()
    }

    fn submission(language: LanguageCode) -> SeriesSubmission {
        SeriesSubmission::builder()
            .code("BLMM")
            .name("Battles of Legend: Monster Mayhem")
            .language(language)
            .entry_count(4)
            .build()
    }

    #[test]
    fn test_save_series() {
        let mut store = InMemoryStore::default();
        let report = save_series(&mut store, &submission(LanguageCode::Fr), &groups()).unwrap();
        assert_eq!(report.cards_created(), 3);
        assert_eq!(report.rarities_processed(), 3);
        assert_eq!(report.links_created(), 4);

        assert_eq!(store.series().len(), 1);
        assert_eq!(store.series()[0].entry_count(), 4);
        let cards = store.cards_of(report.series()).collect_vec();
        assert_eq!(cards.len(), 3);
        assert_eq!(cards[0].name(), "Magicien Sombre");
        assert_eq!(cards[2].name(), "Dark Magician");
        assert_eq!(
            store
                .rarities_of(cards[0].id())
                .map(|r| r.name().as_str())
                .collect_vec(),
            ["Secret Rare", "Starlight Rare"]
        );
        assert!(store.links().iter().all(|l| !l.owned() && l.condition() == "NM"));
    }

    #[test]
    fn test_conflict_keeps_store_untouched() {
        let mut store = InMemoryStore::default();
        save_series(&mut store, &submission(LanguageCode::Fr), &groups()).unwrap();
        let err = save_series(&mut store, &submission(LanguageCode::Fr), &groups()).unwrap_err();
        assert!(matches!(
            err,
            StoreError::SeriesConflict { ref code, language: LanguageCode::Fr } if code == "BLMM"
        ));
        assert_eq!(store.series().len(), 1);
        assert_eq!(store.cards().len(), 3);
        assert_eq!(store.links().len(), 4);

        // Same series code in another language is a different series.
        save_series(&mut store, &submission(LanguageCode::En), &groups()).unwrap();
        assert_eq!(store.series().len(), 2);
        assert_eq!(store.rarities().len(), 3);
        assert_eq!(store.cards().len(), 6);
    }

    #[test]
    fn test_linking_is_idempotent() {
        let mut store = InMemoryStore::default();
        let series = store.create_series(&submission(LanguageCode::Fr)).unwrap();
        let groups = groups();
        let group = &groups[0];
        let rarity = store.upsert_rarity("Secret Rare");
        assert_eq!(store.upsert_rarity("Secret Rare"), rarity);

        let (card, created) = store.upsert_card(series, group).unwrap();
        assert!(created);
        let (again, created) = store.upsert_card(series, group).unwrap();
        assert_eq!(card, again);
        assert!(!created);

        assert!(store.link_rarity(card, rarity).unwrap());
        assert!(!store.link_rarity(card, rarity).unwrap());
        assert_eq!(store.links().len(), 1);
    }

    #[test]
    fn test_failed_transaction_rolls_back() {
        let mut store = InMemoryStore::default();
        let result: Result<(), _> = store.transaction(|store| {
            let series = store.create_series(&submission(LanguageCode::De))?;
            store.upsert_rarity("Common");
            let (card, _) = store.upsert_card(series, &groups()[0])?;
            store.link_rarity(card, 42.into())?;
            Ok(())
        });
        assert!(matches!(result, Err(StoreError::UnknownRarity(_))));
        assert!(store.series().is_empty());
        assert!(store.rarities().is_empty());
        assert!(store.cards().is_empty());
    }

    #[test]
    fn test_unknown_series() {
        let mut store = InMemoryStore::default();
        assert!(matches!(
            store.upsert_card(7.into(), &groups()[0]),
            Err(StoreError::UnknownSeries(_))
        ));
    }

    #[test]
    fn test_round_trips_through_json() {
        let mut store = InMemoryStore::default();
        save_series(&mut store, &submission(LanguageCode::Fr), &groups()).unwrap();
        let json = serde_json::to_string(&store).unwrap();
        let mut restored: InMemoryStore = serde_json::from_str(&json).unwrap();
        assert!(restored
            .find_series("BLMM", LanguageCode::Fr)
            .is_some());
        assert!(matches!(
            save_series(&mut restored, &submission(LanguageCode::Fr), &groups()),
            Err(StoreError::SeriesConflict { .. })
        ));
    }
}
