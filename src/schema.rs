use std::collections::BTreeSet;

use enum_map::Enum;
use getset::{CopyGetters, Getters};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Which artwork a printing uses.
#[derive(
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Debug,
    Display,
    AsRefStr,
    EnumString,
    EnumIter,
    Enum,
    Serialize,
    Deserialize,
)]
pub enum ArtworkKind {
    #[default]
    None,
    New,
    Alternative,
}

/// One (card identity × rarity) observation extracted from a table row.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct CardEntry {
    pub code: String,
    pub name_english: String,
    pub name_localized: String,
    pub rarity: String,
    #[serde(rename = "type")]
    pub card_type: String,
    pub artwork: ArtworkKind,
}

/// All printings of one `(code, artwork)` pair seen in a batch.
#[derive(Clone, PartialEq, Eq, Debug, Getters, CopyGetters, Serialize, Deserialize)]
pub struct CardGroup {
    #[getset(get = "pub")]
    code: String,
    #[getset(get = "pub")]
    name_english: String,
    #[getset(get = "pub")]
    name_localized: String,
    #[getset(get_copy = "pub")]
    artwork: ArtworkKind,
    #[getset(get = "pub")]
    rarities: BTreeSet<String>,
}

impl CardGroup {
    /// Seeds a group from the first entry seen for its key; the rarity set starts empty.
    pub(crate) fn seed(entry: &CardEntry) -> Self {
        Self {
            code: entry.code.clone(),
            name_english: entry.name_english.clone(),
            name_localized: entry.name_localized.clone(),
            artwork: entry.artwork,
            rarities: BTreeSet::new(),
        }
    }

    pub(crate) fn insert_rarity(&mut self, rarity: &str) {
        if !self.rarities.contains(rarity) {
            self.rarities.insert(rarity.to_owned());
        }
    }

    pub fn key(&self) -> CardKey {
        CardKey {
            code: self.code.clone(),
            artwork: self.artwork,
        }
    }

    /// The name shown for the stored card: the localized one if any.
    pub fn display_name(&self) -> &str {
        if self.name_localized.is_empty() {
            &self.name_english
        } else {
            &self.name_localized
        }
    }
}

/// Composite identity of a [`CardGroup`] within one batch.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct CardKey {
    pub code: String,
    pub artwork: ArtworkKind,
}

impl CardKey {
    pub fn of(entry: &CardEntry) -> Self {
        Self {
            code: entry.code.clone(),
            artwork: entry.artwork,
        }
    }
}
