use cardlist_scraping_utils::regex;
use enum_map::Enum;
use getset::CopyGetters;
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

/// Print language of a card, as marked in its code.
#[derive(
    Clone,
    Copy,
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
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum LanguageCode {
    En,
    Fr,
    De,
    Sp,
    It,
    Pt,
    Jp,
    Kr,
    Zh,
    Ru,
}

pub const DEFAULT_LANGUAGE: LanguageCode = LanguageCode::En;

impl LanguageCode {
    pub fn label(self) -> &'static str {
        use LanguageCode::*;
        match self {
            En => "English",
            Fr => "French",
            De => "German",
            Sp => "Spanish",
            It => "Italian",
            Pt => "Portuguese",
            Jp => "Japanese",
            Kr => "Korean",
            Zh => "Chinese",
            Ru => "Russian",
        }
    }

    /// Other markers that denote the same language.
    pub fn aliases(self) -> &'static [&'static str] {
        use LanguageCode::*;
        match self {
            En => &["US", "UK"],
            Sp => &["ES"],
            Zh => &["CN"],
            Fr | De | It | Pt | Jp | Kr | Ru => &[],
        }
    }
}

/// Resolves a canonical code or one of its aliases, ignoring case and surrounding spaces.
pub fn resolve_language_code(raw: &str) -> Option<LanguageCode> {
    let normalized = raw.trim().to_uppercase();
    if normalized.is_empty() {
        return None;
    }
    LanguageCode::iter().find(|language| {
        language.as_ref() == normalized || language.aliases().contains(&normalized.as_str())
    })
}

/// Finds the language marker embedded in a single card code.
///
/// A trailing `<letters><digits>` group such as `FR001` is tried first.
/// Otherwise the code is split on `-`, `_`, `/` and whitespace, and the segments
/// are tried from the right, either whole or with their digit tail cut off.
pub fn detect_from_code(raw_code: &str) -> Option<LanguageCode> {
    let normalized = raw_code.trim().to_uppercase();
    if normalized.is_empty() {
        return None;
    }

    if let Some(language) = regex!(r"([A-Z]{2,3})([0-9]{2,})$")
        .captures(&normalized)
        .and_then(|captures| resolve_language_code(&captures[1]))
    {
        return Some(language);
    }

    normalized
        .split(|c: char| matches!(c, '-' | '_' | '/') || c.is_whitespace())
        .filter(|segment| !segment.is_empty())
        .rev()
        .find_map(|segment| {
            resolve_language_code(segment).or_else(|| {
                regex!(r"^([A-Z]{2,3})[0-9]+")
                    .captures(segment)
                    .and_then(|captures| resolve_language_code(&captures[1]))
            })
        })
}

#[derive(Clone, Copy, PartialEq, Debug, CopyGetters, Serialize, Deserialize)]
#[getset(get_copy = "pub")]
pub struct LanguageDetectionResult {
    code: Option<LanguageCode>,
    /// Number of codes in which a language marker was found.
    matches: usize,
    /// Number of codes examined.
    total: usize,
    /// Share of `matches` held by the winner, rounded to two decimals.
    confidence: f64,
}

impl LanguageDetectionResult {
    pub fn confidence_percent(&self) -> u8 {
        (self.confidence * 100.).round() as u8
    }
}

/// Picks the language most codes of a batch agree on.
///
/// On a tie, the language that was seen first in `codes` wins.
pub fn detect_dominant<S: AsRef<str>>(
    codes: impl IntoIterator<Item = S>,
) -> LanguageDetectionResult {
    let mut tally = IndexMap::<LanguageCode, usize>::new();
    let mut total = 0;
    let mut matches = 0;
    for code in codes {
        total += 1;
        if let Some(language) = detect_from_code(code.as_ref()) {
            matches += 1;
            *tally.entry(language).or_default() += 1;
        }
    }

    let mut winner = None;
    let mut highest = 0;
    for (&language, &count) in &tally {
        if count > highest {
            winner = Some(language);
            highest = count;
        }
    }
    debug!("Language tally: {tally:?}");

    let confidence = if matches == 0 {
        0.
    } else {
        (highest as f64 / matches as f64 * 100.).round() / 100.
    };
    LanguageDetectionResult {
        code: winner,
        matches,
        total,
        confidence,
    }
}
