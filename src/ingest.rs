//! One scraped page in, one stored series out.
//!
//! [`ingest_html`] runs the pure part (parse, detect language, aggregate) and
//! hands back an [`IngestOutcome`]. Its entries may still be corrected by the
//! caller before [`IngestOutcome::submit`] writes them to a store.

use getset::{CopyGetters, Getters};
use indexmap::IndexMap;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;
use typed_builder::TypedBuilder;
use url::Url;

use crate::{
    aggregate::{aggregate, BatchStatistics},
    config::IngestConfig,
    fetch::FetchError,
    language::{detect_dominant, LanguageCode, LanguageDetectionResult, DEFAULT_LANGUAGE},
    parser::parse_html,
    schema::{CardEntry, CardGroup, CardKey},
    series::{derive_series_code, series_name_from_url},
    store::{save_series, SaveReport, SeriesStore, SeriesSubmission, StoreError},
};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("No card entry could be extracted from the table")]
    NothingExtracted,
    #[error("Entry #{index} has an empty {field}")]
    InvalidEntry { index: usize, field: EntryField },
    #[error("The language of the batch could not be determined")]
    LanguageUndetermined,
    #[error("No series code can be derived from the card codes")]
    SeriesCodeUndetermined,
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Fields that must not be empty when a batch is submitted.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
pub enum EntryField {
    Code,
    NameEnglish,
    Rarity,
}

/// Returns the first entry whose code, English name or rarity is blank.
pub fn validate_entries(entries: &[CardEntry]) -> Result<(), IngestError> {
    for (index, entry) in entries.iter().enumerate() {
        let field = if entry.code.trim().is_empty() {
            EntryField::Code
        } else if entry.name_english.trim().is_empty() {
            EntryField::NameEnglish
        } else if entry.rarity.trim().is_empty() {
            EntryField::Rarity
        } else {
            continue;
        };
        return Err(IngestError::InvalidEntry { index, field });
    }
    Ok(())
}

#[derive(Clone, Debug, TypedBuilder, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct IngestOptions {
    /// Wins over whatever the codes say.
    #[builder(default, setter(strip_option))]
    language_override: Option<LanguageCode>,
    #[builder(default = Some(DEFAULT_LANGUAGE))]
    default_language: Option<LanguageCode>,
    #[builder(default = 0.5)]
    min_language_confidence: f64,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl IngestOptions {
    pub fn from_config(config: &IngestConfig, language_override: Option<LanguageCode>) -> Self {
        Self {
            language_override,
            default_language: config.default_language(),
            min_language_confidence: config.min_language_confidence(),
        }
    }
}

/// Where the language of a batch came from.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Display, Serialize, Deserialize)]
pub enum LanguageSource {
    Override,
    Detected,
    Default,
}

#[derive(Clone, Debug, Getters, CopyGetters)]
pub struct IngestOutcome {
    #[getset(get = "pub")]
    entries: Vec<CardEntry>,
    options: IngestOptions,
    #[getset(get_copy = "pub")]
    detection: LanguageDetectionResult,
    #[getset(get_copy = "pub")]
    language: LanguageCode,
    #[getset(get_copy = "pub")]
    language_source: LanguageSource,
}

/// Serializable summary of an [`IngestOutcome`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IngestReport {
    pub series_code: String,
    pub language: LanguageCode,
    pub language_source: LanguageSource,
    pub detection: LanguageDetectionResult,
    pub statistics: BatchStatistics,
    pub groups: Vec<CardGroup>,
    pub entries: Vec<CardEntry>,
}

pub fn ingest_html(html: &str, options: &IngestOptions) -> Result<IngestOutcome, IngestError> {
    ingest_entries(parse_html(html), options)
}

pub fn ingest_entries(
    entries: Vec<CardEntry>,
    options: &IngestOptions,
) -> Result<IngestOutcome, IngestError> {
    if entries.is_empty() {
        return Err(IngestError::NothingExtracted);
    }

    let detection = detect_dominant(entries.iter().map(|entry| &entry.code));
    let (language, language_source) = resolve_language(&detection, options)?;
    info!(
        "Extracted {} entries; language {language} ({language_source})",
        entries.len()
    );

    let outcome = IngestOutcome {
        entries,
        options: options.clone(),
        detection,
        language,
        language_source,
    };
    outcome.statistics().log_summary();
    Ok(outcome)
}

/// Manual override, else the detected language, else the configured default.
fn resolve_language(
    detection: &LanguageDetectionResult,
    options: &IngestOptions,
) -> Result<(LanguageCode, LanguageSource), IngestError> {
    match (options.language_override, detection.code()) {
        (Some(language), _) => Ok((language, LanguageSource::Override)),
        (None, Some(language)) => {
            if detection.confidence() < options.min_language_confidence {
                warn!(
                    "Language {language} was detected with only {}% confidence ({} of {} codes)",
                    detection.confidence_percent(),
                    detection.matches(),
                    detection.total()
                );
            }
            Ok((language, LanguageSource::Detected))
        }
        (None, None) => match options.default_language {
            Some(language) => {
                warn!("No language marker in the card codes; falling back to {language}");
                Ok((language, LanguageSource::Default))
            }
            None => Err(IngestError::LanguageUndetermined),
        },
    }
}

impl IngestOutcome {
    /// Lets the caller correct entries, then runs language detection again.
    ///
    /// The edits are kept even when the language can no longer be resolved.
    pub fn edit_entries<T>(
        &mut self,
        f: impl FnOnce(&mut Vec<CardEntry>) -> T,
    ) -> Result<T, IngestError> {
        let ret = f(&mut self.entries);
        let detection = detect_dominant(self.entries.iter().map(|entry| &entry.code));
        self.detection = detection;
        let (language, language_source) = resolve_language(&detection, &self.options)?;
        if language != self.language {
            info!("Language changed from {} to {language} after the edit", self.language);
        }
        self.language = language;
        self.language_source = language_source;
        Ok(ret)
    }

    pub fn statistics(&self) -> BatchStatistics {
        BatchStatistics::from_entries(&self.entries)
    }

    pub fn groups(&self) -> IndexMap<CardKey, CardGroup> {
        aggregate(&self.entries)
    }

    /// Series code of the first entry, empty when there is no entry.
    pub fn series_code(&self) -> String {
        self.entries
            .first()
            .map(|entry| derive_series_code(&entry.code))
            .unwrap_or_default()
    }

    pub fn report(&self) -> IngestReport {
        IngestReport {
            series_code: self.series_code(),
            language: self.language,
            language_source: self.language_source,
            detection: self.detection,
            statistics: self.statistics(),
            groups: self.groups().into_values().collect(),
            entries: self.entries.clone(),
        }
    }

    /// Validates the (possibly edited) entries and stores them as one new series.
    ///
    /// The series name is `series_name`, else guessed from `source_url`,
    /// else `Series <code>`.
    pub fn submit<S: SeriesStore>(
        &self,
        store: &mut S,
        series_name: Option<&str>,
        source_url: Option<&Url>,
    ) -> Result<SaveReport, IngestError> {
        if self.entries.is_empty() {
            return Err(IngestError::NothingExtracted);
        }
        validate_entries(&self.entries)?;
        let detection = detect_dominant(self.entries.iter().map(|entry| &entry.code));
        let (language, _) = resolve_language(&detection, &self.options)?;

        let code = self.series_code();
        if code.is_empty() {
            return Err(IngestError::SeriesCodeUndetermined);
        }
        let name = series_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
            .or_else(|| {
                source_url
                    .map(|url| series_name_from_url(url.as_str()))
                    .filter(|name| !name.is_empty())
            })
            .unwrap_or_else(|| format!("Series {code}"));

        let submission = SeriesSubmission::builder()
            .code(code)
            .name(name)
            .source_url(source_url.cloned())
            .language(language)
            .entry_count(self.entries.len())
            .build();
        let groups = self.groups().into_values().collect::<Vec<_>>();
        Ok(save_series(store, &submission, &groups)?)
    }
}
