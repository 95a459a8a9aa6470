use log::debug;
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::{
    artwork,
    name::{collapse_whitespace, normalize},
    schema::CardEntry,
    table::{HtmlTable, TableCell, TableRow},
};

/// Rows with fewer data cells than this are headers or noise.
pub const MIN_DATA_CELLS: usize = 4;

/// Text of one data row, before any cleaning.
#[derive(Clone, Default, PartialEq, Eq, Debug, TypedBuilder, Serialize, Deserialize)]
pub struct RawTableRow {
    #[builder(setter(into))]
    pub code: String,
    #[builder(setter(into))]
    pub english_name_raw: String,
    #[builder(default, setter(into))]
    pub localized_name_raw: String,
    #[builder(default)]
    pub rarity_labels: Vec<String>,
    #[builder(default, setter(strip_option, into))]
    pub type_raw: Option<String>,
    #[builder(default, setter(strip_option, into))]
    pub extra_hint_raw: Option<String>,
}

impl RawTableRow {
    /// Column layout: code, English name, localized name, rarities, type, artwork hint.
    pub fn from_cells<C: TableCell>(cells: &[C]) -> Option<Self> {
        if cells.len() < MIN_DATA_CELLS {
            return None;
        }
        Some(Self {
            code: cells[0].text(),
            english_name_raw: cells[1].text(),
            localized_name_raw: cells[2].text(),
            rarity_labels: cells[3].link_labels(),
            type_raw: cells.get(4).map(TableCell::text),
            extra_hint_raw: cells.get(5).map(TableCell::text),
        })
    }
}

/// Expands one row into one entry per rarity label.
///
/// Returns nothing for a row without code or without rarity.
pub fn parse_row(row: &RawTableRow) -> Vec<CardEntry> {
    let code = collapse_whitespace(&row.code);
    if code.is_empty() {
        debug!("Skipping a row without code: {row:?}");
        return vec![];
    }

    let rarities = row
        .rarity_labels
        .iter()
        .map(|label| label.trim())
        .filter(|label| !label.is_empty())
        .collect::<Vec<_>>();
    if rarities.is_empty() {
        debug!("Skipping {code}: no rarity found");
        return vec![];
    }

    let detection = artwork::classify(
        &code,
        Some(&row.english_name_raw),
        row.extra_hint_raw.as_deref(),
    );
    let artwork = detection.artwork();
    let mut name_english = detection.into_cleaned_english_name();
    if name_english.is_empty() {
        // The name consisted of the annotation alone.
        name_english = normalize(&row.english_name_raw);
    }
    let name_localized = normalize(&row.localized_name_raw);
    let card_type = row
        .type_raw
        .as_deref()
        .map(collapse_whitespace)
        .unwrap_or_default();

    rarities
        .into_iter()
        .map(|rarity| CardEntry {
            code: code.clone(),
            name_english: name_english.clone(),
            name_localized: name_localized.clone(),
            rarity: rarity.to_owned(),
            card_type: card_type.clone(),
            artwork,
        })
        .collect()
}

pub fn parse_rows<'a>(rows: impl IntoIterator<Item = &'a RawTableRow>) -> Vec<CardEntry> {
    rows.into_iter().flat_map(parse_row).collect()
}

/// Parses rows through the table capability, dropping header rows.
pub fn parse_table<R: TableRow>(rows: impl IntoIterator<Item = R>) -> Vec<CardEntry> {
    rows.into_iter()
        .filter_map(|row| RawTableRow::from_cells(&row.cells()))
        .flat_map(|row| parse_row(&row))
        .collect()
}

/// Parses the first table body of `html` (a page or a `<tbody>` fragment).
pub fn parse_html(html: &str) -> Vec<CardEntry> {
    let table = HtmlTable::parse(html);
    let entries = parse_table(table.rows());
    debug!("Parsed {} entries from HTML", entries.len());
    entries
}
