use cardlist_scraping_utils::regex;
use itertools::Itertools;

/// Cleans a scraped card name.
///
/// Trims, removes one layer of surrounding straight or curly double quotes,
/// then collapses every whitespace run into a single space.
/// Only one quote layer is removed, so `""a""` becomes `"a"`.
pub fn normalize(text: &str) -> String {
    let trimmed = text.trim();
    let unquoted = regex!(r#"(?s)^["“](.*)["”]$"#)
        .captures(trimmed)
        .and_then(|captures| captures.get(1))
        .map_or(trimmed, |inner| inner.as_str());
    collapse_whitespace(unquoted)
}

/// Collapses every whitespace run (newlines and `&nbsp;` included) into one space and trims.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().join(" ")
}
