use cardlist_scraping_utils::regex;

use crate::name::collapse_whitespace;

const SERIES_CODE_MAX_LEN: usize = 10;

/// `BLMM-FR001` -> `BLMM`. A code without `-` is used as a whole.
pub fn derive_series_code(card_code: &str) -> String {
    let code = card_code.trim().to_uppercase();
    let prefix = match code.find('-') {
        Some(i) if i > 0 => &code[..i],
        _ => &code,
    };
    prefix.chars().take(SERIES_CODE_MAX_LEN).collect()
}

/// Guesses a human-readable series name from a wiki set-list URL.
///
/// Returns an empty string for URLs that do not look like a wiki page.
pub fn series_name_from_url(url: &str) -> String {
    let url = url.trim();
    let page = if let Some((_, page)) = url.split_once("Set_Card_Lists:") {
        page
    } else if let Some((_, page)) = url.split_once("/wiki/") {
        page.split('?').next().unwrap_or_default()
    } else {
        return String::new();
    };

    let page = urlencoding::decode(page).map_or_else(|_| page.to_owned(), |p| p.into_owned());
    let page = regex!(r"(?i)\((?:TCG-FR|TCG|OCG)\)\s*$").replace(&page, "");
    let page = regex!(r"(?i)&colon;").replace_all(&page, ":");
    collapse_whitespace(&page.replace('_', " "))
}

#[cfg(test)]
mod tests {
    use super::{derive_series_code, series_name_from_url};

    #[test]
    fn test_derive_series_code() {
        assert_eq!(derive_series_code("blmm-fr001"), "BLMM");
        assert_eq!(derive_series_code(" RA01-EN001 "), "RA01");
        assert_eq!(derive_series_code("-FR001"), "-FR001");
        assert_eq!(derive_series_code("ABCDEFGHIJKLMNOP"), "ABCDEFGHIJ");
        assert_eq!(derive_series_code(""), "");
    }

    #[test]
    fn test_series_name_from_url() {
        assert_eq!(
            series_name_from_url(
                "https://yugipedia.com/wiki/Set_Card_Lists:Battles_of_Legend:_Monster_Mayhem_(TCG-FR)"
            ),
            "Battles of Legend: Monster Mayhem"
        );
        assert_eq!(
            series_name_from_url("https://yugipedia.com/wiki/Legend_of_Blue_Eyes_White_Dragon?action=raw"),
            "Legend of Blue Eyes White Dragon"
        );
        assert_eq!(
            series_name_from_url("https://yugipedia.com/wiki/Set_Card_Lists%3ARarity_Collection_(OCG)"),
            "Set Card Lists:Rarity Collection"
        );
        assert_eq!(
            series_name_from_url("https://yugipedia.com/wiki/Duelist_Pack&colon;_Kaiba_(tcg)"),
            "Duelist Pack: Kaiba"
        );
        assert_eq!(series_name_from_url("https://example.com/page"), "");
        assert_eq!(series_name_from_url(""), "");
    }
}
