use cardlist_scraping_utils::regex;
use getset::{CopyGetters, Getters};
use log::trace;
use regex::Regex;
use serde::Serialize;

use crate::{
    name::{collapse_whitespace, normalize},
    schema::ArtworkKind,
};

#[derive(Clone, PartialEq, Eq, Debug, Getters, CopyGetters, Serialize)]
pub struct ArtworkDetection {
    #[getset(get_copy = "pub")]
    artwork: ArtworkKind,
    #[getset(get = "pub")]
    cleaned_english_name: String,
}

impl ArtworkDetection {
    pub fn into_cleaned_english_name(self) -> String {
        self.cleaned_english_name
    }
}

/// Annotations inside the English name. Tried in order.
fn name_patterns() -> [(&'static Regex, ArtworkKind); 9] {
    use ArtworkKind::{Alternative, New};
    [
        (regex!(r"(?i)\(new artwork\)"), New),
        (regex!(r"(?i)\(nouvel(?:le)? artwork\)"), New),
        (regex!(r"(?i)\(alternate artwork\)"), Alternative),
        (regex!(r"(?i)\(alternative artwork\)"), Alternative),
        (regex!(r"(?i)\(alt artwork\)"), Alternative),
        (regex!(r"(?i)\(alt\)"), Alternative),
        (regex!(r"(?i)\(alternative\)"), Alternative),
        (regex!(r"(?i)\(alternate\)"), Alternative),
        (regex!(r"(?i)\(new\)"), New),
    ]
}

/// Free text of the auxiliary artwork column.
fn extra_cell_patterns() -> [(&'static Regex, ArtworkKind); 6] {
    use ArtworkKind::{Alternative, New};
    [
        (regex!(r"(?i)(?-u:\b)new artwork(?-u:\b)"), New),
        (regex!(r"(?i)(?-u:\b)nouvel(?:le)? artwork(?-u:\b)"), New),
        (regex!(r"(?i)(?-u:\b)new(?-u:\b)"), New),
        (regex!(r"(?i)(?-u:\b)alternate artwork(?-u:\b)"), Alternative),
        (regex!(r"(?i)(?-u:\b)alternative artwork(?-u:\b)"), Alternative),
        (regex!(r"(?i)(?-u:\b)alt(?:ernate)?(?-u:\b)"), Alternative),
    ]
}

fn code_patterns() -> [(&'static Regex, ArtworkKind); 3] {
    use ArtworkKind::{Alternative, New};
    [
        (regex!(r"(?i)-new$"), New),
        (regex!(r"(?i)-(?:aa|alt|alternative)$"), Alternative),
        (regex!(r"(?i)-a$"), Alternative),
    ]
}

fn first_match<const N: usize>(
    patterns: [(&'static Regex, ArtworkKind); N],
    text: &str,
) -> Option<ArtworkKind> {
    patterns
        .into_iter()
        .find(|(pattern, _)| pattern.is_match(text))
        .map(|(_, kind)| kind)
}

/// Decides which artwork a printing uses.
///
/// Signals are checked in this order and the first hit wins:
/// an annotation in the English name (which is then removed from the name),
/// the auxiliary cell text, and finally the code suffix.
pub fn classify(
    code: &str,
    english_name: Option<&str>,
    extra_text: Option<&str>,
) -> ArtworkDetection {
    let cleaned_english_name = english_name.map(normalize).unwrap_or_default();

    if !cleaned_english_name.is_empty() {
        let hit = name_patterns()
            .into_iter()
            .find(|(pattern, _)| pattern.is_match(&cleaned_english_name));
        if let Some((pattern, artwork)) = hit {
            trace!("{code}: artwork {artwork} from name {cleaned_english_name:?}");
            return ArtworkDetection {
                artwork,
                cleaned_english_name: collapse_whitespace(
                    &pattern.replace_all(&cleaned_english_name, ""),
                ),
            };
        }
    }

    let artwork = extra_text
        .and_then(|text| first_match(extra_cell_patterns(), text))
        .or_else(|| first_match(code_patterns(), code))
        .unwrap_or_default();
    if artwork != ArtworkKind::None {
        trace!("{code}: artwork {artwork} from extra cell or code");
    }
    ArtworkDetection {
        artwork,
        cleaned_english_name,
    }
}
