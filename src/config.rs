use std::{path::Path, time::Duration};

use cardlist_scraping_utils::fs_json_util::read_toml;
use getset::{CopyGetters, Getters};
use log::info;
use serde::Deserialize;

use crate::language::{LanguageCode, DEFAULT_LANGUAGE};

#[derive(Clone, Debug, Default, Deserialize, Getters)]
#[serde(default, deny_unknown_fields)]
#[getset(get = "pub")]
pub struct Config {
    fetch: FetchConfig,
    ingest: IngestConfig,
}

impl Config {
    /// Reads the TOML file at `path`, or returns the defaults when there is none.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => {
                info!("Loading config from {path:?}");
                read_toml(path)
            }
            None => Ok(Self::default()),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Getters, CopyGetters)]
#[serde(default, deny_unknown_fields)]
pub struct FetchConfig {
    /// A host is accepted if it equals an entry or is a subdomain of one.
    #[getset(get = "pub")]
    allowed_hosts: Vec<String>,
    #[getset(get_copy = "pub")]
    timeout_secs: u64,
    #[getset(get_copy = "pub")]
    max_redirects: usize,
    #[getset(get = "pub")]
    user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            allowed_hosts: vec!["yugipedia.com".to_owned()],
            timeout_secs: 15,
            max_redirects: 5,
            user_agent: "Mozilla/5.0 (compatible; CardlistBot/1.0)".to_owned(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Clone, Debug, Deserialize, CopyGetters)]
#[serde(default, deny_unknown_fields)]
#[getset(get_copy = "pub")]
pub struct IngestConfig {
    /// Used when no language can be read from the card codes.
    default_language: Option<LanguageCode>,
    /// Below this, the detected language is still used but a warning is logged.
    min_language_confidence: f64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            default_language: Some(DEFAULT_LANGUAGE),
            min_language_confidence: 0.5,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::Config;
    use crate::language::LanguageCode;

    #[test]
    fn test_defaults() {
        let config = Config::load(None).unwrap();
        assert_eq!(config.fetch().allowed_hosts(), &["yugipedia.com"]);
        assert_eq!(config.fetch().timeout(), Duration::from_secs(15));
        assert_eq!(config.fetch().max_redirects(), 5);
        assert_eq!(config.ingest().default_language(), Some(LanguageCode::En));
    }

    #[test]
    fn test_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [fetch]
            allowed_hosts = ["yugipedia.com", "ygoprodeck.com"]
            timeout_secs = 3

            [ingest]
            default_language = "FR"
            "#,
        )
        .unwrap();
        assert_eq!(config.fetch().allowed_hosts().len(), 2);
        assert_eq!(config.fetch().timeout_secs(), 3);
        assert_eq!(config.fetch().max_redirects(), 5);
        assert_eq!(config.ingest().default_language(), Some(LanguageCode::Fr));
        assert_eq!(config.ingest().min_language_confidence(), 0.5);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        assert!(toml::from_str::<Config>("[fetch]\ntimeout = 3\n").is_err());
    }
}
