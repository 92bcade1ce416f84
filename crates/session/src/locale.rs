use std::collections::BTreeSet;

use serde_json::Value;

use crate::config::ConfigError;
use crate::prefs::{LOCALE_KEY, PrefsError, PrefsStore};

pub const FALLBACK_LOCALE: &str = "en";

/// Locales present in the message bundle (`langs.json`, keyed by locale).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LocaleCatalog {
    locales: BTreeSet<String>,
}

impl LocaleCatalog {
    pub fn new<I, S>(locales: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            locales: locales.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_messages_json(json: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(json).map_err(ConfigError::Json)?;
        let obj = value
            .as_object()
            .ok_or_else(|| ConfigError::Invalid("messages must be an object keyed by locale".to_string()))?;
        Ok(Self::new(obj.keys().cloned()))
    }

    pub fn contains(&self, locale: &str) -> bool {
        self.locales.contains(locale)
    }

    pub fn locales(&self) -> impl Iterator<Item = &str> {
        self.locales.iter().map(String::as_str)
    }
}

/// Maps a browser language tag onto a supported UI language.
pub fn browser_locale(language: Option<&str>) -> &'static str {
    let lang = language.unwrap_or_default().to_ascii_lowercase();
    if lang.starts_with("pl") {
        "pl"
    } else if lang.starts_with("es") {
        "es"
    } else {
        FALLBACK_LOCALE
    }
}

/// Stored preference first, then the browser language; anything the catalog
/// lacks falls back to English.
pub fn resolve_initial_locale(
    stored: Option<&str>,
    browser_language: Option<&str>,
    catalog: &LocaleCatalog,
) -> String {
    let candidate = stored
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| browser_locale(browser_language));
    if catalog.contains(candidate) {
        candidate.to_string()
    } else {
        FALLBACK_LOCALE.to_string()
    }
}

/// Persists `locale` if the catalog knows it. Returns whether it was accepted.
pub fn persist_locale(
    locale: &str,
    catalog: &LocaleCatalog,
    prefs: &mut dyn PrefsStore,
) -> Result<bool, PrefsError> {
    if !catalog.contains(locale) {
        return Ok(false);
    }
    prefs.set(LOCALE_KEY, locale)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::{LocaleCatalog, browser_locale, persist_locale, resolve_initial_locale};
    use crate::prefs::{InMemoryPrefsStore, LOCALE_KEY, PrefsStore};

    fn catalog() -> LocaleCatalog {
        LocaleCatalog::from_messages_json(r#"{"en":{"hi":"Hi"},"pl":{"hi":"Cześć"}}"#)
            .expect("catalog")
    }

    #[test]
    fn browser_language_mapping() {
        assert_eq!(browser_locale(Some("pl-PL")), "pl");
        assert_eq!(browser_locale(Some("ES")), "es");
        assert_eq!(browser_locale(Some("de-DE")), "en");
        assert_eq!(browser_locale(None), "en");
    }

    #[test]
    fn stored_preference_wins_when_known() {
        let c = catalog();
        assert_eq!(resolve_initial_locale(Some("pl"), Some("en-US"), &c), "pl");
        assert_eq!(resolve_initial_locale(None, Some("pl"), &c), "pl");
        // Spanish is detected but missing from the bundle.
        assert_eq!(resolve_initial_locale(None, Some("es-AR"), &c), "en");
        assert_eq!(resolve_initial_locale(Some("fr"), Some("pl"), &c), "en");
    }

    #[test]
    fn persist_only_known_locales() {
        let c = catalog();
        let mut prefs = InMemoryPrefsStore::new();
        assert_eq!(persist_locale("de", &c, &mut prefs), Ok(false));
        assert_eq!(prefs.get(LOCALE_KEY), Ok(None));
        assert_eq!(persist_locale("pl", &c, &mut prefs), Ok(true));
        assert_eq!(prefs.get(LOCALE_KEY), Ok(Some("pl".to_string())));
    }

    #[test]
    fn rejects_non_object_bundle() {
        assert!(LocaleCatalog::from_messages_json("[1,2]").is_err());
    }
}
