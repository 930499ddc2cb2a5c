//! Language set: the active languages for one request.
//!
//! Languages live in the store and are read on every page load, so the set
//! is built per request and passed explicitly into every resolution call.
//! Nothing here is global.

use crate::error::StoreError;
use crate::i18n::language::{normalize_code, Language};
use crate::store::{RestStore, TableQuery};
use tracing::{debug, warn};

/// Active languages, ordered by code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageSet {
    languages: Vec<Language>,
}

impl LanguageSet {
    /// Build a set from store rows, keeping only active languages.
    ///
    /// Codes are normalized. When more than one active language claims to
    /// be the default, the one with the lowest code wins and the conflict
    /// is logged.
    pub fn new(rows: Vec<Language>) -> Self {
        let mut languages: Vec<Language> = Vec::with_capacity(rows.len());

        for mut language in rows.into_iter().filter(|l| l.is_active) {
            let Some(code) = normalize_code(&language.code) else {
                warn!("Ignoring language with invalid code '{}'", language.code);
                continue;
            };
            if languages.iter().any(|l| l.code == code) {
                warn!("Ignoring duplicate language code '{}'", code);
                continue;
            }
            language.code = code;
            languages.push(language);
        }
        languages.sort_by(|a, b| a.code.cmp(&b.code));

        let defaults: Vec<&str> = languages
            .iter()
            .filter(|l| l.is_default)
            .map(|l| l.code.as_str())
            .collect();
        if defaults.len() > 1 {
            warn!(
                "Multiple active default languages {:?}, using '{}'",
                defaults, defaults[0]
            );
        }

        Self { languages }
    }

    /// Get an active language by (possibly non-normalized) code.
    pub fn get_by_code(&self, code: &str) -> Option<&Language> {
        let code = normalize_code(code)?;
        self.languages.iter().find(|lang| lang.code == code)
    }

    pub fn list_active(&self) -> &[Language] {
        &self.languages
    }

    /// The language flagged `is_default`, if any.
    pub fn default_language(&self) -> Option<&Language> {
        self.languages.iter().find(|lang| lang.is_default)
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.languages.len()
    }
}

/// Load the active language set from the store.
pub async fn load_languages(store: &RestStore) -> Result<LanguageSet, StoreError> {
    let rows: Vec<Language> = store
        .select(
            &TableQuery::new("languages")
                .eq("is_active", true)
                .order("code.asc"),
        )
        .await?;

    let languages = LanguageSet::new(rows);
    if languages.is_empty() {
        warn!("No active languages in the store");
    } else {
        debug!("Loaded {} active languages", languages.len());
    }
    Ok(languages)
}
