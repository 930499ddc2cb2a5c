//! Language type: a row of the store's `languages` table.
//!
//! Codes coming from visitors (query parameters, cookies, browser locales)
//! are free-form, so every comparison goes through [`normalize_code`].

use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// A language the site can be shown in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    /// ISO 639-1 language code (e.g., "sr", "en", "de")
    pub code: String,

    /// Human-readable name (e.g., "Srpski", "English")
    #[serde(rename = "name", default)]
    pub display_name: String,

    /// Whether the language is offered to visitors
    #[serde(default = "default_true")]
    pub is_active: bool,

    /// Whether this is the site's default language (at most one active)
    #[serde(default)]
    pub is_default: bool,
}

impl Language {
    pub fn new(code: &str, display_name: &str) -> Self {
        Self {
            code: code.to_string(),
            display_name: display_name.to_string(),
            is_active: true,
            is_default: false,
        }
    }

    pub fn with_default(mut self, is_default: bool) -> Self {
        self.is_default = is_default;
        self
    }

    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }
}

/// Normalize a language tag to its lowercase primary subtag.
///
/// `"sr-Latn-RS"` → `"sr"`, `"EN_us"` → `"en"`. Returns `None` when the
/// primary subtag is not two or three ASCII letters.
pub fn normalize_code(raw: &str) -> Option<String> {
    let primary = raw.trim().split(['-', '_']).next()?;

    if !(2..=3).contains(&primary.len()) || !primary.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    Some(primary.to_ascii_lowercase())
}
