//! Static fallback literals: the last tier of the content fallback chain.
//!
//! Every page region has a handful of fields that must never render empty.
//! When neither the requested language nor the store's default language has
//! a row for one of them, the literal from this table is shown instead. One
//! table for the whole site replaces per-view hardcoded strings.

use std::collections::BTreeMap;

/// One literal for a `(section, key, language)` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackLiteral {
    pub section_key: &'static str,
    pub content_key: &'static str,
    pub value: &'static str,
}

/// Literals grouped by language.
#[derive(Debug, Clone, Copy)]
pub struct LanguageStrings {
    pub language_code: &'static str,
    pub literals: &'static [FallbackLiteral],
}

const fn lit(section_key: &'static str, content_key: &'static str, value: &'static str) -> FallbackLiteral {
    FallbackLiteral {
        section_key,
        content_key,
        value,
    }
}

// ==================== Serbian Strings ====================

pub const SERBIAN_STRINGS: LanguageStrings = LanguageStrings {
    language_code: "sr",
    literals: &[
        lit("hero", "title", "Dobrodošli"),
        lit("hero", "subtitle", "Podkast o kulturi, zajednici i dijaspori"),
        lit("hero", "description", "Razgovori, priče i ukusi koji nas povezuju, gde god da smo."),
        lit("hero", "button_text", "Slušaj epizode"),
        lit("podcast", "title", "Podkast"),
        lit("podcast", "description", "Najnovije epizode našeg podkasta."),
        lit("cultural", "title", "Kultura"),
        lit("cultural", "description", "Tradicija, umetnost i običaji."),
        lit("kitchen", "title", "Kuhinja"),
        lit("kitchen", "description", "Recepti i priče iz naše kuhinje."),
        lit("diaspora", "title", "Dijaspora"),
        lit("diaspora", "description", "Priče naših ljudi širom sveta."),
        lit("posts", "title", "Objave"),
        lit("contact", "title", "Kontakt"),
        lit("contact", "description", "Pišite nam, rado ćemo odgovoriti."),
        lit("footer", "copyright", "Sva prava zadržana."),
        lit("footer", "tagline", "Kultura koja spaja."),
    ],
};

// ==================== English Strings ====================

pub const ENGLISH_STRINGS: LanguageStrings = LanguageStrings {
    language_code: "en",
    literals: &[
        lit("hero", "title", "Welcome"),
        lit("hero", "subtitle", "A podcast about culture, community and diaspora"),
        lit("hero", "description", "Conversations, stories and flavours that connect us, wherever we are."),
        lit("hero", "button_text", "Listen to episodes"),
        lit("podcast", "title", "Podcast"),
        lit("podcast", "description", "The latest episodes of our podcast."),
        lit("cultural", "title", "Culture"),
        lit("cultural", "description", "Tradition, art and customs."),
        lit("kitchen", "title", "Kitchen"),
        lit("kitchen", "description", "Recipes and stories from our kitchen."),
        lit("diaspora", "title", "Diaspora"),
        lit("diaspora", "description", "Stories of our people around the world."),
        lit("posts", "title", "Posts"),
        lit("contact", "title", "Contact"),
        lit("contact", "description", "Write to us, we are happy to answer."),
        lit("footer", "copyright", "All rights reserved."),
        lit("footer", "tagline", "Culture that connects."),
    ],
};

// ==================== German Strings ====================

pub const GERMAN_STRINGS: LanguageStrings = LanguageStrings {
    language_code: "de",
    literals: &[
        lit("hero", "title", "Willkommen"),
        lit("hero", "subtitle", "Ein Podcast über Kultur, Gemeinschaft und Diaspora"),
        lit("hero", "description", "Gespräche, Geschichten und Geschmäcker, die uns verbinden, wo immer wir sind."),
        lit("hero", "button_text", "Episoden anhören"),
        lit("podcast", "title", "Podcast"),
        lit("podcast", "description", "Die neuesten Episoden unseres Podcasts."),
        lit("cultural", "title", "Kultur"),
        lit("cultural", "description", "Tradition, Kunst und Bräuche."),
        lit("kitchen", "title", "Küche"),
        lit("kitchen", "description", "Rezepte und Geschichten aus unserer Küche."),
        lit("diaspora", "title", "Diaspora"),
        lit("diaspora", "description", "Geschichten unserer Leute aus aller Welt."),
        lit("posts", "title", "Beiträge"),
        lit("contact", "title", "Kontakt"),
        lit("contact", "description", "Schreiben Sie uns, wir antworten gerne."),
        lit("footer", "copyright", "Alle Rechte vorbehalten."),
        lit("footer", "tagline", "Kultur, die verbindet."),
    ],
};

const ALL_STRINGS: &[LanguageStrings] = &[SERBIAN_STRINGS, ENGLISH_STRINGS, GERMAN_STRINGS];

/// Lookup over the literal tables.
///
/// Literals are looked up in the requested language first and then in the
/// static fallback language, so a language with no literal table of its own
/// still gets something readable.
#[derive(Debug, Clone)]
pub struct FallbackStrings {
    static_language: String,
}

impl FallbackStrings {
    pub fn new(static_language: &str) -> Self {
        Self {
            static_language: static_language.to_string(),
        }
    }

    /// All literals of a section, keyed by content key.
    pub fn for_section(&self, section_key: &str, language: &str) -> BTreeMap<String, &'static str> {
        let mut values = BTreeMap::new();

        // Static language first so the requested language overwrites it
        for code in [self.static_language.as_str(), language] {
            if let Some(strings) = strings_for(code) {
                for literal in strings.literals.iter().filter(|l| l.section_key == section_key) {
                    values.insert(literal.content_key.to_string(), literal.value);
                }
            }
        }

        values
    }
}

fn strings_for(language: &str) -> Option<&'static LanguageStrings> {
    ALL_STRINGS.iter().find(|s| s.language_code == language)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find_literal(section_key: &str, content_key: &str, language: &str) -> Option<&'static str> {
        strings_for(language)?
            .literals
            .iter()
            .find(|l| l.section_key == section_key && l.content_key == content_key)
            .map(|l| l.value)
    }

    #[test]
    fn test_for_section_requested_language() {
        let strings = FallbackStrings::new("sr");
        assert_eq!(strings.for_section("hero", "en").get("title"), Some(&"Welcome"));
        assert_eq!(strings.for_section("hero", "de").get("title"), Some(&"Willkommen"));
    }

    #[test]
    fn test_for_section_unknown_section() {
        let strings = FallbackStrings::new("sr");
        assert!(strings.for_section("nowhere", "en").is_empty());
    }

    #[test]
    fn test_for_section_merges_static_language() {
        let strings = FallbackStrings::new("sr");
        let values = strings.for_section("hero", "en");

        assert_eq!(values.get("title"), Some(&"Welcome"));
        assert_eq!(values.get("subtitle").map(|s| s.contains("podcast")), Some(true));
        assert_eq!(values.len(), 4);
    }

    #[test]
    fn test_for_section_unknown_language_uses_static() {
        let strings = FallbackStrings::new("sr");
        let values = strings.for_section("footer", "it");
        assert_eq!(values.get("copyright"), Some(&"Sva prava zadržana."));
    }

    #[test]
    fn test_all_tables_cover_same_fields() {
        // Every field with a literal in one language has one in all of them
        for strings in ALL_STRINGS {
            for literal in strings.literals {
                for other in ALL_STRINGS {
                    assert!(
                        find_literal(literal.section_key, literal.content_key, other.language_code)
                            .is_some(),
                        "{}.{} missing for {}",
                        literal.section_key,
                        literal.content_key,
                        other.language_code
                    );
                }
            }
        }
    }

    #[test]
    fn test_no_empty_literals() {
        for strings in ALL_STRINGS {
            for literal in strings.literals {
                assert!(!literal.value.trim().is_empty());
            }
        }
    }
}
