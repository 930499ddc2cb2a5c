//! Language resolution: picks exactly one active language for a visitor.
//!
//! Priority chain, first match wins:
//!
//! 1. `lang` query parameter
//! 2. stored preference
//! 3. geolocation region (country → language table)
//! 4. browser locale (primary subtag of the preferred `Accept-Language` tag)
//! 5. the store's default language
//! 6. the static fallback code
//!
//! Tiers 1–4 only match codes of active languages. A match on tiers 1–4 is
//! written back as the stored preference by the caller; tiers 5–6 are not.

use crate::geolocation::GeoLocator;
use crate::i18n::language::normalize_code;
use crate::i18n::metrics::ResolutionMetrics;
use crate::i18n::region::language_for_country;
use crate::i18n::LanguageSet;
use serde::Serialize;
use std::net::IpAddr;
use tracing::debug;

/// Everything known about the visitor when resolving.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitorContext {
    /// Raw `lang` query parameter
    pub query_lang: Option<String>,
    /// Previously stored preference
    pub stored_preference: Option<String>,
    /// Client address, used for the region lookup
    pub client_ip: Option<IpAddr>,
    /// Raw `Accept-Language` header
    pub accept_language: Option<String>,
}

/// Which tier of the priority chain decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    UrlParameter,
    StoredPreference,
    Geolocation,
    Browser,
    StoreDefault,
    StaticFallback,
}

impl ResolutionSource {
    /// Whether a resolution from this tier becomes the stored preference.
    pub fn persists(self) -> bool {
        matches!(
            self,
            ResolutionSource::UrlParameter
                | ResolutionSource::StoredPreference
                | ResolutionSource::Geolocation
                | ResolutionSource::Browser
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub code: String,
    pub source: ResolutionSource,
}

impl Resolution {
    pub fn should_persist(&self) -> bool {
        self.source.persists()
    }
}

#[derive(Debug, Clone)]
pub struct LanguageResolver {
    geo: GeoLocator,
    fallback_code: String,
}

impl LanguageResolver {
    pub fn new(geo: GeoLocator, fallback_code: &str) -> Self {
        Self {
            geo,
            fallback_code: fallback_code.to_string(),
        }
    }

    /// Resolve the visitor's language against the active set.
    ///
    /// The region lookup only happens when tiers 1–2 did not decide.
    pub async fn resolve(&self, context: &VisitorContext, languages: &LanguageSet) -> Resolution {
        let resolution = self.resolve_inner(context, languages).await;
        debug!(
            "Resolved language '{}' via {:?}",
            resolution.code, resolution.source
        );
        ResolutionMetrics::global().record_resolution(resolution.source);
        resolution
    }

    async fn resolve_inner(&self, context: &VisitorContext, languages: &LanguageSet) -> Resolution {
        if let Some(code) = active_code(context.query_lang.as_deref(), languages) {
            return Resolution {
                code,
                source: ResolutionSource::UrlParameter,
            };
        }

        if let Some(code) = active_code(context.stored_preference.as_deref(), languages) {
            return Resolution {
                code,
                source: ResolutionSource::StoredPreference,
            };
        }

        if let Some(ip) = context.client_ip {
            if let Some(country) = self.geo.country_code(ip).await {
                if let Some(code) = active_code(language_for_country(&country), languages) {
                    return Resolution {
                        code,
                        source: ResolutionSource::Geolocation,
                    };
                }
            }
        }

        let browser = context
            .accept_language
            .as_deref()
            .and_then(preferred_browser_language);
        if let Some(code) = active_code(browser.as_deref(), languages) {
            return Resolution {
                code,
                source: ResolutionSource::Browser,
            };
        }

        if let Some(default) = languages.default_language() {
            return Resolution {
                code: default.code.clone(),
                source: ResolutionSource::StoreDefault,
            };
        }

        Resolution {
            code: self.fallback_code.clone(),
            source: ResolutionSource::StaticFallback,
        }
    }
}

fn active_code(candidate: Option<&str>, languages: &LanguageSet) -> Option<String> {
    languages
        .get_by_code(candidate?)
        .map(|language| language.code.clone())
}

/// Primary subtag of the highest-weighted tag of an `Accept-Language`
/// header. Ties keep header order; `*` and `q=0` tags are ignored.
pub fn preferred_browser_language(header: &str) -> Option<String> {
    let mut best: Option<(f32, String)> = None;

    for part in header.split(',') {
        let mut pieces = part.split(';');
        let tag = pieces.next().unwrap_or("").trim();
        if tag.is_empty() || tag == "*" {
            continue;
        }

        let weight = pieces
            .find_map(|p| p.trim().strip_prefix("q="))
            .map(|q| q.trim().parse::<f32>().unwrap_or(0.0))
            .unwrap_or(1.0);
        if weight <= 0.0 {
            continue;
        }

        let Some(code) = normalize_code(tag) else {
            continue;
        };

        if best.as_ref().map_or(true, |(w, _)| weight > *w) {
            best = Some((weight, code));
        }
    }

    best.map(|(_, code)| code)
}
