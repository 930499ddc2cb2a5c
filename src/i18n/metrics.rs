//! Resolution metrics and observability module.
//!
//! Counts which tier of the language priority chain decided each request,
//! how often geolocation failed, and how often content had to be served from
//! a fallback tier.

use crate::i18n::ResolutionSource;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

/// Global resolution metrics singleton.
pub struct ResolutionMetrics {
    by_url_parameter: AtomicUsize,
    by_stored_preference: AtomicUsize,
    by_geolocation: AtomicUsize,
    by_browser: AtomicUsize,
    by_store_default: AtomicUsize,
    by_static_fallback: AtomicUsize,

    /// Geolocation lookups that timed out or failed
    geolocation_failures: AtomicUsize,

    /// Content lookups issued against the store
    content_lookups: AtomicUsize,

    /// Content lookups that failed and were served as empty
    lookup_failures: AtomicUsize,

    /// Keys served from the store's default language
    default_language_keys: AtomicUsize,

    /// Keys served from the static literal table
    literal_keys: AtomicUsize,
}

/// Global metrics instance (initialized lazily)
static METRICS: OnceLock<ResolutionMetrics> = OnceLock::new();

impl ResolutionMetrics {
    pub fn global() -> &'static ResolutionMetrics {
        METRICS.get_or_init(ResolutionMetrics::new)
    }

    fn new() -> Self {
        ResolutionMetrics {
            by_url_parameter: AtomicUsize::new(0),
            by_stored_preference: AtomicUsize::new(0),
            by_geolocation: AtomicUsize::new(0),
            by_browser: AtomicUsize::new(0),
            by_store_default: AtomicUsize::new(0),
            by_static_fallback: AtomicUsize::new(0),
            geolocation_failures: AtomicUsize::new(0),
            content_lookups: AtomicUsize::new(0),
            lookup_failures: AtomicUsize::new(0),
            default_language_keys: AtomicUsize::new(0),
            literal_keys: AtomicUsize::new(0),
        }
    }

    pub fn record_resolution(&self, source: ResolutionSource) {
        let counter = match source {
            ResolutionSource::UrlParameter => &self.by_url_parameter,
            ResolutionSource::StoredPreference => &self.by_stored_preference,
            ResolutionSource::Geolocation => &self.by_geolocation,
            ResolutionSource::Browser => &self.by_browser,
            ResolutionSource::StoreDefault => &self.by_store_default,
            ResolutionSource::StaticFallback => &self.by_static_fallback,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_geolocation_failure(&self) {
        self.geolocation_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_content_lookup(&self) {
        self.content_lookups.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_lookup_failure(&self) {
        self.lookup_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fallback_keys(&self, default_language: usize, literal: usize) {
        self.default_language_keys
            .fetch_add(default_language, Ordering::Relaxed);
        self.literal_keys.fetch_add(literal, Ordering::Relaxed);
    }

    pub fn geolocation_failures(&self) -> usize {
        self.geolocation_failures.load(Ordering::Relaxed)
    }

    pub fn lookup_failures(&self) -> usize {
        self.lookup_failures.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let lookups = self.content_lookups.load(Ordering::Relaxed);
        let failures = self.lookup_failures();
        let lookup_success_rate = if lookups > 0 {
            (lookups.saturating_sub(failures) as f64 / lookups as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            resolutions: ResolutionCounts {
                url_parameter: self.by_url_parameter.load(Ordering::Relaxed),
                stored_preference: self.by_stored_preference.load(Ordering::Relaxed),
                geolocation: self.by_geolocation.load(Ordering::Relaxed),
                browser: self.by_browser.load(Ordering::Relaxed),
                store_default: self.by_store_default.load(Ordering::Relaxed),
                static_fallback: self.by_static_fallback.load(Ordering::Relaxed),
            },
            geolocation_failures: self.geolocation_failures(),
            content_lookups: lookups,
            lookup_failures: failures,
            lookup_success_rate,
            default_language_keys: self.default_language_keys.load(Ordering::Relaxed),
            literal_keys: self.literal_keys.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolutionCounts {
    pub url_parameter: usize,
    pub stored_preference: usize,
    pub geolocation: usize,
    pub browser: usize,
    pub store_default: usize,
    pub static_fallback: usize,
}

/// Metrics report containing current resolution statistics.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub resolutions: ResolutionCounts,
    pub geolocation_failures: usize,
    pub content_lookups: usize,
    pub lookup_failures: usize,
    /// Lookup success rate as a percentage (0-100)
    pub lookup_success_rate: f64,
    pub default_language_keys: usize,
    pub literal_keys: usize,
}
