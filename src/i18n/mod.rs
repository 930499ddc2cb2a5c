//! Internationalization (i18n) module for multi-language support.
//!
//! Languages are data in the store, not code. Everything here works on an
//! explicit, request-scoped [`LanguageSet`] passed into each call.
//!
//! # Architecture
//!
//! - `language`: `Language` rows and language-tag normalization
//! - `registry`: the active [`LanguageSet`] for one request
//! - `region`: static country → language table
//! - `resolver`: the visitor language priority chain
//! - `strings`: static fallback literals, the last tier of content fallback
//! - `metrics`: resolution observability
//!
//! # Example
//!
//! ```rust,ignore
//! use showcase_content::i18n::{load_languages, LanguageResolver, VisitorContext};
//!
//! let languages = load_languages(&store).await?;
//! let resolution = resolver.resolve(&VisitorContext::default(), &languages).await;
//! ```

mod language;
mod metrics;
mod region;
mod registry;
mod resolver;
mod strings;

pub use language::{normalize_code, Language};
pub use metrics::{MetricsReport, ResolutionMetrics};
pub use region::language_for_country;
pub use registry::{load_languages, LanguageSet};
pub use resolver::{
    preferred_browser_language, LanguageResolver, Resolution, ResolutionSource, VisitorContext,
};
pub use strings::{FallbackLiteral, FallbackStrings, LanguageStrings};
