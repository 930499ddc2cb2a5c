//! Content lookup: `(scope, language) → contentKey → value`.
//!
//! The lookup itself never falls back to another language. Fallback is a
//! separate, single policy ([`resolve_with_fallback`]): requested language,
//! then the store's default language, then the static literal table.

use crate::error::StoreError;
use crate::i18n::{FallbackStrings, ResolutionMetrics};
use crate::models::{ContentEntry, NewContentEntry};
use crate::store::{RestStore, TableQuery};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{error, info, warn};

/// Resolved content, ordered by key so repeated lookups serialize identically.
pub type ContentMap = BTreeMap<String, String>;

/// Columns of the identity tuple; backed by a unique constraint in the store.
pub const CONTENT_CONFLICT_TARGET: &str = "section_key,media_id,language_code,content_key";

/// What a content row belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContentScope {
    /// Section-level content (`media_id IS NULL`)
    Section(String),
    /// Content of one media item
    Media(String),
}

impl ContentScope {
    fn apply(&self, query: TableQuery) -> TableQuery {
        match self {
            ContentScope::Section(key) => query.eq("section_key", key).is_null("media_id"),
            ContentScope::Media(id) => query.eq("media_id", id),
        }
    }
}

/// The languages tried, in order, when a key is missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackChain {
    pub requested: String,
    /// The store's default language, if it differs from `requested`
    pub default: Option<String>,
}

impl FallbackChain {
    pub fn new(requested: &str, default: Option<&str>) -> Self {
        Self {
            requested: requested.to_string(),
            default: default
                .filter(|code| *code != requested)
                .map(|code| code.to_string()),
        }
    }

    /// Codes in lookup order.
    pub fn languages(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.requested.as_str()).chain(self.default.as_deref())
    }
}

/// Where a served value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueOrigin {
    Requested,
    DefaultLanguage,
    Literal,
}

/// Section content after the fallback policy has been applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedContent {
    pub language: String,
    pub values: ContentMap,
    /// Keys not served in the requested language, with their origin
    pub fallbacks: BTreeMap<String, ValueOrigin>,
}

impl ResolvedContent {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn origin(&self, key: &str) -> Option<ValueOrigin> {
        if !self.values.contains_key(key) {
            return None;
        }
        Some(
            self.fallbacks
                .get(key)
                .copied()
                .unwrap_or(ValueOrigin::Requested),
        )
    }
}

/// Build a key → value map from rows of one scope and language.
///
/// Duplicate keys are a known data bug; the last row wins and the duplicate
/// is logged.
pub fn build_content_map(rows: impl IntoIterator<Item = ContentEntry>) -> ContentMap {
    let mut map = ContentMap::new();

    for row in rows {
        if let Some(previous) = map.insert(row.content_key.clone(), row.content_value) {
            warn!(
                "Duplicate content row for key '{}' in section '{}' ({}), replacing '{}'",
                row.content_key, row.section_key, row.language_code, previous
            );
        }
    }

    map
}

fn content_query(scope: &ContentScope, language: &str) -> TableQuery {
    scope
        .apply(TableQuery::new("content"))
        .eq("language_code", language)
        .eq("is_active", true)
        .order("id.asc")
}

/// Look up the content of a scope in exactly one language.
pub async fn try_resolve(
    store: &RestStore,
    scope: &ContentScope,
    language: &str,
) -> Result<ContentMap, StoreError> {
    ResolutionMetrics::global().record_content_lookup();
    let rows: Vec<ContentEntry> = store.select(&content_query(scope, language)).await?;
    Ok(build_content_map(rows))
}

/// Like [`try_resolve`], but a failed query is logged and served as empty.
/// An empty map means "use fallback", never "defined but empty".
pub async fn resolve(store: &RestStore, scope: &ContentScope, language: &str) -> ContentMap {
    match try_resolve(store, scope, language).await {
        Ok(map) => map,
        Err(e) => {
            error!("Content lookup for {:?} ({}) failed: {}", scope, language, e);
            ResolutionMetrics::global().record_lookup_failure();
            ContentMap::new()
        }
    }
}

/// Apply the fallback policy to already-fetched maps.
pub fn merge_with_fallback(
    language: &str,
    requested: ContentMap,
    default: ContentMap,
    literals: BTreeMap<String, &'static str>,
) -> ResolvedContent {
    let mut values = requested;
    let mut fallbacks = BTreeMap::new();

    for (key, value) in default {
        if !values.contains_key(&key) {
            fallbacks.insert(key.clone(), ValueOrigin::DefaultLanguage);
            values.insert(key, value);
        }
    }

    for (key, value) in literals {
        if !values.contains_key(&key) {
            fallbacks.insert(key.clone(), ValueOrigin::Literal);
            values.insert(key, value.to_string());
        }
    }

    ResolvedContent {
        language: language.to_string(),
        values,
        fallbacks,
    }
}

/// Resolve a section's content through the full fallback chain.
pub async fn resolve_with_fallback(
    store: &RestStore,
    strings: &FallbackStrings,
    section_key: &str,
    chain: &FallbackChain,
) -> ResolvedContent {
    let scope = ContentScope::Section(section_key.to_string());

    let (requested, default) = match &chain.default {
        Some(default_code) => {
            futures::join!(
                resolve(store, &scope, &chain.requested),
                resolve(store, &scope, default_code)
            )
        }
        None => (resolve(store, &scope, &chain.requested).await, ContentMap::new()),
    };

    let literals = strings.for_section(section_key, &chain.requested);
    let resolved = merge_with_fallback(&chain.requested, requested, default, literals);

    let from_default = resolved
        .fallbacks
        .values()
        .filter(|o| **o == ValueOrigin::DefaultLanguage)
        .count();
    let from_literal = resolved.fallbacks.len() - from_default;
    ResolutionMetrics::global().record_fallback_keys(from_default, from_literal);

    resolved
}

/// Write a batch of entries as one upsert keyed on the identity tuple.
///
/// A multi-language edit lands in a single statement, so a failure leaves
/// no language half-updated.
pub async fn upsert_entries(
    store: &RestStore,
    entries: &[NewContentEntry],
) -> Result<Vec<ContentEntry>, StoreError> {
    let written: Vec<ContentEntry> = store
        .upsert("content", CONTENT_CONFLICT_TARGET, entries)
        .await?;
    info!("Upserted {} content entries", written.len());
    Ok(written)
}
