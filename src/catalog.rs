//! Media catalog: active media of a section, ordered, paginated and
//! enriched with per-language title/description.
//!
//! Ordering is `display_order` ascending, then `created_at` descending.
//! Pages are fetched as `page_size + 1` rows; the extra row only tells
//! whether another page exists and is never returned.

use crate::content::{ContentMap, FallbackChain};
use crate::error::StoreError;
use crate::models::{ContentEntry, MediaItem, MediaType};
use crate::social;
use crate::store::{RestStore, TableQuery};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use tracing::{error, info};

/// Translations of one media item: language → key → value.
pub type MediaTranslations = BTreeMap<String, ContentMap>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaQuery {
    pub section_key: String,
    /// Only list items tagged with the requested language
    pub filter_by_language: bool,
    /// Zero-based page index
    pub page: usize,
    pub page_size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichedMedia {
    #[serde(flatten)]
    pub item: MediaItem,
    /// Player URL for `social_video` items
    pub embed_url: Option<String>,
    /// Title in the requested language after fallback
    pub display_title: Option<String>,
    /// Description in the requested language after fallback
    pub display_description: Option<String>,
    pub translations: MediaTranslations,
}

impl EnrichedMedia {
    pub fn new(item: MediaItem, translations: MediaTranslations, chain: &FallbackChain) -> Self {
        let embed_url = match item.media_type {
            MediaType::SocialVideo => item.social_url.as_deref().map(social::embed_url),
            MediaType::Image | MediaType::Video => None,
        };

        let mut enriched = Self {
            item,
            embed_url,
            display_title: None,
            display_description: None,
            translations,
        };
        enriched.display_title = enriched.translated_content("title", chain).map(str::to_string);
        enriched.display_description = enriched
            .translated_content("description", chain)
            .map(str::to_string);
        enriched
    }

    /// Value of `key` in the first language of the chain that has it,
    /// else the item's own base field (`title` / `description` only).
    pub fn translated_content(&self, key: &str, chain: &FallbackChain) -> Option<&str> {
        chain
            .languages()
            .find_map(|lang| self.translations.get(lang)?.get(key))
            .map(String::as_str)
            .or_else(|| match key {
                "title" => self.item.title.as_deref(),
                "description" => self.item.description.as_deref(),
                _ => None,
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaPage {
    pub items: Vec<EnrichedMedia>,
    pub page: usize,
    pub page_size: usize,
    pub has_more: bool,
}

impl MediaPage {
    pub fn empty(page: usize, page_size: usize) -> Self {
        Self {
            items: Vec::new(),
            page,
            page_size,
            has_more: false,
        }
    }
}

/// Catalog order: `display_order` ascending, newest first on ties.
pub fn catalog_order(a: &MediaItem, b: &MediaItem) -> Ordering {
    a.display_order
        .cmp(&b.display_order)
        .then_with(|| b.created_at.cmp(&a.created_at))
}

/// Split a `page_size + 1` fetch into the page and the `has_more` flag.
pub fn paginate<T>(mut rows: Vec<T>, page_size: usize) -> (Vec<T>, bool) {
    let has_more = rows.len() > page_size;
    rows.truncate(page_size);
    (rows, has_more)
}

/// Group media content rows by media id, then by language.
pub fn group_translations(rows: Vec<ContentEntry>) -> HashMap<String, MediaTranslations> {
    let mut grouped: HashMap<String, MediaTranslations> = HashMap::new();

    for row in rows {
        let Some(media_id) = row.media_id else {
            continue;
        };
        grouped
            .entry(media_id)
            .or_default()
            .entry(row.language_code)
            .or_default()
            .insert(row.content_key, row.content_value);
    }

    grouped
}

/// Row offset of a zero-based page, or `None` when it does not fit in `usize`.
pub fn page_offset(page: usize, page_size: usize) -> Option<usize> {
    page.checked_mul(page_size)
}

fn media_query(query: &MediaQuery, language: &str, offset: usize) -> TableQuery {
    let mut table = TableQuery::new("media")
        .eq("section_key", &query.section_key)
        .eq("is_active", true);

    if query.filter_by_language {
        table = table.eq("language_code", language);
    }

    table
        .order("display_order.asc,created_at.desc")
        .limit(query.page_size.saturating_add(1))
        .offset(offset)
}

/// List one page of active media for a section.
///
/// A failed translation query degrades to untranslated items; a failed
/// media query is returned as an error.
pub async fn list_active(
    store: &RestStore,
    query: &MediaQuery,
    chain: &FallbackChain,
) -> Result<MediaPage, StoreError> {
    let page_size = query.page_size.max(1);
    let query = MediaQuery {
        page_size,
        ..query.clone()
    };

    let Some(offset) = page_offset(query.page, page_size) else {
        return Ok(MediaPage::empty(query.page, page_size));
    };

    let rows: Vec<MediaItem> = store
        .select(&media_query(&query, &chain.requested, offset))
        .await?;
    let (mut items, has_more) = paginate(rows, page_size);
    items.sort_by(catalog_order);

    if items.is_empty() {
        return Ok(MediaPage::empty(query.page, page_size));
    }

    let ids: Vec<&str> = items.iter().map(|item| item.id.as_str()).collect();
    let languages: Vec<&str> = chain.languages().collect();
    let content_query = TableQuery::new("content")
        .in_list("media_id", &ids)
        .in_list("language_code", &languages)
        .eq("is_active", true)
        .order("id.asc");

    let mut translations = match store.select::<ContentEntry>(&content_query).await {
        Ok(rows) => group_translations(rows),
        Err(e) => {
            error!(
                "Media translations for section '{}' failed: {}",
                query.section_key, e
            );
            HashMap::new()
        }
    };

    let items: Vec<EnrichedMedia> = items
        .into_iter()
        .map(|item| {
            let item_translations = translations.remove(&item.id).unwrap_or_default();
            EnrichedMedia::new(item, item_translations, chain)
        })
        .collect();

    info!(
        "Listed {} media items for section '{}' (page {}, has_more: {})",
        items.len(),
        query.section_key,
        query.page,
        has_more
    );

    Ok(MediaPage {
        items,
        page: query.page,
        page_size,
        has_more,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use proptest::prelude::*;
    use wiremock::{
        matchers::{method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn media(id: &str, order: i32, minutes: i64) -> MediaItem {
        MediaItem {
            id: id.to_string(),
            section_key: "podcast".to_string(),
            media_type: MediaType::Video,
            file_url: Some(format!("https://cdn.example.com/{}.mp4", id)),
            social_url: None,
            thumbnail_url: None,
            display_order: order,
            is_active: true,
            language_code: Some("sr".to_string()),
            title: Some(format!("Base {}", id)),
            description: None,
            created_at: base_time() + Duration::minutes(minutes),
        }
    }

    fn translation(media_id: &str, lang: &str, key: &str, value: &str) -> ContentEntry {
        ContentEntry {
            id: format!("{}-{}-{}", media_id, lang, key),
            section_key: "podcast".to_string(),
            media_id: Some(media_id.to_string()),
            language_code: lang.to_string(),
            content_key: key.to_string(),
            content_value: value.to_string(),
            is_active: true,
        }
    }

    fn query(page: usize, page_size: usize) -> MediaQuery {
        MediaQuery {
            section_key: "podcast".to_string(),
            filter_by_language: false,
            page,
            page_size,
        }
    }

    async fn mount_media(server: &MockServer, offset: usize, rows: &[MediaItem]) {
        Mock::given(method("GET"))
            .and(path("/rest/v1/media"))
            .and(query_param("offset", offset.to_string()))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::to_value(rows).unwrap()),
            )
            .mount(server)
            .await;
    }

    async fn mount_translations(server: &MockServer, rows: &[ContentEntry]) {
        Mock::given(method("GET"))
            .and(path("/rest/v1/content"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::to_value(rows).unwrap()),
            )
            .mount(server)
            .await;
    }

    // ==================== paginate Tests ====================

    #[test]
    fn test_paginate_extra_row_signals_more() {
        let (rows, has_more) = paginate(vec![1, 2, 3, 4], 3);
        assert_eq!(rows, vec![1, 2, 3]);
        assert!(has_more);
    }

    #[test]
    fn test_paginate_exactly_full_page_has_no_more() {
        let (rows, has_more) = paginate(vec![1, 2, 3], 3);
        assert_eq!(rows.len(), 3);
        assert!(!has_more);
    }

    #[test]
    fn test_paginate_empty() {
        let (rows, has_more) = paginate(Vec::<i32>::new(), 6);
        assert!(rows.is_empty());
        assert!(!has_more);
    }

    // ==================== ordering Tests ====================

    #[test]
    fn test_catalog_order_ties_newest_first() {
        let mut items = vec![media("old", 1, 0), media("first", 0, 0), media("new", 1, 10)];
        items.sort_by(catalog_order);
        let ids: Vec<_> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "new", "old"]);
    }

    proptest! {
        #[test]
        fn prop_catalog_order_invariant(entries in prop::collection::vec((0i32..5, 0i64..1000), 0..40)) {
            let mut items: Vec<MediaItem> = entries
                .iter()
                .enumerate()
                .map(|(i, (order, minutes))| media(&i.to_string(), *order, *minutes))
                .collect();
            items.sort_by(catalog_order);

            for pair in items.windows(2) {
                prop_assert!(pair[0].display_order <= pair[1].display_order);
                if pair[0].display_order == pair[1].display_order {
                    prop_assert!(pair[0].created_at >= pair[1].created_at);
                }
            }
        }

        #[test]
        fn prop_paginate_never_exceeds_page(len in 0usize..50, page_size in 1usize..10) {
            let rows: Vec<usize> = (0..len).collect();
            let (page, has_more) = paginate(rows, page_size);
            prop_assert!(page.len() <= page_size);
            prop_assert_eq!(has_more, len > page_size);
        }
    }

    // ==================== group_translations Tests ====================

    #[test]
    fn test_group_translations() {
        let grouped = group_translations(vec![
            translation("m1", "en", "title", "Episode one"),
            translation("m1", "de", "title", "Folge eins"),
            translation("m2", "en", "title", "Episode two"),
        ]);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped["m1"]["de"]["title"], "Folge eins");
        assert_eq!(grouped["m2"].len(), 1);
    }

    #[test]
    fn test_group_translations_skips_section_rows() {
        let mut row = translation("m1", "en", "title", "x");
        row.media_id = None;
        assert!(group_translations(vec![row]).is_empty());
    }

    // ==================== translated_content Tests ====================

    #[test]
    fn test_translated_content_chain() {
        let translations = group_translations(vec![
            translation("m1", "sr", "title", "Epizoda jedan"),
            translation("m1", "sr", "description", "Opis"),
            translation("m1", "en", "title", "Episode one"),
        ])
        .remove("m1")
        .unwrap();

        let chain = FallbackChain::new("en", Some("sr"));
        let enriched = EnrichedMedia::new(media("m1", 0, 0), translations, &chain);

        assert_eq!(enriched.translated_content("title", &chain), Some("Episode one"));
        assert_eq!(enriched.translated_content("description", &chain), Some("Opis"));
        assert_eq!(enriched.display_title.as_deref(), Some("Episode one"));
        assert_eq!(enriched.display_description.as_deref(), Some("Opis"));
    }

    #[test]
    fn test_translated_content_falls_back_to_base_field() {
        let chain = FallbackChain::new("de", None);
        let enriched = EnrichedMedia::new(media("m1", 0, 0), MediaTranslations::new(), &chain);

        assert_eq!(enriched.translated_content("title", &chain), Some("Base m1"));
        assert_eq!(enriched.translated_content("description", &chain), None);
        assert_eq!(enriched.translated_content("button", &chain), None);
    }

    #[test]
    fn test_social_video_gets_embed_url() {
        let mut item = media("m1", 0, 0);
        item.media_type = MediaType::SocialVideo;
        item.social_url = Some("https://youtu.be/dQw4w9WgXcQ".to_string());

        let enriched = EnrichedMedia::new(item, MediaTranslations::new(), &FallbackChain::new("sr", None));
        assert_eq!(
            enriched.embed_url.as_deref(),
            Some("https://www.youtube.com/embed/dQw4w9WgXcQ")
        );
    }

    // ==================== list_active Tests ====================

    #[tokio::test]
    async fn test_list_active_requests_page_size_plus_one() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/media"))
            .and(query_param("section_key", "eq.podcast"))
            .and(query_param("is_active", "eq.true"))
            .and(query_param("language_code", "eq.en"))
            .and(query_param("order", "display_order.asc,created_at.desc"))
            .and(query_param("limit", "3"))
            .and(query_param("offset", "2"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(
                    serde_json::to_value(vec![media("a", 0, 0), media("b", 1, 0), media("c", 2, 0)])
                        .unwrap(),
                ),
            )
            .mount(&mock_server)
            .await;
        mount_translations(&mock_server, &[translation("a", "en", "title", "A in English")]).await;

        let store = RestStore::new(&mock_server.uri(), "key");
        let mut q = query(1, 2);
        q.filter_by_language = true;

        let page = list_active(&store, &q, &FallbackChain::new("en", Some("sr")))
            .await
            .expect("Should list");

        assert_eq!(page.items.len(), 2);
        assert!(page.has_more);
        assert_eq!(page.items[0].display_title.as_deref(), Some("A in English"));
        assert_eq!(page.items[1].display_title.as_deref(), Some("Base b"));
    }

    #[tokio::test]
    async fn test_exactly_full_last_page_then_load_more_returns_empty() {
        let mock_server = MockServer::start().await;
        let all: Vec<MediaItem> = (0..6).map(|i| media(&format!("m{}", i), i, 0)).collect();
        mount_media(&mock_server, 0, &all).await;
        mount_media(&mock_server, 6, &[]).await;
        mount_translations(&mock_server, &[]).await;

        let store = RestStore::new(&mock_server.uri(), "key");
        let chain = FallbackChain::new("sr", None);

        let first = list_active(&store, &query(0, 6), &chain).await.expect("Should list");
        assert_eq!(first.items.len(), 6);
        assert!(!first.has_more);

        // A further "load more" is still legal and simply empty
        let second = list_active(&store, &query(1, 6), &chain).await.expect("Should list");
        assert!(second.items.is_empty());
        assert!(!second.has_more);
    }

    #[tokio::test]
    async fn test_page_beyond_addressable_range_is_empty() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&mock_server)
            .await;

        let store = RestStore::new(&mock_server.uri(), "key");
        let page = list_active(&store, &query(usize::MAX / 2, 6), &FallbackChain::new("sr", None))
            .await
            .expect("Should return an empty page");

        assert!(page.items.is_empty());
        assert!(!page.has_more);
        assert_eq!(page.page, usize::MAX / 2);
    }

    #[test]
    fn test_page_offset() {
        assert_eq!(page_offset(2, 6), Some(12));
        assert_eq!(page_offset(usize::MAX / 2, 6), None);
    }

    #[tokio::test]
    async fn test_translation_failure_degrades_to_base_fields() {
        let mock_server = MockServer::start().await;
        mount_media(&mock_server, 0, &[media("m1", 0, 0)]).await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/content"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let store = RestStore::new(&mock_server.uri(), "key");
        let page = list_active(&store, &query(0, 6), &FallbackChain::new("en", None))
            .await
            .expect("Should list");

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].display_title.as_deref(), Some("Base m1"));
    }

    #[tokio::test]
    async fn test_media_failure_is_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/media"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let store = RestStore::new(&mock_server.uri(), "key");
        assert!(list_active(&store, &query(0, 6), &FallbackChain::new("en", None))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_unfiltered_listing_omits_language_filter() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/media"))
            .and(query_param("language_code", "eq.en"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;
        mount_media(&mock_server, 0, &[media("m1", 0, 0)]).await;
        mount_translations(&mock_server, &[]).await;

        let store = RestStore::new(&mock_server.uri(), "key");
        let page = list_active(&store, &query(0, 6), &FallbackChain::new("en", None))
            .await
            .expect("Should list without language filter");
        assert_eq!(page.items.len(), 1);
    }
}
