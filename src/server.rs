//! HTTP surface of the content service.
//!
//! Public page routes never fail because the store is down: they log the
//! failure and serve empty lists or fallback content with `200`. Writes and
//! admin routes report store failures as errors.

use crate::audit::{self, AuditReport};
use crate::catalog::{self, MediaPage, MediaQuery};
use crate::config::Config;
use crate::content::{self, FallbackChain, ResolvedContent};
use crate::error::{ApiError, StoreError};
use crate::geolocation::GeoLocator;
use crate::i18n::{
    load_languages, normalize_code, FallbackStrings, Language, LanguageResolver, LanguageSet,
    MetricsReport, Resolution, ResolutionMetrics, VisitorContext,
};
use crate::models::{ContentEntry, NewContentEntry, Section};
use crate::records::{
    self, Advertisement, Announcement, ContactMessage, NewContactMessage, PostPage,
};
use crate::security::require_admin_key;
use crate::store::{RestStore, TableQuery};
use anyhow::Result;
use axum::{
    extract::{ConnectInfo, Path, Query, State},
    http::{header::ACCEPT_LANGUAGE, HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Cookie holding the visitor's stored language preference.
pub const PREFERENCE_COOKIE: &str = "preferred_language";

pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<RestStore>,
    pub resolver: LanguageResolver,
    pub strings: FallbackStrings,
}

impl AppState {
    pub fn new(config: Arc<Config>, store: Arc<RestStore>) -> Result<Self> {
        let geo = GeoLocator::new(
            &config.geolocation_url,
            Duration::from_secs(config.geolocation_timeout_secs),
        )?;

        Ok(Self {
            resolver: LanguageResolver::new(geo, &config.fallback_language),
            strings: FallbackStrings::new(&config.fallback_language),
            config,
            store,
        })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/languages", get(get_languages))
        .route("/api/language", get(get_language))
        .route("/api/sections/:section_key", get(get_section))
        .route("/api/sections/:section_key/media", get(get_section_media))
        .route("/api/announcements", get(get_announcements))
        .route("/api/advertisements", get(get_advertisements))
        .route("/api/posts", get(get_posts))
        .route("/api/contact", post(post_contact))
        .route("/admin/audit", get(get_audit))
        .route("/admin/content", put(put_content))
        .route("/admin/metrics", get(get_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ==================== Visitor language ====================

#[derive(Debug, Default, Deserialize)]
pub struct LangParams {
    pub lang: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub lang: Option<String>,
    pub page: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MediaParams {
    pub lang: Option<String>,
    pub page: Option<usize>,
    /// Overrides the section's configured language filtering
    pub by_language: Option<bool>,
}

/// The client's address: first `X-Forwarded-For` hop, then `X-Real-IP`,
/// then the socket peer.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<IpAddr> {
    let header_ip = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .and_then(|ip| ip.trim().parse::<IpAddr>().ok())
    };

    header_ip("x-forwarded-for")
        .or_else(|| header_ip("x-real-ip"))
        .or_else(|| peer.map(|addr| addr.ip()))
}

fn visitor_context(
    lang: Option<String>,
    jar: &CookieJar,
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
) -> VisitorContext {
    VisitorContext {
        query_lang: lang,
        stored_preference: jar.get(PREFERENCE_COOKIE).map(|c| c.value().to_string()),
        client_ip: client_ip(headers, peer),
        accept_language: headers
            .get(ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
    }
}

/// Active languages, or an empty set when the store is unavailable.
async fn active_languages(store: &RestStore) -> LanguageSet {
    match load_languages(store).await {
        Ok(languages) => languages,
        Err(e) => {
            error!("Loading languages failed, serving static fallback: {}", e);
            LanguageSet::default()
        }
    }
}

/// A resolved visitor for one page request.
struct Visitor {
    languages: LanguageSet,
    resolution: Resolution,
    jar: CookieJar,
}

impl Visitor {
    async fn resolve(
        state: &AppState,
        lang: Option<String>,
        jar: CookieJar,
        headers: &HeaderMap,
        peer: Option<SocketAddr>,
    ) -> Self {
        let languages = active_languages(&state.store).await;
        let context = visitor_context(lang, &jar, headers, peer);
        let resolution = state.resolver.resolve(&context, &languages).await;
        let jar = persist_preference(jar, &resolution);

        Self {
            languages,
            resolution,
            jar,
        }
    }

    fn code(&self) -> &str {
        &self.resolution.code
    }

    fn fallback_chain(&self) -> FallbackChain {
        FallbackChain::new(
            &self.resolution.code,
            self.languages.default_language().map(|l| l.code.as_str()),
        )
    }
}

/// Write the resolved language back as the stored preference when the
/// deciding tier is one that persists.
pub fn persist_preference(jar: CookieJar, resolution: &Resolution) -> CookieJar {
    if !resolution.should_persist() {
        return jar;
    }
    if jar.get(PREFERENCE_COOKIE).map(|c| c.value()) == Some(resolution.code.as_str()) {
        return jar;
    }

    jar.add(
        Cookie::build((PREFERENCE_COOKIE, resolution.code.clone()))
            .path("/")
            .same_site(SameSite::Lax)
            .permanent(),
    )
}

// ==================== Public routes ====================

async fn health_check() -> &'static str {
    "OK"
}

#[derive(Debug, Serialize)]
pub struct LanguageResponse {
    #[serde(flatten)]
    pub resolution: Resolution,
    pub languages: Vec<Language>,
}

async fn get_languages(State(state): State<Arc<AppState>>) -> Json<Vec<Language>> {
    let languages = active_languages(&state.store).await;
    Json(languages.list_active().to_vec())
}

async fn get_language(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LangParams>,
    jar: CookieJar,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
) -> (CookieJar, Json<LanguageResponse>) {
    let visitor = Visitor::resolve(&state, params.lang, jar, &headers, peer.map(|c| c.0)).await;

    let response = LanguageResponse {
        languages: visitor.languages.list_active().to_vec(),
        resolution: visitor.resolution,
    };
    (visitor.jar, Json(response))
}

#[derive(Debug, Serialize)]
pub struct SectionResponse {
    pub section: Option<Section>,
    #[serde(flatten)]
    pub content: ResolvedContent,
}

async fn find_section(store: &RestStore, section_key: &str) -> Result<Option<Section>, StoreError> {
    let query = TableQuery::new("page_sections")
        .eq("section_key", section_key)
        .eq("is_active", true)
        .limit(1);

    Ok(store.select::<Section>(&query).await?.pop())
}

async fn get_section(
    State(state): State<Arc<AppState>>,
    Path(section_key): Path<String>,
    Query(params): Query<LangParams>,
    jar: CookieJar,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
) -> Result<(CookieJar, Json<SectionResponse>), ApiError> {
    let visitor = Visitor::resolve(&state, params.lang, jar, &headers, peer.map(|c| c.0)).await;
    let chain = visitor.fallback_chain();

    let (section, content) = futures::join!(
        find_section(&state.store, &section_key),
        content::resolve_with_fallback(&state.store, &state.strings, &section_key, &chain)
    );

    // An unreachable store still gets fallback content; a missing row is a 404
    let section = match section {
        Ok(Some(section)) => Some(section),
        Ok(None) => return Err(ApiError::NotFound(format!("section '{}'", section_key))),
        Err(e) => {
            error!("Loading section '{}' failed: {}", section_key, e);
            None
        }
    };

    Ok((visitor.jar, Json(SectionResponse { section, content })))
}

async fn get_section_media(
    State(state): State<Arc<AppState>>,
    Path(section_key): Path<String>,
    Query(params): Query<MediaParams>,
    jar: CookieJar,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
) -> (CookieJar, Json<MediaPage>) {
    let visitor = Visitor::resolve(&state, params.lang, jar, &headers, peer.map(|c| c.0)).await;

    let filter_by_language = params.by_language.unwrap_or_else(|| {
        state
            .config
            .language_filtered_sections
            .iter()
            .any(|key| *key == section_key)
    });

    let query = MediaQuery {
        section_key,
        filter_by_language,
        page: params.page.unwrap_or(0),
        page_size: state.config.media_page_size,
    };

    let page = match catalog::list_active(&state.store, &query, &visitor.fallback_chain()).await {
        Ok(page) => page,
        Err(e) => {
            error!("Media listing for section '{}' failed: {}", query.section_key, e);
            MediaPage::empty(query.page, query.page_size)
        }
    };

    (visitor.jar, Json(page))
}

async fn get_announcements(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LangParams>,
    jar: CookieJar,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
) -> (CookieJar, Json<Vec<Announcement>>) {
    let visitor = Visitor::resolve(&state, params.lang, jar, &headers, peer.map(|c| c.0)).await;

    let announcements = records::list_announcements(&state.store, visitor.code(), Utc::now())
        .await
        .unwrap_or_else(|e| {
            error!("Loading announcements failed: {}", e);
            Vec::new()
        });

    (visitor.jar, Json(announcements))
}

async fn get_advertisements(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LangParams>,
    jar: CookieJar,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
) -> (CookieJar, Json<Vec<Advertisement>>) {
    let visitor = Visitor::resolve(&state, params.lang, jar, &headers, peer.map(|c| c.0)).await;

    let ads = records::list_advertisements(&state.store, visitor.code(), Utc::now())
        .await
        .unwrap_or_else(|e| {
            error!("Loading advertisements failed: {}", e);
            Vec::new()
        });

    (visitor.jar, Json(ads))
}

async fn get_posts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
    jar: CookieJar,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
) -> (CookieJar, Json<PostPage>) {
    let visitor = Visitor::resolve(&state, params.lang, jar, &headers, peer.map(|c| c.0)).await;
    let page = params.page.unwrap_or(0);
    let page_size = state.config.posts_page_size;

    let posts = records::list_posts(&state.store, visitor.code(), page, page_size)
        .await
        .unwrap_or_else(|e| {
            error!("Loading posts failed: {}", e);
            PostPage {
                items: Vec::new(),
                page,
                page_size,
                has_more: false,
            }
        });

    (visitor.jar, Json(posts))
}

async fn post_contact(
    State(state): State<Arc<AppState>>,
    Json(message): Json<NewContactMessage>,
) -> Result<(StatusCode, Json<ContactMessage>), ApiError> {
    let mut message = message.validated()?;
    message.language_code = message.language_code.as_deref().and_then(normalize_code);

    let stored = records::submit_contact(&state.store, &message).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

// ==================== Admin routes ====================

async fn get_audit(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<AuditReport>, ApiError> {
    require_admin_key(&headers, state.config.admin_api_key.as_deref())?;
    Ok(Json(audit::run_audit(&state.store).await?))
}

async fn get_metrics(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<MetricsReport>, ApiError> {
    require_admin_key(&headers, state.config.admin_api_key.as_deref())?;
    Ok(Json(ResolutionMetrics::global().report()))
}

/// Normalize a batch of entries and reject anything the store would not
/// accept as content.
pub fn prepare_entries(
    entries: Vec<NewContentEntry>,
    languages: &LanguageSet,
) -> Result<Vec<NewContentEntry>, ApiError> {
    if entries.is_empty() {
        return Err(ApiError::BadRequest("no entries given".to_string()));
    }

    entries
        .into_iter()
        .map(|mut entry| {
            if entry.section_key.trim().is_empty() || entry.content_key.trim().is_empty() {
                return Err(ApiError::BadRequest(
                    "section_key and content_key are required".to_string(),
                ));
            }

            let language = languages.get_by_code(&entry.language_code).ok_or_else(|| {
                ApiError::BadRequest(format!("unknown language '{}'", entry.language_code))
            })?;
            entry.language_code = language.code.clone();
            entry.media_id = entry.media_id.filter(|id| !id.trim().is_empty());
            Ok(entry)
        })
        .collect()
}

async fn put_content(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(entries): Json<Vec<NewContentEntry>>,
) -> Result<Json<Vec<ContentEntry>>, ApiError> {
    require_admin_key(&headers, state.config.admin_api_key.as_deref())?;

    let languages = load_languages(&state.store).await?;
    let entries = prepare_entries(entries, &languages)?;

    let written = content::upsert_entries(&state.store, &entries).await?;
    info!("Admin content update wrote {} entries", written.len());
    Ok(Json(written))
}
