//! Language-tagged records that do not go through the content table:
//! announcements, advertisements, blog posts and contact messages.

use crate::catalog::{page_offset, paginate};
use crate::error::{ApiError, StoreError};
use crate::models::{default_true, null_as_default, null_as_true};
use crate::store::{RestStore, TableQuery};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::info;

const MAX_NAME_LEN: usize = 100;
const MAX_EMAIL_LEN: usize = 254;
const MAX_SUBJECT_LEN: usize = 200;
const MAX_MESSAGE_LEN: usize = 5000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    pub id: String,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    pub language_code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub priority: i32,
    #[serde(default)]
    pub link_url: Option<String>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default = "default_true", deserialize_with = "null_as_true")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advertisement {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub link_url: Option<String>,
    /// `None` means the ad runs in every language
    #[serde(default)]
    pub language_code: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub display_order: i32,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default = "default_true", deserialize_with = "null_as_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub body: String,
    #[serde(default)]
    pub cover_image_url: Option<String>,
    pub language_code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub published: bool,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostPage {
    pub items: Vec<Post>,
    pub page: usize,
    pub page_size: usize,
    pub has_more: bool,
}

/// A contact form submission as received from a visitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContactMessage {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub subject: Option<String>,
    pub message: String,
    #[serde(default)]
    pub language_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub subject: Option<String>,
    pub message: String,
    #[serde(default)]
    pub language_code: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("email address is not valid")]
    InvalidEmail,
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Email pattern is valid")
    })
}

fn check_required(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Missing(field));
    }
    check_length(field, value, max)
}

fn check_length(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

impl NewContactMessage {
    /// Trim every field and reject the submission if anything is missing,
    /// too long or not an e-mail address.
    pub fn validated(self) -> Result<Self, ValidationError> {
        let message = Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            subject: self
                .subject
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            message: self.message.trim().to_string(),
            language_code: self.language_code,
        };

        check_required("name", &message.name, MAX_NAME_LEN)?;
        check_required("email", &message.email, MAX_EMAIL_LEN)?;
        if !email_pattern().is_match(&message.email) {
            return Err(ValidationError::InvalidEmail);
        }
        if let Some(subject) = &message.subject {
            check_length("subject", subject, MAX_SUBJECT_LEN)?;
        }
        check_required("message", &message.message, MAX_MESSAGE_LEN)?;

        Ok(message)
    }
}

/// Whether `now` falls inside an optional `[start, end]` window.
pub fn in_window(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    start.map_or(true, |s| s <= now) && end.map_or(true, |e| now <= e)
}

/// Announcements currently running in `language`, highest priority first.
pub async fn list_announcements(
    store: &RestStore,
    language: &str,
    now: DateTime<Utc>,
) -> Result<Vec<Announcement>, StoreError> {
    let query = TableQuery::new("announcements")
        .eq("is_active", true)
        .eq("language_code", language)
        .order("priority.desc,created_at.desc");

    let rows: Vec<Announcement> = store.select(&query).await?;
    let mut current: Vec<Announcement> = rows
        .into_iter()
        .filter(|a| in_window(a.start_date, a.end_date, now))
        .collect();
    current.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });

    Ok(current)
}

/// Advertisements currently running for `language`, including
/// language-neutral ones.
pub async fn list_advertisements(
    store: &RestStore,
    language: &str,
    now: DateTime<Utc>,
) -> Result<Vec<Advertisement>, StoreError> {
    let query = TableQuery::new("advertisements")
        .eq("is_active", true)
        .order("display_order.asc");

    let rows: Vec<Advertisement> = store.select(&query).await?;
    let mut current: Vec<Advertisement> = rows
        .into_iter()
        .filter(|ad| ad.language_code.as_deref().map_or(true, |code| code == language))
        .filter(|ad| in_window(ad.start_date, ad.end_date, now))
        .collect();
    current.sort_by_key(|ad| ad.display_order);

    Ok(current)
}

/// One page of published posts in `language`, newest first.
pub async fn list_posts(
    store: &RestStore,
    language: &str,
    page: usize,
    page_size: usize,
) -> Result<PostPage, StoreError> {
    let page_size = page_size.max(1);
    let Some(offset) = page_offset(page, page_size) else {
        return Ok(PostPage {
            items: Vec::new(),
            page,
            page_size,
            has_more: false,
        });
    };

    let query = TableQuery::new("posts")
        .eq("published", true)
        .eq("language_code", language)
        .order("published_at.desc")
        .limit(page_size.saturating_add(1))
        .offset(offset);

    let rows: Vec<Post> = store.select(&query).await?;
    let (items, has_more) = paginate(rows, page_size);

    Ok(PostPage {
        items,
        page,
        page_size,
        has_more,
    })
}

/// Store a validated contact message.
pub async fn submit_contact(
    store: &RestStore,
    message: &NewContactMessage,
) -> Result<ContactMessage, StoreError> {
    let mut rows: Vec<ContactMessage> = store.insert("contact_messages", message).await?;

    let stored = rows.pop().ok_or_else(|| StoreError::Status {
        table: "contact_messages".to_string(),
        status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
        body: "insert returned no row".to_string(),
    })?;
    info!("Stored contact message {}", stored.id);
    Ok(stored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use wiremock::{
        matchers::{method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn contact(name: &str, email: &str, message: &str) -> NewContactMessage {
        NewContactMessage {
            name: name.to_string(),
            email: email.to_string(),
            subject: None,
            message: message.to_string(),
            language_code: Some("sr".to_string()),
        }
    }

    fn announcement(id: &str, priority: i32, minutes: i64) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "title": format!("Announcement {}", id),
            "language_code": "en",
            "priority": priority,
            "is_active": true,
            "created_at": (now() + Duration::minutes(minutes)).to_rfc3339(),
        })
    }

    // ==================== in_window Tests ====================

    #[test]
    fn test_in_window_open_ends() {
        assert!(in_window(None, None, now()));
        assert!(in_window(Some(now() - Duration::days(1)), None, now()));
        assert!(in_window(None, Some(now() + Duration::days(1)), now()));
    }

    #[test]
    fn test_in_window_bounds_inclusive() {
        assert!(in_window(Some(now()), Some(now()), now()));
    }

    #[test]
    fn test_in_window_outside() {
        assert!(!in_window(Some(now() + Duration::seconds(1)), None, now()));
        assert!(!in_window(None, Some(now() - Duration::seconds(1)), now()));
    }

    // ==================== contact validation Tests ====================

    #[test]
    fn test_contact_valid_is_trimmed() {
        let mut input = contact("  Ana  ", " ana@example.com ", " Zdravo! ");
        input.subject = Some("   ".to_string());

        let message = input.validated().expect("Should validate");
        assert_eq!(message.name, "Ana");
        assert_eq!(message.email, "ana@example.com");
        assert_eq!(message.message, "Zdravo!");
        assert!(message.subject.is_none());
    }

    #[test]
    fn test_contact_missing_fields() {
        assert_eq!(
            contact(" ", "ana@example.com", "Hi").validated(),
            Err(ValidationError::Missing("name"))
        );
        assert_eq!(
            contact("Ana", "ana@example.com", "").validated(),
            Err(ValidationError::Missing("message"))
        );
        assert_eq!(
            contact("Ana", "", "Hi").validated(),
            Err(ValidationError::Missing("email"))
        );
    }

    #[test]
    fn test_contact_invalid_email() {
        for email in ["ana", "ana@", "ana@example", "a na@example.com"] {
            assert_eq!(
                contact("Ana", email, "Hi").validated(),
                Err(ValidationError::InvalidEmail),
                "{}",
                email
            );
        }
    }

    #[test]
    fn test_contact_too_long() {
        let long = "x".repeat(MAX_MESSAGE_LEN + 1);
        assert_eq!(
            contact("Ana", "ana@example.com", &long).validated(),
            Err(ValidationError::TooLong {
                field: "message",
                max: MAX_MESSAGE_LEN
            })
        );
    }

    #[test]
    fn test_contact_length_counts_characters() {
        let name = "ž".repeat(MAX_NAME_LEN);
        assert!(contact(&name, "ana@example.com", "Hi").validated().is_ok());
    }

    // ==================== listing Tests ====================

    #[tokio::test]
    async fn test_announcements_window_and_order() {
        let mock_server = MockServer::start().await;
        let mut expired = announcement("expired", 9, 0);
        expired["end_date"] = serde_json::json!((now() - Duration::days(1)).to_rfc3339());

        Mock::given(method("GET"))
            .and(path("/rest/v1/announcements"))
            .and(query_param("language_code", "eq.en"))
            .and(query_param("is_active", "eq.true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                announcement("low", 1, 10),
                expired,
                announcement("high-old", 5, 0),
                announcement("high-new", 5, 5),
            ])))
            .mount(&mock_server)
            .await;

        let store = RestStore::new(&mock_server.uri(), "key");
        let list = list_announcements(&store, "en", now()).await.expect("Should list");
        let ids: Vec<_> = list.iter().map(|a| a.id.as_str()).collect();

        assert_eq!(ids, vec!["high-new", "high-old", "low"]);
    }

    #[tokio::test]
    async fn test_advertisements_language_neutral_included() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/advertisements"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": "a1", "title": "All", "language_code": null, "display_order": 2},
                {"id": "a2", "title": "English", "language_code": "en", "display_order": 1},
                {"id": "a3", "title": "German", "language_code": "de", "display_order": 0},
                {"id": "a4", "title": "Future", "display_order": 0,
                 "start_date": (now() + Duration::days(3)).to_rfc3339()},
                {"id": "a5", "title": "Unordered", "display_order": null, "is_active": null},
            ])))
            .mount(&mock_server)
            .await;

        let store = RestStore::new(&mock_server.uri(), "key");
        let ads = list_advertisements(&store, "en", now()).await.expect("Should list");
        let ids: Vec<_> = ads.iter().map(|a| a.id.as_str()).collect();

        assert_eq!(ids, vec!["a5", "a2", "a1"]);
    }

    #[tokio::test]
    async fn test_posts_paginated() {
        let mock_server = MockServer::start().await;
        let posts: Vec<_> = (0..3)
            .map(|i| {
                serde_json::json!({
                    "id": format!("p{}", i),
                    "slug": format!("post-{}", i),
                    "title": format!("Post {}", i),
                    "language_code": "sr",
                    "published": true,
                    "published_at": (now() - Duration::days(i)).to_rfc3339(),
                })
            })
            .collect();

        Mock::given(method("GET"))
            .and(path("/rest/v1/posts"))
            .and(query_param("published", "eq.true"))
            .and(query_param("order", "published_at.desc"))
            .and(query_param("limit", "3"))
            .and(query_param("offset", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&posts))
            .mount(&mock_server)
            .await;

        let store = RestStore::new(&mock_server.uri(), "key");
        let page = list_posts(&store, "sr", 1, 2).await.expect("Should list");

        assert_eq!(page.items.len(), 2);
        assert!(page.has_more);
        assert_eq!(page.items[0].slug, "post-0");
    }

    #[tokio::test]
    async fn test_posts_page_beyond_addressable_range_is_empty() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&mock_server)
            .await;

        let store = RestStore::new(&mock_server.uri(), "key");
        let page = list_posts(&store, "sr", usize::MAX / 2, 10)
            .await
            .expect("Should return an empty page");

        assert!(page.items.is_empty());
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn test_submit_contact() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/contact_messages"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!([{
                "id": "cm1",
                "name": "Ana",
                "email": "ana@example.com",
                "message": "Zdravo",
                "language_code": "sr",
                "created_at": now().to_rfc3339(),
            }])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let store = RestStore::new(&mock_server.uri(), "key");
        let message = contact("Ana", "ana@example.com", "Zdravo").validated().unwrap();
        let stored = submit_contact(&store, &message).await.expect("Should insert");

        assert_eq!(stored.id, "cm1");
    }
}
