//! Rows of the content-resolution tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub(crate) fn default_true() -> bool {
    true
}

/// Read an explicit `null` column the same as a missing one.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub(crate) fn null_as_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(true))
}

/// A logical page region ("hero", "podcast", "cultural", ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub section_key: String,
    #[serde(rename = "name", default, deserialize_with = "null_as_default")]
    pub display_name: String,
    #[serde(default)]
    pub background_image_url: Option<String>,
    #[serde(default)]
    pub background_video_url: Option<String>,
    #[serde(default = "default_true", deserialize_with = "null_as_true")]
    pub is_active: bool,
}

/// One stored translation for a section or media item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentEntry {
    pub id: String,
    pub section_key: String,
    #[serde(default)]
    pub media_id: Option<String>,
    pub language_code: String,
    pub content_key: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content_value: String,
    #[serde(default = "default_true", deserialize_with = "null_as_true")]
    pub is_active: bool,
}

/// A content row to be written; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContentEntry {
    pub section_key: String,
    #[serde(default)]
    pub media_id: Option<String>,
    pub language_code: String,
    pub content_key: String,
    pub content_value: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Image,
    Video,
    SocialVideo,
}

/// A displayable asset attached to a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: String,
    pub section_key: String,
    pub media_type: MediaType,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub social_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub display_order: i32,
    #[serde(default = "default_true", deserialize_with = "null_as_true")]
    pub is_active: bool,
    #[serde(default)]
    pub language_code: Option<String>,
    /// Base title, used when no translation exists.
    #[serde(default)]
    pub title: Option<String>,
    /// Base description, used when no translation exists.
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}
