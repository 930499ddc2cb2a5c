//! Integrity audit of the content table.
//!
//! Finds rows that break the identity-tuple uniqueness and rows whose
//! section or media item no longer exists. Read-only.

use crate::error::StoreError;
use crate::models::{ContentEntry, MediaItem, Section};
use crate::store::{RestStore, TableQuery};
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::{info, warn};

/// Rows sharing one `(section_key, media_id, language_code, content_key)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    pub section_key: String,
    pub media_id: Option<String>,
    pub language_code: String,
    pub content_key: String,
    pub ids: Vec<String>,
}

/// A content row pointing at something that does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrphanedEntry {
    pub id: String,
    /// The dangling reference (a section key or a media id)
    pub missing: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    pub generated_at: DateTime<Utc>,
    pub scanned: usize,
    pub duplicates: Vec<DuplicateGroup>,
    pub orphaned_sections: Vec<OrphanedEntry>,
    pub orphaned_media: Vec<OrphanedEntry>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.duplicates.is_empty() && self.orphaned_sections.is_empty() && self.orphaned_media.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} rows scanned, {} duplicate groups, {} rows with unknown section, {} rows with unknown media",
            self.scanned,
            self.duplicates.len(),
            self.orphaned_sections.len(),
            self.orphaned_media.len()
        )
    }
}

type IdentityTuple = (String, Option<String>, String, String);

/// Audit already-fetched rows.
pub fn audit(content: &[ContentEntry], sections: &[Section], media: &[MediaItem]) -> AuditReport {
    let section_keys: HashSet<&str> = sections.iter().map(|s| s.section_key.as_str()).collect();
    let media_ids: HashSet<&str> = media.iter().map(|m| m.id.as_str()).collect();

    let mut by_identity: BTreeMap<IdentityTuple, Vec<String>> = BTreeMap::new();
    let mut orphaned_sections = Vec::new();
    let mut orphaned_media = Vec::new();

    for row in content {
        by_identity
            .entry((
                row.section_key.clone(),
                row.media_id.clone(),
                row.language_code.clone(),
                row.content_key.clone(),
            ))
            .or_default()
            .push(row.id.clone());

        if !section_keys.contains(row.section_key.as_str()) {
            orphaned_sections.push(OrphanedEntry {
                id: row.id.clone(),
                missing: row.section_key.clone(),
            });
        }

        if let Some(media_id) = &row.media_id {
            if !media_ids.contains(media_id.as_str()) {
                orphaned_media.push(OrphanedEntry {
                    id: row.id.clone(),
                    missing: media_id.clone(),
                });
            }
        }
    }

    let duplicates = by_identity
        .into_iter()
        .filter(|(_, ids)| ids.len() > 1)
        .map(|((section_key, media_id, language_code, content_key), mut ids)| {
            ids.sort();
            DuplicateGroup {
                section_key,
                media_id,
                language_code,
                content_key,
                ids,
            }
        })
        .collect();

    AuditReport {
        generated_at: Utc::now(),
        scanned: content.len(),
        duplicates,
        orphaned_sections,
        orphaned_media,
    }
}

/// Fetch every content, section and media row and audit them.
pub async fn run_audit(store: &RestStore) -> Result<AuditReport, StoreError> {
    info!("Starting content audit");

    let content_query = TableQuery::new("content").order("id.asc");
    let sections_query = TableQuery::new("page_sections").order("section_key.asc");
    let media_query = TableQuery::new("media").order("id.asc");

    let (content, sections, media) = futures::try_join!(
        store.select_all::<ContentEntry>(&content_query),
        store.select_all::<Section>(&sections_query),
        store.select_all::<MediaItem>(&media_query),
    )?;

    let report = audit(&content, &sections, &media);

    if report.is_clean() {
        info!("✓ Content audit clean: {}", report.summary());
    } else {
        warn!("Content audit found problems: {}", report.summary());
    }

    Ok(report)
}

/// Write a report as pretty-printed JSON.
pub fn write_report(report: &AuditReport, path: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize audit report")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write audit report to {}", path.display()))
}
