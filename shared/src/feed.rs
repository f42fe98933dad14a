use std::fmt;
use std::num::NonZeroUsize;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use lru::LruCache;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::DedupStrategy;

// --- Typed IDs ---

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GistId(pub String);

impl GistId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// --- Wire shape ---

/// A gist as returned by `GET /gists/public`.
///
/// Every field is optional so a single malformed record cannot fail the
/// whole page; records are validated when reduced into [`GistRecord`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawGist {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub owner: Option<RawOwner>,
    #[serde(default)]
    pub files: IndexMap<String, RawFile>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawOwner {
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFile {
    #[serde(default)]
    pub filename: Option<String>,
}

// --- Reduced record ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub avatar_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GistFile {
    pub filename: String,
}

/// The fields of a gist the feed keeps around. Everything else in the
/// upstream payload is dropped at mapping time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GistRecord {
    pub id: GistId,
    pub owner: Option<Owner>,
    pub files: IndexMap<String, GistFile>,
    pub updated_at: DateTime<Utc>,
}

impl GistRecord {
    #[must_use]
    pub fn avatar_url(&self) -> Option<&str> {
        self.owner.as_ref().map(|o| o.avatar_url.as_str())
    }

    #[must_use]
    pub fn filename(&self) -> &str {
        get_filename(&self.files)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("gist record has no id")]
    MissingId,
    #[error("gist {id} has no updated_at")]
    MissingTimestamp { id: String },
    #[error("gist {id} has invalid updated_at {value:?}: {reason}")]
    InvalidTimestamp {
        id: String,
        value: String,
        reason: String,
    },
}

impl TryFrom<RawGist> for GistRecord {
    type Error = RecordError;

    fn try_from(raw: RawGist) -> Result<Self, Self::Error> {
        let id = raw.id.ok_or(RecordError::MissingId)?;
        let value = raw
            .updated_at
            .ok_or_else(|| RecordError::MissingTimestamp { id: id.clone() })?;
        let updated_at = DateTime::parse_from_rfc3339(&value)
            .map_err(|e| RecordError::InvalidTimestamp {
                id: id.clone(),
                value: value.clone(),
                reason: e.to_string(),
            })?
            .with_timezone(&Utc);

        let owner = raw
            .owner
            .and_then(|o| o.avatar_url)
            .map(|avatar_url| Owner { avatar_url });

        let files = raw
            .files
            .into_iter()
            .map(|(key, file)| {
                let filename = file.filename.unwrap_or_default();
                (key, GistFile { filename })
            })
            .collect();

        Ok(Self {
            id: GistId(id),
            owner,
            files,
            updated_at,
        })
    }
}

/// Reduces a fetched page, dropping records that cannot be shown.
#[must_use]
pub fn reduce_page(raw: Vec<RawGist>) -> Vec<GistRecord> {
    raw.into_iter()
        .filter_map(|gist| match GistRecord::try_from(gist) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(error = %e, "dropping malformed gist");
                None
            }
        })
        .collect()
}

/// Filename of the first file in a gist, or an empty string.
#[must_use]
pub fn get_filename(files: &IndexMap<String, GistFile>) -> &str {
    files.values().next().map_or("", |f| f.filename.as_str())
}

/// Index of the first record strictly older than `oldest`.
///
/// Everything before that index is at least as recent as the oldest record
/// already in the feed and is treated as a repeat.
#[must_use]
pub fn recency_boundary(oldest: DateTime<Utc>, page: &[GistRecord]) -> Option<usize> {
    page.iter().position(|r| r.updated_at < oldest)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MergeOutcome {
    pub appended: usize,
    pub skipped: usize,
}

struct SeenIds {
    window: LruCache<GistId, ()>,
}

impl SeenIds {
    fn new(capacity: NonZeroUsize) -> Self {
        Self {
            window: LruCache::new(capacity),
        }
    }

    /// Returns false if the id was already in the window.
    fn insert(&mut self, id: &GistId) -> bool {
        if self.window.contains(id) {
            self.window.promote(id);
            return false;
        }
        self.window.put(id.clone(), ());
        true
    }

    fn clear(&mut self) {
        self.window.clear();
    }
}

impl fmt::Debug for SeenIds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeenIds")
            .field("len", &self.window.len())
            .field("cap", &self.window.cap())
            .finish()
    }
}

/// The locally held, append-only sequence of gists in fetch order.
#[derive(Debug, Default)]
pub struct Feed {
    records: Vec<GistRecord>,
    seen: Option<SeenIds>,
}

impl Feed {
    #[must_use]
    pub fn new(strategy: DedupStrategy) -> Self {
        let seen = match strategy {
            DedupStrategy::RecencyBoundary => None,
            DedupStrategy::SeenIds { capacity } => Some(SeenIds::new(capacity)),
        };
        Self {
            records: Vec::new(),
            seen,
        }
    }

    #[must_use]
    pub fn records(&self) -> &[GistRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &GistId) -> Option<&GistRecord> {
        self.records.iter().find(|r| &r.id == id)
    }

    #[must_use]
    pub fn oldest_updated_at(&self) -> Option<DateTime<Utc>> {
        self.records.last().map(|r| r.updated_at)
    }

    /// Replaces the feed with the first page.
    pub fn replace(&mut self, page: Vec<GistRecord>) {
        self.records.clear();
        if let Some(seen) = self.seen.as_mut() {
            seen.clear();
        }
        self.merge_page(page);
    }

    /// Appends a freshly fetched page.
    ///
    /// With the recency boundary, leading records at least as recent as the
    /// current oldest are dropped. If the page holds nothing older, nothing
    /// is appended. An empty feed takes the whole page.
    pub fn merge_page(&mut self, page: Vec<GistRecord>) -> MergeOutcome {
        let total = page.len();

        if let Some(seen) = self.seen.as_mut() {
            let before = self.records.len();
            self.records
                .extend(page.into_iter().filter(|r| seen.insert(&r.id)));
            let appended = self.records.len() - before;
            return MergeOutcome {
                appended,
                skipped: total - appended,
            };
        }

        let Some(oldest) = self.oldest_updated_at() else {
            self.records.extend(page);
            return MergeOutcome {
                appended: total,
                skipped: 0,
            };
        };

        match recency_boundary(oldest, &page) {
            Some(start) => {
                self.records.extend(page.into_iter().skip(start));
                MergeOutcome {
                    appended: total - start,
                    skipped: start,
                }
            }
            None => {
                debug!(page_len = total, %oldest, "no record older than feed tail");
                MergeOutcome {
                    appended: 0,
                    skipped: total,
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.records.clear();
        if let Some(seen) = self.seen.as_mut() {
            seen.clear();
        }
    }
}
