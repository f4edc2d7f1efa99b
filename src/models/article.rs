use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// Cached metadata for a single wiki page, independent of its rendered
/// content. Rows are created on first reference from a content group or a
/// user action and mutated by view/save/pin operations; only the
/// housekeeper deletes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    /// Normalized lookup key, see [`database_key`].
    pub key: String,
    pub url: String,
    /// Null until the article is first opened.
    pub viewed_at: Option<DateTime<Utc>>,
    /// Null unless the article is bookmarked.
    pub saved_at: Option<DateTime<Utc>>,
    /// Non-null while the article is pinned on the places map.
    pub places_sort_order: Option<i64>,
    /// Excluded rows must survive sweeps so the exclusion keeps applying.
    pub is_excluded_from_feed: bool,
    /// An offline copy exists; its deletion belongs to the download manager.
    pub is_downloaded: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Normalized lookup key for an article URL: lowercased host plus the
/// percent-decoded path. Scheme, query and fragment are ignored so protocol
/// and tracking-parameter variants of the same page collapse onto one row.
pub fn database_key(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_ascii_lowercase();
    let path = urlencoding::decode(url.path()).ok()?;
    Some(format!("{}{}", host, path))
}
