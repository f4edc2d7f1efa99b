use std::collections::HashSet;
use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, types::Type, OptionalExtension, Row};
use tokio_rusqlite::Connection;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{
    database_key, Article, CleanupLevel, ContentGroup, ContentGroupKind, NewContentGroup,
};

use super::schema::SCHEMA;

pub struct Repository {
    conn: Connection,
    /// Keys of article rows currently materialized by a UI surface. A row
    /// whose key is registered here is being actively displayed; routine
    /// sweeps leave it alone.
    materialized: Mutex<HashSet<String>>,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;

        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self {
            conn,
            materialized: Mutex::new(HashSet::new()),
        })
    }

    // Content group operations

    pub async fn insert_content_group(&self, group: NewContentGroup) -> Result<i64> {
        let preview_json = group
            .content_preview
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let content_json = group
            .full_content
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let kind = group.kind.as_str();
        let day = group.midnight_utc_date.format("%Y-%m-%d").to_string();

        let id = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO content_groups (kind, midnight_utc_date, content_preview, full_content) VALUES (?1, ?2, ?3, ?4)",
                    params![kind, day, preview_json, content_json],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        Ok(id)
    }

    pub async fn get_all_content_groups(&self) -> Result<Vec<ContentGroup>> {
        let groups = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, kind, midnight_utc_date, content_preview, full_content, created_at FROM content_groups ORDER BY midnight_utc_date DESC, id",
                )?;
                let groups = stmt
                    .query_map([], content_group_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(groups)
            })
            .await?;
        Ok(groups)
    }

    pub async fn groups_of_kind(&self, kind: ContentGroupKind) -> Result<Vec<ContentGroup>> {
        let kind = kind.as_str();
        let groups = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, kind, midnight_utc_date, content_preview, full_content, created_at FROM content_groups WHERE kind = ?1 ORDER BY midnight_utc_date DESC, id",
                )?;
                let groups = stmt
                    .query_map(params![kind], content_group_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(groups)
            })
            .await?;
        Ok(groups)
    }

    /// Deletes the given groups in one transaction. This is the commit point
    /// of the announcement sub-sweep.
    pub async fn delete_content_groups(&self, ids: Vec<i64>) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let deleted = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let mut deleted = 0;
                {
                    let mut stmt = tx.prepare("DELETE FROM content_groups WHERE id = ?1")?;
                    for id in &ids {
                        deleted += stmt.execute(params![id])?;
                    }
                }
                tx.commit()?;
                Ok(deleted)
            })
            .await?;
        Ok(deleted)
    }

    /// Deletes expired groups and doomed articles in one transaction. This is
    /// the commit point of the main sweep; either everything lands or the
    /// pass fails with nothing applied.
    pub async fn delete_groups_and_articles(
        &self,
        group_ids: Vec<i64>,
        article_ids: Vec<i64>,
    ) -> Result<()> {
        if group_ids.is_empty() && article_ids.is_empty() {
            return Ok(());
        }
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                {
                    let mut delete_group = tx.prepare("DELETE FROM content_groups WHERE id = ?1")?;
                    for id in &group_ids {
                        delete_group.execute(params![id])?;
                    }
                    let mut delete_article = tx.prepare("DELETE FROM articles WHERE id = ?1")?;
                    for id in &article_ids {
                        delete_article.execute(params![id])?;
                    }
                }
                tx.commit()?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    // Article operations

    pub async fn upsert_article(&self, url: &Url) -> Result<i64> {
        let key =
            database_key(url).ok_or_else(|| AppError::InvalidArticleUrl(url.to_string()))?;
        let url = url.to_string();
        let id = self
            .conn
            .call(move |conn| {
                conn.execute(
                    r#"INSERT INTO articles (key, url) VALUES (?1, ?2)
                       ON CONFLICT(key) DO UPDATE SET
                           url = excluded.url,
                           updated_at = datetime('now')"#,
                    params![key, url],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        Ok(id)
    }

    pub async fn get_article_by_key(&self, key: &str) -> Result<Option<Article>> {
        let key = key.to_string();
        let article = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, key, url, viewed_at, saved_at, places_sort_order, is_excluded_from_feed, is_downloaded, created_at, updated_at FROM articles WHERE key = ?1",
                )?;
                let article = stmt.query_row(params![key], article_from_row).optional()?;
                Ok(article)
            })
            .await?;
        Ok(article)
    }

    pub async fn get_all_articles(&self) -> Result<Vec<Article>> {
        let articles = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, key, url, viewed_at, saved_at, places_sort_order, is_excluded_from_feed, is_downloaded, created_at, updated_at FROM articles ORDER BY key",
                )?;
                let articles = stmt
                    .query_map([], article_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(articles)
            })
            .await?;
        Ok(articles)
    }

    /// Articles matching the stale predicate for the given cleanup level.
    /// These are candidates only; reachability and the materialized registry
    /// still apply before anything is deleted.
    pub async fn stale_article_candidates(&self, level: CleanupLevel) -> Result<Vec<Article>> {
        let sql = format!(
            "SELECT id, key, url, viewed_at, saved_at, places_sort_order, is_excluded_from_feed, is_downloaded, created_at, updated_at FROM articles WHERE {}",
            stale_article_predicate(level)
        );
        let articles = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let articles = stmt
                    .query_map([], article_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(articles)
            })
            .await?;
        Ok(articles)
    }

    pub async fn mark_article_viewed(&self, key: &str) -> Result<()> {
        let key = key.to_string();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE articles SET viewed_at = datetime('now'), updated_at = datetime('now') WHERE key = ?1",
                    params![key],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn set_article_saved(&self, key: &str, saved: bool) -> Result<()> {
        let key = key.to_string();
        self.conn
            .call(move |conn| {
                let sql = if saved {
                    "UPDATE articles SET saved_at = datetime('now'), updated_at = datetime('now') WHERE key = ?1"
                } else {
                    "UPDATE articles SET saved_at = NULL, updated_at = datetime('now') WHERE key = ?1"
                };
                conn.execute(sql, params![key])?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn set_places_sort_order(&self, key: &str, order: Option<i64>) -> Result<()> {
        let key = key.to_string();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE articles SET places_sort_order = ?1, updated_at = datetime('now') WHERE key = ?2",
                    params![order, key],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn set_excluded_from_feed(&self, key: &str, excluded: bool) -> Result<()> {
        let key = key.to_string();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE articles SET is_excluded_from_feed = ?1, updated_at = datetime('now') WHERE key = ?2",
                    params![excluded, key],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn set_downloaded(&self, key: &str, downloaded: bool) -> Result<()> {
        let key = key.to_string();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE articles SET is_downloaded = ?1, updated_at = datetime('now') WHERE key = ?2",
                    params![downloaded, key],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    // Navigation state

    pub async fn replace_navigation_state(&self, keys: Vec<String>) -> Result<()> {
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM navigation_state", [])?;
                {
                    let mut insert = tx.prepare(
                        "INSERT INTO navigation_state (article_key, stack_index) VALUES (?1, ?2)",
                    )?;
                    for (index, key) in keys.iter().enumerate() {
                        insert.execute(params![key, index as i64])?;
                    }
                }
                tx.commit()?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Keys of every article preserved in the persisted back stack, or `None`
    /// when no navigation state exists.
    pub async fn navigation_state_keys(&self) -> Result<Option<HashSet<String>>> {
        let keys = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare("SELECT article_key FROM navigation_state")?;
                let keys = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<std::result::Result<HashSet<_>, _>>()?;
                Ok(keys)
            })
            .await?;
        if keys.is_empty() {
            Ok(None)
        } else {
            Ok(Some(keys))
        }
    }

    pub async fn clear_navigation_state(&self) -> Result<()> {
        self.conn
            .call(|conn| {
                conn.execute("DELETE FROM navigation_state", [])?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    // Materialized registry

    pub fn mark_materialized(&self, key: &str) {
        self.materialized
            .lock()
            .expect("materialized registry poisoned")
            .insert(key.to_string());
    }

    pub fn release_materialized(&self, key: &str) {
        self.materialized
            .lock()
            .expect("materialized registry poisoned")
            .remove(key);
    }

    pub fn materialized_keys(&self) -> HashSet<String> {
        self.materialized
            .lock()
            .expect("materialized registry poisoned")
            .clone()
    }
}

/// WHERE clause selecting stale articles. Saved, pinned, excluded-from-feed
/// and downloaded rows always survive; "never viewed" binds routine passes
/// only.
fn stale_article_predicate(level: CleanupLevel) -> String {
    let mut clauses = vec![
        "saved_at IS NULL",
        "places_sort_order IS NULL",
        "is_excluded_from_feed = 0",
        "is_downloaded = 0",
    ];
    if level == CleanupLevel::Low {
        clauses.push("viewed_at IS NULL");
    }
    clauses.join(" AND ")
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // Try RFC3339 first (e.g., "2026-01-11T12:34:56+00:00")
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Try SQLite datetime format (e.g., "2026-01-11 12:34:56")
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

fn invalid_column(
    index: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(err))
}

fn content_group_from_row(row: &Row) -> rusqlite::Result<ContentGroup> {
    let kind: String = row.get(1)?;
    let kind = kind
        .parse::<ContentGroupKind>()
        .map_err(|e| invalid_column(1, e))?;
    let day: String = row.get(2)?;
    let midnight_utc_date =
        NaiveDate::parse_from_str(&day, "%Y-%m-%d").map_err(|e| invalid_column(2, e))?;
    let content_preview = row
        .get::<_, Option<String>>(3)?
        .as_deref()
        .map(serde_json::from_str)
        .transpose()
        .map_err(|e| invalid_column(3, e))?;
    let full_content = row
        .get::<_, Option<String>>(4)?
        .as_deref()
        .map(serde_json::from_str)
        .transpose()
        .map_err(|e| invalid_column(4, e))?;

    Ok(ContentGroup {
        id: row.get(0)?,
        kind,
        midnight_utc_date,
        content_preview,
        full_content,
        created_at: row
            .get::<_, String>(5)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or_else(Utc::now),
    })
}

fn article_from_row(row: &Row) -> rusqlite::Result<Article> {
    Ok(Article {
        id: row.get(0)?,
        key: row.get(1)?,
        url: row.get(2)?,
        viewed_at: row
            .get::<_, Option<String>>(3)?
            .and_then(|s| parse_datetime(&s)),
        saved_at: row
            .get::<_, Option<String>>(4)?
            .and_then(|s| parse_datetime(&s)),
        places_sort_order: row.get(5)?,
        is_excluded_from_feed: row.get::<_, i64>(6)? != 0,
        is_downloaded: row.get::<_, i64>(7)? != 0,
        created_at: row
            .get::<_, String>(8)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or_else(Utc::now),
        updated_at: row
            .get::<_, String>(9)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or_else(Utc::now),
    })
}
