use std::collections::HashSet;

use chrono::{Days, NaiveDate, Utc};
use url::Url;

use crate::db::Repository;
use crate::error::Result;
use crate::events::{EventBus, StoreEvent};
use crate::models::{
    database_key, CleanupLevel, ContentGroup, ContentGroupKind, ContentItem,
};
use crate::services::NavigationStateController;

/// Days of explore-feed history a routine pass keeps.
pub const MAX_FEED_RETENTION_DAYS: u32 = 15;

/// Reclaims storage by deleting content groups past the retention window and
/// articles that are stale and no longer referenced by any surviving group or
/// preserved navigation state.
///
/// A pass commits in two saves, one per sub-phase: the announcement sweep
/// first, then the group/article sweep. A failure aborts the current
/// sub-phase and leaves the other's commit (if any) in place; the caller is
/// expected to log it and try again on the next scheduled run. Overlapping
/// passes against one store are the caller's responsibility to avoid.
pub struct Housekeeper {
    retention_days: u32,
    events: EventBus,
}

impl Housekeeper {
    pub fn new(events: EventBus) -> Self {
        Self::with_retention_days(events, MAX_FEED_RETENTION_DAYS)
    }

    pub fn with_retention_days(events: EventBus, retention_days: u32) -> Self {
        Self {
            retention_days,
            events,
        }
    }

    /// Runs one full housekeeping pass. Returns the URL of every article
    /// actually deleted so dependent caches (e.g. offline content) can react.
    pub async fn perform_housekeeping(
        &self,
        repository: &Repository,
        navigation: &NavigationStateController,
        level: CleanupLevel,
    ) -> Result<Vec<Url>> {
        if level == CleanupLevel::High {
            navigation.clear(repository).await?;
        }

        self.delete_expired_announcements(repository).await?;
        let urls = self
            .delete_stale_unreferenced_articles(repository, navigation, level)
            .await?;

        self.events.publish(StoreEvent::HousekeepingCompleted);

        Ok(urls)
    }

    /// Drops every announcement group whose preview has an end time strictly
    /// in the past. Runs on every pass, independent of cleanup level and
    /// retention window, and commits on its own.
    async fn delete_expired_announcements(&self, repository: &Repository) -> Result<()> {
        let groups = repository
            .groups_of_kind(ContentGroupKind::Announcement)
            .await?;
        let now = Utc::now();

        let expired: Vec<i64> = groups
            .iter()
            .filter(|group| match &group.content_preview {
                Some(ContentItem::Announcement(announcement)) => {
                    announcement.end_time.is_some_and(|end| end < now)
                }
                _ => false,
            })
            .map(|group| group.id)
            .collect();

        if expired.is_empty() {
            return Ok(());
        }

        tracing::debug!(count = expired.len(), "deleting expired announcements");
        repository.delete_content_groups(expired).await?;
        Ok(())
    }

    async fn delete_stale_unreferenced_articles(
        &self,
        repository: &Repository,
        navigation: &NavigationStateController,
        level: CleanupLevel,
    ) -> Result<Vec<Url>> {
        let retention_days = match level {
            CleanupLevel::High => 0,
            CleanupLevel::Low => self.retention_days,
        };
        let oldest_retained_day = Utc::now()
            .date_naive()
            .checked_sub_days(Days::new(retention_days as u64))
            .unwrap_or(NaiveDate::MIN);

        let groups = repository.get_all_content_groups().await?;
        let (expired, surviving): (Vec<ContentGroup>, Vec<ContentGroup>) = groups
            .into_iter()
            .partition(|group| group_is_expired(group.midnight_utc_date, oldest_retained_day, level));

        // The reachable set is built as a fold over the surviving groups,
        // seeded with the preserved back-stack keys, and is immutable before
        // the article pass starts.
        let preserved = navigation
            .all_preserved_article_keys(repository)
            .await?
            .unwrap_or_default();
        let reachable: HashSet<String> = surviving.iter().fold(preserved, |mut keys, group| {
            collect_group_keys(group, &mut keys);
            keys
        });

        let candidates = repository.stale_article_candidates(level).await?;
        let materialized = repository.materialized_keys();

        let mut doomed_articles = Vec::new();
        let mut urls = Vec::new();
        for article in candidates {
            // A materialized row may be on screen right now; routine passes
            // leave it alone. A deep clean deletes it regardless.
            if level == CleanupLevel::Low && materialized.contains(&article.key) {
                continue;
            }
            if reachable.contains(&article.key) {
                continue;
            }
            doomed_articles.push(article.id);
            if let Ok(url) = Url::parse(&article.url) {
                urls.push(url);
            }
        }

        let expired_ids: Vec<i64> = expired.iter().map(|group| group.id).collect();
        tracing::debug!(
            groups = expired_ids.len(),
            articles = doomed_articles.len(),
            "housekeeping sweep"
        );
        repository
            .delete_groups_and_articles(expired_ids, doomed_articles)
            .await?;

        Ok(urls)
    }
}

/// A group past the retention cutoff is dropped. The boundary day itself
/// survives a routine pass but not a full clear, where the cutoff is today.
fn group_is_expired(day: NaiveDate, oldest_retained_day: NaiveDate, level: CleanupLevel) -> bool {
    match level {
        CleanupLevel::High => day <= oldest_retained_day,
        CleanupLevel::Low => day < oldest_retained_day,
    }
}

fn collect_group_keys(group: &ContentGroup, keys: &mut HashSet<String>) {
    if let Some(preview) = &group.content_preview {
        collect_preview_keys(preview, keys);
    }

    let Some(full_content) = &group.full_content else {
        return;
    };
    for item in full_content {
        collect_item_keys(group.kind, item, keys);
    }
}

/// Preview payloads are self-describing: url, top-read and story previews
/// contribute their article keys, the rest carry no article reference.
fn collect_preview_keys(item: &ContentItem, keys: &mut HashSet<String>) {
    match item {
        ContentItem::Url { url } => insert_key(url, keys),
        ContentItem::TopReadPreview(preview) => insert_key(&preview.article_url, keys),
        ContentItem::Story(story) => {
            for preview in story.article_previews.iter().flatten() {
                insert_key(&preview.article_url, keys);
            }
        }
        ContentItem::Image(_)
        | ContentItem::Notification(_)
        | ContentItem::Announcement(_)
        | ContentItem::OnThisDayEvent(_)
        | ContentItem::Theme(_) => {}
    }
}

/// Full-content items are dispatched against the group's kind. A combination
/// outside the known pairs means the content model has drifted from the sweep
/// logic; that is a programming error, surfaced rather than silently skipped.
fn collect_item_keys(kind: ContentGroupKind, item: &ContentItem, keys: &mut HashSet<String>) {
    match (kind, item) {
        (ContentGroupKind::Url, ContentItem::Url { url }) => insert_key(url, keys),
        (ContentGroupKind::TopReadPreview, ContentItem::TopReadPreview(preview)) => {
            insert_key(&preview.article_url, keys);
        }
        (ContentGroupKind::Story, ContentItem::Story(story)) => {
            for preview in story.article_previews.iter().flatten() {
                insert_key(&preview.article_url, keys);
            }
        }
        (ContentGroupKind::Image, ContentItem::Image(_))
        | (ContentGroupKind::Notification, ContentItem::Notification(_))
        | (ContentGroupKind::Announcement, ContentItem::Announcement(_))
        | (ContentGroupKind::OnThisDayEvent, ContentItem::OnThisDayEvent(_))
        | (ContentGroupKind::Theme, ContentItem::Theme(_)) => {}
        (kind, item) => {
            tracing::error!(%kind, "content item does not belong to this group kind");
            debug_assert!(
                false,
                "content item {item:?} does not belong to a {kind} group"
            );
        }
    }
}

fn insert_key(raw_url: &str, keys: &mut HashSet<String>) {
    let Ok(url) = Url::parse(raw_url) else {
        return;
    };
    if let Some(key) = database_key(&url) {
        keys.insert(key);
    }
}
