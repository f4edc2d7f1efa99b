use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A timestamped feed entry bundling one or more content items for display.
///
/// The preview and full-content payloads are polymorphic by `kind` and are
/// stored as JSON columns; the housekeeper walks both to find article
/// references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentGroup {
    pub id: i64,
    pub kind: ContentGroupKind,
    /// The UTC calendar day this group logically belongs to. Retention is
    /// decided against this day, not the row's creation time.
    pub midnight_utc_date: NaiveDate,
    pub content_preview: Option<ContentItem>,
    pub full_content: Option<Vec<ContentItem>>,
    pub created_at: DateTime<Utc>,
}

/// A content group staged for insertion.
#[derive(Debug, Clone)]
pub struct NewContentGroup {
    pub kind: ContentGroupKind,
    pub midnight_utc_date: NaiveDate,
    pub content_preview: Option<ContentItem>,
    pub full_content: Option<Vec<ContentItem>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentGroupKind {
    Url,
    TopReadPreview,
    Story,
    Image,
    Notification,
    Announcement,
    OnThisDayEvent,
    Theme,
}

impl ContentGroupKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentGroupKind::Url => "url",
            ContentGroupKind::TopReadPreview => "top_read_preview",
            ContentGroupKind::Story => "story",
            ContentGroupKind::Image => "image",
            ContentGroupKind::Notification => "notification",
            ContentGroupKind::Announcement => "announcement",
            ContentGroupKind::OnThisDayEvent => "on_this_day_event",
            ContentGroupKind::Theme => "theme",
        }
    }
}

impl fmt::Display for ContentGroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown content group kind: {0}")]
pub struct UnknownKindError(String);

impl FromStr for ContentGroupKind {
    type Err = UnknownKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "url" => Ok(ContentGroupKind::Url),
            "top_read_preview" => Ok(ContentGroupKind::TopReadPreview),
            "story" => Ok(ContentGroupKind::Story),
            "image" => Ok(ContentGroupKind::Image),
            "notification" => Ok(ContentGroupKind::Notification),
            "announcement" => Ok(ContentGroupKind::Announcement),
            "on_this_day_event" => Ok(ContentGroupKind::OnThisDayEvent),
            "theme" => Ok(ContentGroupKind::Theme),
            other => Err(UnknownKindError(other.to_string())),
        }
    }
}

/// One element of a group's preview or full-content payload. Which variant a
/// group carries depends on its kind; a mismatch means the content model has
/// drifted from the sweep logic and is surfaced, not silently ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentItem {
    Url { url: String },
    TopReadPreview(TopReadArticlePreview),
    Story(NewsStory),
    Image(ImageContent),
    Notification(NotificationContent),
    Announcement(Announcement),
    OnThisDayEvent(OnThisDayEvent),
    Theme(ThemeContent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopReadArticlePreview {
    pub article_url: String,
    pub rank: Option<u32>,
    pub view_count: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsStory {
    pub story_html: Option<String>,
    /// Previews for the articles the story mentions; absent when the feed
    /// service sent a bare story.
    pub article_previews: Option<Vec<TopReadArticlePreview>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageContent {
    pub source_url: String,
    pub caption: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationContent {
    pub title: String,
    pub body: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Announcement {
    pub identifier: String,
    pub text: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    /// Announcements expire; the housekeeper drops the group once this is in
    /// the past.
    pub end_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnThisDayEvent {
    pub year: Option<i32>,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeContent {
    pub name: String,
}
