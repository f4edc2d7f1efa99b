mod article;
mod content_group;

pub use article::{database_key, Article};
pub use content_group::{
    Announcement, ContentGroup, ContentGroupKind, ContentItem, ImageContent, NewContentGroup,
    NewsStory, NotificationContent, OnThisDayEvent, ThemeContent, TopReadArticlePreview,
    UnknownKindError,
};

/// Aggressiveness of a housekeeping pass.
///
/// `Low` is routine maintenance; `High` is a full clear that retains no feed
/// history, wipes preserved navigation state first, and deletes previously
/// viewed articles as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CleanupLevel {
    #[default]
    Low,
    High,
}
