use chrono::{Days, Duration, NaiveDate, Utc};
use tempfile::TempDir;
use url::Url;

use reader_housekeeper::db::Repository;
use reader_housekeeper::events::{EventBus, StoreEvent};
use reader_housekeeper::models::{
    database_key, Announcement, CleanupLevel, ContentGroupKind, ContentItem, NewContentGroup,
    NewsStory, TopReadArticlePreview,
};
use reader_housekeeper::services::{Housekeeper, NavigationStateController};

const RETENTION_DAYS: u32 = 15;

async fn open_repository(dir: &TempDir) -> Repository {
    let db_path = dir.path().join("reader.db");
    Repository::new(db_path.to_str().unwrap()).await.unwrap()
}

fn housekeeper() -> Housekeeper {
    Housekeeper::with_retention_days(EventBus::new(), RETENTION_DAYS)
}

fn day(days_ago: u64) -> NaiveDate {
    Utc::now().date_naive() - Days::new(days_ago)
}

fn url_item(url: &str) -> ContentItem {
    ContentItem::Url {
        url: url.to_string(),
    }
}

fn url_group(days_ago: u64, urls: &[&str]) -> NewContentGroup {
    NewContentGroup {
        kind: ContentGroupKind::Url,
        midnight_utc_date: day(days_ago),
        content_preview: None,
        full_content: Some(urls.iter().map(|url| url_item(url)).collect()),
    }
}

fn announcement_group(ends_in_hours: i64) -> NewContentGroup {
    NewContentGroup {
        kind: ContentGroupKind::Announcement,
        midnight_utc_date: day(0),
        content_preview: Some(ContentItem::Announcement(Announcement {
            identifier: "fundraiser-2026".to_string(),
            text: Some("Support the encyclopedia".to_string()),
            start_time: Some(Utc::now() - Duration::days(7)),
            end_time: Some(Utc::now() + Duration::hours(ends_in_hours)),
        })),
        full_content: None,
    }
}

async fn add_article(repository: &Repository, url: &str) -> String {
    let url = Url::parse(url).unwrap();
    repository.upsert_article(&url).await.unwrap();
    database_key(&url).unwrap()
}

// Scenario: a group past the retention window referencing an article nobody
// else references. Both go, and the article's URL is reported.
#[tokio::test]
async fn old_group_and_its_unreferenced_article_are_deleted() {
    let dir = TempDir::new().unwrap();
    let repository = open_repository(&dir).await;
    let navigation = NavigationStateController::new();

    repository
        .insert_content_group(url_group(40, &["https://en.wikipedia.org/wiki/Rust"]))
        .await
        .unwrap();
    let key = add_article(&repository, "https://en.wikipedia.org/wiki/Rust").await;

    let deleted = housekeeper()
        .perform_housekeeping(&repository, &navigation, CleanupLevel::Low)
        .await
        .unwrap();

    assert!(repository.get_all_content_groups().await.unwrap().is_empty());
    assert!(repository.get_article_by_key(&key).await.unwrap().is_none());
    assert_eq!(
        deleted.iter().map(Url::as_str).collect::<Vec<_>>(),
        vec!["https://en.wikipedia.org/wiki/Rust"]
    );
}

// Scenario: same article also referenced by a recent group. The old group
// goes, the article stays — one surviving reference is enough.
#[tokio::test]
async fn surviving_reference_retains_the_article() {
    let dir = TempDir::new().unwrap();
    let repository = open_repository(&dir).await;
    let navigation = NavigationStateController::new();

    repository
        .insert_content_group(url_group(40, &["https://en.wikipedia.org/wiki/Rust"]))
        .await
        .unwrap();
    repository
        .insert_content_group(url_group(1, &["https://en.wikipedia.org/wiki/Rust"]))
        .await
        .unwrap();
    let key = add_article(&repository, "https://en.wikipedia.org/wiki/Rust").await;

    let deleted = housekeeper()
        .perform_housekeeping(&repository, &navigation, CleanupLevel::Low)
        .await
        .unwrap();

    assert!(deleted.is_empty());
    assert_eq!(repository.get_all_content_groups().await.unwrap().len(), 1);
    assert!(repository.get_article_by_key(&key).await.unwrap().is_some());
}

#[tokio::test]
async fn retention_boundary_day_survives_a_routine_pass() {
    let dir = TempDir::new().unwrap();
    let repository = open_repository(&dir).await;
    let navigation = NavigationStateController::new();

    repository
        .insert_content_group(url_group(RETENTION_DAYS as u64, &[]))
        .await
        .unwrap();
    repository
        .insert_content_group(url_group(RETENTION_DAYS as u64 + 1, &[]))
        .await
        .unwrap();

    housekeeper()
        .perform_housekeeping(&repository, &navigation, CleanupLevel::Low)
        .await
        .unwrap();

    let remaining = repository.get_all_content_groups().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].midnight_utc_date, day(RETENTION_DAYS as u64));
}

// Scenario: a full clear deletes every group including today's, wipes the
// back stack first, and still honors the downloaded flag.
#[tokio::test]
async fn deep_clean_retains_nothing_but_protected_articles() {
    let dir = TempDir::new().unwrap();
    let repository = open_repository(&dir).await;
    let navigation = NavigationStateController::new();

    repository
        .insert_content_group(url_group(0, &["https://en.wikipedia.org/wiki/Mars"]))
        .await
        .unwrap();
    repository.insert_content_group(url_group(40, &[])).await.unwrap();

    let downloaded = add_article(&repository, "https://en.wikipedia.org/wiki/Moon").await;
    repository.set_downloaded(&downloaded, true).await.unwrap();
    let plain = add_article(&repository, "https://en.wikipedia.org/wiki/Mars").await;

    navigation
        .save_back_stack(&repository, vec![plain.clone()])
        .await
        .unwrap();

    housekeeper()
        .perform_housekeeping(&repository, &navigation, CleanupLevel::High)
        .await
        .unwrap();

    assert!(repository.get_all_content_groups().await.unwrap().is_empty());
    assert!(
        navigation
            .all_preserved_article_keys(&repository)
            .await
            .unwrap()
            .is_none(),
        "deep clean must wipe the back stack before sweeping"
    );
    assert!(repository.get_article_by_key(&downloaded).await.unwrap().is_some());
    assert!(repository.get_article_by_key(&plain).await.unwrap().is_none());
}

#[tokio::test]
async fn user_state_flags_protect_articles_from_any_pass() {
    let dir = TempDir::new().unwrap();
    let repository = open_repository(&dir).await;
    let navigation = NavigationStateController::new();

    let saved = add_article(&repository, "https://en.wikipedia.org/wiki/Saved").await;
    repository.set_article_saved(&saved, true).await.unwrap();

    let pinned = add_article(&repository, "https://en.wikipedia.org/wiki/Pinned").await;
    repository.set_places_sort_order(&pinned, Some(3)).await.unwrap();

    let excluded = add_article(&repository, "https://en.wikipedia.org/wiki/Excluded").await;
    repository.set_excluded_from_feed(&excluded, true).await.unwrap();

    let downloaded = add_article(&repository, "https://en.wikipedia.org/wiki/Downloaded").await;
    repository.set_downloaded(&downloaded, true).await.unwrap();

    for level in [CleanupLevel::Low, CleanupLevel::High] {
        let deleted = housekeeper()
            .perform_housekeeping(&repository, &navigation, level)
            .await
            .unwrap();
        assert!(deleted.is_empty(), "level {level:?} deleted protected rows");
    }

    assert_eq!(repository.get_all_articles().await.unwrap().len(), 4);
}

#[tokio::test]
async fn viewed_articles_survive_routine_passes_but_not_a_deep_clean() {
    let dir = TempDir::new().unwrap();
    let repository = open_repository(&dir).await;
    let navigation = NavigationStateController::new();

    let key = add_article(&repository, "https://en.wikipedia.org/wiki/History").await;
    repository.mark_article_viewed(&key).await.unwrap();

    housekeeper()
        .perform_housekeeping(&repository, &navigation, CleanupLevel::Low)
        .await
        .unwrap();
    assert!(repository.get_article_by_key(&key).await.unwrap().is_some());

    let deleted = housekeeper()
        .perform_housekeeping(&repository, &navigation, CleanupLevel::High)
        .await
        .unwrap();
    assert_eq!(deleted.len(), 1);
    assert!(repository.get_article_by_key(&key).await.unwrap().is_none());
}

// Scenario: an announcement whose end time has passed goes on every pass,
// independent of cleanup level or retention window.
#[tokio::test]
async fn expired_announcements_are_deleted_on_every_pass() {
    let dir = TempDir::new().unwrap();
    let repository = open_repository(&dir).await;
    let navigation = NavigationStateController::new();

    repository
        .insert_content_group(announcement_group(-2))
        .await
        .unwrap();
    repository
        .insert_content_group(announcement_group(48))
        .await
        .unwrap();

    housekeeper()
        .perform_housekeeping(&repository, &navigation, CleanupLevel::Low)
        .await
        .unwrap();

    let remaining = repository
        .groups_of_kind(ContentGroupKind::Announcement)
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);
    match &remaining[0].content_preview {
        Some(ContentItem::Announcement(announcement)) => {
            assert!(announcement.end_time.unwrap() > Utc::now());
        }
        other => panic!("unexpected preview payload: {other:?}"),
    }
}

// Scenario: the persistence object is materialized (actively displayed), so
// a routine pass skips it even though it is otherwise eligible.
#[tokio::test]
async fn materialized_articles_survive_a_routine_pass() {
    let dir = TempDir::new().unwrap();
    let repository = open_repository(&dir).await;
    let navigation = NavigationStateController::new();

    let key = add_article(&repository, "https://en.wikipedia.org/wiki/Disambiguation").await;
    repository.mark_materialized(&key);

    let deleted = housekeeper()
        .perform_housekeeping(&repository, &navigation, CleanupLevel::Low)
        .await
        .unwrap();
    assert!(deleted.is_empty());
    assert!(repository.get_article_by_key(&key).await.unwrap().is_some());
}

#[tokio::test]
async fn deep_clean_ignores_the_materialized_registry() {
    let dir = TempDir::new().unwrap();
    let repository = open_repository(&dir).await;
    let navigation = NavigationStateController::new();

    let key = add_article(&repository, "https://en.wikipedia.org/wiki/Disambiguation").await;
    repository.mark_materialized(&key);

    housekeeper()
        .perform_housekeeping(&repository, &navigation, CleanupLevel::High)
        .await
        .unwrap();
    assert!(repository.get_article_by_key(&key).await.unwrap().is_none());
}

#[tokio::test]
async fn back_stack_articles_are_protected_until_cleared() {
    let dir = TempDir::new().unwrap();
    let repository = open_repository(&dir).await;
    let navigation = NavigationStateController::new();

    let key = add_article(&repository, "https://en.wikipedia.org/wiki/Open_Tab").await;
    navigation
        .save_back_stack(&repository, vec![key.clone()])
        .await
        .unwrap();

    housekeeper()
        .perform_housekeeping(&repository, &navigation, CleanupLevel::Low)
        .await
        .unwrap();
    assert!(repository.get_article_by_key(&key).await.unwrap().is_some());

    housekeeper()
        .perform_housekeeping(&repository, &navigation, CleanupLevel::High)
        .await
        .unwrap();
    assert!(repository.get_article_by_key(&key).await.unwrap().is_none());
}

#[tokio::test]
async fn preview_only_groups_still_protect_their_article() {
    let dir = TempDir::new().unwrap();
    let repository = open_repository(&dir).await;
    let navigation = NavigationStateController::new();

    repository
        .insert_content_group(NewContentGroup {
            kind: ContentGroupKind::Url,
            midnight_utc_date: day(1),
            content_preview: Some(url_item("https://en.wikipedia.org/wiki/Preview")),
            full_content: None,
        })
        .await
        .unwrap();
    let key = add_article(&repository, "https://en.wikipedia.org/wiki/Preview").await;

    let deleted = housekeeper()
        .perform_housekeeping(&repository, &navigation, CleanupLevel::Low)
        .await
        .unwrap();
    assert!(deleted.is_empty());
    assert!(repository.get_article_by_key(&key).await.unwrap().is_some());
}

#[tokio::test]
async fn story_groups_protect_every_nested_article() {
    let dir = TempDir::new().unwrap();
    let repository = open_repository(&dir).await;
    let navigation = NavigationStateController::new();

    let previews = ["https://en.wikipedia.org/wiki/Mars", "https://en.wikipedia.org/wiki/Venus"]
        .iter()
        .map(|url| TopReadArticlePreview {
            article_url: url.to_string(),
            rank: None,
            view_count: None,
        })
        .collect();
    repository
        .insert_content_group(NewContentGroup {
            kind: ContentGroupKind::Story,
            midnight_utc_date: day(2),
            content_preview: None,
            full_content: Some(vec![ContentItem::Story(NewsStory {
                story_html: Some("<p>Planetary news</p>".to_string()),
                article_previews: Some(previews),
            })]),
        })
        .await
        .unwrap();
    let mars = add_article(&repository, "https://en.wikipedia.org/wiki/Mars").await;
    let venus = add_article(&repository, "https://en.wikipedia.org/wiki/Venus").await;

    let deleted = housekeeper()
        .perform_housekeeping(&repository, &navigation, CleanupLevel::Low)
        .await
        .unwrap();
    assert!(deleted.is_empty());
    assert!(repository.get_article_by_key(&mars).await.unwrap().is_some());
    assert!(repository.get_article_by_key(&venus).await.unwrap().is_some());
}

#[tokio::test]
async fn back_to_back_passes_are_idempotent() {
    let dir = TempDir::new().unwrap();
    let repository = open_repository(&dir).await;
    let navigation = NavigationStateController::new();

    repository
        .insert_content_group(url_group(40, &["https://en.wikipedia.org/wiki/Rust"]))
        .await
        .unwrap();
    repository
        .insert_content_group(url_group(1, &["https://en.wikipedia.org/wiki/Ada_Lovelace"]))
        .await
        .unwrap();
    add_article(&repository, "https://en.wikipedia.org/wiki/Rust").await;
    add_article(&repository, "https://en.wikipedia.org/wiki/Ada_Lovelace").await;

    let sweeper = housekeeper();
    let first = sweeper
        .perform_housekeeping(&repository, &navigation, CleanupLevel::Low)
        .await
        .unwrap();
    assert_eq!(first.len(), 1);

    let groups_after_first = repository.get_all_content_groups().await.unwrap().len();
    let second = sweeper
        .perform_housekeeping(&repository, &navigation, CleanupLevel::Low)
        .await
        .unwrap();
    assert!(second.is_empty());
    assert_eq!(
        repository.get_all_content_groups().await.unwrap().len(),
        groups_after_first
    );
}

#[tokio::test]
async fn completion_event_is_published_after_a_pass() {
    let dir = TempDir::new().unwrap();
    let repository = open_repository(&dir).await;
    let navigation = NavigationStateController::new();

    let events = EventBus::new();
    let mut rx = events.subscribe();
    let sweeper = Housekeeper::with_retention_days(events, RETENTION_DAYS);

    sweeper
        .perform_housekeeping(&repository, &navigation, CleanupLevel::Low)
        .await
        .unwrap();

    assert_eq!(rx.try_recv().unwrap(), StoreEvent::HousekeepingCompleted);
}
