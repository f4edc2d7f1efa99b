pub const SCHEMA: &str = r#"
-- content_groups table
CREATE TABLE IF NOT EXISTS content_groups (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    kind TEXT NOT NULL,
    midnight_utc_date TEXT NOT NULL,
    content_preview TEXT,
    full_content TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_content_groups_date ON content_groups(midnight_utc_date DESC);
CREATE INDEX IF NOT EXISTS idx_content_groups_kind ON content_groups(kind);

-- articles table
CREATE TABLE IF NOT EXISTS articles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    key TEXT NOT NULL UNIQUE,
    url TEXT NOT NULL,
    viewed_at TEXT,
    saved_at TEXT,
    places_sort_order INTEGER,
    is_excluded_from_feed INTEGER NOT NULL DEFAULT 0,
    is_downloaded INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_articles_key ON articles(key);
CREATE INDEX IF NOT EXISTS idx_articles_saved_at ON articles(saved_at);

-- navigation_state table (persisted back stack; empty means nothing to protect)
CREATE TABLE IF NOT EXISTS navigation_state (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    article_key TEXT NOT NULL,
    stack_index INTEGER NOT NULL,
    saved_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_navigation_state_key ON navigation_state(article_key);
"#;
