//! Database schema and migrations.
//!
//! Migrations run in order; `schema_version` records which have been applied.
//! Timestamps are stored as UTC RFC 3339 text so they sort lexically.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: provider accounts, channels, articles
    r#"
CREATE TABLE accounts (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    cookie      TEXT NOT NULL DEFAULT '',
    token       TEXT NOT NULL DEFAULT '',
    available   INTEGER NOT NULL DEFAULT 1,
    need_check  INTEGER NOT NULL DEFAULT 0,
    wait_time   TEXT,
    created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
    updated_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
);

CREATE TABLE channels (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    biz_id          TEXT NOT NULL UNIQUE,
    name            TEXT NOT NULL,
    description     TEXT NOT NULL DEFAULT '',
    avatar          TEXT NOT NULL DEFAULT '',
    link            TEXT NOT NULL DEFAULT '',
    account_id      INTEGER,
    last_update     TEXT,
    article_count   INTEGER NOT NULL DEFAULT 0,
    status          TEXT NOT NULL DEFAULT 'active',  -- 'active' or 'paused'
    created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
);

CREATE INDEX idx_channels_status ON channels(status);

-- link is the dedup key; INSERT OR IGNORE relies on this constraint
CREATE TABLE articles (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    biz_id          TEXT NOT NULL REFERENCES channels(biz_id) ON DELETE CASCADE,
    title           TEXT NOT NULL,
    description     TEXT NOT NULL DEFAULT '',
    content         TEXT NOT NULL DEFAULT '',
    link            TEXT NOT NULL UNIQUE,
    cover           TEXT NOT NULL DEFAULT '',
    published_at    TEXT NOT NULL,
    created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
);

CREATE INDEX idx_articles_biz_id ON articles(biz_id);
CREATE INDEX idx_articles_published_at ON articles(published_at);
"#,
];
