//! Stored entity types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{OarssError, Result};

/// Default articles per page when a query leaves the size unset.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Upper bound on a single query page.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Lifecycle status of a channel. Only user actions change it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelStatus {
    /// Included in scheduled syncs.
    Active,
    /// Skipped by scheduled syncs.
    Paused,
}

impl ChannelStatus {
    /// Database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelStatus::Active => "active",
            ChannelStatus::Paused => "paused",
        }
    }

    /// Parse the database representation.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "active" => Ok(ChannelStatus::Active),
            "paused" => Ok(ChannelStatus::Paused),
            other => Err(OarssError::Validation(format!(
                "unknown channel status: {other}"
            ))),
        }
    }
}

/// A subscribed content source.
#[derive(Debug, Clone, Serialize)]
pub struct Channel {
    /// Row id.
    pub id: i64,
    /// Provider-assigned real identifier.
    pub real_id: String,
    pub name: String,
    pub description: String,
    pub avatar: String,
    /// Canonical link on the provider side.
    pub link: String,
    /// Owning provider account.
    pub account_id: Option<i64>,
    /// Last completed sync.
    pub last_update: Option<DateTime<Utc>>,
    /// Stored article count as of the last sync.
    pub article_count: i64,
    pub status: ChannelStatus,
    pub created_at: DateTime<Utc>,
}

impl Channel {
    /// Whether scheduled syncs include this channel.
    pub fn is_active(&self) -> bool {
        self.status == ChannelStatus::Active
    }
}

/// Data for creating a new channel.
#[derive(Debug, Clone)]
pub struct NewChannel {
    pub real_id: String,
    pub name: String,
    pub description: String,
    pub avatar: String,
    pub link: String,
    pub account_id: Option<i64>,
}

impl NewChannel {
    /// Create a new channel with the given identifier and name.
    pub fn new(real_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            real_id: real_id.into(),
            name: name.into(),
            description: String::new(),
            avatar: String::new(),
            link: String::new(),
            account_id: None,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the avatar URL.
    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = avatar.into();
        self
    }

    /// Set the provider link.
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = link.into();
        self
    }

    /// Set the owning account.
    pub fn with_account(mut self, account_id: i64) -> Self {
        self.account_id = Some(account_id);
        self
    }
}

/// One ingested article.
#[derive(Debug, Clone, Serialize)]
pub struct Article {
    pub id: i64,
    /// Real identifier of the owning channel.
    pub channel_id: String,
    pub title: String,
    pub description: String,
    /// Full body; empty when not backfilled or not requested.
    pub content: String,
    /// Dedup key.
    pub link: String,
    pub cover: String,
    /// `None` when the stored value is empty or unreadable.
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Data for inserting a new article.
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub channel_id: String,
    pub title: String,
    pub description: String,
    pub content: String,
    pub link: String,
    pub cover: String,
    pub published_at: DateTime<Utc>,
}

impl NewArticle {
    /// Create a new article for a channel, published now.
    pub fn new(
        channel_id: impl Into<String>,
        title: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        Self {
            channel_id: channel_id.into(),
            title: title.into(),
            description: String::new(),
            content: String::new(),
            link: link.into(),
            cover: String::new(),
            published_at: Utc::now(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the body.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Set the cover image URL.
    pub fn with_cover(mut self, cover: impl Into<String>) -> Self {
        self.cover = cover.into();
        self
    }

    /// Set the publish time.
    pub fn with_published_at(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = published_at;
        self
    }
}

/// Result of a dedup-aware insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new row was written with this id.
    Created(i64),
    /// An article with the same link was already stored; nothing changed.
    AlreadyExists,
}

/// Filters for listing articles.
#[derive(Debug, Clone)]
pub struct ArticleQuery {
    /// Restrict to one channel's real identifier.
    pub channel_id: Option<String>,
    /// Only articles published before this day (`YYYYMMDD`).
    pub before: Option<String>,
    /// Only articles published on or after this day (`YYYYMMDD`).
    pub after: Option<String>,
    /// 1-based page number.
    pub page: u32,
    pub page_size: u32,
    /// Load the body column.
    pub include_body: bool,
}

impl Default for ArticleQuery {
    fn default() -> Self {
        Self {
            channel_id: None,
            before: None,
            after: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            include_body: true,
        }
    }
}

impl ArticleQuery {
    /// Most recent `limit` articles, optionally within one channel.
    pub fn latest(channel_id: Option<&str>, limit: u32) -> Self {
        Self {
            channel_id: channel_id.map(str::to_string),
            page_size: limit,
            ..Default::default()
        }
    }

    /// Convert to SQL offset and limit, clamping page and size.
    pub fn to_offset_limit(&self) -> (i64, i64) {
        let page = self.page.max(1) as i64;
        let size = self.page_size.clamp(1, MAX_PAGE_SIZE) as i64;
        ((page - 1) * size, size)
    }
}

/// Provider credential bundle.
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing)]
    pub cookie: String,
    #[serde(skip_serializing)]
    pub token: String,
    pub available: bool,
    pub need_check: bool,
    /// Cooldown end, if the provider asked us to back off.
    pub wait_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data for creating an account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub cookie: String,
    pub token: String,
}

impl NewAccount {
    /// Create account data.
    pub fn new(
        name: impl Into<String>,
        cookie: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            cookie: cookie.into(),
            token: token.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_status_parse() {
        assert_eq!(ChannelStatus::parse("active").unwrap(), ChannelStatus::Active);
        assert_eq!(ChannelStatus::parse("paused").unwrap(), ChannelStatus::Paused);
        assert!(ChannelStatus::parse("deleted").is_err());
        assert_eq!(ChannelStatus::Paused.as_str(), "paused");
    }

    #[test]
    fn test_new_channel_builder() {
        let ch = NewChannel::new("Mzkz1", "Daily")
            .with_description("news")
            .with_avatar("https://img/a.png")
            .with_link("https://mp/1")
            .with_account(1);
        assert_eq!(ch.real_id, "Mzkz1");
        assert_eq!(ch.description, "news");
        assert_eq!(ch.account_id, Some(1));
    }

    #[test]
    fn test_query_offset_limit() {
        let q = ArticleQuery {
            page: 3,
            page_size: 10,
            ..Default::default()
        };
        assert_eq!(q.to_offset_limit(), (20, 10));

        let q = ArticleQuery {
            page: 0,
            page_size: 0,
            ..Default::default()
        };
        assert_eq!(q.to_offset_limit(), (0, 1));

        let q = ArticleQuery::latest(Some("x"), 5000);
        assert_eq!(q.to_offset_limit(), (0, MAX_PAGE_SIZE as i64));
        assert_eq!(q.channel_id.as_deref(), Some("x"));
    }
}
