//! Request DTOs for Web API.

use serde::Deserialize;

use crate::store::{ArticleQuery, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Pagination query parameters.
#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    /// Page number (1-based).
    #[serde(default = "default_page")]
    pub page: u32,
    /// Items per page.
    #[serde(default = "default_size")]
    pub size: u32,
}

fn default_page() -> u32 {
    1
}

fn default_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for PaginationQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            size: default_size(),
        }
    }
}

impl PaginationQuery {
    /// Page and size after clamping.
    pub fn normalized(&self) -> (u32, u32) {
        (self.page.max(1), self.size.clamp(1, MAX_PAGE_SIZE))
    }
}

/// `GET /api/list` parameters.
#[derive(Debug, Deserialize)]
pub struct ListChannelsQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_size")]
    pub size: u32,
    /// Substring of the channel name.
    #[serde(default)]
    pub name: Option<String>,
}

impl ListChannelsQuery {
    pub fn pagination(&self) -> PaginationQuery {
        PaginationQuery {
            page: self.page,
            size: self.size,
        }
    }
}

/// `GET /api/query` parameters.
#[derive(Debug, Deserialize)]
pub struct ArticlesQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_size")]
    pub size: u32,
    /// Public identifier of a channel.
    #[serde(default)]
    pub bid: Option<String>,
    /// `YYYYMMDD`, exclusive.
    #[serde(default)]
    pub before: Option<String>,
    /// `YYYYMMDD`, inclusive.
    #[serde(default)]
    pub after: Option<String>,
    /// Include article bodies.
    #[serde(default)]
    pub content: Option<String>,
}

impl ArticlesQuery {
    /// Storage query for an already-resolved channel.
    pub fn to_store_query(&self, real_id: Option<String>) -> ArticleQuery {
        let (page, page_size) = PaginationQuery {
            page: self.page,
            size: self.size,
        }
        .normalized();
        ArticleQuery {
            channel_id: real_id,
            before: self.before.clone().filter(|s| !s.is_empty()),
            after: self.after.clone().filter(|s| !s.is_empty()),
            page,
            page_size,
            include_body: self.content.as_deref().map(parse_flag).unwrap_or(false),
        }
    }
}

/// `GET /api/pause/:id` parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PauseQuery {
    /// `true` pauses, `false` resumes. Missing means pause.
    #[serde(default)]
    pub status: Option<String>,
}

impl PauseQuery {
    pub fn paused(&self) -> bool {
        self.status.as_deref().map(parse_flag).unwrap_or(true)
    }
}

/// `GET /api/addurl` parameters.
#[derive(Debug, Default, Deserialize)]
pub struct AddUrlQuery {
    #[serde(default)]
    pub url: Option<String>,
}

/// `GET /api/fetch` parameters.
#[derive(Debug, Default, Deserialize)]
pub struct FetchQuery {
    /// Public identifier; absent means all channels.
    #[serde(default)]
    pub bid: Option<String>,
}

/// Lenient boolean used by query flags: `1`, `true`, `yes`, `on`.
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
