//! Response DTOs for Web API.

use serde::Serialize;

use crate::config::Config;
use crate::datetime::to_rfc3339;
use crate::store::{Account, Article, Channel};
use crate::sync::SchedulerStatus;

// ============================================================================
// Generic Response Wrappers
// ============================================================================

/// Success envelope: `{"err": "", "data": ...}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Always empty on success.
    pub err: String,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self {
            err: String::new(),
            data,
        }
    }
}

/// Paginated response wrapper.
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T: Serialize> {
    pub err: String,
    /// Response data.
    pub data: Vec<T>,
    /// Pagination metadata.
    pub meta: PaginationMeta,
}

impl<T: Serialize> PaginatedResponse<T> {
    /// Create a new paginated response.
    pub fn new(data: Vec<T>, page: u32, per_page: u32, total: i64) -> Self {
        Self {
            err: String::new(),
            data,
            meta: PaginationMeta {
                page,
                per_page,
                total: total.max(0) as u64,
            },
        }
    }
}

/// Pagination metadata.
#[derive(Debug, Serialize)]
pub struct PaginationMeta {
    /// Current page number.
    pub page: u32,
    /// Items per page.
    pub per_page: u32,
    /// Total number of items.
    pub total: u64,
}

// ============================================================================
// Channels and articles
// ============================================================================

/// Channel as listed by the API, keyed by its public identifier.
#[derive(Debug, Serialize)]
pub struct ChannelResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub avatar: String,
    pub link: String,
    /// Feed URL without extension.
    pub feed: String,
    pub article_count: i64,
    pub paused: bool,
    pub last_update: Option<String>,
    pub created_at: String,
}

impl ChannelResponse {
    pub fn new(channel: Channel, public_id: String, feed: String) -> Self {
        Self {
            id: public_id,
            paused: !channel.is_active(),
            name: channel.name,
            description: channel.description,
            avatar: channel.avatar,
            link: channel.link,
            feed,
            article_count: channel.article_count,
            last_update: channel.last_update.as_ref().map(to_rfc3339),
            created_at: to_rfc3339(&channel.created_at),
        }
    }
}

/// Article as returned by the API.
#[derive(Debug, Serialize)]
pub struct ArticleResponse {
    pub id: i64,
    /// Public identifier of the owning channel.
    pub channel: String,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub content: String,
    pub link: String,
    pub cover: String,
    pub published_at: Option<String>,
}

impl ArticleResponse {
    pub fn new(article: Article, channel_public_id: String) -> Self {
        Self {
            id: article.id,
            channel: channel_public_id,
            title: article.title,
            description: article.description,
            content: article.content,
            link: article.link,
            cover: article.cover,
            published_at: article.published_at.as_ref().map(to_rfc3339),
        }
    }
}

/// Provider account without credentials.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: i64,
    pub name: String,
    pub available: bool,
    pub need_check: bool,
    pub wait_time: Option<String>,
    pub created_at: String,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            name: account.name,
            available: account.available,
            need_check: account.need_check,
            wait_time: account.wait_time.as_ref().map(to_rfc3339),
            created_at: to_rfc3339(&account.created_at),
        }
    }
}

// ============================================================================
// System
// ============================================================================

/// Effective configuration with secrets removed.
#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub host: String,
    pub enc_feed_id: bool,
    pub max_item_count: usize,
    pub all_max_item_count: usize,
    pub scheduler: SchedulerStatus,
    pub upstream_base_url: String,
    pub page_size: u32,
    /// Whether the management API requires a token.
    pub token_required: bool,
}

impl ConfigResponse {
    pub fn new(config: &Config, scheduler: SchedulerStatus) -> Self {
        Self {
            host: config.public_host().to_string(),
            enc_feed_id: config.rss.enc_feed_id,
            max_item_count: config.rss.max_item_count,
            all_max_item_count: config.rss.all_max_item_count,
            scheduler,
            upstream_base_url: config.upstream.base_url.clone(),
            page_size: config.upstream.page_size,
            token_required: !config.server.token.is_empty(),
        }
    }
}

/// Build information.
#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub name: &'static str,
    pub version: &'static str,
}

impl Default for VersionResponse {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_response_envelope() {
        let json = serde_json::to_value(ApiResponse::new("link")).unwrap();
        assert_eq!(json["err"], "");
        assert_eq!(json["data"], "link");
    }

    #[test]
    fn test_paginated_response() {
        let json = serde_json::to_value(PaginatedResponse::new(vec![1, 2], 2, 2, 5)).unwrap();
        assert_eq!(json["data"].as_array().unwrap().len(), 2);
        assert_eq!(json["meta"]["page"], 2);
        assert_eq!(json["meta"]["per_page"], 2);
        assert_eq!(json["meta"]["total"], 5);
    }

    #[test]
    fn test_config_response_hides_secrets() {
        let mut config = Config::default();
        config.server.token = "tok".to_string();
        config.rss.secret = "sec".to_string();
        config.upstream.cookie = "cookie".to_string();
        let status = SchedulerStatus {
            running: false,
            times: vec!["07:00".to_string()],
            timezone: "UTC".to_string(),
            next_run: None,
        };

        let json = serde_json::to_string(&ConfigResponse::new(&config, status)).unwrap();
        assert!(!json.contains("tok\""));
        assert!(!json.contains("sec\""));
        assert!(!json.contains("cookie"));
        assert!(json.contains("\"token_required\":true"));
    }
}
