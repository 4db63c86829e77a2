//! Content source gateway.
//!
//! The sync pipeline only needs a handful of capabilities from the provider.
//! They are expressed as the [`ContentSource`] trait so the HTTP client can be
//! swapped for a scripted double in tests. No retry or rate limiting happens
//! here; each call either succeeds or reports an upstream error.

mod client;
pub mod extract;

pub use client::HttpContentSource;
pub use extract::resolve_real_id_from_url;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::Result;

/// Channel metadata reported by the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelMetadata {
    pub name: String,
    pub description: String,
    pub avatar: String,
    pub link: String,
}

/// One article as listed by the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpstreamArticle {
    pub title: String,
    pub description: String,
    /// Inline body; empty when the listing omitted it.
    pub body: String,
    pub link: String,
    pub cover: String,
    /// `None` when the provider did not supply a publish time.
    pub published_at: Option<DateTime<Utc>>,
}

/// Provider capabilities the sync pipeline depends on.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Metadata for a channel.
    async fn fetch_channel_metadata(&self, real_id: &str) -> Result<ChannelMetadata>;

    /// A page of a channel's articles in provider order.
    async fn fetch_article_page(
        &self,
        real_id: &str,
        offset: u32,
        count: u32,
    ) -> Result<Vec<UpstreamArticle>>;

    /// Full body of one article.
    async fn fetch_article_body(&self, link: &str) -> Result<String>;

    /// Raw markup of an article page.
    async fn fetch_page(&self, url: &str) -> Result<String>;
}
