//! Builds feed documents from stored articles.

use chrono::Utc;
use tracing::debug;

use super::{
    clean_description, render_json, render_opml, render_rss, FeedDocument, FeedEntry, FeedFormat,
    FeedScope, OpmlEntry, ALL_FEED_ID,
};
use crate::codec::FeedIdCodec;
use crate::config::RssConfig;
use crate::db::Database;
use crate::store::{
    Article, ArticleQuery, ArticleRepository, ChannelRepository, MAX_PAGE_SIZE,
};
use crate::{OarssError, Result};

/// Items in a single-channel feed when not configured.
pub const DEFAULT_MAX_ITEMS: usize = 20;

/// Items in the aggregate feed when not configured.
pub const DEFAULT_ALL_MAX_ITEMS: usize = 50;

/// Title of the aggregate feed.
pub const ALL_FEED_TITLE: &str = "WeChatOArss All";

/// Description of the aggregate feed.
pub const ALL_FEED_DESCRIPTION: &str = "All subscribed channels";

/// A serialized feed and its content type.
#[derive(Debug, Clone)]
pub struct RenderedFeed {
    pub content_type: &'static str,
    pub body: String,
}

/// Feed synthesizer.
#[derive(Clone)]
pub struct FeedSynthesizer {
    db: Database,
    codec: FeedIdCodec,
    public_host: String,
    max_items: usize,
    all_max_items: usize,
}

impl FeedSynthesizer {
    /// Create a synthesizer with explicit limits. Zero limits use the defaults.
    pub fn new(
        db: Database,
        codec: FeedIdCodec,
        public_host: impl Into<String>,
        max_items: usize,
        all_max_items: usize,
    ) -> Self {
        let max_items = if max_items == 0 {
            DEFAULT_MAX_ITEMS
        } else {
            max_items
        };
        let all_max_items = if all_max_items == 0 {
            DEFAULT_ALL_MAX_ITEMS
        } else {
            all_max_items
        };
        Self {
            db,
            codec,
            public_host: public_host.into().trim_end_matches('/').to_string(),
            max_items,
            all_max_items,
        }
    }

    /// Create a synthesizer from the feed configuration.
    ///
    /// An unset aggregate limit inherits the single-channel limit when that
    /// one is set.
    pub fn from_config(db: Database, codec: FeedIdCodec, config: &RssConfig) -> Self {
        let all_max_items = if config.all_max_item_count > 0 {
            config.all_max_item_count
        } else {
            config.max_item_count
        };
        Self::new(db, codec, &config.host, config.max_item_count, all_max_items)
    }

    /// Item limit for a scope.
    pub fn limit_for(&self, scope: &FeedScope) -> usize {
        match scope {
            FeedScope::Channel(_) => self.max_items,
            FeedScope::All => self.all_max_items,
        }
    }

    /// Public URL of a feed.
    pub fn feed_url(&self, public_id: &str, format: FeedFormat) -> String {
        format!("{}/feed/{}.{}", self.public_host, public_id, format.extension())
    }

    /// Render a feed.
    pub async fn render(&self, scope: &FeedScope, format: FeedFormat) -> Result<RenderedFeed> {
        let doc = self.build_document(scope, format).await?;
        let body = match format {
            FeedFormat::Rss => render_rss(&doc, Utc::now())?,
            FeedFormat::Json => render_json(&doc)?,
        };
        Ok(RenderedFeed {
            content_type: format.content_type(),
            body,
        })
    }

    /// Build the format-neutral document for a scope.
    pub async fn build_document(&self, scope: &FeedScope, format: FeedFormat) -> Result<FeedDocument> {
        let pool = self.db.pool();
        let limit = self.limit_for(scope).min(MAX_PAGE_SIZE as usize) as u32;

        let (title, description, home_url, feed_url, query) = match scope {
            FeedScope::Channel(public_id) => {
                let real_id = self.codec.to_real(pool, public_id).await?;
                let channel = ChannelRepository::new(pool)
                    .get_by_real_id(&real_id)
                    .await?
                    .ok_or_else(|| OarssError::ChannelNotFound(public_id.clone()))?;
                (
                    channel.name,
                    channel.description,
                    channel.link,
                    self.feed_url(public_id, format),
                    ArticleQuery::latest(Some(real_id.as_str()), limit),
                )
            }
            FeedScope::All => (
                ALL_FEED_TITLE.to_string(),
                ALL_FEED_DESCRIPTION.to_string(),
                self.public_host.clone(),
                self.feed_url(ALL_FEED_ID, format),
                ArticleQuery::latest(None, limit),
            ),
        };

        let (articles, _) = ArticleRepository::new(pool).query(&query).await?;
        debug!("Rendering {:?} with {} articles", scope, articles.len());

        let entries = articles
            .into_iter()
            .map(to_entry)
            .collect::<Result<Vec<_>>>()?;

        Ok(FeedDocument {
            title,
            description,
            home_url,
            feed_url,
            entries,
        })
    }

    /// OPML list of every channel's RSS feed.
    pub async fn render_opml(&self) -> Result<String> {
        let channels = ChannelRepository::new(self.db.pool()).list_all().await?;
        let entries: Vec<OpmlEntry> = channels
            .into_iter()
            .map(|channel| OpmlEntry {
                xml_url: self.feed_url(&self.codec.to_public(&channel.real_id), FeedFormat::Rss),
                title: channel.name,
                html_url: Some(channel.link),
            })
            .collect();
        render_opml(&entries)
    }
}

fn to_entry(article: Article) -> Result<FeedEntry> {
    let source = if article.description.is_empty() {
        &article.content
    } else {
        &article.description
    };
    Ok(FeedEntry {
        id: article.id,
        summary: clean_description(source)?,
        published_at: article.published_at.unwrap_or_else(Utc::now),
        title: article.title,
        link: article.link,
        content: article.content,
    })
}
