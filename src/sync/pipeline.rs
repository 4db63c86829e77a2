//! Fetch pipeline: pulls channel articles from the content source into storage.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use super::BackgroundTasks;
use crate::codec::FeedIdCodec;
use crate::config::Config;
use crate::db::Database;
use crate::store::{
    AccountRepository, ArticleRepository, ChannelRepository, ChannelStatus, InsertOutcome,
    NewArticle, NewChannel,
};
use crate::upstream::{resolve_real_id_from_url, ContentSource, UpstreamArticle};
use crate::{OarssError, Result};

/// Articles requested per channel sync when not configured.
pub const DEFAULT_SYNC_PAGE_SIZE: u32 = 20;

/// Pause between channels in a full sync when not configured.
pub const DEFAULT_CHANNEL_PAUSE: Duration = Duration::from_millis(500);

/// Outcome of one channel sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Articles returned by the provider.
    pub fetched: usize,
    /// New rows written.
    pub created: usize,
    /// Articles already stored.
    pub skipped: usize,
    /// Articles that could not be stored.
    pub failed: usize,
    /// Bodies fetched separately.
    pub backfilled: usize,
}

/// Outcome of a full sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub channels: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub created: usize,
}

/// Syncs channels and manages subscriptions.
#[derive(Clone)]
pub struct FetchPipeline {
    db: Database,
    source: Arc<dyn ContentSource>,
    codec: FeedIdCodec,
    tasks: BackgroundTasks,
    public_host: String,
    page_size: u32,
    channel_pause: Duration,
}

impl FetchPipeline {
    /// Create a pipeline with default page size and pause.
    pub fn new(
        db: Database,
        source: Arc<dyn ContentSource>,
        codec: FeedIdCodec,
        public_host: impl Into<String>,
    ) -> Self {
        Self {
            db,
            source,
            codec,
            tasks: BackgroundTasks::new(),
            public_host: public_host.into().trim_end_matches('/').to_string(),
            page_size: DEFAULT_SYNC_PAGE_SIZE,
            channel_pause: DEFAULT_CHANNEL_PAUSE,
        }
    }

    /// Create a pipeline from the application configuration.
    pub fn from_config(db: Database, source: Arc<dyn ContentSource>, config: &Config) -> Self {
        Self::new(
            db,
            source,
            FeedIdCodec::from_config(&config.rss),
            config.public_host(),
        )
        .with_page_size(config.upstream.page_size)
        .with_channel_pause(Duration::from_millis(config.scheduler.channel_pause_ms))
    }

    /// Set the number of articles requested per sync.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Set the pause between channels in a full sync.
    pub fn with_channel_pause(mut self, pause: Duration) -> Self {
        self.channel_pause = pause;
        self
    }

    /// Background task set used for asynchronous syncs.
    pub fn tasks(&self) -> &BackgroundTasks {
        &self.tasks
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn codec(&self) -> &FeedIdCodec {
        &self.codec
    }

    /// Public feed link of a channel.
    pub fn feed_link(&self, real_id: &str) -> String {
        format!("{}/feed/{}", self.public_host, self.codec.to_public(real_id))
    }

    /// Sync one channel.
    ///
    /// Fails only when the channel is unknown or the article page cannot be
    /// fetched. Per-article problems are counted in the report.
    pub async fn sync_channel(&self, real_id: &str) -> Result<SyncReport> {
        let pool = self.db.pool();
        let channels = ChannelRepository::new(pool);
        if channels.get_by_real_id(real_id).await?.is_none() {
            return Err(OarssError::ChannelNotFound(real_id.to_string()));
        }

        debug!("Syncing channel {}", real_id);
        let page = self
            .source
            .fetch_article_page(real_id, 0, self.page_size)
            .await?;

        let articles = ArticleRepository::new(pool);
        let mut report = SyncReport {
            fetched: page.len(),
            ..Default::default()
        };

        for item in page {
            if item.link.is_empty() {
                debug!("Skipping article without link in channel {}", real_id);
                report.failed += 1;
                continue;
            }

            // Stored links need no body fetch. The insert below still dedups.
            match articles.exists_by_link(&item.link).await {
                Ok(true) => {
                    report.skipped += 1;
                    continue;
                }
                Ok(false) => {}
                Err(e) => warn!("Failed to look up article {}: {}", item.link, e),
            }

            let new_article = self.prepare_article(real_id, item, &mut report).await;
            match articles.insert_if_absent(&new_article).await {
                Ok(InsertOutcome::Created(_)) => report.created += 1,
                Ok(InsertOutcome::AlreadyExists) => report.skipped += 1,
                Err(e) => {
                    error!("Failed to store article {}: {}", new_article.link, e);
                    report.failed += 1;
                }
            }
        }

        let count = articles.count_by_channel(real_id).await?;
        channels.update_sync_stats(real_id, count).await?;

        if report.created > 0 {
            info!(
                "Channel {} synced: {} new article(s), {} total",
                real_id, report.created, count
            );
        } else {
            debug!("Channel {} synced: no new articles", real_id);
        }
        Ok(report)
    }

    /// Turn a provider article into a row, backfilling an empty body.
    async fn prepare_article(
        &self,
        real_id: &str,
        item: UpstreamArticle,
        report: &mut SyncReport,
    ) -> NewArticle {
        let mut body = item.body;
        if body.is_empty() {
            match self.source.fetch_article_body(&item.link).await {
                Ok(fetched) => {
                    report.backfilled += 1;
                    body = fetched;
                }
                Err(e) => warn!("Failed to fetch body of {}: {}", item.link, e),
            }
        }

        let mut article = NewArticle::new(real_id, item.title, item.link)
            .with_description(item.description)
            .with_content(body)
            .with_cover(item.cover);
        if let Some(published_at) = item.published_at {
            article = article.with_published_at(published_at);
        }
        article
    }

    /// Sync every active channel in turn.
    ///
    /// A failing channel is logged and skipped. Only listing the channels can
    /// fail the whole run.
    pub async fn sync_all(&self) -> Result<SyncSummary> {
        let channels = ChannelRepository::new(self.db.pool()).list_active().await?;
        info!("Syncing {} active channel(s)", channels.len());

        let mut summary = SyncSummary {
            channels: channels.len(),
            ..Default::default()
        };
        for (i, channel) in channels.iter().enumerate() {
            if i > 0 && !self.channel_pause.is_zero() {
                tokio::time::sleep(self.channel_pause).await;
            }
            match self.sync_channel(&channel.real_id).await {
                Ok(report) => {
                    summary.succeeded += 1;
                    summary.created += report.created;
                }
                Err(e) => {
                    warn!("Failed to sync channel {}: {}", channel.real_id, e);
                    summary.failed += 1;
                }
            }
        }

        info!(
            "Sync finished: {} ok, {} failed, {} new article(s)",
            summary.succeeded, summary.failed, summary.created
        );
        Ok(summary)
    }

    /// Sync one channel in the background.
    pub fn spawn_sync(&self, real_id: &str) {
        let pipeline = self.clone();
        let real_id = real_id.to_string();
        self.tasks.spawn(async move {
            if let Err(e) = pipeline.sync_channel(&real_id).await {
                warn!("Background sync of {} failed: {}", real_id, e);
            }
        });
    }

    /// Sync every active channel in the background.
    pub fn spawn_sync_all(&self) {
        let pipeline = self.clone();
        self.tasks.spawn(async move {
            if let Err(e) = pipeline.sync_all().await {
                error!("Background sync failed: {}", e);
            }
        });
    }

    /// Manual trigger: one channel when given, otherwise all of them.
    pub fn trigger(&self, real_id: Option<&str>) {
        match real_id {
            Some(id) => self.spawn_sync(id),
            None => self.spawn_sync_all(),
        }
    }

    /// Subscribe to a channel and return its feed link.
    ///
    /// Adding a known channel only schedules a sync. A new channel is created
    /// from provider metadata and synced in the background.
    pub async fn add_channel(&self, real_id: &str) -> Result<String> {
        let real_id = real_id.trim();
        if real_id.is_empty() {
            return Err(OarssError::Validation("channel id is empty".to_string()));
        }

        let pool = self.db.pool();
        let channels = ChannelRepository::new(pool);
        if channels.get_by_real_id(real_id).await?.is_some() {
            debug!("Channel {} already subscribed", real_id);
            self.spawn_sync(real_id);
            return Ok(self.feed_link(real_id));
        }

        let meta = self.source.fetch_channel_metadata(real_id).await?;

        let account = AccountRepository::new(pool)
            .list()
            .await?
            .into_iter()
            .find(|a| a.available);

        let mut new_channel = NewChannel::new(real_id, meta.name)
            .with_description(meta.description)
            .with_avatar(meta.avatar)
            .with_link(meta.link);
        if let Some(account) = account {
            new_channel = new_channel.with_account(account.id);
        }

        match channels.create(&new_channel).await {
            Ok(channel) => info!("Subscribed to channel {} ({})", channel.real_id, channel.name),
            Err(e) => {
                // A concurrent add of the same channel wins the unique constraint.
                if channels.get_by_real_id(real_id).await?.is_none() {
                    return Err(e);
                }
                debug!("Channel {} was added concurrently", real_id);
            }
        }

        self.spawn_sync(real_id);
        Ok(self.feed_link(real_id))
    }

    /// Subscribe to the channel that published an article.
    pub async fn add_channel_by_url(&self, article_url: &str) -> Result<String> {
        let real_id = resolve_real_id_from_url(self.source.as_ref(), article_url).await?;
        self.add_channel(&real_id).await
    }

    /// Unsubscribe from a channel, removing its articles.
    pub async fn delete_channel(&self, real_id: &str) -> Result<()> {
        ChannelRepository::new(self.db.pool()).delete(real_id).await?;
        info!("Deleted channel {}", real_id);
        Ok(())
    }

    /// Pause or resume scheduled syncs for a channel.
    pub async fn set_paused(&self, real_id: &str, paused: bool) -> Result<()> {
        let status = if paused {
            ChannelStatus::Paused
        } else {
            ChannelStatus::Active
        };
        ChannelRepository::new(self.db.pool())
            .update_status(real_id, status)
            .await?;
        info!("Channel {} is now {}", real_id, status.as_str());
        Ok(())
    }
}
