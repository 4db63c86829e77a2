//! Test helpers for integration tests.
//!
//! Provides a scripted content source and builders for the application state.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use oarss::config::Config;
use oarss::upstream::{ChannelMetadata, ContentSource, UpstreamArticle};
use oarss::{
    AppState, Database, FeedIdCodec, FeedSynthesizer, FetchPipeline, OarssError, Result,
    Scheduler,
};

/// In-memory content source with call counters.
#[derive(Default)]
pub struct ScriptedSource {
    channels: Mutex<HashMap<String, ChannelMetadata>>,
    articles: Mutex<HashMap<String, Vec<UpstreamArticle>>>,
    bodies: Mutex<HashMap<String, String>>,
    pages: Mutex<HashMap<String, String>>,
    failing_pages: Mutex<Vec<String>>,
    pub metadata_calls: AtomicUsize,
    pub page_calls: AtomicUsize,
    pub body_calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a channel the provider knows about.
    pub fn add_channel(&self, real_id: &str, name: &str) {
        self.channels.lock().unwrap().insert(
            real_id.to_string(),
            ChannelMetadata {
                name: name.to_string(),
                description: format!("{name} description"),
                avatar: format!("https://img.example.com/{real_id}.png"),
                link: format!("https://mp.example.com/{real_id}"),
            },
        );
    }

    /// Replace the article listing of a channel.
    pub fn set_articles(&self, real_id: &str, articles: Vec<UpstreamArticle>) {
        self.articles
            .lock()
            .unwrap()
            .insert(real_id.to_string(), articles);
    }

    /// Body returned by the backfill call for a link.
    pub fn set_body(&self, link: &str, body: &str) {
        self.bodies
            .lock()
            .unwrap()
            .insert(link.to_string(), body.to_string());
    }

    /// Raw markup returned for a page URL.
    pub fn set_page(&self, url: &str, html: &str) {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), html.to_string());
    }

    /// Make article listing fail for a channel.
    pub fn fail_pages_for(&self, real_id: &str) {
        self.failing_pages.lock().unwrap().push(real_id.to_string());
    }

    pub fn page_calls(&self) -> usize {
        self.page_calls.load(Ordering::SeqCst)
    }

    pub fn body_calls(&self) -> usize {
        self.body_calls.load(Ordering::SeqCst)
    }

    pub fn metadata_calls(&self) -> usize {
        self.metadata_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentSource for ScriptedSource {
    async fn fetch_channel_metadata(&self, real_id: &str) -> Result<ChannelMetadata> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        self.channels
            .lock()
            .unwrap()
            .get(real_id)
            .cloned()
            .ok_or_else(|| OarssError::Upstream(format!("unknown channel {real_id}")))
    }

    async fn fetch_article_page(
        &self,
        real_id: &str,
        offset: u32,
        count: u32,
    ) -> Result<Vec<UpstreamArticle>> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        if self
            .failing_pages
            .lock()
            .unwrap()
            .iter()
            .any(|id| id == real_id)
        {
            return Err(OarssError::Upstream(format!("HTTP 503 for {real_id}")));
        }
        Ok(self
            .articles
            .lock()
            .unwrap()
            .get(real_id)
            .map(|list| {
                list.iter()
                    .skip(offset as usize)
                    .take(count as usize)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn fetch_article_body(&self, link: &str) -> Result<String> {
        self.body_calls.fetch_add(1, Ordering::SeqCst);
        self.bodies
            .lock()
            .unwrap()
            .get(link)
            .cloned()
            .ok_or_else(|| OarssError::Upstream(format!("no body for {link}")))
    }

    async fn fetch_page(&self, url: &str) -> Result<String> {
        self.pages
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| OarssError::Upstream(format!("HTTP 404 from {url}")))
    }
}

/// Fixed base time for generated articles.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
}

/// Article published `hours` after [`base_time`].
pub fn upstream_article(link: &str, title: &str, body: &str, hours: i64) -> UpstreamArticle {
    UpstreamArticle {
        title: title.to_string(),
        description: format!("<p>{title}</p>"),
        body: body.to_string(),
        link: link.to_string(),
        cover: String::new(),
        published_at: Some(base_time() + chrono::Duration::hours(hours)),
    }
}

/// Test configuration with no pauses between channels.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.rss.host = "http://rss.test".to_string();
    config.scheduler.channel_pause_ms = 0;
    config
}

/// Fully wired application over an in-memory database.
pub struct TestApp {
    pub db: Database,
    pub source: Arc<ScriptedSource>,
    pub pipeline: FetchPipeline,
    pub scheduler: Arc<Scheduler>,
    pub state: Arc<AppState>,
}

impl TestApp {
    pub async fn new(config: Config) -> Self {
        let db = Database::open_in_memory().await.unwrap();
        let source = ScriptedSource::new();
        let pipeline = FetchPipeline::from_config(db.clone(), source.clone(), &config)
            .with_channel_pause(Duration::ZERO);
        let synthesizer = FeedSynthesizer::from_config(
            db.clone(),
            FeedIdCodec::from_config(&config.rss),
            &config.rss,
        );
        let scheduler = Arc::new(Scheduler::new(pipeline.clone(), &config.scheduler));
        let state = Arc::new(AppState::new(
            pipeline.clone(),
            Arc::clone(&scheduler),
            synthesizer,
            Arc::new(config),
        ));
        Self {
            db,
            source,
            pipeline,
            scheduler,
            state,
        }
    }

    /// Wait for every background sync to finish.
    pub async fn settle(&self) {
        self.pipeline.tasks().wait_idle().await;
    }
}
