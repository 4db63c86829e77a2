//! API handlers.

pub mod article;
pub mod channel;
pub mod feed;
pub mod system;

pub use article::*;
pub use channel::*;
pub use feed::*;
pub use system::*;

use std::sync::Arc;

use crate::codec::FeedIdCodec;
use crate::config::Config;
use crate::db::Database;
use crate::feed::FeedSynthesizer;
use crate::sync::{FetchPipeline, Scheduler};
use crate::web::error::ApiError;

/// Shared state for all handlers.
pub struct AppState {
    pub db: Database,
    pub codec: FeedIdCodec,
    pub pipeline: FetchPipeline,
    pub scheduler: Arc<Scheduler>,
    pub synthesizer: FeedSynthesizer,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire the state from already-built components.
    pub fn new(
        pipeline: FetchPipeline,
        scheduler: Arc<Scheduler>,
        synthesizer: FeedSynthesizer,
        config: Arc<Config>,
    ) -> Self {
        Self {
            db: pipeline.db().clone(),
            codec: pipeline.codec().clone(),
            pipeline,
            scheduler,
            synthesizer,
            config,
        }
    }

    /// Real identifier behind a public one.
    pub async fn resolve(&self, public_id: &str) -> Result<String, ApiError> {
        Ok(self.codec.to_real(self.db.pool(), public_id).await?)
    }

    /// Public identifier of a channel.
    pub fn public_id(&self, real_id: &str) -> String {
        self.codec.to_public(real_id)
    }
}
