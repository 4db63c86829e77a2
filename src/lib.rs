//! oarss - official-account feed bridge
//!
//! Follows publishing channels on a content provider, stores their articles,
//! and republishes them as RSS 2.0 and JSON Feed documents.

pub mod codec;
pub mod config;
pub mod datetime;
pub mod db;
pub mod error;
pub mod feed;
pub mod logging;
mod pattern;
pub mod store;
pub mod sync;
pub mod upstream;
pub mod web;

pub use codec::FeedIdCodec;
pub use config::Config;
pub use db::Database;
pub use error::{ErrorKind, OarssError, Result};
pub use feed::{FeedFormat, FeedScope, FeedSynthesizer};
pub use store::{
    Article, ArticleQuery, ArticleRepository, Channel, ChannelRepository, ChannelStatus,
    InsertOutcome, NewArticle, NewChannel,
};
pub use sync::{BackgroundTasks, FetchPipeline, Scheduler, SyncReport};
pub use upstream::{ContentSource, HttpContentSource};
pub use web::{AppState, WebServer};
