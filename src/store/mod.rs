//! Storage gateway.
//!
//! Channels, articles and provider accounts live only here. Other components
//! go through these repositories and never keep rows across calls.
//!
//! Article links are unique: inserting a link that is already stored is a
//! no-op reported as [`InsertOutcome::AlreadyExists`], which is what keeps
//! repeated syncs idempotent.

mod repository;
mod types;

pub use repository::{AccountRepository, ArticleRepository, ChannelRepository};
pub use types::{
    Account, Article, ArticleQuery, Channel, ChannelStatus, InsertOutcome, NewAccount,
    NewArticle, NewChannel, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
