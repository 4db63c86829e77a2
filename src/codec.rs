//! Opaque feed identifiers.
//!
//! A channel can be published under a token derived from its real identifier
//! with HMAC-SHA256, so feed URLs do not reveal which sources are followed.
//! The mapping is one-way: resolving a token re-encodes every stored channel
//! and compares. That is linear in the number of channels, which is fine for
//! the tens to low thousands this service is meant for.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

use crate::config::RssConfig;
use crate::db::DbPool;
use crate::store::ChannelRepository;
use crate::{OarssError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Key used when no secret is configured.
pub const DEFAULT_SECRET: &str = "default_secret";

/// Length of an encoded token in hex characters.
pub const TOKEN_LEN: usize = 16;

/// Encoder/resolver for public feed identifiers.
#[derive(Clone)]
pub struct FeedIdCodec {
    secret: Vec<u8>,
    enabled: bool,
}

impl FeedIdCodec {
    /// Create a codec. An empty secret falls back to [`DEFAULT_SECRET`].
    pub fn new(secret: &str, enabled: bool) -> Self {
        let secret = if secret.is_empty() {
            DEFAULT_SECRET
        } else {
            secret
        };
        Self {
            secret: secret.as_bytes().to_vec(),
            enabled,
        }
    }

    /// Create a codec from the feed configuration.
    pub fn from_config(config: &RssConfig) -> Self {
        Self::new(&config.secret, config.enc_feed_id)
    }

    /// Derive the token for a real identifier.
    pub fn encode(&self, real_id: &str) -> String {
        let Ok(mut mac) = HmacSha256::new_from_slice(&self.secret) else {
            unreachable!("HMAC accepts keys of any length");
        };
        mac.update(real_id.as_bytes());
        let digest = hex::encode(mac.finalize().into_bytes());
        digest[..TOKEN_LEN].to_string()
    }

    /// Find the real identifier whose token equals `token`.
    ///
    /// Returns `Ok(None)` when no stored channel matches.
    pub async fn decode(&self, pool: &DbPool, token: &str) -> Result<Option<String>> {
        let real_ids = ChannelRepository::new(pool).list_real_ids().await?;
        debug!("Resolving feed token against {} channel(s)", real_ids.len());
        Ok(real_ids.into_iter().find(|id| self.encode(id) == token))
    }

    /// Identifier to publish for a channel.
    pub fn to_public(&self, real_id: &str) -> String {
        if self.enabled {
            self.encode(real_id)
        } else {
            real_id.to_string()
        }
    }

    /// Real identifier behind a public identifier.
    ///
    /// With tokens disabled the input is returned unchanged. With tokens
    /// enabled an unknown token is reported as `ChannelNotFound`.
    pub async fn to_real(&self, pool: &DbPool, public_id: &str) -> Result<String> {
        if !self.enabled {
            return Ok(public_id.to_string());
        }
        self.decode(pool, public_id)
            .await?
            .ok_or_else(|| OarssError::ChannelNotFound(public_id.to_string()))
    }
}

impl std::fmt::Debug for FeedIdCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedIdCodec")
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}
