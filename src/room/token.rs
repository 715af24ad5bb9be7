//! Room access tokens.
//!
//! Tokens are HS256 JWTs signed with the room service's API secret and carry
//! a `video` grant naming the room the holder may join.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::RoomError;
use crate::config::RoomConfig;

/// Permissions granted inside a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoGrant {
    pub room_join: bool,
    pub room: String,
    pub can_publish: bool,
    pub can_subscribe: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomClaims {
    /// API key the token was signed with.
    pub iss: String,
    /// Participant identity.
    pub sub: String,
    pub name: String,
    pub nbf: usize,
    pub exp: usize,
    pub video: VideoGrant,
}

/// A token plus the identity and room it was issued for.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub identity: String,
    pub room: String,
}

/// Fresh identity of the form `web-1a2b3c4d`.
#[must_use]
pub fn random_identity() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("web-{}", &id[..8])
}

/// Signs access tokens with an API key/secret pair.
#[derive(Clone)]
pub struct TokenIssuer {
    api_key: String,
    key: EncodingKey,
    ttl: Duration,
    default_room: String,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("api_key", &self.api_key)
            .field("ttl", &self.ttl)
            .field("default_room", &self.default_room)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    #[must_use]
    pub fn new(
        api_key: impl Into<String>,
        api_secret: &str,
        ttl: Duration,
        default_room: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            key: EncodingKey::from_secret(api_secret.as_bytes()),
            ttl,
            default_room: default_room.into(),
        }
    }

    /// Mint a token. Blank identity or room fall back to defaults.
    pub fn mint(&self, identity: Option<&str>, room: Option<&str>) -> Result<IssuedToken, RoomError> {
        let identity = non_blank(identity).map_or_else(random_identity, ToString::to_string);
        let room = non_blank(room).unwrap_or(self.default_room.as_str()).to_string();

        let now = usize::try_from(Utc::now().timestamp()).unwrap_or_default();
        let ttl = usize::try_from(self.ttl.as_secs()).unwrap_or(usize::MAX);
        let claims = RoomClaims {
            iss: self.api_key.clone(),
            sub: identity.clone(),
            name: identity.clone(),
            nbf: now,
            exp: now.saturating_add(ttl),
            video: VideoGrant {
                room_join: true,
                room: room.clone(),
                can_publish: true,
                can_subscribe: true,
            },
        };

        let token = encode(&Header::default(), &claims, &self.key)?;
        tracing::debug!(name: "room.token.minted", identity = %identity, room = %room, "Access token minted");

        Ok(IssuedToken {
            token,
            identity,
            room,
        })
    }
}

/// Where room access tokens come from.
#[derive(Debug, Clone)]
pub enum RoomCredentials {
    /// A pre-issued token from configuration.
    Static { token: String, room: String },
    /// Tokens minted on demand.
    Signed(TokenIssuer),
}

impl RoomCredentials {
    /// Resolve credentials from configuration. A configured token wins over
    /// a key/secret pair.
    #[must_use]
    pub fn from_config(config: &RoomConfig) -> Option<Self> {
        if let Some(token) = non_blank(config.token.as_deref()) {
            return Some(Self::Static {
                token: token.to_string(),
                room: config.default_room.clone(),
            });
        }
        let (key, secret) = config.signing_credentials()?;
        Some(Self::Signed(TokenIssuer::new(
            key,
            secret,
            Duration::from_secs(config.token_ttl_secs),
            config.default_room.clone(),
        )))
    }

    /// Produce a token for `identity` in `room`.
    ///
    /// A static token is returned as-is; its identity and room are whatever
    /// it was issued for.
    pub fn issue(&self, identity: Option<&str>, room: Option<&str>) -> Result<IssuedToken, RoomError> {
        match self {
            Self::Static { token, room: default_room } => Ok(IssuedToken {
                token: token.clone(),
                identity: non_blank(identity).unwrap_or_default().to_string(),
                room: non_blank(room).unwrap_or(default_room.as_str()).to_string(),
            }),
            Self::Signed(issuer) => issuer.mint(identity, room),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
