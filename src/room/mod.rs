//! Real-time audio/video room client.
//!
//! The room service itself is external. This module only owns the client
//! side of it:
//!
//! - [`Room`]: a connection object (connect / disconnect)
//! - [`RoomSession`]: mount/unmount lifecycle around a [`Room`]
//! - [`SignalRoom`]: websocket signalling implementation
//! - [`RoomCredentials`]: where access tokens come from (configured or minted)

mod session;
mod signal;
mod token;

pub use session::{RoomSession, RoomState};
pub use signal::{SignalRoom, signal_url};
pub use token::{IssuedToken, RoomClaims, RoomCredentials, TokenIssuer, VideoGrant, random_identity};

use thiserror::Error;

/// Capability flags fixed when the connection object is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomOptions {
    /// Let the server adapt subscribed video quality to rendered size.
    pub adaptive_stream: bool,
    /// Pause publishing layers nobody subscribes to.
    pub dynacast: bool,
}

impl Default for RoomOptions {
    fn default() -> Self {
        Self {
            adaptive_stream: true,
            dynacast: true,
        }
    }
}

#[derive(Error, Debug)]
pub enum RoomError {
    #[error("invalid room url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("unsupported room url scheme: {0}")]
    UnsupportedScheme(String),

    #[error("connection failed: {0}")]
    Connect(#[source] Box<tokio_tungstenite::tungstenite::Error>),

    #[error("room server url is not configured")]
    MissingServerUrl,

    #[error("room credentials are not configured")]
    MissingCredentials,

    #[error("token signing failed: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

/// A connection to a room service.
#[async_trait::async_trait]
pub trait Room: Send + Sync {
    /// Flags this connection was built with.
    fn options(&self) -> RoomOptions;

    /// Establish the connection.
    async fn connect(&self, server_url: &str, token: &str) -> Result<(), RoomError>;

    /// Tear the connection down. Safe to call when never connected.
    async fn disconnect(&self);
}
