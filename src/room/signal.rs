//! Websocket signalling connection to the room service.

use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

use super::{Room, RoomError, RoomOptions};

type SignalStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Build the signalling URL: `{server}/rtc?access_token=..&...`.
///
/// `http`/`https` are mapped to `ws`/`wss`.
pub fn signal_url(server_url: &str, token: &str, options: RoomOptions) -> Result<Url, RoomError> {
    let mut url = Url::parse(server_url)?;

    let scheme = match url.scheme() {
        "ws" | "http" => "ws",
        "wss" | "https" => "wss",
        other => return Err(RoomError::UnsupportedScheme(other.to_string())),
    };
    if scheme != url.scheme() {
        url.set_scheme(scheme)
            .map_err(|()| RoomError::UnsupportedScheme(url.scheme().to_string()))?;
    }

    let path = format!("{}/rtc", url.path().trim_end_matches('/'));
    url.set_path(&path);

    url.query_pairs_mut()
        .clear()
        .append_pair("access_token", token)
        .append_pair("auto_subscribe", "1")
        .append_pair("adaptive_stream", flag(options.adaptive_stream))
        .append_pair("dynacast", flag(options.dynacast));

    Ok(url)
}

fn flag(enabled: bool) -> &'static str {
    if enabled { "1" } else { "0" }
}

/// [`Room`] backed by a websocket signalling connection.
pub struct SignalRoom {
    options: RoomOptions,
    stream: Mutex<Option<SignalStream>>,
}

impl std::fmt::Debug for SignalRoom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalRoom")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl SignalRoom {
    #[must_use]
    pub fn new(options: RoomOptions) -> Self {
        Self {
            options,
            stream: Mutex::new(None),
        }
    }

    /// Whether a signalling connection is currently open.
    pub async fn is_connected(&self) -> bool {
        self.stream.lock().await.is_some()
    }
}

#[async_trait::async_trait]
impl Room for SignalRoom {
    fn options(&self) -> RoomOptions {
        self.options
    }

    async fn connect(&self, server_url: &str, token: &str) -> Result<(), RoomError> {
        let url = signal_url(server_url, token, self.options)?;
        let (stream, _response) = connect_async(url.as_str())
            .await
            .map_err(|e| RoomError::Connect(Box::new(e)))?;

        if let Some(mut previous) = self.stream.lock().await.replace(stream) {
            let _ = previous.close(None).await;
        }
        Ok(())
    }

    async fn disconnect(&self) {
        let Some(mut stream) = self.stream.lock().await.take() else {
            return;
        };
        if let Err(e) = stream.close(None).await {
            tracing::warn!(name: "room.close.failed", error = %e, "Error closing signalling connection");
        }
    }
}
