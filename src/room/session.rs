//! Mount/unmount lifecycle for a [`Room`].

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::Room;

/// Observable connection state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomState {
    Connecting,
    Connected,
    Failed(String),
    Disconnected,
}

/// Owns one [`Room`] for the lifetime of its owner.
///
/// [`RoomSession::mount`] starts connecting in the background. Once
/// [`RoomSession::unmount`] has been called no further state change from the
/// connect attempt is applied, and the room is disconnected exactly once.
/// Dropping a mounted session tears it down as well.
pub struct RoomSession {
    room: Arc<dyn Room>,
    cancel: CancellationToken,
    state: Arc<watch::Sender<RoomState>>,
    connect_task: Option<JoinHandle<()>>,
    torn_down: bool,
}

impl std::fmt::Debug for RoomSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomSession")
            .field("state", &*self.state.borrow())
            .field("options", &self.room.options())
            .finish()
    }
}

impl RoomSession {
    /// Start connecting `room` to `server_url` with `token`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn mount(room: Arc<dyn Room>, server_url: String, token: String) -> Self {
        let cancel = CancellationToken::new();
        let (tx, _rx) = watch::channel(RoomState::Connecting);
        let state = Arc::new(tx);

        let connect_task = tokio::spawn(connect(
            Arc::clone(&room),
            server_url,
            token,
            cancel.clone(),
            Arc::clone(&state),
        ));

        Self {
            room,
            cancel,
            state,
            connect_task: Some(connect_task),
            torn_down: false,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> RoomState {
        self.state.borrow().clone()
    }

    /// Watch state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<RoomState> {
        self.state.subscribe()
    }

    /// Cancel any pending connect and disconnect the room.
    pub async fn unmount(mut self) {
        self.torn_down = true;
        self.cancel.cancel();
        if let Some(task) = self.connect_task.take() {
            if let Err(e) = task.await {
                tracing::warn!(name: "room.connect.join_failed", error = %e, "Connect task ended abnormally");
            }
        }
        self.room.disconnect().await;
        self.state.send_replace(RoomState::Disconnected);
        tracing::info!(name: "room.disconnected", "Room disconnected");
    }
}

impl Drop for RoomSession {
    fn drop(&mut self) {
        if self.torn_down {
            return;
        }
        self.cancel.cancel();

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(name: "room.drop.no_runtime", "Room dropped outside a runtime; skipping disconnect");
            return;
        };
        let room = Arc::clone(&self.room);
        let state = Arc::clone(&self.state);
        let connect_task = self.connect_task.take();
        handle.spawn(async move {
            // Wait for the connect attempt so it cannot open after the disconnect.
            if let Some(task) = connect_task {
                let _ = task.await;
            }
            room.disconnect().await;
            state.send_replace(RoomState::Disconnected);
        });
    }
}

async fn connect(
    room: Arc<dyn Room>,
    server_url: String,
    token: String,
    cancel: CancellationToken,
    state: Arc<watch::Sender<RoomState>>,
) {
    let result = tokio::select! {
        () = cancel.cancelled() => {
            tracing::debug!(name: "room.connect.cancelled", "Unmounted before connect resolved");
            return;
        }
        result = room.connect(&server_url, &token) => result,
    };

    if cancel.is_cancelled() {
        return;
    }

    match result {
        Ok(()) => {
            tracing::info!(name: "room.connected", url = %server_url, "Connected to room");
            state.send_replace(RoomState::Connected);
        }
        Err(e) => {
            tracing::error!(name: "room.connect.failed", url = %server_url, error = %e, "Room connection failed");
            state.send_replace(RoomState::Failed(e.to_string()));
        }
    }
}
