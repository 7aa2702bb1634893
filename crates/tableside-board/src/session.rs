//! Per-session owner of the single broker connection.
//!
//! A [`Session`] is constructed explicitly and injected where a connection
//! is needed. [`Session::get_client`] opens the connection on first use and
//! returns the same [`ClientHandle`] afterwards, so a session never holds
//! more than one live connection. Creation happens under a mutex, which
//! makes concurrent first calls from different tasks single-flight.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::board::Board;
use crate::config::BoardConfig;
use crate::connection::{ConnectionManager, ConnectionState};
use crate::error::BoardError;
use crate::store::Store;
use crate::transport::Connect;

/// How long [`Session::close`] waits for the old event loop to see `Closed`.
const CLOSE_GRACE: Duration = Duration::from_millis(500);

/// Shared handle to the session's connection manager.
pub type ClientHandle<T> = Arc<ConnectionManager<T>>;

/// A live connection plus the task consuming its events.
struct Active<T> {
    manager: ClientHandle<T>,
    task: JoinHandle<()>,
}

/// Lazily connected session bound to one board.
pub struct Session<C: Connect> {
    connector: C,
    config: BoardConfig,
    client_id: String,
    board: Board,
    state: Store<ConnectionState>,
    slot: Mutex<Option<Active<C::Transport>>>,
}

impl<C: Connect> Session<C> {
    /// Create a session with a fresh board and a random client id.
    ///
    /// No connection is opened until [`get_client`](Self::get_client).
    pub fn new(connector: C, config: BoardConfig) -> Self {
        let board = Board::new(config.table_count);
        Self::with_board(connector, config, board)
    }

    /// Create a session that feeds an existing board.
    pub fn with_board(connector: C, config: BoardConfig, board: Board) -> Self {
        let client_id = config.generate_client_id();
        Self {
            connector,
            config,
            client_id,
            board,
            state: Store::new(ConnectionState::Disconnected),
            slot: Mutex::new(None),
        }
    }

    /// Board the session's connection feeds.
    pub const fn board(&self) -> &Board {
        &self.board
    }

    /// Configuration the session connects with.
    pub const fn config(&self) -> &BoardConfig {
        &self.config
    }

    /// Client identifier used for every connection of this session.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Observable connection state, stable across reconnects.
    pub const fn state(&self) -> &Store<ConnectionState> {
        &self.state
    }

    /// Whether a connection has been created and not closed.
    pub fn has_client(&self) -> bool {
        self.lock().is_some()
    }

    /// Return the session's connection, opening it on first call.
    ///
    /// Must be called from within a tokio runtime: the connection's event
    /// loop is spawned onto the current runtime.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Config`] or [`BoardError::Transport`] if the
    /// connection cannot be created. A failed attempt leaves the session
    /// empty so the next call retries.
    pub fn get_client(&self) -> Result<ClientHandle<C::Transport>, BoardError> {
        let mut slot = self.lock();
        if let Some(active) = slot.as_ref() {
            return Ok(Arc::clone(&active.manager));
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| BoardError::Transport(format!("no tokio runtime: {e}")))?;
        let (transport, events) = self.connector.connect(&self.config, &self.client_id)?;
        let manager = Arc::new(ConnectionManager::new(
            transport,
            self.board.clone(),
            self.state.clone(),
            self.config.broker_url.clone(),
        ));
        let task = runtime.spawn(Arc::clone(&manager).run(events));

        info!(
            broker = self.config.broker_url,
            client_id = self.client_id,
            "broker connection created"
        );
        *slot = Some(Active {
            manager: Arc::clone(&manager),
            task,
        });
        Ok(manager)
    }

    /// Disconnect and forget the current connection, if any.
    ///
    /// Waits up to [`CLOSE_GRACE`] for the connection's event loop to finish
    /// and aborts it otherwise, so a late `Closed` from the old connection
    /// can never overwrite the state of the next one. The next
    /// [`get_client`](Self::get_client) opens a new connection.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Transport`] if the disconnect request failed.
    /// The session is cleared either way.
    pub async fn close(&self) -> Result<(), BoardError> {
        let Some(Active { manager, mut task }) = self.lock().take() else {
            return Ok(());
        };

        let result = manager.close().await;
        if tokio::time::timeout(CLOSE_GRACE, &mut task).await.is_err() {
            debug!(
                broker = self.config.broker_url,
                "connection task still running after close, aborting"
            );
            task.abort();
            if let Err(e) = task.await {
                debug!(error = %e, "connection task stopped");
            }
        }
        result
    }

    /// Drop the current connection without disconnecting it.
    #[cfg(test)]
    pub(crate) fn reset(&self) {
        if let Some(active) = self.lock().take() {
            active.task.abort();
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Active<C::Transport>>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C: Connect> std::fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("client_id", &self.client_id)
            .field("broker_url", &self.config.broker_url)
            .field("connected", &self.has_client())
            .finish_non_exhaustive()
    }
}
