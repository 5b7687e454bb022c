// SPDX-License-Identifier: AGPL-3.0
// Home Cinema Core - Favorite movies
//
// The in-memory list is the source of truth for the running process.
// Every change enqueues a full snapshot to a single writer task, so durable
// writes land in the order the changes were made.

use crate::kv::KeyValueStore;
use crate::types::{AppError, MovieId};
use async_channel::{Receiver, Sender};
use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;

/// Storage key of the persisted favorites record
pub const FAVORITES_KEY: &str = "favorites";

const EVENT_CAPACITY: usize = 64;

/// Whether the persisted record has been read yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Uninitialized,
    Ready,
}

/// Notifications emitted by the favorites store
#[derive(Debug, Clone, PartialEq)]
pub enum FavoritesEvent {
    Loaded { count: usize },
    Added(MovieId),
    Removed(MovieId),
    Persisted { count: usize },
    PersistFailed { error: String },
}

enum PersistCommand {
    Write(Vec<MovieId>),
    Flush { reply: Sender<()> },
}

struct Inner {
    state: LoadState,
    ids: Vec<MovieId>,
}

/// Favorites store backed by a key-value record
pub struct FavoritesStore {
    inner: RwLock<Inner>,
    kv: Arc<dyn KeyValueStore>,
    key: String,
    persist_tx: Sender<PersistCommand>,
    events_tx: broadcast::Sender<FavoritesEvent>,
}

impl FavoritesStore {
    /// Create a store over `kv` using the default key.
    ///
    /// Must be called from within a tokio runtime: the persistence writer
    /// is spawned onto the current runtime.
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Result<Self, AppError> {
        Self::with_key(kv, FAVORITES_KEY)
    }

    /// Create a store persisting under a custom key
    pub fn with_key(kv: Arc<dyn KeyValueStore>, key: &str) -> Result<Self, AppError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            AppError::Runtime(format!("Favorites store needs a tokio runtime: {}", e))
        })?;

        let (persist_tx, persist_rx) = async_channel::unbounded();
        let (events_tx, _) = broadcast::channel(EVENT_CAPACITY);

        runtime.spawn(Self::run_writer(
            kv.clone(),
            key.to_string(),
            persist_rx,
            events_tx.clone(),
        ));

        Ok(Self {
            inner: RwLock::new(Inner {
                state: LoadState::Uninitialized,
                ids: Vec::new(),
            }),
            kv,
            key: key.to_string(),
            persist_tx,
            events_tx,
        })
    }

    async fn run_writer(
        kv: Arc<dyn KeyValueStore>,
        key: String,
        persist_rx: Receiver<PersistCommand>,
        events_tx: broadcast::Sender<FavoritesEvent>,
    ) {
        while let Ok(command) = persist_rx.recv().await {
            match command {
                PersistCommand::Write(snapshot) => {
                    let count = snapshot.len();
                    let kv = kv.clone();
                    let key = key.clone();

                    let result = tokio::task::spawn_blocking(move || {
                        let content = serialize_record(&snapshot)?;
                        kv.set(&key, &content)
                    })
                    .await
                    .map_err(|e| AppError::Runtime(format!("Favorites writer task failed: {}", e)))
                    .and_then(|r| r);

                    match result {
                        Ok(()) => {
                            tracing::debug!("Persisted {} favorites", count);
                            let _ = events_tx.send(FavoritesEvent::Persisted { count });
                        }
                        Err(e) => {
                            tracing::error!("Error saving favorites: {}", e);
                            let _ = events_tx.send(FavoritesEvent::PersistFailed {
                                error: e.to_string(),
                            });
                        }
                    }
                }
                PersistCommand::Flush { reply } => {
                    let _ = reply.send(()).await;
                }
            }
        }
        tracing::debug!("Favorites writer stopped");
    }

    /// Read the persisted record and replace the in-memory list with it.
    ///
    /// Changes made before the first load are discarded. A missing record
    /// yields an empty list. A record that is not a JSON array of ids fails
    /// with [`AppError::PersistenceCorrupt`] and leaves the store untouched.
    pub async fn load(&self) -> Result<Vec<MovieId>, AppError> {
        let kv = self.kv.clone();
        let key = self.key.clone();

        let raw = tokio::task::spawn_blocking(move || kv.get(&key))
            .await
            .map_err(|e| AppError::Runtime(format!("Favorites reader task failed: {}", e)))?
            .map_err(|e| match e {
                AppError::PersistenceRead(_) => e,
                other => AppError::PersistenceRead(other.to_string()),
            })?;

        let ids = match raw {
            Some(content) => parse_record(&content)?,
            None => Vec::new(),
        };

        tracing::info!("Loaded {} favorites", ids.len());
        self.replace(ids.clone());
        Ok(ids)
    }

    /// Like [`load`](Self::load), but a corrupt record is discarded and the
    /// store starts empty. Read failures are still returned.
    pub async fn load_or_reset(&self) -> Result<Vec<MovieId>, AppError> {
        match self.load().await {
            Err(AppError::PersistenceCorrupt(e)) => {
                tracing::warn!("Failed to parse favorites, starting fresh: {}", e);
                self.replace(Vec::new());
                Ok(Vec::new())
            }
            other => other,
        }
    }

    fn replace(&self, ids: Vec<MovieId>) {
        let count = ids.len();
        {
            let mut inner = self.write_inner();
            inner.ids = ids;
            inner.state = LoadState::Ready;
        }
        let _ = self.events_tx.send(FavoritesEvent::Loaded { count });
    }

    /// Add a favorite. Returns `false` if it was already present.
    pub fn add_favorite(&self, id: MovieId) -> bool {
        {
            let mut inner = self.write_inner();
            if inner.ids.contains(&id) {
                return false;
            }
            inner.ids.push(id);
            self.enqueue_write(inner.state, inner.ids.clone());
        }

        tracing::info!("Added favorite {}", id);
        let _ = self.events_tx.send(FavoritesEvent::Added(id));
        true
    }

    /// Remove a favorite. Returns `false` if it was not present.
    pub fn remove_favorite(&self, id: MovieId) -> bool {
        {
            let mut inner = self.write_inner();
            let original_len = inner.ids.len();
            inner.ids.retain(|f| *f != id);

            if inner.ids.len() == original_len {
                return false;
            }
            self.enqueue_write(inner.state, inner.ids.clone());
        }

        tracing::info!("Removed favorite {}", id);
        let _ = self.events_tx.send(FavoritesEvent::Removed(id));
        true
    }

    /// Flip membership of `id`, returning whether it is now a favorite
    pub fn toggle_favorite(&self, id: MovieId) -> bool {
        if self.is_favorite(id) {
            self.remove_favorite(id);
            false
        } else {
            self.add_favorite(id);
            true
        }
    }

    pub fn is_favorite(&self, id: MovieId) -> bool {
        self.read_inner().ids.contains(&id)
    }

    /// Favorites in the order they were added
    pub fn list(&self) -> Vec<MovieId> {
        self.read_inner().ids.clone()
    }

    pub fn len(&self) -> usize {
        self.read_inner().ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_inner().ids.is_empty()
    }

    pub fn state(&self) -> LoadState {
        self.read_inner().state
    }

    /// Subscribe to store notifications
    pub fn subscribe(&self) -> broadcast::Receiver<FavoritesEvent> {
        self.events_tx.subscribe()
    }

    /// Wait until every write queued before this call has been attempted
    pub async fn flush(&self) {
        let (reply_tx, reply_rx) = async_channel::bounded(1);
        if self
            .persist_tx
            .send(PersistCommand::Flush { reply: reply_tx })
            .await
            .is_ok()
        {
            let _ = reply_rx.recv().await;
        }
    }

    // Called with the write lock held so queue order matches mutation order.
    // Nothing is written before the first load: the list held then is not
    // derived from the record and would overwrite it.
    fn enqueue_write(&self, state: LoadState, snapshot: Vec<MovieId>) {
        if state == LoadState::Uninitialized {
            tracing::warn!("Favorites changed before load, not persisting");
            return;
        }
        if let Err(e) = self.persist_tx.try_send(PersistCommand::Write(snapshot)) {
            tracing::error!("Favorites writer unavailable: {}", e);
        }
    }

    fn read_inner(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_inner(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Encode favorites as the persisted JSON array
pub fn serialize_record(ids: &[MovieId]) -> Result<String, AppError> {
    serde_json::to_string(ids)
        .map_err(|e| AppError::Serialization(format!("Failed to serialize favorites: {}", e)))
}

/// Decode the persisted JSON array, dropping repeated ids.
///
/// Blank content counts as an empty record.
pub fn parse_record(content: &str) -> Result<Vec<MovieId>, AppError> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<MovieId> = serde_json::from_str(content)
        .map_err(|e| AppError::PersistenceCorrupt(format!("Failed to parse favorites: {}", e)))?;

    let mut seen = HashSet::with_capacity(ids.len());
    let unique: Vec<MovieId> = ids.into_iter().filter(|id| seen.insert(*id)).collect();
    Ok(unique)
}
