use crate::config::Config;
use crate::engine::cues::{CueSink, TracingCueSink};
use crate::engine::persist::{JsonFileStore, MemoryStore, SnapshotStore};
use crate::engine::{EngineDeps, SessionHandle};
use crate::pipeline::heart_rate::{HeartRateSource, SimulatedHeartRate};
use crate::session::TrackingSession;
use crate::types::session::WorkoutConfig;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    sessions: Arc<DashMap<Uuid, LiveSession>>,
    store: Arc<dyn SnapshotStore>,
    cues: Arc<dyn CueSink>,
    config: Arc<Config>,
}

struct LiveSession {
    handle: SessionHandle,
    last_activity: Instant,
    finished_at: Option<Instant>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let store: Arc<dyn SnapshotStore> = match &config.snapshot_dir {
            Some(dir) => match JsonFileStore::new(dir) {
                Ok(store) => Arc::new(store),
                Err(err) => {
                    tracing::warn!(
                        "Snapshot directory {} unusable ({}); keeping snapshots in memory",
                        dir.display(),
                        err
                    );
                    Arc::new(MemoryStore::new())
                }
            },
            None => Arc::new(MemoryStore::new()),
        };
        Self::with_collaborators(config, store, Arc::new(TracingCueSink))
    }

    pub fn with_collaborators(
        config: Config,
        store: Arc<dyn SnapshotStore>,
        cues: Arc<dyn CueSink>,
    ) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            store,
            cues,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn SnapshotStore> {
        &self.store
    }

    /// Spawn a new session actor and register it. The session is not started.
    pub fn create_session(&self, workout: WorkoutConfig) -> SessionHandle {
        let id = Uuid::new_v4();
        let heart_rate: Option<Box<dyn HeartRateSource>> = if workout.simulated_heart_rate {
            Some(Box::new(SimulatedHeartRate::default()))
        } else {
            None
        };

        let tracking = self.config.tracking.clone();
        let session = TrackingSession::new(id, workout, &tracking);
        let handle = SessionHandle::spawn(
            session,
            EngineDeps {
                tracking,
                cues: Arc::clone(&self.cues),
                store: Arc::clone(&self.store),
                heart_rate,
            },
        );

        self.sessions.insert(
            id,
            LiveSession {
                handle: handle.clone(),
                last_activity: Instant::now(),
                finished_at: None,
            },
        );
        handle
    }

    /// Looking a session up counts as activity for eviction.
    pub fn get(&self, session_id: Uuid) -> Option<SessionHandle> {
        self.sessions.get_mut(&session_id).map(|mut entry| {
            entry.last_activity = Instant::now();
            entry.handle.clone()
        })
    }

    pub fn mark_finished(&self, session_id: Uuid) {
        if let Some(mut entry) = self.sessions.get_mut(&session_id) {
            entry.finished_at.get_or_insert_with(Instant::now);
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop finished sessions older than `ttl` and unfinished ones idle for
    /// longer than `ttl`. Snapshots of finished sessions stay in the store.
    ///
    /// Removing the registry's handle closes an abandoned actor's channel
    /// once callers holding their own clones let go, which stops its ticker.
    pub fn evict_expired(&self, ttl: Duration) {
        let now = Instant::now();
        self.sessions.retain(|id, live| {
            let keep = match live.finished_at {
                Some(finished_at) => now.duration_since(finished_at) < ttl,
                None => !live.handle.is_closed() && now.duration_since(live.last_activity) < ttl,
            };
            if !keep && live.finished_at.is_none() {
                tracing::warn!(session = %id, "Evicting abandoned session");
            }
            keep
        });
        tracing::info!("Session eviction complete. Live sessions: {}", self.sessions.len());
    }
}
