//! Runs a [`TrackingSession`] as an actor.
//!
//! The session lives inside one tokio task and is mutated only by commands
//! arriving on its channel, so the ticker, the heart-rate sampler and the
//! geolocation callback never race on the aggregate. Readers get the latest
//! [`SessionView`] from a watch channel without going through the actor.
//!
//! Producers only run while the session is active: pausing aborts them and
//! resuming spawns fresh ones. Finishing aborts them before the snapshot is
//! handed back, then closes the channel so nothing can touch the session
//! afterwards.

pub mod cues;
pub mod persist;
mod producers;

use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::TrackingConfig;
use crate::error::SessionError;
use crate::pipeline::heart_rate::HeartRateSource;
use crate::pipeline::laps::cue_text;
use crate::session::{FixOutcome, TrackingSession};
use crate::types::fix::{Fix, SensorError};
use crate::types::session::{Lap, SessionPhase, SessionSnapshot, SessionView};

use self::cues::CueSink;
use self::persist::SnapshotStore;
use self::producers::SharedHeartRateSource;

const COMMAND_BUFFER: usize = 256;

type Reply<T> = oneshot::Sender<Result<T, SessionError>>;

pub(crate) enum Command {
    Start(Reply<bool>),
    Pause(Reply<()>),
    Resume(Reply<()>),
    Fix(Fix, Option<Reply<FixOutcome>>),
    Tick(Option<Reply<bool>>),
    HeartRate(Option<u16>, Option<Reply<bool>>),
    Sensor(SensorError, Reply<()>),
    ManualDistance(f64, Reply<Vec<Lap>>),
    Finish(Reply<SessionSnapshot>),
}

/// Collaborators a session actor talks to.
pub struct EngineDeps {
    pub tracking: TrackingConfig,
    pub cues: Arc<dyn CueSink>,
    pub store: Arc<dyn SnapshotStore>,
    /// Sampled on an interval while active; `None` when samples are pushed
    /// in through [`SessionHandle::record_heart_rate`] instead.
    pub heart_rate: Option<Box<dyn HeartRateSource>>,
}

/// Cloneable front door to a running session actor.
#[derive(Clone)]
pub struct SessionHandle {
    id: Uuid,
    commands: mpsc::Sender<Command>,
    view: watch::Receiver<SessionView>,
}

impl SessionHandle {
    /// Spawn the actor. The session is not started; call [`Self::start`].
    pub fn spawn(session: TrackingSession, deps: EngineDeps) -> Self {
        let id = session.id();
        let (commands, inbox) = mpsc::channel(COMMAND_BUFFER);
        let (view_tx, view) = watch::channel(session.view());

        let actor = SessionActor {
            session,
            tracking: deps.tracking,
            cues: deps.cues,
            store: deps.store,
            heart_rate: deps.heart_rate.map(|source| Arc::new(Mutex::new(source))),
            commands: commands.downgrade(),
            view_tx,
            producers: Vec::new(),
        };
        tokio::spawn(actor.run(inbox));

        Self { id, commands, view }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Latest published state.
    pub fn view(&self) -> SessionView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view.clone()
    }

    /// The actor has stopped, either finished or abandoned.
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    /// Returns `false` if the session was already running.
    pub async fn start(&self) -> Result<bool, SessionError> {
        self.request(Command::Start).await
    }

    pub async fn pause(&self) -> Result<(), SessionError> {
        self.request(Command::Pause).await
    }

    pub async fn resume(&self) -> Result<(), SessionError> {
        self.request(Command::Resume).await
    }

    pub async fn submit_fix(&self, fix: Fix) -> Result<FixOutcome, SessionError> {
        self.request(|reply| Command::Fix(fix, Some(reply))).await
    }

    /// Advance elapsed time by one second outside the internal ticker.
    pub async fn tick(&self) -> Result<bool, SessionError> {
        self.request(|reply| Command::Tick(Some(reply))).await
    }

    pub async fn record_heart_rate(&self, bpm: Option<u16>) -> Result<bool, SessionError> {
        self.request(|reply| Command::HeartRate(bpm, Some(reply))).await
    }

    pub async fn report_sensor_error(&self, error: SensorError) -> Result<(), SessionError> {
        self.request(|reply| Command::Sensor(error, reply)).await
    }

    pub async fn submit_manual_distance_increment(&self, km: f64) -> Result<Vec<Lap>, SessionError> {
        self.request(|reply| Command::ManualDistance(km, reply)).await
    }

    pub async fn finish(&self) -> Result<SessionSnapshot, SessionError> {
        self.request(Command::Finish).await
    }

    async fn request<T>(&self, command: impl FnOnce(Reply<T>) -> Command) -> Result<T, SessionError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| SessionError::Finished)?;
        response.await.map_err(|_| SessionError::Finished)?
    }
}

struct SessionActor {
    session: TrackingSession,
    tracking: TrackingConfig,
    cues: Arc<dyn CueSink>,
    store: Arc<dyn SnapshotStore>,
    heart_rate: Option<SharedHeartRateSource>,
    commands: mpsc::WeakSender<Command>,
    view_tx: watch::Sender<SessionView>,
    producers: Vec<JoinHandle<()>>,
}

impl SessionActor {
    async fn run(mut self, mut inbox: mpsc::Receiver<Command>) {
        while let Some(command) = inbox.recv().await {
            if self.handle(command) {
                break;
            }
        }

        self.stop_producers();
        tracing::debug!(session = %self.session.id(), "Session actor stopped");
    }

    /// Returns `true` once the session has finished.
    fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::Start(reply) => {
                let result = self.session.start();
                if let Ok(true) = result {
                    self.spawn_producers();
                }
                self.publish();
                let _ = reply.send(result);
            }
            Command::Pause(reply) => {
                let result = self.session.pause();
                if result.is_ok() {
                    self.stop_producers();
                }
                self.publish();
                let _ = reply.send(result);
            }
            Command::Resume(reply) => {
                let was_paused = self.session.phase() == SessionPhase::Paused;
                let result = self.session.resume();
                if result.is_ok() && was_paused {
                    self.spawn_producers();
                }
                self.publish();
                let _ = reply.send(result);
            }
            Command::Fix(fix, reply) => {
                let outcome = self.session.ingest_fix(fix);
                self.announce(outcome.laps());
                self.publish();
                if let Some(reply) = reply {
                    let _ = reply.send(Ok(outcome));
                }
            }
            Command::Tick(reply) => {
                let counted = self.session.tick();
                self.publish();
                if let Some(reply) = reply {
                    let _ = reply.send(Ok(counted));
                }
            }
            Command::HeartRate(bpm, reply) => {
                let recorded = self.session.record_heart_rate(bpm);
                self.publish();
                if let Some(reply) = reply {
                    let _ = reply.send(Ok(recorded));
                }
            }
            Command::Sensor(error, reply) => {
                if error.is_permanent() {
                    self.session.mark_gps_unavailable();
                } else {
                    tracing::debug!(session = %self.session.id(), ?error, "Transient geolocation error");
                }
                self.publish();
                let _ = reply.send(Ok(()));
            }
            Command::ManualDistance(km, reply) => {
                let result = self.session.submit_manual_distance_increment(km);
                if let Ok(laps) = &result {
                    self.announce(laps);
                }
                self.publish();
                let _ = reply.send(result);
            }
            Command::Finish(reply) => {
                let result = self.session.finish();
                let finished = result.is_ok();
                if let Ok(snapshot) = &result {
                    self.stop_producers();
                    if let Err(err) = self.store.save(snapshot) {
                        tracing::error!(session = %snapshot.session_id, "Failed to persist snapshot: {}", err);
                    }
                }
                self.publish();
                let _ = reply.send(result);
                return finished;
            }
        }
        false
    }

    /// Replies go out after this, so a caller always reads its own write.
    fn publish(&self) {
        self.view_tx.send_replace(self.session.view());
    }

    fn announce(&self, laps: &[Lap]) {
        if !self.session.config().voice_cues {
            return;
        }
        for lap in laps {
            self.cues.speak(&cue_text(lap));
        }
    }

    fn spawn_producers(&mut self) {
        self.stop_producers();
        self.producers.push(producers::spawn_ticker(
            self.commands.clone(),
            self.tracking.tick_interval,
        ));
        if let Some(source) = &self.heart_rate {
            self.producers.push(producers::spawn_heart_rate_sampler(
                self.commands.clone(),
                Arc::clone(source),
                self.view_tx.subscribe(),
                self.tracking.heart_rate_interval,
            ));
        }
    }

    fn stop_producers(&mut self) {
        for producer in self.producers.drain(..) {
            producer.abort();
        }
    }
}
