use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::engine::Command;
use crate::pipeline::heart_rate::HeartRateSource;
use crate::types::session::SessionView;

pub(crate) type SharedHeartRateSource = Arc<Mutex<Box<dyn HeartRateSource>>>;

/// Sends one `Tick` per `period`, starting one period after spawn.
pub(crate) fn spawn_ticker(commands: mpsc::WeakSender<Command>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            let Some(commands) = commands.upgrade() else { break };
            if commands.send(Command::Tick(None)).await.is_err() {
                break;
            }
        }
    })
}

/// Samples `source` every `period`, using the current speed as the effort hint.
pub(crate) fn spawn_heart_rate_sampler(
    commands: mpsc::WeakSender<Command>,
    source: SharedHeartRateSource,
    view: watch::Receiver<SessionView>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            let intensity_kmh = view.borrow().current_speed_kmh;
            let bpm = match source.lock() {
                Ok(mut source) => source.sample(intensity_kmh),
                Err(poisoned) => poisoned.into_inner().sample(intensity_kmh),
            };
            if bpm.is_none() {
                tracing::debug!("Heart-rate sample failed; skipping");
            }

            let Some(commands) = commands.upgrade() else { break };
            if commands.send(Command::HeartRate(bpm, None)).await.is_err() {
                break;
            }
        }
    })
}
