//! Periodic timer that injects `Action::Timer` into a game's queue.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tracing::debug;

use crate::action::{Action, Payload, TimerId};
use crate::game::GameRef;

/// Ticks a game every `interval` while running.
///
/// Each tick sleeps for the interval, bumps the tick counter and queues a
/// timer action. `stop` takes effect before the next tick is injected.
pub struct GameTimer<M: Payload, S: Payload> {
    id: TimerId,
    game: GameRef<M, S>,
    interval: Duration,
    ticks: Arc<AtomicU64>,

    /// Run flag of the live ticking task, if any.
    running: Mutex<Option<Arc<AtomicBool>>>,
}

impl<M: Payload, S: Payload> GameTimer<M, S> {
    pub fn new(game: GameRef<M, S>, interval: Duration) -> Self {
        GameTimer {
            id: TimerId::next(),
            game,
            interval,
            ticks: Arc::new(AtomicU64::new(0)),
            running: Mutex::new(None),
        }
    }

    pub fn id(&self) -> TimerId {
        self.id
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start ticking. Does nothing if already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if running.is_some() {
            return;
        }

        let flag = Arc::new(AtomicBool::new(true));
        *running = Some(Arc::clone(&flag));

        let id = self.id;
        let game = Arc::clone(&self.game);
        let ticks = Arc::clone(&self.ticks);
        let interval = self.interval;

        debug!(timer = id.0, ?interval, "timer started");
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                if !flag.load(Ordering::Acquire) {
                    break;
                }
                ticks.fetch_add(1, Ordering::Relaxed);
                game.apply_action(Action::Timer { timer: id });
            }
            debug!(timer = id.0, "timer stopped");
        });
    }

    /// Stop ticking. A tick already sleeping is not injected.
    pub fn stop(&self) {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(flag) = running.take() {
            flag.store(false, Ordering::Release);
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Ticks injected since creation or the last `reset`.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.ticks.store(0, Ordering::Relaxed);
    }
}

impl<M: Payload, S: Payload> Drop for GameTimer<M, S> {
    fn drop(&mut self) {
        self.stop();
    }
}
