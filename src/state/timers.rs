//! Cancellable scoped tasks backing the idle notice and the secret-mode hue cycle.
//!
//! Both own their spawned task: dropping the owner aborts it.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::{Instant, interval_at, sleep},
};

/// Generation stamp carried by an idle notice. Stale stamps must be ignored.
pub type IdleGeneration = u64;

/// Single-shot timer that sends its generation once `window` elapses without a re-arm.
pub struct IdleTimer {
    window: Duration,
    notify: mpsc::UnboundedSender<IdleGeneration>,
    generation: IdleGeneration,
    task: Option<JoinHandle<()>>,
}

impl IdleTimer {
    pub fn new(window: Duration, notify: mpsc::UnboundedSender<IdleGeneration>) -> Self {
        Self {
            window,
            notify,
            generation: 0,
            task: None,
        }
    }

    /// Start the countdown again, superseding any pending one.
    pub fn arm(&mut self) {
        self.cancel();
        let generation = self.generation;
        let window = self.window;
        let notify = self.notify.clone();
        self.task = Some(tokio::spawn(async move {
            sleep(window).await;
            let _ = notify.send(generation);
        }));
    }

    /// Stop the countdown. Notices already queued become stale.
    pub fn cancel(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Whether a received notice belongs to the countdown currently armed.
    pub fn is_current(&self, generation: IdleGeneration) -> bool {
        self.task.is_some() && generation == self.generation
    }

    /// Mark the current countdown as consumed once its notice was handled.
    pub fn complete(&mut self) {
        self.cancel();
    }
}

impl Drop for IdleTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Advance a hue angle by `step`, wrapping at 360.
pub fn advance_hue(angle: u16, step: u16) -> u16 {
    ((u32::from(angle) + u32::from(step)) % 360) as u16
}

/// Periodically advancing hue angle published through a `watch` channel.
///
/// Stopping resets the angle to 0.
pub struct HueCycle {
    tick: Duration,
    step: u16,
    angle: Arc<watch::Sender<u16>>,
    active: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl HueCycle {
    pub fn new(tick: Duration, step: u16) -> Self {
        let (angle, _rx) = watch::channel(0);
        Self {
            tick,
            step,
            angle: Arc::new(angle),
            active: Arc::new(AtomicBool::new(false)),
            task: None,
        }
    }

    /// Follow the current angle.
    pub fn subscribe(&self) -> watch::Receiver<u16> {
        self.angle.subscribe()
    }

    /// Current angle in degrees, `0..360`.
    pub fn angle(&self) -> u16 {
        *self.angle.borrow()
    }

    /// Whether the tick task is alive.
    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Spawn the tick task. Does nothing when already running.
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }

        let active = Arc::new(AtomicBool::new(true));
        self.active = active.clone();
        let angle = self.angle.clone();
        let (tick, step) = (self.tick, self.step);

        self.task = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + tick, tick);
            loop {
                ticker.tick().await;
                // The flag is checked under the channel lock so a concurrent stop wins.
                angle.send_if_modified(|value| {
                    if !active.load(Ordering::SeqCst) {
                        return false;
                    }
                    *value = advance_hue(*value, step);
                    true
                });
            }
        }));
    }

    /// Abort the tick task and reset the angle to 0.
    pub fn stop(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.angle.send_if_modified(|value| std::mem::replace(value, 0) != 0);
    }
}

impl Drop for HueCycle {
    fn drop(&mut self) {
        self.stop();
    }
}
