//! Vibe engine — real-time driver over a [`Session`].
//!
//! Owns the session behind a mutex and a heartbeat thread that steps it
//! by wall-clock time. Commands and heartbeat steps both take the same
//! lock, so a cancel can never interleave with a half-applied step: once
//! `cancel_or_reset` returns, no further capture event is produced.
//!
//! Observers subscribe for [`SessionEvent`]s over channels; front ends
//! that prefer polling read [`Engine::state`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;

use crate::capture::CaptureTimings;
use crate::catalog::Catalog;
use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::models::command::SessionCommand;
use crate::random::{RandomSource, SeededRandom};
use crate::session::{ScreenKind, Session, SessionEvent, SessionSnapshot};

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

struct Inner {
    session: Session,
    /// Clock reading at the last step.
    last_step: Duration,
}

type Watchers = Mutex<Vec<Sender<SessionEvent>>>;

pub struct Engine {
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    inner: Arc<Mutex<Inner>>,
    watchers: Arc<Watchers>,
    /// Shutdown signal for the heartbeat thread.
    shutdown: Arc<AtomicBool>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Engine {
    /// Build from config: catalog file or built-in catalog, wall clock,
    /// seeded or entropy RNG.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let catalog = match &config.catalog_path {
            Some(path) => Catalog::load(path)?,
            None => Catalog::builtin(),
        };
        let rng = SeededRandom::from_seed_option(config.seed);
        Ok(Self::with_parts(
            config,
            catalog,
            Arc::new(SystemClock::new()),
            Box::new(rng),
        ))
    }

    /// Build from explicit parts. Tests pass a `ManualClock` and a fixed seed.
    pub fn with_parts(
        config: EngineConfig,
        catalog: Catalog,
        clock: Arc<dyn Clock>,
        rng: Box<dyn RandomSource>,
    ) -> Self {
        let session = Session::new(catalog, CaptureTimings::from(&config), rng);
        let last_step = clock.now();
        Self {
            config,
            clock,
            inner: Arc::new(Mutex::new(Inner { session, last_step })),
            watchers: Arc::new(Mutex::new(Vec::new())),
            shutdown: Arc::new(AtomicBool::new(false)),
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Start the heartbeat. Idempotent — calling twice is a no-op.
    pub fn start(&self) {
        let mut handles = self.handles.lock();
        if !handles.is_empty() {
            return;
        }
        handles.push(self.start_heartbeat());
    }

    /// Stop the heartbeat and wait for it to finish.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        let mut handles = self.handles.lock();
        for handle in handles.drain(..) {
            if handle.join().is_err() {
                log::warn!("vibe: heartbeat thread panicked");
            }
        }
    }

    fn start_heartbeat(&self) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        let clock = Arc::clone(&self.clock);
        let watchers = Arc::clone(&self.watchers);
        let shutdown = Arc::clone(&self.shutdown);
        let tick = self.config.tick();

        thread::spawn(move || {
            while !shutdown.load(Ordering::SeqCst) {
                thread::sleep(tick);
                if shutdown.load(Ordering::SeqCst) {
                    break;
                }
                let mut guard = inner.lock();
                step(&mut guard, &*clock, &watchers);
            }
        })
    }

    // -----------------------------------------------------------------------
    // Public API
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Step the session up to the clock's current time.
    ///
    /// The heartbeat calls this; tests and single-threaded front ends call
    /// it directly.
    pub fn pump(&self) -> Vec<SessionEvent> {
        let mut guard = self.inner.lock();
        step(&mut guard, &*self.clock, &self.watchers)
    }

    /// Landing → capture.
    pub fn start_capture(&self) -> Result<()> {
        self.command(SessionCommand::StartCapture)
    }

    /// Cancel a capture, or return from the presenter to landing.
    pub fn cancel_or_reset(&self) -> Result<()> {
        self.command(SessionCommand::CancelOrReset)
    }

    /// Present the best match for an externally supplied detected set.
    pub fn complete_capture<S: AsRef<str>>(&self, detected: &[S]) -> Result<()> {
        self.command(SessionCommand::CompleteCapture {
            detected: detected.iter().map(|s| s.as_ref().to_string()).collect(),
        })
    }

    pub fn toggle_like(&self) -> Result<()> {
        self.command(SessionCommand::ToggleLike)
    }

    /// Apply a command after catching the session up to the current time,
    /// so a cancel that arrives after the recording window has closed is
    /// judged against the analyzing phase.
    pub fn command(&self, command: SessionCommand) -> Result<()> {
        let mut guard = self.inner.lock();
        step(&mut guard, &*self.clock, &self.watchers);
        let events = guard.session.apply(command)?;
        broadcast(&self.watchers, &events);
        Ok(())
    }

    pub fn screen(&self) -> ScreenKind {
        self.inner.lock().session.kind()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.lock().session.snapshot()
    }

    /// Current screen as JSON.
    pub fn state(&self) -> Value {
        serde_json::to_value(self.snapshot()).unwrap_or(Value::Null)
    }

    pub fn catalog(&self) -> Catalog {
        self.inner.lock().session.catalog().clone()
    }

    /// Receive every session event from now on. Dropping the receiver
    /// unsubscribes.
    pub fn subscribe(&self) -> Receiver<SessionEvent> {
        let (tx, rx) = mpsc::channel();
        self.watchers.lock().push(tx);
        rx
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        // Don't join here — the heartbeat exits on its next wake-up
    }
}

// ---------------------------------------------------------------------------
// Stepping
// ---------------------------------------------------------------------------

fn step(inner: &mut Inner, clock: &dyn Clock, watchers: &Watchers) -> Vec<SessionEvent> {
    let now = clock.now();
    let dt = now.saturating_sub(inner.last_step);
    inner.last_step = now;
    let events = inner.session.advance(dt);
    broadcast(watchers, &events);
    events
}

/// Send to every subscriber, dropping those whose receiver is gone.
fn broadcast(watchers: &Watchers, events: &[SessionEvent]) {
    if events.is_empty() {
        return;
    }
    let mut watchers = watchers.lock();
    for event in events {
        watchers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}
