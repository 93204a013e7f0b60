//! Capture simulator — countdown, fake recording, analysis delay, sample.
//!
//! There is no audio. The simulator is a value that owns its own timers
//! and is stepped by explicit durations:
//!
//! ```text
//! Countdown(3) --1s--> Countdown(2) --1s--> Countdown(1) --1s--> Recording
//! Recording: LevelTick every 100ms, RecordingEnd after 10s --> Analyzing
//! Analyzing: AnalysisDone after 2s --> Complete { detected }
//! Countdown | Recording --cancel--> Cancelled
//! ```
//!
//! Timers live in the simulator, so tearing a phase down is dropping its
//! timers. Once cancelled or complete nothing is pending and `advance` is
//! inert.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{Result, VibeError};
use crate::models::scale::SCALE_UNIVERSE;
use crate::random::RandomSource;

const COUNTDOWN_STEP: Duration = Duration::from_secs(1);

/// Number of bars in the level meter.
pub const LEVEL_BARS: usize = 10;

/// Durations and sizes that shape one capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureTimings {
    pub countdown_secs: u32,
    pub recording_window: Duration,
    pub level_interval: Duration,
    pub analysis_delay: Duration,
    pub sample_size: usize,
}

impl CaptureTimings {
    /// Zero windows or intervals would reschedule a timer at the same
    /// instant forever.
    pub fn validate(&self) -> Result<()> {
        if self.recording_window.is_zero() {
            return Err(VibeError::InvalidConfig("recording window must be positive".into()));
        }
        if self.level_interval.is_zero() {
            return Err(VibeError::InvalidConfig("level interval must be positive".into()));
        }
        if self.sample_size == 0 || self.sample_size > SCALE_UNIVERSE.len() {
            return Err(VibeError::InvalidConfig(format!(
                "sample_size must be between 1 and {}",
                SCALE_UNIVERSE.len()
            )));
        }
        Ok(())
    }
}

impl Default for CaptureTimings {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for CaptureTimings {
    fn from(config: &EngineConfig) -> Self {
        Self {
            countdown_secs: config.countdown_secs,
            recording_window: config.recording_window(),
            level_interval: config.level_interval(),
            analysis_delay: config.analysis_delay(),
            sample_size: config.sample_size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum CapturePhase {
    Countdown { remaining: u32 },
    Recording { elapsed_ms: u64, level: f32 },
    Analyzing,
    Complete { detected: Vec<String> },
    Cancelled,
}

/// What happened during one `advance` (or `cancel`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CaptureEvent {
    CountdownTick { remaining: u32 },
    RecordingStarted,
    LevelUpdate { level: f32, elapsed_ms: u64 },
    AnalyzingStarted,
    Completed { detected: Vec<String> },
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerKind {
    CountdownTick,
    LevelTick,
    RecordingEnd,
    AnalysisDone,
}

#[derive(Debug, Clone)]
struct Timer {
    due: Duration,
    seq: u64,
    kind: TimerKind,
}

#[derive(Debug, Clone)]
pub struct CaptureSimulator {
    timings: CaptureTimings,
    phase: CapturePhase,
    /// Simulator-local time since start.
    now: Duration,
    timers: Vec<Timer>,
    next_seq: u64,
}

impl CaptureSimulator {
    /// Start in `Countdown`. A zero countdown still passes through one
    /// immediate tick so `RecordingStarted` is reported on the first step.
    ///
    /// Fails on timings that would never let the recording window close.
    pub fn new(timings: CaptureTimings) -> Result<Self> {
        timings.validate()?;
        let mut sim = Self {
            timings,
            phase: CapturePhase::Countdown {
                remaining: timings.countdown_secs,
            },
            now: Duration::ZERO,
            timers: Vec::new(),
            next_seq: 0,
        };
        let first_tick = if timings.countdown_secs == 0 {
            Duration::ZERO
        } else {
            COUNTDOWN_STEP
        };
        sim.schedule(first_tick, TimerKind::CountdownTick);
        Ok(sim)
    }

    pub fn phase(&self) -> &CapturePhase {
        &self.phase
    }

    pub fn phase_name(&self) -> &'static str {
        match self.phase {
            CapturePhase::Countdown { .. } => "counting down",
            CapturePhase::Recording { .. } => "recording",
            CapturePhase::Analyzing => "analyzing",
            CapturePhase::Complete { .. } => "complete",
            CapturePhase::Cancelled => "cancelled",
        }
    }

    pub fn timings(&self) -> &CaptureTimings {
        &self.timings
    }

    /// Simulator-local time since start.
    pub fn elapsed(&self) -> Duration {
        self.now
    }

    /// Number of timers still scheduled.
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn is_cancellable(&self) -> bool {
        matches!(
            self.phase,
            CapturePhase::Countdown { .. } | CapturePhase::Recording { .. }
        )
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self.phase,
            CapturePhase::Complete { .. } | CapturePhase::Cancelled
        )
    }

    pub fn detected(&self) -> Option<&[String]> {
        match &self.phase {
            CapturePhase::Complete { detected } => Some(detected),
            _ => None,
        }
    }

    /// Recording progress, 0..=100. Full once past the recording phase.
    pub fn progress_percent(&self) -> u32 {
        match self.phase {
            CapturePhase::Countdown { .. } | CapturePhase::Cancelled => 0,
            CapturePhase::Recording { elapsed_ms, .. } => {
                let window = self.timings.recording_window.as_millis().max(1) as u64;
                (elapsed_ms.saturating_mul(100) / window).min(100) as u32
            }
            CapturePhase::Analyzing | CapturePhase::Complete { .. } => 100,
        }
    }

    /// The "crowd voices detected" readout: one per ten level points, plus one.
    pub fn crowd_voices(&self) -> u32 {
        match self.phase {
            CapturePhase::Recording { level, .. } => (level / 10.0).floor() as u32 + 1,
            _ => 0,
        }
    }

    /// How many of the [`LEVEL_BARS`] meter bars are lit.
    pub fn level_bars(&self) -> usize {
        match self.phase {
            CapturePhase::Recording { level, .. } => (0..LEVEL_BARS)
                .filter(|i| level > (*i as f32) * 10.0)
                .count(),
            _ => 0,
        }
    }

    /// Move simulator time forward by `dt`, firing every timer that comes
    /// due in order. Timers sharing a due instant fire in scheduling order.
    pub fn advance(&mut self, dt: Duration, rng: &mut dyn RandomSource) -> Vec<CaptureEvent> {
        let mut events = Vec::new();
        if self.is_finished() {
            return events;
        }

        let target = self.now + dt;
        while let Some(idx) = self.next_due(target) {
            let timer = self.timers.swap_remove(idx);
            self.now = timer.due;
            self.fire(timer.kind, rng, &mut events);
        }

        if !self.is_finished() {
            self.now = target;
        }
        events
    }

    /// Abort during countdown or recording. Drops every pending timer.
    pub fn cancel(&mut self) -> Result<CaptureEvent> {
        if !self.is_cancellable() {
            return Err(VibeError::CancelUnavailable {
                phase: self.phase_name(),
            });
        }
        log::info!("vibe: capture cancelled while {}", self.phase_name());
        self.timers.clear();
        self.phase = CapturePhase::Cancelled;
        Ok(CaptureEvent::Cancelled)
    }

    // -----------------------------------------------------------------------
    // Timers
    // -----------------------------------------------------------------------

    fn schedule(&mut self, after: Duration, kind: TimerKind) {
        self.timers.push(Timer {
            due: self.now + after,
            seq: self.next_seq,
            kind,
        });
        self.next_seq += 1;
    }

    fn next_due(&self, target: Duration) -> Option<usize> {
        self.timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= target)
            .min_by_key(|(_, t)| (t.due, t.seq))
            .map(|(i, _)| i)
    }

    fn fire(&mut self, kind: TimerKind, rng: &mut dyn RandomSource, events: &mut Vec<CaptureEvent>) {
        match kind {
            TimerKind::CountdownTick => self.on_countdown_tick(events),
            TimerKind::LevelTick => self.on_level_tick(rng, events),
            TimerKind::RecordingEnd => self.on_recording_end(events),
            TimerKind::AnalysisDone => self.on_analysis_done(rng, events),
        }
    }

    fn on_countdown_tick(&mut self, events: &mut Vec<CaptureEvent>) {
        let remaining = match &mut self.phase {
            CapturePhase::Countdown { remaining } => {
                *remaining = remaining.saturating_sub(1);
                *remaining
            }
            _ => return,
        };
        events.push(CaptureEvent::CountdownTick { remaining });

        if remaining > 0 {
            self.schedule(COUNTDOWN_STEP, TimerKind::CountdownTick);
            return;
        }

        log::debug!("vibe: countdown finished, recording");
        self.phase = CapturePhase::Recording {
            elapsed_ms: 0,
            level: 0.0,
        };
        events.push(CaptureEvent::RecordingStarted);
        self.schedule(self.timings.level_interval, TimerKind::LevelTick);
        self.schedule(self.timings.recording_window, TimerKind::RecordingEnd);
    }

    fn on_level_tick(&mut self, rng: &mut dyn RandomSource, events: &mut Vec<CaptureEvent>) {
        let step_ms = self.timings.level_interval.as_millis() as u64;
        let update = match &mut self.phase {
            CapturePhase::Recording { elapsed_ms, level } => {
                *level = rng.level();
                *elapsed_ms += step_ms;
                CaptureEvent::LevelUpdate {
                    level: *level,
                    elapsed_ms: *elapsed_ms,
                }
            }
            _ => return,
        };
        events.push(update);
        self.schedule(self.timings.level_interval, TimerKind::LevelTick);
    }

    fn on_recording_end(&mut self, events: &mut Vec<CaptureEvent>) {
        self.timers.retain(|t| t.kind != TimerKind::LevelTick);
        log::debug!("vibe: recording window closed, analyzing");
        self.phase = CapturePhase::Analyzing;
        events.push(CaptureEvent::AnalyzingStarted);
        self.schedule(self.timings.analysis_delay, TimerKind::AnalysisDone);
    }

    fn on_analysis_done(&mut self, rng: &mut dyn RandomSource, events: &mut Vec<CaptureEvent>) {
        let detected = rng.sample_scales(&SCALE_UNIVERSE, self.timings.sample_size);
        log::info!("vibe: detected scales {:?}", detected);
        self.timers.clear();
        self.phase = CapturePhase::Complete {
            detected: detected.clone(),
        };
        events.push(CaptureEvent::Completed { detected });
    }
}
