//! The three-screen flow: landing, capture, presenter.
//!
//! A `Session` owns the catalog, its random source and whichever screen is
//! showing. It never reads a clock; callers step it with `advance`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::capture::{CaptureEvent, CapturePhase, CaptureSimulator, CaptureTimings};
use crate::catalog::Catalog;
use crate::error::{Result, VibeError};
use crate::matcher::{Recommendation, ScaleHit};
use crate::models::command::SessionCommand;
use crate::random::RandomSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenKind {
    Landing,
    Capture,
    Presenter,
}

impl ScreenKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ScreenKind::Landing => "landing",
            ScreenKind::Capture => "capture",
            ScreenKind::Presenter => "presenter",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Screen {
    Landing,
    Capturing(CaptureSimulator),
    Presenting {
        recommendation: Recommendation,
        liked: bool,
    },
}

impl Screen {
    pub fn kind(&self) -> ScreenKind {
        match self {
            Screen::Landing => ScreenKind::Landing,
            Screen::Capturing(_) => ScreenKind::Capture,
            Screen::Presenting { .. } => ScreenKind::Presenter,
        }
    }
}

/// Everything observers are told about.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    ScreenChanged { screen: ScreenKind },
    Capture(CaptureEvent),
    MatchFound { recommendation: Recommendation },
    LikeToggled { liked: bool },
}

/// Serializable view of the current screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum SessionSnapshot {
    Landing,
    Capture {
        #[serde(flatten)]
        phase: CapturePhase,
        progress_percent: u32,
        crowd_voices: u32,
        level_bars: usize,
        cancellable: bool,
    },
    Presenter {
        recommendation: Recommendation,
        scale_hits: Vec<ScaleHit>,
        liked: bool,
    },
}

pub struct Session {
    catalog: Catalog,
    timings: CaptureTimings,
    rng: Box<dyn RandomSource>,
    screen: Screen,
}

impl Session {
    pub fn new(catalog: Catalog, timings: CaptureTimings, rng: Box<dyn RandomSource>) -> Self {
        Self {
            catalog,
            timings,
            rng,
            screen: Screen::Landing,
        }
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn kind(&self) -> ScreenKind {
        self.screen.kind()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn timings(&self) -> &CaptureTimings {
        &self.timings
    }

    /// Landing → capture.
    pub fn start_capture(&mut self) -> Result<Vec<SessionEvent>> {
        if !matches!(self.screen, Screen::Landing) {
            return Err(self.refuse("start capture"));
        }
        log::info!("vibe: starting capture");
        self.screen = Screen::Capturing(CaptureSimulator::new(self.timings)?);
        Ok(vec![SessionEvent::ScreenChanged {
            screen: ScreenKind::Capture,
        }])
    }

    /// Capture → presenter. Also accepted from landing, for detected sets
    /// that come from outside the simulator. Any running simulator is
    /// dropped together with its timers.
    pub fn on_capture_complete<S: AsRef<str>>(&mut self, detected: &[S]) -> Result<Vec<SessionEvent>> {
        if matches!(self.screen, Screen::Presenting { .. }) {
            return Err(self.refuse("complete capture"));
        }
        let recommendation = self.catalog.best_match(detected)?;
        log::info!(
            "vibe: recommending '{}' ({}% vibe match)",
            recommendation.song.title,
            recommendation.match_percentage
        );
        self.screen = Screen::Presenting {
            recommendation: recommendation.clone(),
            liked: false,
        };
        Ok(vec![
            SessionEvent::MatchFound { recommendation },
            SessionEvent::ScreenChanged {
                screen: ScreenKind::Presenter,
            },
        ])
    }

    /// Any screen → landing.
    ///
    /// During capture this is the cancel action, refused while analyzing.
    /// On the presenter it discards the recommendation. On landing it does
    /// nothing.
    pub fn cancel_or_reset(&mut self) -> Result<Vec<SessionEvent>> {
        let mut events = Vec::new();
        match &mut self.screen {
            Screen::Landing => return Ok(events),
            Screen::Capturing(sim) => events.push(SessionEvent::Capture(sim.cancel()?)),
            Screen::Presenting { .. } => log::info!("vibe: starting over"),
        }
        self.screen = Screen::Landing;
        events.push(SessionEvent::ScreenChanged {
            screen: ScreenKind::Landing,
        });
        Ok(events)
    }

    /// Flip the presenter's like flag.
    pub fn toggle_like(&mut self) -> Result<SessionEvent> {
        if let Screen::Presenting { liked, .. } = &mut self.screen {
            *liked = !*liked;
            return Ok(SessionEvent::LikeToggled { liked: *liked });
        }
        Err(self.refuse("toggle like"))
    }

    /// Step the capture simulator by `dt`. A completed sample moves the
    /// session straight to the presenter within the same step.
    pub fn advance(&mut self, dt: Duration) -> Vec<SessionEvent> {
        let sim = match &mut self.screen {
            Screen::Capturing(sim) => sim,
            _ => return Vec::new(),
        };

        let mut events: Vec<SessionEvent> = sim
            .advance(dt, self.rng.as_mut())
            .into_iter()
            .map(SessionEvent::Capture)
            .collect();

        if let Some(detected) = sim.detected().map(|d| d.to_vec()) {
            match self.on_capture_complete(&detected) {
                Ok(more) => events.extend(more),
                Err(e) => {
                    log::error!("vibe: could not present capture result: {}", e);
                    self.screen = Screen::Landing;
                    events.push(SessionEvent::ScreenChanged {
                        screen: ScreenKind::Landing,
                    });
                }
            }
        }
        events
    }

    pub fn apply(&mut self, command: SessionCommand) -> Result<Vec<SessionEvent>> {
        match command {
            SessionCommand::StartCapture => self.start_capture(),
            SessionCommand::CancelOrReset => self.cancel_or_reset(),
            SessionCommand::CompleteCapture { detected } => self.on_capture_complete(&detected),
            SessionCommand::ToggleLike => self.toggle_like().map(|e| vec![e]),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        match &self.screen {
            Screen::Landing => SessionSnapshot::Landing,
            Screen::Capturing(sim) => SessionSnapshot::Capture {
                phase: sim.phase().clone(),
                progress_percent: sim.progress_percent(),
                crowd_voices: sim.crowd_voices(),
                level_bars: sim.level_bars(),
                cancellable: sim.is_cancellable(),
            },
            Screen::Presenting {
                recommendation,
                liked,
            } => SessionSnapshot::Presenter {
                recommendation: recommendation.clone(),
                scale_hits: recommendation.scale_hits(),
                liked: *liked,
            },
        }
    }

    fn refuse(&self, action: &'static str) -> VibeError {
        VibeError::InvalidTransition {
            from: self.kind().as_str(),
            action,
        }
    }
}
