//! vibe-core — crowd-vibe capture simulator and Bollywood scale matcher.
//!
//! Nothing here listens to a microphone. A capture is a timed show (count
//! down, pretend to record, pretend to analyze) that ends in three random
//! scale labels; the matcher then picks the catalog song sharing the most
//! of them.
//!
//! # Architecture
//!
//! ```text
//! Layer 0: Data (scale universe, song records, catalog)
//! Layer 1: Pure logic (matcher, capture simulator, session flow)
//! Layer 2: Engine (heartbeat thread, clock, subscribers)
//! Layer 3: Front ends (CLI, FFI) render engine state
//! ```

pub mod capture;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod models;
pub mod random;
pub mod session;

pub use capture::{CaptureEvent, CapturePhase, CaptureSimulator, CaptureTimings};
pub use catalog::Catalog;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{Result, VibeError};
pub use matcher::{best_match, match_percentage, Recommendation, ScaleHit};
pub use models::*;
pub use random::{RandomSource, SeededRandom};
pub use session::{Screen, ScreenKind, Session, SessionEvent, SessionSnapshot};

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    fn titles_for(detected: &[&str]) -> (String, usize, u32) {
        let rec = Catalog::builtin().best_match(detected).unwrap();
        (rec.song.title, rec.match_count, rec.match_percentage)
    }

    // -------------------------------------------------------------------
    // Catalog scenarios
    // -------------------------------------------------------------------

    #[test]
    fn romantic_scales_pick_tum_hi_ho() {
        assert_eq!(
            titles_for(&["C Major", "A Minor", "F Major"]),
            ("Tum Hi Ho".to_string(), 3, 100)
        );
    }

    #[test]
    fn inspirational_scales_pick_kal_ho_naa_ho() {
        assert_eq!(
            titles_for(&["D Minor", "G Major", "E Minor"]),
            ("Kal Ho Naa Ho".to_string(), 3, 100)
        );
    }

    #[test]
    fn unknown_scales_fall_back_to_first_song() {
        assert_eq!(
            titles_for(&["X", "Y", "Z"]),
            ("Tum Hi Ho".to_string(), 0, 0)
        );
    }

    #[test]
    fn kal_ho_naa_ho_beats_ilahi_on_tie() {
        // Both share G Major and D Minor; catalog order decides.
        assert_eq!(
            titles_for(&["G Major", "D Minor", "C# Minor"]),
            ("Kal Ho Naa Ho".to_string(), 2, 67)
        );
    }

    #[test]
    fn festive_scales_pick_nagada_sang_dhol() {
        assert_eq!(
            titles_for(&["F# Major", "A Minor", "B Minor"]),
            ("Nagada Sang Dhol".to_string(), 2, 67)
        );
    }

    #[test]
    fn every_random_session_recommends_a_catalog_song() {
        let catalog = Catalog::builtin();
        for seed in 0..100 {
            let mut session = Session::new(
                catalog.clone(),
                CaptureTimings::default(),
                Box::new(SeededRandom::seeded(seed)),
            );
            session.start_capture().unwrap();
            session.advance(Duration::from_secs(15));
            match session.snapshot() {
                SessionSnapshot::Presenter { recommendation, .. } => {
                    assert!(catalog.songs().contains(&recommendation.song));
                    assert_eq!(recommendation.detected.len(), DETECTED_SCALE_COUNT);
                    assert_eq!(
                        recommendation.match_percentage,
                        match_percentage(recommendation.match_count)
                    );
                }
                other => panic!("seed {} ended on {:?}", seed, other),
            }
        }
    }

    // -------------------------------------------------------------------
    // Engine from environment
    // -------------------------------------------------------------------

    #[test]
    fn config_from_env_file() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let dir = tempfile::TempDir::new().expect("tempdir");
        let path = dir.path().join("vibe.json");
        std::fs::write(&path, r#"{"countdown_secs": 5, "seed": 12}"#).unwrap();

        std::env::set_var(config::CONFIG_ENV, &path);
        let loaded = EngineConfig::from_env();
        std::env::remove_var(config::CONFIG_ENV);

        let loaded = loaded.unwrap();
        assert_eq!(loaded.countdown_secs, 5);
        assert_eq!(loaded.seed, Some(12));
    }

    #[test]
    fn config_from_env_defaults_when_unset() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        std::env::remove_var(config::CONFIG_ENV);
        assert_eq!(EngineConfig::from_env().unwrap(), EngineConfig::default());
    }

    #[test]
    fn seeded_engines_agree() {
        let run = || {
            let clock = Arc::new(ManualClock::new());
            let engine = Engine::with_parts(
                EngineConfig::default(),
                Catalog::builtin(),
                clock.clone(),
                Box::new(SeededRandom::seeded(2024)),
            );
            engine.start_capture().unwrap();
            clock.advance(Duration::from_secs(20));
            engine.pump();
            engine.state()
        };
        assert_eq!(run(), run());
    }
}
