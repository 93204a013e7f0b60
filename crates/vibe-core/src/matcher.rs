//! Best-match selector.
//!
//! Linear scan over the catalog, counting how many of each song's scales
//! appear in the detected set. Strict `>` keeps the earliest song on ties,
//! so a detected set that overlaps nothing returns the first catalog entry.

use serde::{Deserialize, Serialize};

use crate::error::{Result, VibeError};
use crate::models::scale::DETECTED_SCALE_COUNT;
use crate::models::song::SongRecord;

/// The presenter's input: the chosen song plus how strongly it matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub song: SongRecord,
    pub detected: Vec<String>,
    pub match_count: usize,
    pub match_percentage: u32,
}

/// One of the recommended song's scales, flagged when the crowd hit it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleHit {
    pub scale: String,
    pub detected: bool,
}

impl Recommendation {
    /// The song's scales in order, each marked if it appears in `detected`.
    pub fn scale_hits(&self) -> Vec<ScaleHit> {
        self.song
            .scales
            .iter()
            .map(|scale| ScaleHit {
                scale: scale.clone(),
                detected: self.detected.iter().any(|d| d == scale),
            })
            .collect()
    }
}

/// Pick the catalog song whose scales overlap `detected` the most.
///
/// Fails only on an empty catalog.
pub fn best_match<S: AsRef<str>>(detected: &[S], catalog: &[SongRecord]) -> Result<Recommendation> {
    let first = catalog
        .first()
        .ok_or_else(|| VibeError::InvalidArgument("song catalog is empty".into()))?;

    let mut best = first;
    let mut best_count = 0;
    for song in catalog {
        let count = song.overlap(detected);
        if count > best_count {
            best = song;
            best_count = count;
        }
    }

    log::debug!(
        "vibe: best match '{}' with {} overlapping scale(s)",
        best.title,
        best_count
    );

    Ok(Recommendation {
        song: best.clone(),
        detected: detected.iter().map(|s| s.as_ref().to_string()).collect(),
        match_count: best_count,
        match_percentage: match_percentage(best_count),
    })
}

/// `round(count / 3 * 100)`, half up.
///
/// The denominator is always the detected-set size, never the song's own
/// scale count. Counts above 3 yield values above 100.
pub fn match_percentage(count: usize) -> u32 {
    (count as f64 / DETECTED_SCALE_COUNT as f64 * 100.0).round() as u32
}
