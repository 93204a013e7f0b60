//! Song records.

use serde::{Deserialize, Serialize};

/// One catalog entry. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongRecord {
    pub title: String,
    pub artist: String,
    pub movie: String,
    pub year: String,
    pub scales: Vec<String>,
    pub vibe: String,
    pub tempo: String,
    pub energy: String,
}

impl SongRecord {
    /// Number of this song's scale entries that appear anywhere in `detected`.
    ///
    /// Counts per occurrence in `scales`: a label listed twice in the song
    /// counts twice.
    pub fn overlap<S: AsRef<str>>(&self, detected: &[S]) -> usize {
        self.scales
            .iter()
            .filter(|scale| detected.iter().any(|d| d.as_ref() == scale.as_str()))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(scales: &[&str]) -> SongRecord {
        SongRecord {
            title: "t".into(),
            artist: "a".into(),
            movie: "m".into(),
            year: "2000".into(),
            scales: scales.iter().map(|s| s.to_string()).collect(),
            vibe: "v".into(),
            tempo: "t".into(),
            energy: "e".into(),
        }
    }

    #[test]
    fn overlap_counts_shared_labels() {
        let s = song(&["C Major", "A Minor", "F Major"]);
        assert_eq!(s.overlap(&["A Minor", "G Major", "C Major"]), 2);
        assert_eq!(s.overlap::<&str>(&[]), 0);
    }

    #[test]
    fn overlap_counts_duplicates_in_song_per_occurrence() {
        let s = song(&["C Major", "C Major", "D Minor"]);
        assert_eq!(s.overlap(&["C Major"]), 2);
    }

    #[test]
    fn overlap_ignores_duplicates_in_detected() {
        let s = song(&["C Major", "D Minor"]);
        assert_eq!(s.overlap(&["C Major", "C Major"]), 1);
    }

    #[test]
    fn json_field_names_match_source_data() {
        let s = song(&["C Major"]);
        let v = serde_json::to_value(&s).unwrap();
        for key in ["title", "artist", "movie", "year", "scales", "vibe", "tempo", "energy"] {
            assert!(v.get(key).is_some(), "missing {}", key);
        }
    }
}
