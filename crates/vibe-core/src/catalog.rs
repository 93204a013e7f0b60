//! Song catalog.
//!
//! The four compiled-in songs are the default. A JSON array of song records
//! can replace them; either way every song is checked once at load time so
//! the selector never sees a degenerate entry.

use std::path::Path;

use crate::error::{Result, VibeError};
use crate::matcher::{self, Recommendation};
use crate::models::scale::{is_known_scale, DETECTED_SCALE_COUNT};
use crate::models::song::SongRecord;

/// A validated, non-empty, ordered list of songs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    songs: Vec<SongRecord>,
}

impl Catalog {
    /// Validate and wrap `songs`. Order is preserved; it decides ties.
    pub fn new(songs: Vec<SongRecord>) -> Result<Self> {
        if songs.is_empty() {
            return Err(VibeError::InvalidArgument("song catalog is empty".into()));
        }
        for song in &songs {
            validate_song(song)?;
        }
        Ok(Self { songs })
    }

    /// The built-in Bollywood catalog.
    pub fn builtin() -> Self {
        let songs = vec![
            record(
                "Tum Hi Ho",
                "Arijit Singh",
                "Aashiqui 2",
                "2013",
                ["C Major", "A Minor", "F Major"],
                ("Romantic", "Slow", "Emotional"),
            ),
            record(
                "Kal Ho Naa Ho",
                "Sonu Nigam",
                "Kal Ho Naa Ho",
                "2003",
                ["D Minor", "G Major", "E Minor"],
                ("Inspirational", "Medium", "Uplifting"),
            ),
            record(
                "Nagada Sang Dhol",
                "Shreya Ghoshal",
                "Goliyon Ki Raasleela Ram-Leela",
                "2013",
                ["B Minor", "F# Major", "C# Minor"],
                ("Festive", "Fast", "High Energy"),
            ),
            record(
                "Ilahi",
                "Arijit Singh",
                "Yeh Jawaani Hai Deewani",
                "2013",
                ["Bb Major", "G Major", "D Minor"],
                ("Adventure", "Medium", "Feel Good"),
            ),
        ];
        Self { songs }
    }

    /// Parse a JSON array of song records.
    pub fn from_json(json: &str) -> Result<Self> {
        let songs: Vec<SongRecord> = serde_json::from_str(json)?;
        Self::new(songs)
    }

    /// Read and parse a catalog file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let catalog = Self::from_json(&json)?;
        log::info!("vibe: loaded {} songs from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    pub fn songs(&self) -> &[SongRecord] {
        &self.songs
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    /// Always false: construction rejects empty catalogs.
    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    pub fn first(&self) -> &SongRecord {
        &self.songs[0]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SongRecord> {
        self.songs.iter()
    }

    pub fn best_match<S: AsRef<str>>(&self, detected: &[S]) -> Result<Recommendation> {
        matcher::best_match(detected, &self.songs)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a SongRecord;
    type IntoIter = std::slice::Iter<'a, SongRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.songs.iter()
    }
}

fn validate_song(song: &SongRecord) -> Result<()> {
    if song.scales.is_empty() {
        return Err(VibeError::InvalidCatalog {
            title: song.title.clone(),
            reason: "scale list is empty".into(),
        });
    }
    if song.scales.len() != DETECTED_SCALE_COUNT {
        log::warn!(
            "vibe: '{}' lists {} scales, expected {}",
            song.title,
            song.scales.len(),
            DETECTED_SCALE_COUNT
        );
    }
    for scale in song.scales.iter().filter(|s| !is_known_scale(s)) {
        log::warn!("vibe: '{}' uses unknown scale '{}'", song.title, scale);
    }
    Ok(())
}

fn record(
    title: &str,
    artist: &str,
    movie: &str,
    year: &str,
    scales: [&str; 3],
    (vibe, tempo, energy): (&str, &str, &str),
) -> SongRecord {
    SongRecord {
        title: title.into(),
        artist: artist.into(),
        movie: movie.into(),
        year: year.into(),
        scales: scales.iter().map(|s| s.to_string()).collect(),
        vibe: vibe.into(),
        tempo: tempo.into(),
        energy: energy.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn builtin_catalog_is_valid() {
        let builtin = Catalog::builtin();
        assert_eq!(builtin.len(), 4);
        let rebuilt = Catalog::new(builtin.songs().to_vec()).unwrap();
        assert_eq!(rebuilt, builtin);
        for song in &builtin {
            assert_eq!(song.scales.len(), DETECTED_SCALE_COUNT);
            assert!(song.scales.iter().all(|s| is_known_scale(s)));
        }
    }

    #[test]
    fn builtin_order_starts_with_tum_hi_ho() {
        let builtin = Catalog::builtin();
        let titles: Vec<&str> = builtin.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["Tum Hi Ho", "Kal Ho Naa Ho", "Nagada Sang Dhol", "Ilahi"]);
    }

    #[test]
    fn empty_catalog_is_invalid_argument() {
        assert!(matches!(Catalog::new(vec![]), Err(VibeError::InvalidArgument(_))));
        assert!(matches!(Catalog::from_json("[]"), Err(VibeError::InvalidArgument(_))));
    }

    #[test]
    fn song_without_scales_is_rejected() {
        let json = r#"[{"title":"Silent","artist":"a","movie":"m","year":"2001",
            "scales":[],"vibe":"v","tempo":"t","energy":"e"}]"#;
        match Catalog::from_json(json) {
            Err(VibeError::InvalidCatalog { title, .. }) => assert_eq!(title, "Silent"),
            other => panic!("expected InvalidCatalog, got {:?}", other),
        }
    }

    #[test]
    fn short_scale_lists_are_accepted() {
        let json = r#"[{"title":"Duo","artist":"a","movie":"m","year":"2001",
            "scales":["C Major","D Minor"],"vibe":"v","tempo":"t","energy":"e"}]"#;
        let catalog = Catalog::from_json(json).unwrap();
        assert_eq!(catalog.first().scales.len(), 2);
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        assert!(matches!(Catalog::from_json("{"), Err(VibeError::Json(_))));
    }

    #[test]
    fn load_from_file() {
        let songs = Catalog::builtin().songs()[1..].to_vec();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(&songs).unwrap().as_bytes())
            .unwrap();

        let catalog = Catalog::load(file.path()).unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.first().title, "Kal Ho Naa Ho");
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = Catalog::load(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, VibeError::Io(_)));
    }
}
