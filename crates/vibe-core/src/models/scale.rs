//! Scale labels.
//!
//! Labels are opaque strings. The only structure this crate relies on is
//! exact equality and membership in the fixed universe below.

/// Every label the capture simulator can "detect".
pub const SCALE_UNIVERSE: [&str; 10] = [
    "C Major", "D Minor", "E Minor", "F Major", "G Major", "A Minor", "B Minor", "C# Minor",
    "F# Major", "Bb Major",
];

/// Size of a detected-scales set, and the fixed denominator of the match
/// percentage.
pub const DETECTED_SCALE_COUNT: usize = 3;

/// True if `label` is one of the ten universe labels.
pub fn is_known_scale(label: &str) -> bool {
    SCALE_UNIVERSE.contains(&label)
}
