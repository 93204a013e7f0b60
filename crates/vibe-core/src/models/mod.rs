//! VibeAlchemy data models.
//!
//! Scale labels stay plain strings; songs are small serde records; the
//! command enum exists for tagged JSON dispatch from front ends.

pub mod command;
pub mod scale;
pub mod song;

pub use command::SessionCommand;
pub use scale::{is_known_scale, DETECTED_SCALE_COUNT, SCALE_UNIVERSE};
pub use song::SongRecord;
