//! Session commands.
//!
//! Tagged enum so front ends (FFI, scripts) can drive a session with a
//! single JSON message: `{"action": "start_capture"}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SessionCommand {
    StartCapture,
    CancelOrReset,
    CompleteCapture { detected: Vec<String> },
    ToggleLike,
}

impl SessionCommand {
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn from_value(v: &Value) -> Option<Self> {
        serde_json::from_value(v.clone()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_json() {
        let cmd = SessionCommand::from_value(&serde_json::json!({
            "action": "complete_capture",
            "detected": ["C Major", "A Minor", "F Major"]
        }));
        assert_eq!(
            cmd,
            Some(SessionCommand::CompleteCapture {
                detected: vec!["C Major".into(), "A Minor".into(), "F Major".into()]
            })
        );
        assert_eq!(
            SessionCommand::StartCapture.to_value(),
            serde_json::json!({"action": "start_capture"})
        );
    }

    #[test]
    fn unknown_action_is_none() {
        assert!(SessionCommand::from_value(&serde_json::json!({"action": "play"})).is_none());
    }
}
