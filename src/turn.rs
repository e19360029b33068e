//! Turn ownership shared by the controller and the front-end
//!
//! Exactly one process acts per turn. The front-end owns `Listen`
//! (capture, transcribe, complete), the controller owns `Respond`
//! (speak the reply and hand the turn back).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Which process currently has the right to act
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Turn {
    /// Front-end is capturing input; controller idles
    #[default]
    Listen,
    /// Controller is delivering the response; front-end idles
    Respond,
}

impl Turn {
    /// Literal token persisted in the control record
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Listen => "listen",
            Self::Respond => "respond",
        }
    }
}

impl fmt::Display for Turn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Turn {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "listen" => Ok(Self::Listen),
            "respond" => Ok(Self::Respond),
            other => Err(Error::Store(format!("unknown turn token: {other:?}"))),
        }
    }
}

/// On-disk control record: `{"turn": "listen"}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ControlRecord {
    pub turn: Turn,
}

/// Readiness predicate for the response payload
///
/// A payload is ready iff it is non-empty after trimming whitespace.
/// Identical consecutive replies are therefore always delivered.
#[must_use]
pub fn is_ready(payload: &str) -> bool {
    !payload.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_record_wire_format() {
        let record = ControlRecord { turn: Turn::Respond };
        assert_eq!(serde_json::to_string(&record).unwrap(), r#"{"turn":"respond"}"#);

        let parsed: ControlRecord = serde_json::from_str(r#"{"turn": "listen"}"#).unwrap();
        assert_eq!(parsed.turn, Turn::Listen);
    }

    #[test]
    fn test_unknown_token_rejected() {
        assert!(serde_json::from_str::<ControlRecord>(r#"{"turn": "LISTEN"}"#).is_err());
        assert!("speak".parse::<Turn>().is_err());
        assert_eq!(" respond\n".parse::<Turn>().unwrap(), Turn::Respond);
    }

    #[test]
    fn test_readiness() {
        assert!(!is_ready(""));
        assert!(!is_ready("  \n\t"));
        assert!(is_ready("Hello ^start(g1) world"));
    }

    #[test]
    fn test_default_is_listen() {
        assert_eq!(Turn::default(), Turn::Listen);
        assert_eq!(Turn::Listen.to_string(), "listen");
    }
}
