//! User intents and touch gesture recognition.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Vertical travel a touch gesture must exceed to count as a swipe.
pub const MIN_SWIPE_DISTANCE: f64 = 50.0;

/// Something the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "intent", content = "value", rename_all = "snake_case")]
pub enum UserIntent {
    Advance,
    Retreat,
    SelectCard(usize),
    ToggleFreeLook,
    SetZoom(f64),
    SetVerticalPan(f64),
}

/// Error parsing a [`UserIntent`] from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntentParseError {
    #[error("unknown intent '{0}'")]
    Unknown(String),

    #[error("invalid value '{value}' for intent '{intent}'")]
    InvalidValue { intent: String, value: String },

    #[error("intent '{0}' needs a value")]
    MissingValue(String),
}

impl FromStr for UserIntent {
    type Err = IntentParseError;

    /// Parses `advance`, `retreat`, `free-look`, `select:<index>`,
    /// `zoom:<value>` and `pan:<value>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (name, value) = match s.split_once(':') {
            Some((name, value)) => (name.trim(), Some(value.trim())),
            None => (s, None),
        };

        let invalid = |value: &str| IntentParseError::InvalidValue {
            intent: name.to_string(),
            value: value.to_string(),
        };

        match name {
            "advance" | "next" => Ok(UserIntent::Advance),
            "retreat" | "prev" => Ok(UserIntent::Retreat),
            "free-look" | "freelook" => Ok(UserIntent::ToggleFreeLook),
            "select" => {
                let v = require(name, value)?;
                v.parse().map(UserIntent::SelectCard).map_err(|_| invalid(v))
            }
            "zoom" => {
                let v = require(name, value)?;
                v.parse().map(UserIntent::SetZoom).map_err(|_| invalid(v))
            }
            "pan" => {
                let v = require(name, value)?;
                v.parse().map(UserIntent::SetVerticalPan).map_err(|_| invalid(v))
            }
            other => Err(IntentParseError::Unknown(other.to_string())),
        }
    }
}

fn require<'a>(name: &str, value: Option<&'a str>) -> Result<&'a str, IntentParseError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| IntentParseError::MissingValue(name.to_string()))
}

impl fmt::Display for UserIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserIntent::Advance => write!(f, "advance"),
            UserIntent::Retreat => write!(f, "retreat"),
            UserIntent::SelectCard(i) => write!(f, "select:{i}"),
            UserIntent::ToggleFreeLook => write!(f, "free-look"),
            UserIntent::SetZoom(z) => write!(f, "zoom:{z}"),
            UserIntent::SetVerticalPan(p) => write!(f, "pan:{p}"),
        }
    }
}

/// Turns vertical touch movement into navigation intents.
///
/// Screen coordinates grow downward, so dragging a finger up (`y`
/// decreasing) advances and dragging down retreats.
#[derive(Debug, Clone, Default)]
pub struct SwipeTracker {
    start_y: Option<f64>,
    end_y: Option<f64>,
}

impl SwipeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn touch_start(&mut self, y: f64) {
        self.start_y = Some(y);
        self.end_y = None;
    }

    pub fn touch_move(&mut self, y: f64) {
        if self.start_y.is_some() {
            self.end_y = Some(y);
        }
    }

    /// Finish the gesture. A touch that never moved yields nothing.
    pub fn touch_end(&mut self) -> Option<UserIntent> {
        let start = self.start_y.take()?;
        let end = self.end_y.take()?;
        let travel = start - end;

        if travel > MIN_SWIPE_DISTANCE {
            Some(UserIntent::Advance)
        } else if travel < -MIN_SWIPE_DISTANCE {
            Some(UserIntent::Retreat)
        } else {
            None
        }
    }
}
