//! The three-valued traffic light signal.

use serde::{Deserialize, Serialize};
use std::fmt;

/// State of a single traffic light.
///
/// # Example
///
/// ```rust
/// use crosslight::core::LightState;
///
/// assert_eq!(LightState::Green.next(), LightState::Yellow);
/// assert_eq!(LightState::Yellow.next(), LightState::Red);
/// assert_eq!(LightState::Red.next(), LightState::Green);
///
/// assert!(LightState::Green.allows_traffic());
/// assert!(!LightState::Yellow.allows_traffic());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum LightState {
    Red,
    Yellow,
    Green,
}

impl LightState {
    /// The next state in the standard cycle: Green -> Yellow -> Red -> Green.
    pub fn next(&self) -> LightState {
        match self {
            LightState::Green => LightState::Yellow,
            LightState::Yellow => LightState::Red,
            LightState::Red => LightState::Green,
        }
    }

    /// Whether this state allows traffic to proceed (pure).
    ///
    /// Only green allows traffic; yellow is a caution interval, not a go.
    pub fn allows_traffic(&self) -> bool {
        matches!(self, LightState::Green)
    }

    /// Human-readable meaning of the signal.
    pub fn description(&self) -> &'static str {
        match self {
            LightState::Red => "Stop",
            LightState::Yellow => "Caution",
            LightState::Green => "Go",
        }
    }
}

impl fmt::Display for LightState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LightState::Red => write!(f, "Red"),
            LightState::Yellow => write!(f, "Yellow"),
            LightState::Green => write!(f, "Green"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_returns_to_start_after_three_steps() {
        let mut state = LightState::Red;
        for _ in 0..3 {
            state = state.next();
        }
        assert_eq!(state, LightState::Red);
    }

    #[test]
    fn only_green_allows_traffic() {
        assert!(LightState::Green.allows_traffic());
        assert!(!LightState::Yellow.allows_traffic());
        assert!(!LightState::Red.allows_traffic());
    }

    #[test]
    fn descriptions_match_signal_meaning() {
        assert_eq!(LightState::Red.description(), "Stop");
        assert_eq!(LightState::Yellow.description(), "Caution");
        assert_eq!(LightState::Green.description(), "Go");
    }
}
