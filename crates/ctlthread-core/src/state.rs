//! Controllable thread state and priority types

use core::fmt;
use core::str::FromStr;

/// State of a controllable thread
///
/// ```text
/// Idle ──run──► Running ──pause──► Paused
///                  │   ◄──resume──   │
///                  │                 │
///          finish / terminate    terminate
///                  ▼                 ▼
///               Finished ◄───────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CtlThreadState {
    /// Created, no execution spawned yet
    Idle = 0,

    /// Execution is live and making progress
    Running = 1,

    /// Execution is live but parked
    Paused = 2,

    /// Execution ended, naturally or by termination
    Finished = 3,
}

impl CtlThreadState {
    /// An OS thread exists for this state
    #[inline]
    pub const fn is_live(&self) -> bool {
        matches!(self, CtlThreadState::Running | CtlThreadState::Paused)
    }

    /// The registry may drop an entry in this state
    #[inline]
    pub const fn is_removable(&self) -> bool {
        !self.is_live()
    }

    pub const fn name(&self) -> &'static str {
        match self {
            CtlThreadState::Idle => "idle",
            CtlThreadState::Running => "running",
            CtlThreadState::Paused => "paused",
            CtlThreadState::Finished => "finished",
        }
    }
}

impl From<u8> for CtlThreadState {
    fn from(v: u8) -> Self {
        match v {
            0 => CtlThreadState::Idle,
            1 => CtlThreadState::Running,
            2 => CtlThreadState::Paused,
            _ => CtlThreadState::Finished,
        }
    }
}

impl From<CtlThreadState> for u8 {
    fn from(state: CtlThreadState) -> u8 {
        state as u8
    }
}

impl fmt::Display for CtlThreadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Scheduling priority hint for a controllable thread
///
/// Five levels, lowest first. The runtime maps each level onto whatever
/// native hint the platform offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Priority {
    Low = 0,
    BelowNormal = 1,
    Normal = 2,
    AboveNormal = 3,
    High = 4,
}

impl Priority {
    #[inline]
    pub const fn from_index(idx: usize) -> Option<Priority> {
        match idx {
            0 => Some(Priority::Low),
            1 => Some(Priority::BelowNormal),
            2 => Some(Priority::Normal),
            3 => Some(Priority::AboveNormal),
            4 => Some(Priority::High),
            _ => None,
        }
    }

    /// Human-readable label, as shown in a priority picker
    pub const fn label(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::BelowNormal => "Below Normal",
            Priority::Normal => "Normal",
            Priority::AboveNormal => "Above Normal",
            Priority::High => "High",
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

impl From<u8> for Priority {
    fn from(v: u8) -> Self {
        Priority::from_index(v as usize).unwrap_or(Priority::Normal)
    }
}

impl From<Priority> for u8 {
    fn from(p: Priority) -> u8 {
        p as u8
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// Error returned when a priority name is not recognised
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePriorityError(pub String);

impl fmt::Display for ParsePriorityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown priority '{}'", self.0)
    }
}

impl std::error::Error for ParsePriorityError {}

impl FromStr for Priority {
    type Err = ParsePriorityError;

    /// Accepts a level index (`0`..`4`) or a label, ignoring case,
    /// spaces, dashes and underscores (`"above-normal"`, `"AboveNormal"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(idx) = s.trim().parse::<usize>() {
            return Priority::from_index(idx).ok_or_else(|| ParsePriorityError(s.to_string()));
        }
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "low" => Ok(Priority::Low),
            "belownormal" => Ok(Priority::BelowNormal),
            "normal" => Ok(Priority::Normal),
            "abovenormal" => Ok(Priority::AboveNormal),
            "high" => Ok(Priority::High),
            _ => Err(ParsePriorityError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_liveness() {
        assert!(!CtlThreadState::Idle.is_live());
        assert!(CtlThreadState::Running.is_live());
        assert!(CtlThreadState::Paused.is_live());
        assert!(!CtlThreadState::Finished.is_live());

        assert!(CtlThreadState::Idle.is_removable());
        assert!(CtlThreadState::Finished.is_removable());
        assert!(!CtlThreadState::Paused.is_removable());
    }

    #[test]
    fn test_state_u8_roundtrip() {
        for s in [
            CtlThreadState::Idle,
            CtlThreadState::Running,
            CtlThreadState::Paused,
            CtlThreadState::Finished,
        ] {
            assert_eq!(CtlThreadState::from(u8::from(s)), s);
        }
    }

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::Low < Priority::BelowNormal);
        assert!(Priority::Normal < Priority::AboveNormal);
        assert!(Priority::AboveNormal < Priority::High);
        assert_eq!(Priority::from(4u8), Priority::High);
        assert_eq!(Priority::from(200u8), Priority::Normal);
    }

    #[test]
    fn test_priority_parse() {
        assert_eq!("High".parse::<Priority>(), Ok(Priority::High));
        assert_eq!("below normal".parse::<Priority>(), Ok(Priority::BelowNormal));
        assert_eq!("above-normal".parse::<Priority>(), Ok(Priority::AboveNormal));
        assert_eq!("0".parse::<Priority>(), Ok(Priority::Low));
        assert!("9".parse::<Priority>().is_err());
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn test_priority_labels() {
        assert_eq!(Priority::BelowNormal.to_string(), "Below Normal");
        assert_eq!(Priority::default(), Priority::Normal);
    }
}
