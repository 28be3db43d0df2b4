//! What an entity currently is.

use std::fmt;

use serde::{Deserialize, Serialize};

/// State of an entity as the hub believes it.
///
/// Write-only devices never report back, so `On`/`Off` may be assumed rather
/// than observed; see the entity's `assumed_state` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityState {
    On,
    Off,
    #[default]
    Unknown,
    Unavailable,
}

impl EntityState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
            Self::Unknown => "unknown",
            Self::Unavailable => "unavailable",
        }
    }

    #[must_use]
    pub fn is_on(self) -> bool {
        self == Self::On
    }

    /// Anything but [`Unavailable`](Self::Unavailable).
    #[must_use]
    pub fn is_available(self) -> bool {
        self != Self::Unavailable
    }
}

impl From<bool> for EntityState {
    fn from(on: bool) -> Self {
        if on { Self::On } else { Self::Off }
    }
}

impl fmt::Display for EntityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
