//! Assistant domains.
//!
//! Every user utterance is classified upstream into exactly one domain
//! before it reaches the skill layer.  The set is closed: adding a domain
//! is a deliberate product decision, not a runtime event.

use serde::{Deserialize, Serialize};

/// The domain a routing decision (and every skill package) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainType {
    /// Cabin hardware: AC, windows, seats, lights, wipers, trunk.
    VehicleControl,
    /// Media playback and volume.
    Music,
    /// Route planning and guidance.
    Navigation,
    /// Open-ended conversation with no command side effects.
    Chat,
}

impl DomainType {
    /// All domains, in routing-priority order.
    pub const ALL: [Self; 4] = [
        Self::VehicleControl,
        Self::Music,
        Self::Navigation,
        Self::Chat,
    ];

    /// The wire-format name (`vehicle_control`, `music`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VehicleControl => "vehicle_control",
            Self::Music => "music",
            Self::Navigation => "navigation",
            Self::Chat => "chat",
        }
    }
}

impl std::fmt::Display for DomainType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unrecognized domain name.
#[derive(Debug, thiserror::Error)]
#[error("unknown domain: `{0}`")]
pub struct UnknownDomain(pub String);

impl std::str::FromStr for DomainType {
    type Err = UnknownDomain;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vehicle_control" => Ok(Self::VehicleControl),
            "music" => Ok(Self::Music),
            "navigation" => Ok(Self::Navigation),
            "chat" => Ok(Self::Chat),
            other => Err(UnknownDomain(other.to_owned())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
