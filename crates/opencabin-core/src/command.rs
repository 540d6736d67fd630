//! Executable commands.
//!
//! A [`Command`] is the unit of output the skill layer hands to the
//! downstream command executor, which actually mutates vehicle state.  The
//! skill layer only produces commands; it never executes them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::DomainType;

/// A single actuation request (e.g. `set_wiper_speed`, `play_music`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Command {
    /// Command type, matching a function name known to the command executor.
    #[serde(rename = "type")]
    pub kind: String,

    /// Command parameters, keyed by parameter name.
    #[serde(default)]
    pub params: serde_json::Map<String, Value>,

    /// The domain this command originated from.
    pub domain: DomainType,

    /// Execution priority; lower values run first.
    #[serde(default)]
    pub priority: i32,
}

impl Command {
    /// Create a command with no parameters and default priority.
    pub fn new(kind: impl Into<String>, domain: DomainType) -> Self {
        Self {
            kind: kind.into(),
            params: serde_json::Map::new(),
            domain,
            priority: 0,
        }
    }

    /// Attach a parameter (builder style).
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Set the execution priority (builder style).
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// Order commands for execution: ascending priority, stable within a tier.
pub fn by_priority(commands: &mut [Command]) {
    commands.sort_by_key(|c| c.priority);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_params() {
        let cmd = Command::new("set_wiper_speed", DomainType::VehicleControl)
            .with_param("speed", "high")
            .with_priority(2);

        assert_eq!(cmd.kind, "set_wiper_speed");
        assert_eq!(cmd.params["speed"], "high");
        assert_eq!(cmd.priority, 2);
    }

    #[test]
    fn priority_ordering_is_stable() {
        let mut commands = vec![
            Command::new("b", DomainType::Music).with_priority(1),
            Command::new("a", DomainType::Music),
            Command::new("c", DomainType::Music).with_priority(1),
        ];

        by_priority(&mut commands);

        let kinds: Vec<&str> = commands.iter().map(|c| c.kind.as_str()).collect();
        assert_eq!(kinds, ["a", "b", "c"]);
    }

    #[test]
    fn serde_uses_type_field() {
        let cmd = Command::new("open_trunk", DomainType::VehicleControl);
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["type"], "open_trunk");
        assert_eq!(json["domain"], "vehicle_control");
    }
}
