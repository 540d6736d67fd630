//! Session context: vehicle state and conversation history.
//!
//! The context is a read-only view handed to capability handlers.  Handlers
//! express state changes by returning [`crate::command::Command`]s; they never
//! mutate the context directly.

use serde::{Deserialize, Serialize};

use crate::domain::DomainType;
use crate::llm::Message;

/// Air-conditioning operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcMode {
    Cool,
    Heat,
    Auto,
    Ventilation,
}

/// Wiper sweep speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WiperSpeed {
    Low,
    Medium,
    High,
}

/// Media playback order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackMode {
    Sequential,
    Shuffle,
    RepeatOne,
}

/// Route planning preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutePreference {
    Fastest,
    Shortest,
    NoHighway,
}

/// Air-conditioning state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcState {
    pub is_on: bool,
    /// Target temperature in degrees Celsius.
    pub temperature: f64,
    pub mode: AcMode,
    /// Fan speed, 1–5.
    pub fan_speed: u8,
}

/// Window openness per position, 0 (closed) to 100 (fully open).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WindowState {
    pub front_left: u8,
    pub front_right: u8,
    pub rear_left: u8,
    pub rear_right: u8,
}

/// Seat heating/ventilation levels, 0 (off) to 3.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeatState {
    pub driver_heating: u8,
    pub driver_ventilation: u8,
    pub passenger_heating: u8,
    pub passenger_ventilation: u8,
}

/// Interior lighting state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LightState {
    pub ambient_on: bool,
    /// Ambient color as a hex string (`#RRGGBB`).
    pub ambient_color: String,
    pub reading_on: bool,
}

/// Wiper state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WiperState {
    pub is_on: bool,
    pub speed: WiperSpeed,
}

/// Media playback state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MusicState {
    pub is_playing: bool,
    pub track: String,
    /// Volume, 0–100.
    pub volume: u8,
    pub mode: PlaybackMode,
}

/// Navigation state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationState {
    pub is_active: bool,
    pub destination: String,
    pub route_preference: RoutePreference,
}

/// Traction battery state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatteryState {
    /// Charge level, 0–100.
    pub level: u8,
    /// Estimated remaining range in kilometers.
    pub range_km: u32,
}

/// Complete cabin state snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleState {
    pub ac: AcState,
    pub windows: WindowState,
    pub seats: SeatState,
    pub lights: LightState,
    pub trunk_open: bool,
    pub wiper: WiperState,
    pub music: MusicState,
    pub navigation: NavigationState,
    pub battery: BatteryState,
}

impl Default for VehicleState {
    /// A plausible parked-vehicle baseline: everything off, windows closed,
    /// battery at 78%.
    fn default() -> Self {
        Self {
            ac: AcState {
                is_on: false,
                temperature: 26.0,
                mode: AcMode::Auto,
                fan_speed: 3,
            },
            windows: WindowState::default(),
            seats: SeatState::default(),
            lights: LightState {
                ambient_on: false,
                ambient_color: "#FFFFFF".to_owned(),
                reading_on: false,
            },
            trunk_open: false,
            wiper: WiperState {
                is_on: false,
                speed: WiperSpeed::Low,
            },
            music: MusicState {
                is_playing: false,
                track: String::new(),
                volume: 50,
                mode: PlaybackMode::Sequential,
            },
            navigation: NavigationState {
                is_active: false,
                destination: String::new(),
                route_preference: RoutePreference::Fastest,
            },
            battery: BatteryState {
                level: 78,
                range_km: 320,
            },
        }
    }
}

/// Execution context handed to capability handlers.
#[derive(Debug, Clone, Default)]
pub struct SkillContext {
    /// Current cabin state.
    pub vehicle_state: VehicleState,

    /// Recent conversation turns, oldest first.
    pub dialog_history: Vec<Message>,

    /// The domain handled in the previous turn, if any.
    pub previous_domain: Option<DomainType>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_parked() {
        let state = VehicleState::default();
        assert!(!state.ac.is_on);
        assert!(!state.music.is_playing);
        assert_eq!(state.windows.front_left, 0);
        assert_eq!(state.battery.level, 78);
    }

    #[test]
    fn state_round_trips_through_json() {
        let state = VehicleState::default();
        let json = serde_json::to_string(&state).unwrap();
        let back: VehicleState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.ac.temperature, 26.0);
        assert_eq!(back.wiper.speed, WiperSpeed::Low);
    }
}
