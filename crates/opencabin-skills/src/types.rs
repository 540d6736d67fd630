//! Skill data model.
//!
//! Three layers of data describe a skill package, matching the three load
//! tiers:
//!
//! 1. [`SkillMetadata`] — the lightweight descriptor, resident from discovery
//!    onward.
//! 2. [`SkillInstructions`] — the opaque instruction document, loaded on
//!    first use.
//! 3. [`ParsedCapability`] — the normalized capability schema the registry
//!    indexes and the executor validates against.
//!
//! Installed values are immutable; corrections require a full reload.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use opencabin_core::DomainType;

/// Default per-capability confidence floor, mirroring the domain handlers'
/// rejection threshold.
pub const DEFAULT_CONFIDENCE_FLOOR: f64 = 0.3;

// ---------------------------------------------------------------------------
// Tier 1 — metadata
// ---------------------------------------------------------------------------

/// A one-line capability advertisement carried by the metadata descriptor.
///
/// Summaries are what discovery UIs and the capability index see before any
/// schema file is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySummary {
    /// Capability name, unique within the package.
    pub name: String,
    /// Short human-readable description.
    pub short_description: String,
}

/// The lightweight package descriptor (Tier 1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillMetadata {
    /// Package name, unique across all loaded packages.
    pub name: String,
    /// The domain every capability in this package belongs to.
    pub domain: DomainType,
    /// Package version string.
    pub version: String,
    /// One-line package description.
    pub summary: String,
    /// Whether the package participates in discovery.
    pub enabled: bool,
    /// Capability advertisements.
    pub capability_summaries: Vec<CapabilitySummary>,
}

// ---------------------------------------------------------------------------
// Tier 2 — instructions
// ---------------------------------------------------------------------------

/// The opaque instruction document (Tier 2), loaded at most once per package
/// per registry epoch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillInstructions {
    /// Raw document text.
    pub content: String,
}

// ---------------------------------------------------------------------------
// Tier 3 — capability schema
// ---------------------------------------------------------------------------

/// The type of a capability slot.  Each tag has its own validation function;
/// there is no structural duck-typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotType {
    String,
    Number,
    Boolean,
    Enum,
}

impl std::fmt::Display for SlotType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Number => write!(f, "number"),
            Self::Boolean => write!(f, "boolean"),
            Self::Enum => write!(f, "enum"),
        }
    }
}

/// Inclusive numeric bounds for a [`SlotType::Number`] slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlotConstraints {
    pub min: f64,
    pub max: f64,
}

/// One slot of a capability: a named, typed parameter extracted from the
/// user's utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotDefinition {
    /// Slot name.
    pub name: String,

    /// Declared value type.
    pub slot_type: SlotType,

    /// Whether execution requires this slot to be present.
    pub required: bool,

    /// Allowed values for [`SlotType::Enum`] slots; empty otherwise.
    #[serde(default)]
    pub enum_values: Vec<String>,

    /// Bounds for [`SlotType::Number`] slots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<SlotConstraints>,
}

impl SlotDefinition {
    /// Validate a raw value against this slot's declared type.
    ///
    /// Returns the violation reason on mismatch.  Presence/absence is the
    /// caller's concern; this only judges a value that is present.
    pub fn validate(&self, value: &Value) -> std::result::Result<(), String> {
        match self.slot_type {
            SlotType::String => {
                if !value.is_string() {
                    return Err(format!("expected string, got {}", type_name(value)));
                }
            }
            SlotType::Number => {
                let Some(n) = value.as_f64() else {
                    return Err(format!("expected number, got {}", type_name(value)));
                };
                if !n.is_finite() {
                    return Err("expected a finite number".to_owned());
                }
                if let Some(c) = &self.constraints
                    && !(c.min..=c.max).contains(&n)
                {
                    return Err(format!("{n} outside allowed range [{}, {}]", c.min, c.max));
                }
            }
            SlotType::Boolean => {
                if !value.is_boolean() {
                    return Err(format!("expected boolean, got {}", type_name(value)));
                }
            }
            SlotType::Enum => {
                let Some(s) = value.as_str() else {
                    return Err(format!("expected enum string, got {}", type_name(value)));
                };
                if !self.enum_values.iter().any(|v| v == s) {
                    return Err(format!(
                        "`{s}` is not one of [{}]",
                        self.enum_values.join(", ")
                    ));
                }
            }
        }
        Ok(())
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A normalized, registry-stored capability (Tier 3).
///
/// Metadata and schema data are both folded into this form; it is the unit
/// the registry's capability index hands to the executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedCapability {
    /// Owning package name.
    pub package_name: String,
    /// Capability name, unique within the package.
    pub capability_name: String,
    /// Domain inherited from the package metadata.
    pub domain: DomainType,
    /// Slot schema, keyed by slot name.
    pub slots: HashMap<String, SlotDefinition>,
    /// Lookup key into the executor's handler table.  A weak reference: the
    /// handler object itself is supplied by the host application.
    pub handler_ref: String,
    /// Minimum routing confidence required to execute this capability.
    pub confidence_floor: f64,
}

// ---------------------------------------------------------------------------
// Progressive disclosure
// ---------------------------------------------------------------------------

/// How much of a package has been materialized.
///
/// Escalation is monotonic and on-demand: discovery leaves every package at
/// [`LoadTier::MetadataOnly`]; instructions and capability schemas are read
/// only when a capability from the package is actually being considered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LoadTier {
    /// Tier 1: descriptor only — cheap, used for discovery and listing.
    MetadataOnly,
    /// Tier 2: instruction document read and cached.
    WithInstructions,
    /// Tier 3: capability schema parsed and cached.
    FullyLoaded,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn slot(slot_type: SlotType) -> SlotDefinition {
        SlotDefinition {
            name: "s".into(),
            slot_type,
            required: false,
            enum_values: Vec::new(),
            constraints: None,
        }
    }

    #[test]
    fn string_slot_rejects_numbers() {
        assert!(slot(SlotType::String).validate(&json!("ok")).is_ok());
        assert!(slot(SlotType::String).validate(&json!(3)).is_err());
    }

    #[test]
    fn number_slot_honors_constraints() {
        let mut def = slot(SlotType::Number);
        def.constraints = Some(SlotConstraints { min: 16.0, max: 30.0 });

        assert!(def.validate(&json!(16)).is_ok());
        assert!(def.validate(&json!(30.0)).is_ok());
        assert!(def.validate(&json!(31)).is_err());
        assert!(def.validate(&json!("26")).is_err());
    }

    #[test]
    fn boolean_slot() {
        assert!(slot(SlotType::Boolean).validate(&json!(true)).is_ok());
        assert!(slot(SlotType::Boolean).validate(&json!("true")).is_err());
    }

    #[test]
    fn enum_slot_requires_membership() {
        let mut def = slot(SlotType::Enum);
        def.enum_values = vec!["low".into(), "medium".into(), "high".into()];

        assert!(def.validate(&json!("medium")).is_ok());
        let err = def.validate(&json!("turbo")).unwrap_err();
        assert!(err.contains("turbo"));
    }

    #[test]
    fn tiers_are_ordered() {
        assert!(LoadTier::MetadataOnly < LoadTier::WithInstructions);
        assert!(LoadTier::WithInstructions < LoadTier::FullyLoaded);
    }
}
