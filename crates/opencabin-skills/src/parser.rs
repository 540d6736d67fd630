//! Descriptor and schema parsing.
//!
//! Two file formats feed the skill system:
//!
//! - `skill.yaml` — the Tier-1 metadata descriptor, parsed through the
//!   in-crate YAML subset into [`SkillMetadata`].
//! - `capabilities.json` — the optional Tier-3 capability schema, parsed
//!   into normalized [`ParsedCapability`] values.
//!
//! Raw deserialization only checks shape; the guard functions here enforce
//! the structural invariants (required fields, enum slots carry values,
//! sane numeric bounds, unique names) before anything reaches the registry.

use std::path::Path;

use serde::Deserialize;

use opencabin_core::DomainType;

use crate::error::{Result, SkillError};
use crate::types::{
    CapabilitySummary, DEFAULT_CONFIDENCE_FLOOR, ParsedCapability, SkillMetadata, SlotConstraints,
    SlotDefinition, SlotType,
};
use crate::yaml::parse_yaml;

// ---------------------------------------------------------------------------
// Raw descriptor structures
// ---------------------------------------------------------------------------

/// Raw metadata shape as read from `skill.yaml`.
#[derive(Debug, Deserialize)]
struct RawMetadata {
    name: Option<String>,
    domain: Option<String>,
    version: Option<String>,
    #[serde(alias = "description")]
    summary: Option<String>,
    enabled: Option<bool>,
    #[serde(default)]
    capabilities: Vec<RawCapabilitySummary>,
}

#[derive(Debug, Deserialize)]
struct RawCapabilitySummary {
    name: Option<String>,
    #[serde(alias = "description")]
    short_description: Option<String>,
}

/// Raw schema shape as read from `capabilities.json`.
#[derive(Debug, Deserialize)]
struct RawCapabilitySchema {
    #[serde(default)]
    capabilities: Vec<RawCapability>,
}

#[derive(Debug, Deserialize)]
struct RawCapability {
    name: Option<String>,
    #[serde(default)]
    slots: Vec<RawSlot>,
    #[serde(alias = "handler")]
    handler_ref: Option<String>,
    confidence_floor: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawSlot {
    name: Option<String>,
    #[serde(rename = "type")]
    slot_type: SlotType,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    enum_values: Vec<String>,
    min: Option<f64>,
    max: Option<f64>,
}

// ---------------------------------------------------------------------------
// Metadata parsing (Tier 1)
// ---------------------------------------------------------------------------

/// Parse a metadata descriptor.
///
/// `fallback_name` (the package directory name) is used when the descriptor
/// omits `name`.  Missing or ill-typed required fields are reported as
/// [`SkillError::MetadataInvalid`] with the file path attached.
pub fn parse_metadata(content: &str, path: &Path, fallback_name: &str) -> Result<SkillMetadata> {
    let invalid = |reason: String| SkillError::MetadataInvalid {
        path: path.to_path_buf(),
        reason,
    };

    let value = parse_yaml(content).map_err(|e| invalid(format!("yaml parse error: {e}")))?;
    let raw: RawMetadata =
        serde_json::from_value(value).map_err(|e| invalid(format!("descriptor shape: {e}")))?;

    let name = match raw.name {
        Some(n) if !n.trim().is_empty() => n,
        _ => fallback_name.to_owned(),
    };
    if name.trim().is_empty() {
        return Err(invalid("missing required field `name`".to_owned()));
    }

    let domain: DomainType = raw
        .domain
        .ok_or_else(|| invalid("missing required field `domain`".to_owned()))?
        .parse()
        .map_err(|e| invalid(format!("{e}")))?;

    let mut capability_summaries = Vec::with_capacity(raw.capabilities.len());
    for cap in raw.capabilities {
        let cap_name = cap
            .name
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| invalid("capability entry without a `name`".to_owned()))?;
        capability_summaries.push(CapabilitySummary {
            name: cap_name,
            short_description: cap.short_description.unwrap_or_default(),
        });
    }

    Ok(SkillMetadata {
        summary: raw.summary.unwrap_or_else(|| format!("Skill: {name}")),
        version: raw.version.unwrap_or_else(|| "0.0.0".to_owned()),
        enabled: raw.enabled.unwrap_or(true),
        name,
        domain,
        capability_summaries,
    })
}

// ---------------------------------------------------------------------------
// Capability schema parsing (Tier 3)
// ---------------------------------------------------------------------------

/// Parse and normalize a capability schema file for the given package.
///
/// Structural violations surface as [`SkillError::SchemaInvalid`]; nothing
/// partially parsed is ever returned.
pub fn parse_capabilities(content: &str, metadata: &SkillMetadata) -> Result<Vec<ParsedCapability>> {
    let invalid = |reason: String| SkillError::SchemaInvalid {
        package: metadata.name.clone(),
        reason,
    };

    let raw: RawCapabilitySchema =
        serde_json::from_str(content).map_err(|e| invalid(format!("schema shape: {e}")))?;

    if raw.capabilities.is_empty() {
        return Err(invalid("schema declares no capabilities".to_owned()));
    }

    let mut parsed = Vec::with_capacity(raw.capabilities.len());
    for cap in raw.capabilities {
        parsed.push(to_parsed_capability(cap, metadata).map_err(invalid)?);
    }

    // Capability names must be unique within the package.
    for (i, cap) in parsed.iter().enumerate() {
        if parsed[..i].iter().any(|p| p.capability_name == cap.capability_name) {
            return Err(invalid(format!(
                "duplicate capability name `{}`",
                cap.capability_name
            )));
        }
    }

    Ok(parsed)
}

/// Convert one raw capability into its normalized form, checking the
/// structural invariants the raw shape cannot express.
fn to_parsed_capability(
    raw: RawCapability,
    metadata: &SkillMetadata,
) -> std::result::Result<ParsedCapability, String> {
    let name = raw
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| "capability without a `name`".to_owned())?;

    let confidence_floor = raw.confidence_floor.unwrap_or(DEFAULT_CONFIDENCE_FLOOR);
    if !(0.0..=1.0).contains(&confidence_floor) {
        return Err(format!(
            "capability `{name}`: confidence_floor {confidence_floor} outside [0, 1]"
        ));
    }

    let mut slots = std::collections::HashMap::with_capacity(raw.slots.len());
    for slot in raw.slots {
        let slot = to_slot_definition(slot).map_err(|e| format!("capability `{name}`: {e}"))?;
        if slots.insert(slot.name.clone(), slot).is_some() {
            return Err(format!("capability `{name}`: duplicate slot name"));
        }
    }

    Ok(ParsedCapability {
        package_name: metadata.name.clone(),
        capability_name: name.clone(),
        domain: metadata.domain,
        slots,
        handler_ref: raw.handler_ref.unwrap_or(name),
        confidence_floor,
    })
}

/// Convert one raw slot, enforcing per-type invariants.
fn to_slot_definition(raw: RawSlot) -> std::result::Result<SlotDefinition, String> {
    let name = raw
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| "slot without a `name`".to_owned())?;

    if raw.slot_type == SlotType::Enum && raw.enum_values.is_empty() {
        return Err(format!("enum slot `{name}` declares no enum_values"));
    }

    let constraints = match (raw.min, raw.max) {
        (None, None) => None,
        (min, max) => {
            if raw.slot_type != SlotType::Number {
                return Err(format!("slot `{name}`: min/max only apply to number slots"));
            }
            let min = min.unwrap_or(f64::NEG_INFINITY);
            let max = max.unwrap_or(f64::INFINITY);
            if min > max {
                return Err(format!("slot `{name}`: min {min} exceeds max {max}"));
            }
            Some(SlotConstraints { min, max })
        }
    };

    Ok(SlotDefinition {
        name,
        slot_type: raw.slot_type,
        required: raw.required,
        enum_values: raw.enum_values,
        constraints,
    })
}

/// Build the fallback capability for a package without a schema file: one
/// slot-free capability named after the package, so simple packages stay
/// usable without boilerplate.
pub fn synthesize_capability(metadata: &SkillMetadata) -> ParsedCapability {
    ParsedCapability {
        package_name: metadata.name.clone(),
        capability_name: metadata.name.clone(),
        domain: metadata.domain,
        slots: std::collections::HashMap::new(),
        handler_ref: metadata.name.clone(),
        confidence_floor: DEFAULT_CONFIDENCE_FLOOR,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
