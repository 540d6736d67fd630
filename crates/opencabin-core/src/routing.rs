//! Routing decisions.
//!
//! The central controller (an LLM upstream of this workspace) classifies each
//! utterance into a domain, rewrites the query so downstream models can work
//! without conversation history, and optionally attaches a parsed intent.
//! The skill orchestrator consumes the resulting [`DomainRouting`] verbatim.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::DomainType;

/// An intent parsed by the upstream classifier: which capability to run and
/// with what slot values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognizedIntent {
    /// Capability name the classifier selected (used as a resolution hint).
    pub capability: String,

    /// Extracted slot values, keyed by slot name.  Values are untrusted
    /// until validated against the capability's slot schema.
    #[serde(default)]
    pub slots: HashMap<String, Value>,

    /// Classifier confidence for this intent (0.0–1.0).
    pub confidence: f64,
}

impl RecognizedIntent {
    /// Create an intent with no slots.
    pub fn new(capability: impl Into<String>, confidence: f64) -> Self {
        Self {
            capability: capability.into(),
            slots: HashMap::new(),
            confidence,
        }
    }

    /// Attach a slot value (builder style).
    #[must_use]
    pub fn with_slot(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.slots.insert(name.into(), value.into());
        self
    }
}

/// A single domain routing decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainRouting {
    /// The domain the utterance was classified into.
    pub domain: DomainType,

    /// The raw user utterance.
    pub original_query: String,

    /// The utterance rewritten to be self-contained (context folded in).
    pub rewritten_query: String,

    /// Classification confidence (0.0–1.0).
    pub confidence: f64,

    /// Parsed intent, when the classifier produced one.  Absent for domains
    /// that operate on the rewritten text alone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<RecognizedIntent>,
}

impl DomainRouting {
    /// Create a routing with identical original/rewritten queries and no
    /// parsed intent.
    pub fn new(domain: DomainType, query: impl Into<String>, confidence: f64) -> Self {
        let query = query.into();
        Self {
            domain,
            original_query: query.clone(),
            rewritten_query: query,
            confidence,
            intent: None,
        }
    }

    /// Attach a parsed intent (builder style).
    #[must_use]
    pub fn with_intent(mut self, intent: RecognizedIntent) -> Self {
        self.intent = Some(intent);
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
