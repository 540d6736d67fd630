//! Capability execution.
//!
//! The executor binds capability handler references to host-supplied
//! [`CapabilityHandler`] implementations and runs exactly one attempt per
//! request: resolve the capability through the registry's current snapshot,
//! validate the untrusted slot values against its schema, then invoke the
//! bound handler.  Validation failures stop the request before the handler
//! is ever called; handler faults are wrapped, never swallowed, and never
//! retried here — retry policy belongs to the host.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use opencabin_core::{Command, SkillContext};

use crate::error::{Result, SkillError};
use crate::registry::FileBasedSkillRegistry;
use crate::types::ParsedCapability;

// ---------------------------------------------------------------------------
// Handler contract
// ---------------------------------------------------------------------------

/// The result of running one capability.
#[derive(Debug, Clone, Default)]
pub struct ExecutionOutcome {
    /// Commands for the downstream command executor.
    pub commands: Vec<Command>,
    /// Spoken acknowledgment, when the handler produced one.
    pub tts_text: Option<String>,
}

impl ExecutionOutcome {
    /// An outcome with no commands and no speech.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Append a command (builder style).
    #[must_use]
    pub fn with_command(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    /// Set the spoken acknowledgment (builder style).
    #[must_use]
    pub fn with_tts(mut self, tts: impl Into<String>) -> Self {
        self.tts_text = Some(tts.into());
        self
    }
}

/// A host-supplied capability implementation.
///
/// Handlers receive slot values already validated against the capability's
/// schema, plus the session context.  They are the extension point through
/// which skill packages gain actual effects.
#[async_trait]
pub trait CapabilityHandler: Send + Sync {
    /// Run the capability once.
    async fn handle(
        &self,
        slots: &HashMap<String, Value>,
        context: &SkillContext,
    ) -> anyhow::Result<ExecutionOutcome>;
}

/// One execution request.
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    /// The capability to run.
    pub capability_name: String,
    /// Untrusted slot values from the routing's parsed intent.
    pub raw_slots: HashMap<String, Value>,
    /// Session context handed through to the handler.
    pub context: SkillContext,
}

// ---------------------------------------------------------------------------
// Executor
// ---------------------------------------------------------------------------

/// Binds handler references to handlers and executes capabilities.
pub struct SkillExecutor {
    /// Handler table keyed by `handler_ref`.  Rebinding a key overwrites the
    /// previous handler (last-writer-wins), so tests and hot-reload flows
    /// can swap implementations in place.
    handlers: DashMap<String, Arc<dyn CapabilityHandler>>,
}

impl SkillExecutor {
    /// Create an executor with an empty handler table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: DashMap::new(),
        }
    }

    /// Bind a handler to a capability handler reference.
    pub fn register_handler(&self, name: impl Into<String>, handler: Arc<dyn CapabilityHandler>) {
        let name = name.into();
        if self.handlers.insert(name.clone(), handler).is_some() {
            tracing::debug!(handler = %name, "handler rebound");
        } else {
            tracing::debug!(handler = %name, "handler registered");
        }
    }

    /// Remove a binding.  Returns whether one existed.
    pub fn remove_handler(&self, name: &str) -> bool {
        self.handlers.remove(name).is_some()
    }

    /// Number of bound handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Drop every binding.
    pub fn clear(&self) {
        self.handlers.clear();
    }

    /// Execute one request against the registry's current snapshot.
    ///
    /// Order: capability lookup, slot validation, handler lookup, single
    /// handler invocation.  The first slot violation aborts with
    /// [`SkillError::SlotValidation`] before the handler runs.
    pub async fn execute(
        &self,
        registry: &FileBasedSkillRegistry,
        request: &ExecutionRequest,
    ) -> Result<ExecutionOutcome> {
        let capability = registry
            .capability(&request.capability_name)
            .await?
            .ok_or_else(|| SkillError::CapabilityNotFound {
                name: request.capability_name.clone(),
            })?;

        validate_slots(&capability, &request.raw_slots)?;

        let handler = self
            .handlers
            .get(&capability.handler_ref)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| SkillError::HandlerNotRegistered {
                capability: capability.handler_ref.clone(),
            })?;

        tracing::debug!(
            capability = %capability.capability_name,
            package = %capability.package_name,
            "invoking capability handler"
        );

        handler
            .handle(&request.raw_slots, &request.context)
            .await
            .map_err(|source| SkillError::HandlerExecution {
                capability: capability.capability_name.clone(),
                source,
            })
    }
}

impl Default for SkillExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate raw slot values against the capability's slot schema.
///
/// Slots the schema does not name pass through untouched — the schema
/// constrains what it declares, it is not a closed world.  Missing, null,
/// and empty-string values count as absent.
fn validate_slots(capability: &ParsedCapability, slots: &HashMap<String, Value>) -> Result<()> {
    let mut definitions: Vec<_> = capability.slots.values().collect();
    definitions.sort_by(|a, b| a.name.cmp(&b.name));

    for definition in definitions {
        let value = slots.get(&definition.name);
        let present = match value {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        };

        if !present {
            if definition.required {
                return Err(SkillError::SlotValidation {
                    slot: definition.name.clone(),
                    reason: "required slot is missing".to_owned(),
                });
            }
            continue;
        }

        if let Some(value) = value {
            definition
                .validate(value)
                .map_err(|reason| SkillError::SlotValidation {
                    slot: definition.name.clone(),
                    reason,
                })?;
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Process-wide singleton
// ---------------------------------------------------------------------------

static GLOBAL_EXECUTOR: Mutex<Option<Arc<SkillExecutor>>> = Mutex::new(None);

/// Return the process-wide executor, creating it on first access.
///
/// Its lifecycle is independent of the registry singleton: resetting one
/// does not reset the other.
pub fn global_executor() -> Arc<SkillExecutor> {
    GLOBAL_EXECUTOR
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .get_or_insert_with(|| Arc::new(SkillExecutor::new()))
        .clone()
}

/// Destroy the process-wide executor; the next [`global_executor`] call
/// creates a fresh instance with an empty handler table.
pub fn reset_global_executor() {
    GLOBAL_EXECUTOR
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .take();
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
