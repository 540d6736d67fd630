//! Skill orchestration.
//!
//! The orchestrator is the last layer before user-facing output.  Given a
//! routing decision and a session context it runs one request through
//! `Routed -> Resolving -> (Executing | Bypassed) -> Completed`:
//!
//! 1. Reject low-confidence routings before any registry work.
//! 2. Echo bypassed domains verbatim (a staged-rollout path for domains
//!    that operate on rewritten text without a skill package yet).
//! 3. Resolve a capability from the registry, escalating the selected
//!    package to Tier 3.
//! 4. Execute through the executor and map the outcome to commands + TTS.
//!
//! Resolution and execution errors are absorbed here into apologetic
//! results — callers observe "no commands, apologetic text", never a thrown
//! fault.  Only internal infrastructure errors propagate as `Err`; they
//! indicate misconfiguration, not a normal no-match.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use uuid::Uuid;

use opencabin_core::{Command, DomainRouting, DomainType, SkillContext};

use crate::error::{Result, SkillError};
use crate::executor::{ExecutionRequest, SkillExecutor, global_executor};
use crate::registry::{FileBasedSkillRegistry, global_registry};

/// How a request completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// A capability was resolved, validated, and executed.
    Executed,
    /// The domain is configured to skip capability resolution; the
    /// rewritten query was echoed back.
    Bypassed,
    /// The routing (or resolved capability) confidence was below its floor.
    LowConfidence,
    /// No capability could be resolved for the domain.
    NoMatch,
    /// A capability was resolved but validation or the handler failed.
    HandlerFailed,
}

/// The unified per-request result.
#[derive(Debug, Clone)]
pub struct OrchestrationResult {
    /// How the request completed.
    pub disposition: Disposition,
    /// Commands for the downstream command executor; empty unless
    /// [`Disposition::Executed`].
    pub commands: Vec<Command>,
    /// Spoken response — an acknowledgment, an echo, or an apology.  Never
    /// empty.
    pub tts_text: String,
    /// Confidence carried over from the routing decision.
    pub confidence: f64,
    /// Correlation id for tracing this request through the logs.
    pub request_id: Uuid,
}

/// Orchestrator tuning.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Routings below this confidence are rejected without registry work.
    pub confidence_floor: f64,
    /// Domains that skip capability resolution and echo the rewritten query.
    pub bypass_domains: HashSet<DomainType>,
    /// Spoken fallback for rejected and failed requests.
    pub apology: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            confidence_floor: 0.3,
            bypass_domains: HashSet::from([DomainType::Music, DomainType::Navigation]),
            apology: "Sorry, I couldn't handle that request.".to_owned(),
        }
    }
}

/// Façade over the registry and executor for one-call request handling.
pub struct FileBasedSkillOrchestrator {
    registry: Arc<FileBasedSkillRegistry>,
    executor: Arc<SkillExecutor>,
    config: OrchestratorConfig,
}

impl FileBasedSkillOrchestrator {
    /// Create an orchestrator over explicit registry/executor instances.
    #[must_use]
    pub fn new(registry: Arc<FileBasedSkillRegistry>, executor: Arc<SkillExecutor>) -> Self {
        Self::with_config(registry, executor, OrchestratorConfig::default())
    }

    /// Create an orchestrator with custom tuning.
    #[must_use]
    pub fn with_config(
        registry: Arc<FileBasedSkillRegistry>,
        executor: Arc<SkillExecutor>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            registry,
            executor,
            config,
        }
    }

    /// Create an orchestrator over the process-wide singletons.
    #[must_use]
    pub fn from_globals() -> Self {
        Self::new(global_registry(), global_executor())
    }

    /// The registry this orchestrator reads from.
    pub fn registry(&self) -> &Arc<FileBasedSkillRegistry> {
        &self.registry
    }

    /// The executor this orchestrator dispatches through.
    pub fn executor(&self) -> &Arc<SkillExecutor> {
        &self.executor
    }

    /// Handle one routed request.
    ///
    /// Never fails for normal no-match, validation, or handler problems —
    /// those complete with an apologetic result.  `Err` is reserved for
    /// internal infrastructure faults.
    pub async fn handle(
        &self,
        routing: &DomainRouting,
        context: &SkillContext,
    ) -> Result<OrchestrationResult> {
        let request_id = Uuid::now_v7();
        tracing::debug!(
            request_id = %request_id,
            domain = %routing.domain,
            confidence = routing.confidence,
            "handling routed request"
        );

        // Confidence gate: below the floor there is nothing worth the
        // registry/filesystem work.
        if routing.confidence < self.config.confidence_floor {
            tracing::debug!(
                request_id = %request_id,
                confidence = routing.confidence,
                floor = self.config.confidence_floor,
                "routing below confidence floor"
            );
            return Ok(self.completed(request_id, routing, Disposition::LowConfidence));
        }

        // Bypass: the domain runs on rewritten text alone, no package needed.
        if self.config.bypass_domains.contains(&routing.domain) {
            tracing::debug!(request_id = %request_id, domain = %routing.domain, "domain bypassed");
            return Ok(OrchestrationResult {
                disposition: Disposition::Bypassed,
                commands: Vec::new(),
                tts_text: routing.rewritten_query.clone(),
                confidence: routing.confidence,
                request_id,
            });
        }

        let hint = routing.intent.as_ref().map(|i| i.capability.as_str());

        let capability = match self.registry.resolve_capability(routing.domain, hint).await {
            Ok(Some(capability)) => capability,
            Ok(None) => {
                tracing::debug!(request_id = %request_id, domain = %routing.domain, "no capability resolved");
                return Ok(self.completed(request_id, routing, Disposition::NoMatch));
            }
            Err(e @ SkillError::Internal { .. }) => return Err(e),
            Err(e) => {
                tracing::warn!(request_id = %request_id, error = %e, "capability resolution failed");
                return Ok(self.completed(request_id, routing, Disposition::NoMatch));
            }
        };

        // The resolved capability can demand more confidence than the
        // orchestrator-wide floor.
        if routing.confidence < capability.confidence_floor {
            tracing::debug!(
                request_id = %request_id,
                capability = %capability.capability_name,
                confidence = routing.confidence,
                floor = capability.confidence_floor,
                "routing below capability confidence floor"
            );
            return Ok(self.completed(request_id, routing, Disposition::LowConfidence));
        }

        let raw_slots: HashMap<String, serde_json::Value> = routing
            .intent
            .as_ref()
            .map(|i| i.slots.clone())
            .unwrap_or_default();

        let request = ExecutionRequest {
            capability_name: capability.capability_name.clone(),
            raw_slots,
            context: context.clone(),
        };

        match self.executor.execute(&self.registry, &request).await {
            Ok(outcome) => {
                tracing::info!(
                    request_id = %request_id,
                    capability = %capability.capability_name,
                    commands = outcome.commands.len(),
                    "capability executed"
                );
                Ok(OrchestrationResult {
                    disposition: Disposition::Executed,
                    commands: outcome.commands,
                    tts_text: outcome.tts_text.unwrap_or_else(|| "Done.".to_owned()),
                    confidence: routing.confidence,
                    request_id,
                })
            }
            Err(e @ SkillError::Internal { .. }) => Err(e),
            Err(e) => {
                tracing::warn!(
                    request_id = %request_id,
                    capability = %capability.capability_name,
                    error = %e,
                    "capability execution failed"
                );
                Ok(self.completed(request_id, routing, Disposition::HandlerFailed))
            }
        }
    }

    /// A terminal result with no commands and the configured apology.
    fn completed(
        &self,
        request_id: Uuid,
        routing: &DomainRouting,
        disposition: Disposition,
    ) -> OrchestrationResult {
        OrchestrationResult {
            disposition,
            commands: Vec::new(),
            tts_text: self.config.apology.clone(),
            confidence: routing.confidence,
            request_id,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
