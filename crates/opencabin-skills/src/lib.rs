//! File-based skill system for OpenCabin.
//!
//! New vehicle-control capabilities ship as self-contained filesystem
//! packages — a directory with a `skill.yaml` descriptor, an optional
//! `SKILL.md` instruction document, and an optional `capabilities.json`
//! schema — discovered and executed without recompiling the host.
//!
//! This crate provides:
//!
//! - **Progressive-disclosure loader** — three load tiers (metadata,
//!   instructions, capability schema) so package content is only read when
//!   something actually needs it, with per-tier memoization.
//!
//! - **Skill registry** — an immutable, copy-on-write snapshot of every
//!   discovered package, indexed by domain and capability name, reloaded
//!   wholesale and safe for concurrent readers.
//!
//! - **Executor** — validates untrusted slot values against a capability's
//!   schema, then runs the host-registered [`CapabilityHandler`] exactly
//!   once.
//!
//! - **Script handler** — runs package scripts as capabilities via
//!   subprocess, for packages that carry behavior as files.
//!
//! - **Orchestrator** — the façade turning one routing decision into
//!   commands plus a spoken response, with confidence gating, per-domain
//!   bypass, and an error-absorbing boundary.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use opencabin_core::{DomainRouting, DomainType, SkillContext};
//! use opencabin_skills::{
//!     FileBasedSkillOrchestrator, FileBasedSkillRegistry, SkillExecutor,
//! };
//!
//! # async fn run() -> opencabin_skills::Result<()> {
//! let registry = Arc::new(FileBasedSkillRegistry::new());
//! registry.load(std::path::Path::new("skills")).await?;
//!
//! let executor = Arc::new(SkillExecutor::new());
//! // executor.register_handler("set_speed", Arc::new(MyWiperHandler));
//!
//! let orchestrator = FileBasedSkillOrchestrator::new(registry, executor);
//! let routing = DomainRouting::new(DomainType::VehicleControl, "wipers on", 0.9);
//! let result = orchestrator.handle(&routing, &SkillContext::default()).await?;
//! println!("{}", result.tts_text);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod executor;
pub mod loader;
pub mod orchestrator;
pub mod parser;
pub mod registry;
pub mod script;
pub mod types;
mod yaml;

pub use error::{Result, SkillError};
pub use executor::{
    CapabilityHandler, ExecutionOutcome, ExecutionRequest, SkillExecutor, global_executor,
    reset_global_executor,
};
pub use loader::{LoaderConfig, SkillLoader, SkillPackage, default_skills_dir};
pub use orchestrator::{
    Disposition, FileBasedSkillOrchestrator, OrchestrationResult, OrchestratorConfig,
};
pub use registry::{FileBasedSkillRegistry, global_registry, reset_global_registry};
pub use script::{
    ScriptCapabilityHandler, ScriptInterpreter, SkillScript, discover_scripts,
};
pub use types::{
    CapabilitySummary, LoadTier, ParsedCapability, SkillInstructions, SkillMetadata,
    SlotConstraints, SlotDefinition, SlotType,
};
