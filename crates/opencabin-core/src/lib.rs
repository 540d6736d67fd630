//! Core vocabulary for OpenCabin.
//!
//! This crate holds the types every layer of the assistant speaks:
//!
//! - **Domains** — the closed set of areas an utterance can be routed to.
//!
//! - **Commands** — the actuation requests skills produce and the downstream
//!   command executor consumes.
//!
//! - **Routing** — the classified, rewritten, confidence-scored decision the
//!   upstream controller hands to the skill orchestrator.
//!
//! - **Context** — the cabin-state and conversation snapshot capability
//!   handlers read.
//!
//! - **LLM contract** — the provider-agnostic chat interface the upstream
//!   classifier is written against (consumed here, implemented by hosts).
//!
//! The crate is deliberately free of behavior beyond constructors, ordering
//! helpers, and serde wiring; all skill mechanics live in `opencabin-skills`.

pub mod command;
pub mod context;
pub mod domain;
pub mod llm;
pub mod routing;

pub use command::{Command, by_priority};
pub use context::{SkillContext, VehicleState, WiperSpeed};
pub use domain::{DomainType, UnknownDomain};
pub use llm::{ChatRequest, ChatResponse, LlmError, LlmProvider, Message, Role, StreamDelta};
pub use routing::{DomainRouting, RecognizedIntent};
