//! Error types for the skill subsystem.
//!
//! Every public API in this crate surfaces failures through [`SkillError`].
//! The taxonomy distinguishes per-package discovery problems (logged and
//! skipped), load-pass-fatal problems (the whole pass is rejected), and
//! per-request problems (absorbed at the orchestrator boundary).

use std::path::PathBuf;

/// Unified error type for the skill subsystem.
#[derive(Debug, thiserror::Error)]
pub enum SkillError {
    // -- Discovery errors ---------------------------------------------------
    /// A package's metadata descriptor is missing required fields or is not
    /// parseable.  Non-fatal to a discovery pass: the package is skipped.
    #[error("invalid skill metadata at `{path}`: {reason}")]
    MetadataInvalid { path: PathBuf, reason: String },

    /// Two packages in the same discovery pass declared the same name.
    /// Fatal to the whole pass: ambiguous identity is worse than a missing
    /// skill.
    #[error("duplicate skill name: `{name}`")]
    DuplicateSkillName { name: String },

    // -- Loading errors -----------------------------------------------------
    /// The referenced package was not found in the last discovery pass.
    #[error("skill package not found: `{name}`")]
    PackageNotFound { name: String },

    /// The package has no instruction document.  Non-fatal: instructions are
    /// advisory and simple capabilities work without them.
    #[error("no instructions document for skill package `{name}`")]
    InstructionsMissing { name: String },

    /// The package's capability schema file failed structural validation.
    #[error("invalid capability schema for package `{package}`: {reason}")]
    SchemaInvalid { package: String, reason: String },

    // -- Execution errors ---------------------------------------------------
    /// No loaded capability matches the requested name.
    #[error("capability not found: `{name}`")]
    CapabilityNotFound { name: String },

    /// A slot value violated the capability's slot schema.  The handler is
    /// never invoked when this is produced.
    #[error("slot validation failed for `{slot}`: {reason}")]
    SlotValidation { slot: String, reason: String },

    /// The capability resolved, but no handler is bound to its handler
    /// reference.
    #[error("no handler registered for capability `{capability}`")]
    HandlerNotRegistered { capability: String },

    /// The bound handler itself failed.  Wrapped, not swallowed; never
    /// retried here.
    #[error("handler for capability `{capability}` failed")]
    HandlerExecution {
        capability: String,
        #[source]
        source: anyhow::Error,
    },

    /// A capability script could not be run or produced an unusable result.
    #[error("script `{script}` failed: {reason}")]
    ScriptFailed { script: String, reason: String },

    // -- Infrastructure errors ----------------------------------------------
    /// Internal invariant violation (e.g. a poisoned registry lock).  These
    /// propagate past the orchestrator: they indicate misconfiguration, not
    /// a normal no-match.
    #[error("internal error: {reason}")]
    Internal { reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, SkillError>;
