//! File-based skill registry.
//!
//! The registry owns the result of a discovery pass as one immutable
//! snapshot: the package list in registration order plus indexes by domain
//! and by advertised capability name.  `load` builds a complete replacement
//! snapshot and swaps it in behind a single writer lock; readers clone the
//! snapshot `Arc` once at the start of an operation and never re-read it
//! mid-operation, so they always observe the old or the new snapshot in
//! full, never a partial one.
//!
//! A process-wide singleton is available through [`global_registry`] /
//! [`reset_global_registry`] for hosts that want one shared instance;
//! nothing forces single-instance use.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Utc};

use opencabin_core::DomainType;

use crate::error::Result;
use crate::loader::{LoaderConfig, SkillLoader, default_skills_dir};
use crate::types::{ParsedCapability, SkillMetadata};

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// One immutable view of the registered packages.
struct RegistrySnapshot {
    /// Metadata in registration order.
    packages: Vec<SkillMetadata>,
    /// Package name -> index into `packages`.
    by_name: HashMap<String, usize>,
    /// Domain -> package names, in registration order.
    by_domain: HashMap<DomainType, Vec<String>>,
    /// Advertised capability name -> owning package name.
    by_capability: HashMap<String, String>,
    /// When this snapshot was installed; `None` for the never-loaded state.
    loaded_at: Option<DateTime<Utc>>,
}

impl RegistrySnapshot {
    fn empty() -> Self {
        Self {
            packages: Vec::new(),
            by_name: HashMap::new(),
            by_domain: HashMap::new(),
            by_capability: HashMap::new(),
            loaded_at: None,
        }
    }

    fn build(discovered: Vec<SkillMetadata>) -> Self {
        let mut snapshot = Self::empty();
        snapshot.loaded_at = Some(Utc::now());

        for metadata in discovered {
            snapshot
                .by_domain
                .entry(metadata.domain)
                .or_default()
                .push(metadata.name.clone());

            for summary in &metadata.capability_summaries {
                // Package names are unique; capability names are only unique
                // within a package.  First registrant keeps the index entry.
                if let Some(existing) = snapshot.by_capability.get(&summary.name) {
                    tracing::warn!(
                        capability = %summary.name,
                        kept = %existing,
                        ignored = %metadata.name,
                        "capability name already indexed by another package"
                    );
                } else {
                    snapshot
                        .by_capability
                        .insert(summary.name.clone(), metadata.name.clone());
                }
            }

            if metadata.capability_summaries.is_empty() {
                // A package with no advertised capabilities resolves through
                // its synthesized fallback capability, named after the
                // package itself.  Index it so by-name lookups reach it.
                snapshot
                    .by_capability
                    .entry(metadata.name.clone())
                    .or_insert_with(|| metadata.name.clone());
            }

            snapshot
                .by_name
                .insert(metadata.name.clone(), snapshot.packages.len());
            snapshot.packages.push(metadata);
        }

        snapshot
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Registry of file-based skill packages with copy-on-write reloads.
pub struct FileBasedSkillRegistry {
    loader: SkillLoader,
    /// Current snapshot.  Readers clone the `Arc` and release the lock
    /// immediately; only `load`/`reset` take the write side.
    snapshot: RwLock<Arc<RegistrySnapshot>>,
    /// Serializes whole `load`/`reset` passes against each other without
    /// ever blocking readers mid-read.
    writer: tokio::sync::Mutex<()>,
}

impl FileBasedSkillRegistry {
    /// Create an empty registry with default file-name configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(LoaderConfig::default())
    }

    /// Create an empty registry with custom package file names.
    #[must_use]
    pub fn with_config(config: LoaderConfig) -> Self {
        Self {
            loader: SkillLoader::new(config),
            snapshot: RwLock::new(Arc::new(RegistrySnapshot::empty())),
            writer: tokio::sync::Mutex::new(()),
        }
    }

    /// Run a full discovery pass over `root` and atomically install the
    /// resulting snapshot.
    ///
    /// The pass succeeds or fails wholesale: on any pass-fatal error (a
    /// duplicate package name) the previous snapshot — or the never-loaded
    /// state — remains installed untouched.  Returns the number of
    /// registered packages.
    pub async fn load(&self, root: &Path) -> Result<usize> {
        let _pass = self.writer.lock().await;

        let discovered = self.loader.discover(root).await?;
        let count = discovered.len();
        let snapshot = Arc::new(RegistrySnapshot::build(discovered));

        tracing::info!(
            packages = count,
            root = %root.display(),
            "registry snapshot installed"
        );
        self.install(snapshot);
        Ok(count)
    }

    /// Load from the default skills root (`$OPENCABIN_SKILLS_DIR` or
    /// `./skills`).
    pub async fn load_default(&self) -> Result<usize> {
        self.load(&default_skills_dir()).await
    }

    /// Discard the current snapshot and every loader cache.  Until the next
    /// `load`, the registry behaves as if `load` was never invoked.
    pub async fn reset(&self) {
        let _pass = self.writer.lock().await;
        self.loader.clear();
        self.install(Arc::new(RegistrySnapshot::empty()));
        tracing::info!("registry reset");
    }

    /// Tier-1 listing: metadata of every package in `domain`, in
    /// registration order.
    pub fn find_by_domain(&self, domain: DomainType) -> Vec<SkillMetadata> {
        let snapshot = self.current();
        let Some(names) = snapshot.by_domain.get(&domain) else {
            return Vec::new();
        };
        names
            .iter()
            .filter_map(|name| snapshot.by_name.get(name))
            .map(|&idx| snapshot.packages[idx].clone())
            .collect()
    }

    /// Tier-1 listing: metadata of every package, in registration order.
    pub fn all_packages(&self) -> Vec<SkillMetadata> {
        self.current().packages.clone()
    }

    /// Number of registered packages.
    pub fn package_count(&self) -> usize {
        self.current().packages.len()
    }

    /// When the current snapshot was installed; `None` before the first
    /// `load` and after a `reset`.
    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.current().loaded_at
    }

    /// Resolve the capability to execute for a routing decision.
    ///
    /// Candidate packages in `domain` are ranked by (1) exact
    /// capability-name hint match against the advertised index, (2) sole
    /// candidate in the domain, (3) first-registered order.  Only the
    /// selected package is escalated to Tier 3.  `Ok(None)` means no
    /// candidate exists — a normal no-match, not an error.
    pub async fn resolve_capability(
        &self,
        domain: DomainType,
        hint: Option<&str>,
    ) -> Result<Option<ParsedCapability>> {
        let snapshot = self.current();

        let Some(candidates) = snapshot.by_domain.get(&domain).filter(|c| !c.is_empty()) else {
            return Ok(None);
        };

        // Rank: hint match beats single-candidate beats first-registered.
        let package_name = hint
            .and_then(|h| snapshot.by_capability.get(h))
            .filter(|pkg| candidates.contains(*pkg))
            .cloned()
            .unwrap_or_else(|| candidates[0].clone());

        let capabilities = self.loader.load_capabilities(&package_name).await?;

        let selected = match hint {
            Some(h) => capabilities
                .iter()
                .find(|c| c.capability_name == h)
                .or_else(|| {
                    tracing::debug!(
                        package = %package_name,
                        hint = %h,
                        "hint matched no loaded capability, falling back to first"
                    );
                    capabilities.first()
                }),
            None => capabilities.first(),
        };

        Ok(selected.cloned())
    }

    /// Resolve a capability by exact name, escalating its package to Tier 3.
    ///
    /// `Ok(None)` when no package advertises the name or the package's
    /// schema does not define it.
    pub async fn capability(&self, name: &str) -> Result<Option<ParsedCapability>> {
        let snapshot = self.current();
        let Some(package_name) = snapshot.by_capability.get(name).cloned() else {
            return Ok(None);
        };

        let capabilities = self.loader.load_capabilities(&package_name).await?;
        Ok(capabilities
            .iter()
            .find(|c| c.capability_name == name)
            .cloned())
    }

    fn current(&self) -> Arc<RegistrySnapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn install(&self, snapshot: Arc<RegistrySnapshot>) {
        *self
            .snapshot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = snapshot;
    }
}

impl Default for FileBasedSkillRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Process-wide singleton
// ---------------------------------------------------------------------------

static GLOBAL_REGISTRY: Mutex<Option<Arc<FileBasedSkillRegistry>>> = Mutex::new(None);

/// Return the process-wide registry, creating it on first access.
///
/// The instance starts empty; hosts typically follow up with
/// [`FileBasedSkillRegistry::load_default`].
pub fn global_registry() -> Arc<FileBasedSkillRegistry> {
    GLOBAL_REGISTRY
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .get_or_insert_with(|| Arc::new(FileBasedSkillRegistry::new()))
        .clone()
}

/// Destroy the process-wide registry.  The next [`global_registry`] call
/// creates a fresh, empty instance — primarily so test suites get a clean
/// slate deterministically.
pub fn reset_global_registry() {
    GLOBAL_REGISTRY
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .take();
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
