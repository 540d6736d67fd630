//! Skill package discovery and progressive loading.
//!
//! Packages are directories under a skills root.  Loading is tiered so the
//! expensive parts of a package are never read before something actually
//! needs them:
//!
//! | Tier | Content | Read when |
//! |------|---------|-----------|
//! | 1 | `skill.yaml` metadata | discovery pass |
//! | 2 | `SKILL.md` instructions | a capability from the package is considered |
//! | 3 | `capabilities.json` schema | immediately before execution |
//!
//! Escalation is monotonic and idempotent: requesting Tier 3 guarantees
//! Tiers 1–2 are loaded and cached, and repeated requests are served from
//! cache without touching the filesystem again.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tokio::sync::OnceCell;

use crate::error::{Result, SkillError};
use crate::parser::{parse_capabilities, parse_metadata, synthesize_capability};
use crate::types::{LoadTier, ParsedCapability, SkillInstructions, SkillMetadata};

/// On-disk file names within a package directory.  Names are configuration,
/// not part of the core contract.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Tier-1 metadata descriptor file name.
    pub metadata_file: String,
    /// Tier-2 instruction document file name.
    pub instructions_file: String,
    /// Tier-3 capability schema file name.
    pub schema_file: String,
    /// Subdirectory holding executable capability scripts.
    pub scripts_dir: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            metadata_file: "skill.yaml".to_owned(),
            instructions_file: "SKILL.md".to_owned(),
            schema_file: "capabilities.json".to_owned(),
            scripts_dir: "scripts".to_owned(),
        }
    }
}

/// Return the default skills root.
///
/// Priority:
/// 1. `$OPENCABIN_SKILLS_DIR` environment variable
/// 2. `./skills/` relative to the current working directory
pub fn default_skills_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("OPENCABIN_SKILLS_DIR") {
        return PathBuf::from(dir);
    }
    PathBuf::from("skills")
}

// ---------------------------------------------------------------------------
// SkillPackage
// ---------------------------------------------------------------------------

/// One discovered package: Tier-1 metadata plus memoized Tier-2/3 content.
///
/// A package snapshot is immutable for the lifetime of the discovery pass
/// that produced it; the memoized cells only ever go from empty to filled.
pub struct SkillPackage {
    metadata: SkillMetadata,
    dir: PathBuf,
    /// Tier-2 cache.  `None` records a confirmed-absent instructions file so
    /// the miss is not re-probed on every request.
    instructions: OnceCell<Option<Arc<SkillInstructions>>>,
    /// Tier-3 cache.
    capabilities: OnceCell<Arc<[ParsedCapability]>>,
}

impl SkillPackage {
    fn new(metadata: SkillMetadata, dir: PathBuf) -> Self {
        Self {
            metadata,
            dir,
            instructions: OnceCell::new(),
            capabilities: OnceCell::new(),
        }
    }

    /// Tier-1 metadata.
    pub fn metadata(&self) -> &SkillMetadata {
        &self.metadata
    }

    /// The package's root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The tier this package has been materialized to so far.
    pub fn tier(&self) -> LoadTier {
        if self.capabilities.initialized() {
            LoadTier::FullyLoaded
        } else if self.instructions.initialized() {
            LoadTier::WithInstructions
        } else {
            LoadTier::MetadataOnly
        }
    }

    /// Tier 2: read (or serve from cache) the instruction document.
    ///
    /// `Ok(None)` means the package ships no instructions — a cached,
    /// non-fatal condition.
    async fn instructions(&self, config: &LoaderConfig) -> Result<Option<Arc<SkillInstructions>>> {
        let cached = self
            .instructions
            .get_or_try_init(|| async {
                let path = self.dir.join(&config.instructions_file);
                match tokio::fs::read_to_string(&path).await {
                    Ok(content) => {
                        tracing::debug!(
                            package = %self.metadata.name,
                            bytes = content.len(),
                            "instructions loaded"
                        );
                        Ok(Some(Arc::new(SkillInstructions { content })))
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                        tracing::debug!(package = %self.metadata.name, "no instructions document");
                        Ok(None)
                    }
                    Err(e) => Err(SkillError::Io(e)),
                }
            })
            .await?;

        Ok(cached.clone())
    }

    /// Tier 3: read (or serve from cache) the capability schema, escalating
    /// through Tier 2 first.
    async fn capabilities(&self, config: &LoaderConfig) -> Result<Arc<[ParsedCapability]>> {
        // Tier escalation is monotonic: a missing instructions document is
        // advisory and must not block the schema.
        self.instructions(config).await?;

        let cached = self
            .capabilities
            .get_or_try_init(|| async {
                let path = self.dir.join(&config.schema_file);
                match tokio::fs::read_to_string(&path).await {
                    Ok(content) => {
                        let parsed = parse_capabilities(&content, &self.metadata)?;
                        tracing::debug!(
                            package = %self.metadata.name,
                            capabilities = parsed.len(),
                            "capability schema loaded"
                        );
                        Ok(Arc::from(parsed))
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                        tracing::debug!(
                            package = %self.metadata.name,
                            "no capability schema, synthesizing fallback capability"
                        );
                        Ok(Arc::from(vec![synthesize_capability(&self.metadata)]))
                    }
                    Err(e) => Err(SkillError::Io(e)),
                }
            })
            .await?;

        Ok(cached.clone())
    }
}

// ---------------------------------------------------------------------------
// SkillLoader
// ---------------------------------------------------------------------------

/// Scans the skills root and serves tiered package content.
pub struct SkillLoader {
    config: LoaderConfig,
    /// Packages from the most recent successful discovery pass, keyed by
    /// package name.  Replaced wholesale; never mutated entry-by-entry.
    packages: RwLock<HashMap<String, Arc<SkillPackage>>>,
}

impl SkillLoader {
    /// Create a loader with the given file-name configuration.
    #[must_use]
    pub fn new(config: LoaderConfig) -> Self {
        Self {
            config,
            packages: RwLock::new(HashMap::new()),
        }
    }

    /// Tier 1: scan the immediate subdirectories of `root`.
    ///
    /// Subdirectories without a valid metadata descriptor are logged and
    /// skipped; disabled packages are skipped.  A duplicate package name
    /// within the pass fails the whole pass and leaves the previous package
    /// table untouched.  On success the new table atomically replaces the
    /// old one and the discovered metadata is returned in lexicographic
    /// directory order (the stable registration order).
    pub async fn discover(&self, root: &Path) -> Result<Vec<SkillMetadata>> {
        if !root.exists() {
            tracing::debug!(path = %root.display(), "skills directory does not exist");
            self.install(HashMap::new());
            return Ok(Vec::new());
        }

        let mut dirs = Vec::new();
        let mut entries = tokio::fs::read_dir(root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.is_dir() {
                dirs.push(path);
            }
        }
        // Scan order is normalized so registration order is reproducible
        // across platforms.
        dirs.sort();

        let mut table = HashMap::new();
        let mut discovered = Vec::new();

        for dir in dirs {
            let dir_name = dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            let descriptor = dir.join(&self.config.metadata_file);
            let content = match tokio::fs::read_to_string(&descriptor).await {
                Ok(content) => content,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::trace!(path = %dir.display(), "no metadata descriptor, skipping");
                    continue;
                }
                Err(e) => {
                    tracing::warn!(path = %descriptor.display(), error = %e, "failed to read metadata");
                    continue;
                }
            };

            let metadata = match parse_metadata(&content, &descriptor, &dir_name) {
                Ok(metadata) => metadata,
                Err(e) => {
                    tracing::warn!(path = %descriptor.display(), error = %e, "skipping package");
                    continue;
                }
            };

            if !metadata.enabled {
                tracing::debug!(package = %metadata.name, "package disabled, skipping");
                continue;
            }

            if table.contains_key(&metadata.name) {
                return Err(SkillError::DuplicateSkillName {
                    name: metadata.name,
                });
            }

            tracing::info!(
                package = %metadata.name,
                domain = %metadata.domain,
                "skill package discovered"
            );

            table.insert(
                metadata.name.clone(),
                Arc::new(SkillPackage::new(metadata.clone(), dir)),
            );
            discovered.push(metadata);
        }

        tracing::info!(count = discovered.len(), root = %root.display(), "discovery pass complete");
        self.install(table);
        Ok(discovered)
    }

    /// Look up a discovered package by name.
    pub fn package(&self, name: &str) -> Result<Arc<SkillPackage>> {
        self.packages
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(name)
            .cloned()
            .ok_or_else(|| SkillError::PackageNotFound {
                name: name.to_owned(),
            })
    }

    /// Tier 2: load the instruction document for a package.
    ///
    /// Fails with [`SkillError::PackageNotFound`] for undiscovered packages
    /// and [`SkillError::InstructionsMissing`] when the package ships no
    /// document — the latter is advisory and callers may proceed without it.
    pub async fn load_instructions(&self, name: &str) -> Result<Arc<SkillInstructions>> {
        let package = self.package(name)?;
        package
            .instructions(&self.config)
            .await?
            .ok_or_else(|| SkillError::InstructionsMissing {
                name: name.to_owned(),
            })
    }

    /// Tier 3: load the normalized capabilities for a package, escalating
    /// through Tier 2 first.
    pub async fn load_capabilities(&self, name: &str) -> Result<Arc<[ParsedCapability]>> {
        let package = self.package(name)?;
        package.capabilities(&self.config).await
    }

    /// List the executable scripts shipped in a package's scripts
    /// directory.  A package without one yields an empty list.
    pub fn scripts(&self, name: &str) -> Result<Vec<crate::script::SkillScript>> {
        let package = self.package(name)?;
        let dir = package.dir().join(&self.config.scripts_dir);
        Ok(crate::script::discover_scripts(&dir)?)
    }

    /// Drop the package table and every tier cache.
    pub fn clear(&self) {
        self.install(HashMap::new());
    }

    fn install(&self, table: HashMap<String, Arc<SkillPackage>>) {
        *self
            .packages
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = table;
    }
}

impl Default for SkillLoader {
    fn default() -> Self {
        Self::new(LoaderConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
