//! The live model cache.
//!
//! [`LiveModels`] decides when the model module must be regenerated, builds it
//! at most once per schema revision under concurrent access, and publishes
//! the resulting [`ModelSet`] to readers.
//!
//! Lock order is always gateway lock, then core lock. The compilation
//! callback runs with the gateway lock already held, so it only ever waits a
//! bounded time for the shared core lock and does nothing if it cannot get it.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use livemodels_common::ContentHash;
use livemodels_config::ModelsConfig;
use livemodels_schema::{
    build_type_models, CodeGenerator, CompanionSources, GenerationError, GeneratorOptions,
    SchemaProvider,
};
use parking_lot::RwLock;

use crate::error::BuildError;
use crate::gateway::{BuildUnit, CompilationCallback, CompilerGateway, DependencySink};
use crate::hasher::SchemaHasher;
use crate::model_set::{Instance, ModelList, ModelSet};
use crate::module::{ElementRef, TypeRef};
use crate::report::{describe, ErrorReporter, FileErrorReporter, MemoryErrorReporter};
use crate::store::{
    is_owned_file, ArtifactRecord, ArtifactStore, DiskArtifactStore, ModulePointer, OWNED_FILES,
};
use crate::version::{BuildVersion, BuildVersions};

/// Whether the published model set reflects the current schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheState {
    /// No module is loaded. The next read attempts a build.
    Empty,
    /// A module is loaded and its digest is current.
    Valid,
    /// Explicitly invalidated. The next read rebuilds.
    Stale,
}

/// Point-in-time view of the cache for operators.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheStatus {
    /// Current state.
    pub state: CacheState,
    /// Latest build version issued or observed.
    pub version: Option<BuildVersion>,
    /// Digest of the loaded module's inputs.
    pub digest: Option<ContentHash>,
    /// Generation of the published model set.
    pub generation: u64,
    /// Number of published model types.
    pub model_count: usize,
    /// Rendered text of the last failure, until the next successful build.
    pub last_error: Option<String>,
}

/// Tunables for a [`LiveModels`] instance.
#[derive(Clone, Debug)]
pub struct LiveModelsOptions {
    /// Passed to the code generator.
    pub generator: GeneratorOptions,
    /// How long the compilation callback waits for the shared lock.
    pub callback_timeout: Duration,
    /// Directory holding companion sources, if any.
    pub companion_dir: Option<PathBuf>,
    /// Extension of companion source files, without the dot.
    pub companion_extension: String,
}

impl Default for LiveModelsOptions {
    fn default() -> Self {
        Self {
            generator: GeneratorOptions::default(),
            callback_timeout: Duration::from_millis(250),
            companion_dir: None,
            companion_extension: "rs".to_string(),
        }
    }
}

impl LiveModelsOptions {
    /// Derives options from a loaded configuration, resolving directories
    /// against `root`.
    pub fn from_config(config: &ModelsConfig, root: &Path) -> Self {
        Self {
            generator: GeneratorOptions {
                namespace: config.models.namespace.clone(),
            },
            callback_timeout: config.callback_timeout(),
            companion_dir: Some(config.companion_dir(root)),
            companion_extension: config.models.companion_extension.clone(),
        }
    }
}

/// The external collaborators a cache is wired to.
pub struct Collaborators {
    /// Supplies the content schema.
    pub schema: Arc<dyn SchemaProvider>,
    /// Turns type models into source text.
    pub generator: Arc<dyn CodeGenerator>,
    /// Compiles and loads build units.
    pub gateway: Arc<dyn CompilerGateway>,
    /// Persists the artifact record.
    pub store: Arc<dyn ArtifactStore>,
    /// Receives build failures.
    pub reporter: Arc<dyn ErrorReporter>,
}

struct CoreState {
    state: CacheState,
    published: Arc<ModelSet>,
    versions: BuildVersions,
    digest: Option<ContentHash>,
    force_rebuild: bool,
    last_generation: u64,
    last_error: Option<String>,
}

impl CoreState {
    fn next_generation(&mut self) -> u64 {
        self.last_generation += 1;
        self.last_generation
    }
}

/// Live compilation cache for one logical model set.
pub struct LiveModels {
    schema: Arc<dyn SchemaProvider>,
    generator: Arc<dyn CodeGenerator>,
    gateway: Arc<dyn CompilerGateway>,
    store: Arc<dyn ArtifactStore>,
    reporter: Arc<dyn ErrorReporter>,
    options: LiveModelsOptions,
    core: RwLock<CoreState>,
}

impl LiveModels {
    /// Creates a cache and registers its compilation callback with the gateway.
    ///
    /// Build versions resume past any version recorded by the store, so a
    /// restarted process never reuses one.
    pub fn new(collaborators: Collaborators, options: LiveModelsOptions) -> Arc<Self> {
        let Collaborators {
            schema,
            generator,
            gateway,
            store,
            reporter,
        } = collaborators;

        let mut versions = BuildVersions::new();
        if let Some(record) = store.load_record() {
            versions.observe(record.module.version);
        }
        if let Some((version, _)) = store
            .load_build_unit()
            .as_deref()
            .and_then(BuildUnit::parse_header)
        {
            versions.observe(version);
        }

        Arc::new_cyclic(|weak: &Weak<Self>| {
            gateway.register_compilation_callback(Arc::new(ModelsCallback {
                models: weak.clone(),
            }));
            Self {
                schema,
                generator,
                gateway,
                store,
                reporter,
                options,
                core: RwLock::new(CoreState {
                    state: CacheState::Empty,
                    published: Arc::new(ModelSet::empty(0)),
                    versions,
                    digest: None,
                    force_rebuild: false,
                    last_generation: 0,
                    last_error: None,
                }),
            }
        })
    }

    /// Creates a cache from configuration, storing artifacts under the
    /// configured cache directory. Returns `None` when live models are
    /// disabled.
    pub fn open(
        config: &ModelsConfig,
        root: &Path,
        schema: Arc<dyn SchemaProvider>,
        generator: Arc<dyn CodeGenerator>,
        gateway: Arc<dyn CompilerGateway>,
    ) -> Option<Arc<Self>> {
        if !config.models.enabled {
            tracing::info!("live models disabled by configuration");
            return None;
        }
        let cache_dir = config.cache_dir(root);
        let reporter: Arc<dyn ErrorReporter> = if config.build.write_error_file {
            Arc::new(FileErrorReporter::new(&cache_dir))
        } else {
            Arc::new(MemoryErrorReporter::new())
        };
        let collaborators = Collaborators {
            schema,
            generator,
            gateway,
            store: Arc::new(DiskArtifactStore::new(&cache_dir)),
            reporter,
        };
        Some(Self::new(
            collaborators,
            LiveModelsOptions::from_config(config, root),
        ))
    }

    /// Returns the current model set, building it first if needed.
    ///
    /// A failed build returns its error to this caller only. The next call
    /// starts a fresh attempt.
    pub fn ensure_models(&self) -> Result<Arc<ModelSet>, BuildError> {
        {
            let core = self.core.read();
            if core.state == CacheState::Valid {
                return Ok(Arc::clone(&core.published));
            }
        }

        let _gateway = self.gateway.lock();
        let mut core = self.core.write();
        if core.state == CacheState::Valid {
            return Ok(Arc::clone(&core.published));
        }
        self.build(&mut core)
    }

    /// Marks the cache stale and clears the persisted markers. Rebuilding
    /// happens on the next read. Repeated calls are no-ops.
    pub fn invalidate(&self) {
        let mut core = self.core.write();
        if core.state == CacheState::Valid {
            core.state = CacheState::Stale;
            self.store.clear();
            tracing::info!("live models invalidated");
        }
    }

    /// Invalidates and makes the next build regenerate even if a cached
    /// module matches.
    pub fn request_rebuild(&self) {
        let mut core = self.core.write();
        core.force_rebuild = true;
        if core.state == CacheState::Valid {
            core.state = CacheState::Stale;
        }
        self.store.clear();
        tracing::info!("live models rebuild requested");
    }

    /// Handles a filesystem change. The cache's own files are ignored.
    pub fn on_path_changed(&self, path: &Path) {
        if is_owned_file(path) {
            tracing::trace!(path = %path.display(), "ignoring change to cache-owned file");
            return;
        }
        tracing::debug!(path = %path.display(), "companion change detected");
        self.invalidate();
    }

    /// Attaches the loaded module as a dependency of some other compilation.
    ///
    /// Called by the gateway with its lock held. Waits at most the configured
    /// callback timeout for the shared lock and does nothing if no module is
    /// loaded.
    pub fn on_external_compilation_started(&self, sink: &mut dyn DependencySink) {
        let Some(core) = self.core.try_read_for(self.options.callback_timeout) else {
            tracing::debug!("models lock busy, compiling without models dependency");
            return;
        };
        if let Some(module) = core.published.module() {
            sink.add_dependency(Arc::clone(module));
        }
    }

    /// Replaces model placeholders in `ty` with published type names.
    pub fn map_type(&self, ty: &TypeRef) -> TypeRef {
        self.current().map_type(ty)
    }

    /// Wraps an element in its model type, or returns it unchanged.
    pub fn create_instance(&self, element: ElementRef) -> Instance {
        self.current().create_instance(element)
    }

    /// Creates an empty list typed for `alias`.
    pub fn create_list(&self, alias: &str) -> ModelList {
        self.current().create_list(alias)
    }

    /// Snapshot of the cache for operators.
    pub fn status(&self) -> CacheStatus {
        let core = self.core.read();
        CacheStatus {
            state: core.state,
            version: core.versions.latest(),
            digest: core.digest,
            generation: core.published.generation(),
            model_count: core.published.len(),
            last_error: core.last_error.clone(),
        }
    }

    /// The published set after ensuring models, or the last published set
    /// if the build failed. Readers degrade rather than fail.
    fn current(&self) -> Arc<ModelSet> {
        match self.ensure_models() {
            Ok(set) => set,
            Err(e) => {
                tracing::debug!(error = %e, "serving last published models");
                Arc::clone(&self.core.read().published)
            }
        }
    }

    fn build(&self, core: &mut CoreState) -> Result<Arc<ModelSet>, BuildError> {
        let started = Instant::now();
        let forced = std::mem::take(&mut core.force_rebuild);
        tracing::debug!(forced, "live models build cycle started");

        match self.run_cycle(core, forced) {
            Ok(set) => {
                let set = Arc::new(set);
                core.published = Arc::clone(&set);
                core.state = CacheState::Valid;
                core.last_error = None;
                self.reporter.clear();
                tracing::info!(
                    generation = set.generation(),
                    models = set.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "live models published"
                );
                Ok(set)
            }
            Err(err) => {
                self.store.clear();
                let message = describe(&err);
                self.reporter.report(&message, &err);
                tracing::warn!(error = %err, "live models build failed");
                core.state = CacheState::Empty;
                core.digest = None;
                core.last_error = Some(message);
                if core.published.module().is_none() {
                    let generation = core.next_generation();
                    core.published = Arc::new(ModelSet::empty(generation));
                }
                Err(err)
            }
        }
    }

    fn run_cycle(&self, core: &mut CoreState, forced: bool) -> Result<ModelSet, BuildError> {
        let schema = self.schema.schema()?;
        let companions = self.load_companions()?;
        let digest = SchemaHasher::digest(&companions, &schema);

        if !forced {
            if let Some(set) = self.try_reuse(core, digest)? {
                return Ok(set);
            }
        }

        let types = build_type_models(&schema)?;
        let generated = self
            .generator
            .generate(&companions, &types, &self.options.generator)?;
        if generated.trim().is_empty() {
            return Err(GenerationError::EmptyOutput.into());
        }

        let Some(version) = core.versions.issue() else {
            return Err(BuildError::VersionsExhausted {
                last: core.versions.latest().unwrap_or(BuildVersion(0)),
            });
        };
        let unit = BuildUnit::assemble(version, digest, &companions, &generated);
        if let Err(e) = self.store.save_build_unit(&unit.text) {
            tracing::warn!(error = %e, "failed to persist build unit");
        }

        tracing::debug!(%version, %digest, "compiling models build unit");
        let module = match self.gateway.compile(&unit) {
            Ok(module) => module,
            Err(diagnostics) => {
                return Err(BuildError::Compilation {
                    diagnostics,
                    unit_text: unit.text,
                });
            }
        };
        let set = ModelSet::from_module(core.next_generation(), Arc::clone(&module))?;

        let record = ArtifactRecord {
            generated_source: generated,
            build_unit: unit.text,
            digest,
            module: ModulePointer {
                location: module.location().to_path_buf(),
                version,
            },
        };
        if let Err(e) = self.store.save_record(&record) {
            tracing::warn!(error = %e, "failed to persist artifact record");
        }
        core.digest = Some(digest);
        Ok(set)
    }

    /// Loads the module named by the stored record if its digest matches and
    /// the module itself carries the same digest.
    fn try_reuse(
        &self,
        core: &mut CoreState,
        digest: ContentHash,
    ) -> Result<Option<ModelSet>, BuildError> {
        let Some(record) = self.store.load_record() else {
            return Ok(None);
        };
        if record.digest != digest {
            tracing::debug!(cached = %record.digest, current = %digest, "digest mismatch");
            return Ok(None);
        }
        let Some(module) = self.gateway.load(&record.module.location) else {
            tracing::debug!(
                path = %record.module.location.display(),
                "cached models module missing"
            );
            return Ok(None);
        };
        if module.digest_marker() != Some(digest) {
            tracing::warn!(
                path = %record.module.location.display(),
                "cached models module carries a foreign digest"
            );
            return Ok(None);
        }

        core.versions.observe(record.module.version);
        core.versions.observe(module.build_version());
        let set = ModelSet::from_module(core.next_generation(), module)?;
        core.digest = Some(digest);
        tracing::info!(version = %record.module.version, "reusing cached models module");
        Ok(Some(set))
    }

    fn load_companions(&self) -> Result<CompanionSources, GenerationError> {
        match &self.options.companion_dir {
            Some(dir) => {
                CompanionSources::load(dir, &self.options.companion_extension, &OWNED_FILES)
            }
            None => Ok(CompanionSources::new()),
        }
    }
}

struct ModelsCallback {
    models: Weak<LiveModels>,
}

impl CompilationCallback for ModelsCallback {
    fn compilation_started(&self, sink: &mut dyn DependencySink) {
        if let Some(models) = self.models.upgrade() {
            models.on_external_compilation_started(sink);
        }
    }
}
