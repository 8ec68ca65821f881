//! Fake collaborators shared by the live cache integration tests.
//!
//! The fake generator emits one `model <TypeName> <alias>` line per type
//! model. The fake gateway "compiles" a build unit by reading those lines
//! (from generated and companion sections alike) back into model type
//! declarations, and keeps every compiled module in an in-memory registry
//! that outlives any one `LiveModels` instance, like modules on disk.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use livemodels_cache::{
    ArtifactStore, BuildUnit, BuildVersion, Collaborators, CompilationCallback, CompiledModule,
    CompilerGateway, Constructor, DependencySink, ElementRef, GatewayLock, LiveModels,
    LiveModelsOptions, MemoryArtifactStore, MemoryErrorReporter, Model, ModelCtor, ModelRef,
    ModelTypeDecl, PublishedElement,
};
use livemodels_common::{Alias, ContentHash};
use livemodels_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink, Location};
use livemodels_schema::{
    CodeGenerator, CompanionSources, ContentKind, ContentTypeDescriptor, GenerationError,
    GeneratorOptions, PropertyDescriptor, StaticSchemaProvider, TypeModel,
};
use parking_lot::Mutex;

// ---------------------------------------------------------------------------
// Elements and models
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Element {
    content_type: Alias,
}

impl PublishedElement for Element {
    fn content_type(&self) -> &Alias {
        &self.content_type
    }
}

pub fn element(alias: &str) -> ElementRef {
    Arc::new(Element {
        content_type: Alias::new(alias),
    })
}

#[derive(Debug)]
pub struct GeneratedModel {
    type_name: String,
    element: ElementRef,
}

impl Model for GeneratedModel {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn element(&self) -> &ElementRef {
        &self.element
    }
}

fn ctor(type_name: &str) -> ModelCtor {
    let type_name = type_name.to_string();
    Arc::new(move |element: ElementRef| {
        Arc::new(GeneratedModel {
            type_name: type_name.clone(),
            element,
        }) as ModelRef
    })
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

pub fn content_type(alias: &str) -> ContentTypeDescriptor {
    ContentTypeDescriptor::new(alias, ContentKind::Content)
        .with_property(PropertyDescriptor::new("title", "textbox", "String"))
}

pub fn site_schema() -> Vec<ContentTypeDescriptor> {
    vec![content_type("home"), content_type("blogPost")]
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeGenerator {
    calls: AtomicUsize,
    fail: Mutex<Option<String>>,
}

impl FakeGenerator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail_with(&self, reason: Option<&str>) {
        *self.fail.lock() = reason.map(str::to_string);
    }
}

impl CodeGenerator for FakeGenerator {
    fn generate(
        &self,
        _companions: &CompanionSources,
        models: &[TypeModel],
        options: &GeneratorOptions,
    ) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = self.fail.lock().clone() {
            return Err(GenerationError::Generator(reason));
        }
        let mut out = format!("namespace {}\n", options.namespace);
        for model in models {
            out.push_str(&format!("model {} {}\n", model.type_name, model.alias));
        }
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// Compiled modules and gateway
// ---------------------------------------------------------------------------

pub struct FakeModule {
    location: PathBuf,
    version: BuildVersion,
    digest: Option<ContentHash>,
    types: Vec<ModelTypeDecl>,
}

impl CompiledModule for FakeModule {
    fn location(&self) -> &Path {
        &self.location
    }

    fn build_version(&self) -> BuildVersion {
        self.version
    }

    fn digest_marker(&self) -> Option<ContentHash> {
        self.digest
    }

    fn model_types(&self) -> Vec<ModelTypeDecl> {
        self.types.clone()
    }
}

/// Reads the model declarations out of a build unit.
///
/// `model <Type> <alias>` declares a concrete type, `abstract <Type>` an
/// abstract one, and `shapeless <Type> <alias>` a type without an element
/// constructor.
fn parse_types(text: &str) -> Vec<ModelTypeDecl> {
    let mut types = Vec::new();
    for line in text.lines() {
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.as_slice() {
            ["model", type_name, alias] => {
                types.push(ModelTypeDecl::new(*type_name, *alias, ctor(type_name)));
            }
            ["abstract", type_name] => types.push(ModelTypeDecl {
                type_name: type_name.to_string(),
                alias: None,
                is_abstract: true,
                constructors: Vec::new(),
            }),
            ["shapeless", type_name, alias] => types.push(ModelTypeDecl {
                type_name: type_name.to_string(),
                alias: Some(Alias::new(*alias)),
                is_abstract: false,
                constructors: vec![Constructor::Other {
                    params: vec!["String".to_string()],
                }],
            }),
            _ => {}
        }
    }
    types
}

struct VecSink(Vec<Arc<dyn CompiledModule>>);

impl DependencySink for VecSink {
    fn add_dependency(&mut self, module: Arc<dyn CompiledModule>) {
        self.0.push(module);
    }
}

#[derive(Default)]
pub struct FakeGateway {
    lock: Mutex<()>,
    modules: Mutex<HashMap<PathBuf, Arc<FakeModule>>>,
    callbacks: Mutex<Vec<Arc<dyn CompilationCallback>>>,
    compiled_versions: Mutex<Vec<BuildVersion>>,
    fail: Mutex<bool>,
    compile_delay: Mutex<Duration>,
    nested_compile: Mutex<bool>,
    nested_dependencies: AtomicUsize,
}

impl FakeGateway {
    /// Number of successful and failed compilations.
    pub fn compiles(&self) -> usize {
        self.compiled_versions.lock().len()
    }

    /// Every build version submitted, in order.
    pub fn compiled_versions(&self) -> Vec<BuildVersion> {
        self.compiled_versions.lock().clone()
    }

    /// Makes every compilation fail with diagnostics until reset.
    pub fn fail_compilation(&self, fail: bool) {
        *self.fail.lock() = fail;
    }

    /// Holds the gateway lock this long inside every compilation.
    pub fn set_compile_delay(&self, delay: Duration) {
        *self.compile_delay.lock() = delay;
    }

    /// Runs the compilation callbacks from inside every compilation, as a
    /// host would when the models unit triggers another unit.
    pub fn set_nested_compile(&self, nested: bool) {
        *self.nested_compile.lock() = nested;
    }

    pub fn nested_dependencies(&self) -> usize {
        self.nested_dependencies.load(Ordering::SeqCst)
    }

    /// Replaces every stored module with one lacking the digest marker.
    pub fn strip_digest_markers(&self) {
        let mut modules = self.modules.lock();
        for module in modules.values_mut() {
            *module = Arc::new(FakeModule {
                location: module.location.clone(),
                version: module.version,
                digest: None,
                types: module.types.clone(),
            });
        }
    }

    /// Deletes every stored module.
    pub fn delete_modules(&self) {
        self.modules.lock().clear();
    }

    /// Compiles some unrelated unit: takes the gateway lock, then asks every
    /// registered callback for dependencies.
    pub fn compile_external(&self) -> Vec<Arc<dyn CompiledModule>> {
        let _lock = self.lock();
        self.run_callbacks()
    }

    /// Runs the callbacks without taking the lock. The caller must hold it.
    pub fn run_callbacks(&self) -> Vec<Arc<dyn CompiledModule>> {
        let callbacks = self.callbacks.lock().clone();
        let mut sink = VecSink(Vec::new());
        for callback in callbacks {
            callback.compilation_started(&mut sink);
        }
        sink.0
    }

    /// Holds the gateway lock while `f` runs.
    pub fn with_lock<R>(&self, f: impl FnOnce() -> R) -> R {
        let _lock = self.lock();
        f()
    }
}

impl CompilerGateway for FakeGateway {
    fn lock(&self) -> GatewayLock<'_> {
        GatewayLock::new(self.lock.lock())
    }

    fn compile(&self, unit: &BuildUnit) -> Result<Arc<dyn CompiledModule>, Vec<Diagnostic>> {
        self.compiled_versions.lock().push(unit.version);

        let delay = *self.compile_delay.lock();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        if *self.nested_compile.lock() {
            let deps = self.run_callbacks();
            self.nested_dependencies.fetch_add(deps.len(), Ordering::SeqCst);
        }
        if *self.fail.lock() {
            let sink = DiagnosticSink::new();
            sink.emit(Diagnostic::warning(
                DiagnosticCode::new(Category::Warning, 3),
                "unused companion import",
            ));
            sink.emit(
                Diagnostic::error(DiagnosticCode::new(Category::Error, 412), "cannot find type `Pge`")
                    .at(Location::new("all.generated.src", 3, 1)),
            );
            if let Err(diagnostics) = sink.finish() {
                return Err(diagnostics);
            }
        }

        let (version, digest) = BuildUnit::parse_header(&unit.text)
            .ok_or_else(|| vec![Diagnostic::error(DiagnosticCode::new(Category::Error, 1), "no header")])?;
        let module = Arc::new(FakeModule {
            location: PathBuf::from(format!("modules/models.v{version}")),
            version,
            digest: Some(digest),
            types: parse_types(&unit.text),
        });
        self.modules
            .lock()
            .insert(module.location.clone(), Arc::clone(&module));
        Ok(module)
    }

    fn load(&self, location: &Path) -> Option<Arc<dyn CompiledModule>> {
        let module = self.modules.lock().get(location).cloned()?;
        Some(module)
    }

    fn register_compilation_callback(&self, callback: Arc<dyn CompilationCallback>) {
        self.callbacks.lock().push(callback);
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// Collaborators that survive simulated process restarts.
pub struct Harness {
    pub schema: Arc<StaticSchemaProvider>,
    pub generator: Arc<FakeGenerator>,
    pub gateway: Arc<FakeGateway>,
    pub store: Arc<MemoryArtifactStore>,
    pub reporter: Arc<MemoryErrorReporter>,
}

impl Harness {
    pub fn new(schema: Vec<ContentTypeDescriptor>) -> Self {
        Self {
            schema: Arc::new(StaticSchemaProvider::new(schema)),
            generator: Arc::new(FakeGenerator::default()),
            gateway: Arc::new(FakeGateway::default()),
            store: Arc::new(MemoryArtifactStore::new()),
            reporter: Arc::new(MemoryErrorReporter::new()),
        }
    }

    pub fn options() -> LiveModelsOptions {
        LiveModelsOptions {
            callback_timeout: Duration::from_millis(50),
            ..LiveModelsOptions::default()
        }
    }

    pub fn collaborators_with_store(&self, store: Arc<dyn ArtifactStore>) -> Collaborators {
        Collaborators {
            schema: self.schema.clone(),
            generator: self.generator.clone(),
            gateway: self.gateway.clone(),
            store,
            reporter: self.reporter.clone(),
        }
    }

    /// Starts a cache instance, as a freshly started process would.
    pub fn start(&self) -> Arc<LiveModels> {
        self.start_with(Self::options())
    }

    pub fn start_with(&self, options: LiveModelsOptions) -> Arc<LiveModels> {
        LiveModels::new(self.collaborators_with_store(self.store.clone()), options)
    }
}
