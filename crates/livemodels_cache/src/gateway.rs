//! The compiler gateway seam and the build units handed to it.
//!
//! The gateway serializes all compilation in the host behind its own lock and
//! calls back into the cache when unrelated units are compiled. The cache
//! always takes the gateway lock before its own lock, and the callback only
//! ever takes the cache's shared lock.

use std::path::Path;
use std::sync::Arc;

use livemodels_common::ContentHash;
use livemodels_diagnostics::Diagnostic;
use livemodels_schema::CompanionSources;

use crate::module::CompiledModule;
use crate::version::BuildVersion;

/// Marker for anything that can be held as a lock guard.
pub trait LockGuard {}

impl<T> LockGuard for T {}

/// Guard for the gateway's host-wide compilation lock; releases on drop.
pub struct GatewayLock<'a> {
    _guard: Box<dyn LockGuard + 'a>,
}

impl<'a> GatewayLock<'a> {
    /// Wraps a guard of the gateway's own lock type.
    pub fn new(guard: impl LockGuard + 'a) -> Self {
        Self {
            _guard: Box::new(guard),
        }
    }
}

/// Receives modules that an external compilation should depend on.
pub trait DependencySink {
    /// Adds `module` as a dependency of the unit being compiled.
    fn add_dependency(&mut self, module: Arc<dyn CompiledModule>);
}

/// Invoked by the gateway, while it holds its lock, when it starts compiling
/// some other unit.
pub trait CompilationCallback: Send + Sync {
    /// Attaches dependencies to the unit being compiled.
    fn compilation_started(&self, sink: &mut dyn DependencySink);
}

/// The host's compiler front end.
pub trait CompilerGateway: Send + Sync {
    /// Acquires the host-wide compilation lock.
    fn lock(&self) -> GatewayLock<'_>;

    /// Compiles a build unit into a loadable module, or returns the diagnostics.
    ///
    /// The cache only calls this while holding the guard from [`lock`], so an
    /// implementation must not take that lock again.
    ///
    /// [`lock`]: CompilerGateway::lock
    fn compile(&self, unit: &BuildUnit) -> Result<Arc<dyn CompiledModule>, Vec<Diagnostic>>;

    /// Loads a previously compiled module. Returns `None` if the location is
    /// missing or does not hold a valid module.
    ///
    /// Like [`compile`], called only while the guard from [`lock`] is held.
    ///
    /// [`compile`]: CompilerGateway::compile
    /// [`lock`]: CompilerGateway::lock
    fn load(&self, location: &Path) -> Option<Arc<dyn CompiledModule>>;

    /// Registers the callback invoked whenever another unit is compiled.
    fn register_compilation_callback(&self, callback: Arc<dyn CompilationCallback>);
}

/// Companion and generated sources merged into one compilable unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildUnit {
    /// Fresh version for this unit.
    pub version: BuildVersion,
    /// Digest the compiled module must embed.
    pub digest: ContentHash,
    /// The unit's full text.
    pub text: String,
}

const VERSION_HEADER: &str = "// livemodels.version: ";
const DIGEST_HEADER: &str = "// livemodels.digest: ";

impl BuildUnit {
    /// Merges companion sources and generated source into one unit.
    ///
    /// The header carries the version and digest so that the compiled module
    /// can embed both.
    pub fn assemble(
        version: BuildVersion,
        digest: ContentHash,
        companions: &CompanionSources,
        generated: &str,
    ) -> Self {
        let mut text = String::new();
        text.push_str(&format!("{VERSION_HEADER}{version}\n"));
        text.push_str(&format!("{DIGEST_HEADER}{digest}\n"));
        for (path, source) in companions.iter() {
            text.push_str(&format!("\n// companion: {}\n", path.display()));
            text.push_str(source);
            if !source.ends_with('\n') {
                text.push('\n');
            }
        }
        text.push_str("\n// generated\n");
        text.push_str(generated);
        if !generated.ends_with('\n') {
            text.push('\n');
        }
        Self {
            version,
            digest,
            text,
        }
    }

    /// Reads the version and digest back from a unit's header.
    ///
    /// A header naming a version that could never have been issued counts as
    /// no header at all.
    pub fn parse_header(text: &str) -> Option<(BuildVersion, ContentHash)> {
        let mut lines = text.lines();
        let version = BuildVersion(lines.next()?.strip_prefix(VERSION_HEADER)?.parse().ok()?);
        if !version.is_issuable() {
            return None;
        }
        let digest = lines.next()?.strip_prefix(DIGEST_HEADER)?.parse().ok()?;
        Some((version, digest))
    }
}
