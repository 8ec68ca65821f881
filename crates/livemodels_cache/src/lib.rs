//! Live compilation cache for generated content models.
//!
//! [`LiveModels`] turns the current content schema and hand-written companion
//! sources into a compiled model module and serves its types to a
//! long-running host. It rebuilds lazily after invalidation, reuses a cached
//! module across restarts when the [`SchemaHasher`] digest still matches, and
//! interoperates with the host's [`CompilerGateway`] under a strict
//! gateway-then-core lock order.
//!
//! Persistence goes through the [`ArtifactStore`] trait, with a disk-backed
//! and an in-memory implementation. With the default `watch` feature,
//! [`FsWatcher`] feeds companion directory changes into the cache.

#![warn(missing_docs)]

pub mod error;
pub mod gateway;
pub mod hasher;
pub mod live;
pub mod model_set;
pub mod module;
pub mod report;
pub mod store;
pub mod version;
#[cfg(feature = "watch")]
pub mod watch;

pub use error::{BuildError, StoreError};
pub use gateway::{
    BuildUnit, CompilationCallback, CompilerGateway, DependencySink, GatewayLock, LockGuard,
};
pub use hasher::SchemaHasher;
pub use live::{CacheState, CacheStatus, Collaborators, LiveModels, LiveModelsOptions};
pub use model_set::{Instance, ModelDescriptor, ModelList, ModelSet};
pub use module::{
    CompiledModule, Constructor, ElementRef, Model, ModelCtor, ModelRef, ModelTypeDecl,
    PublishedElement, TypeRef, BACKING_ELEMENT_TYPE, LIST_TYPE,
};
pub use report::{describe, ErrorReporter, FileErrorReporter, MemoryErrorReporter};
pub use store::{
    is_owned_file, ArtifactRecord, ArtifactStore, DiskArtifactStore, MemoryArtifactStore,
    ModulePointer, RecordFile,
};
pub use version::{BuildVersion, BuildVersions};
#[cfg(feature = "watch")]
pub use watch::FsWatcher;
