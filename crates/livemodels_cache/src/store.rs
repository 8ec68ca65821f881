//! On-disk cache entries for one logical model set.
//!
//! A generation consists of four files that are only meaningful together:
//!
//! | File | Content |
//! |------|---------|
//! | `models.generated.src` | generator output |
//! | `all.generated.src` | combined build unit (companions + generated) |
//! | `models.hash` | digest of the schema and companions that produced it |
//! | `models.module` | JSON pointer to the last compiled module and its version |
//!
//! Reads are fail-safe: if any file is missing or unparseable, or the build
//! unit's header disagrees with the digest or module version, the record does
//! not exist and the next build regenerates everything. Deletions are
//! best-effort and only logged, since a stale file heals on the next
//! successful build.

use std::path::{Path, PathBuf};

use livemodels_common::ContentHash;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::gateway::BuildUnit;
use crate::version::BuildVersion;

/// Generator output.
pub const GENERATED_SOURCE_FILE: &str = "models.generated.src";
/// Combined build unit.
pub const BUILD_UNIT_FILE: &str = "all.generated.src";
/// Digest marker.
pub const DIGEST_FILE: &str = "models.hash";
/// Last-module pointer.
pub const MODULE_POINTER_FILE: &str = "models.module";
/// Last build failure, written by the file error reporter.
pub const ERROR_FILE: &str = "models.err";

/// Every file name the cache writes itself. Change events for these never
/// invalidate the cache.
pub const OWNED_FILES: [&str; 5] = [
    GENERATED_SOURCE_FILE,
    BUILD_UNIT_FILE,
    DIGEST_FILE,
    MODULE_POINTER_FILE,
    ERROR_FILE,
];

/// Returns `true` if `path` names one of the cache's own files.
pub fn is_owned_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| OWNED_FILES.contains(&name))
}

/// One of the four files making up a record.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RecordFile {
    /// `models.generated.src`
    GeneratedSource,
    /// `all.generated.src`
    BuildUnit,
    /// `models.hash`
    Digest,
    /// `models.module`
    ModulePointer,
}

impl RecordFile {
    /// File name of this part inside the cache directory.
    pub fn file_name(self) -> &'static str {
        match self {
            RecordFile::GeneratedSource => GENERATED_SOURCE_FILE,
            RecordFile::BuildUnit => BUILD_UNIT_FILE,
            RecordFile::Digest => DIGEST_FILE,
            RecordFile::ModulePointer => MODULE_POINTER_FILE,
        }
    }
}

/// Where the last compiled module lives and which version it was built as.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModulePointer {
    /// Location understood by the compiler gateway's `load`.
    pub location: PathBuf,
    /// Build version the module was compiled with.
    pub version: BuildVersion,
}

/// The persisted state of one cache generation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactRecord {
    /// Generator output.
    pub generated_source: String,
    /// Combined build unit text.
    pub build_unit: String,
    /// Digest of the inputs that produced the module.
    pub digest: ContentHash,
    /// The compiled module.
    pub module: ModulePointer,
}

impl ArtifactRecord {
    /// Returns `true` if the build unit's header names this record's digest
    /// and module version, i.e. all four parts come from the same build.
    pub fn is_consistent(&self) -> bool {
        BuildUnit::parse_header(&self.build_unit)
            .is_some_and(|(version, digest)| version == self.module.version && digest == self.digest)
    }

    fn checked(self) -> Option<Self> {
        if self.is_consistent() {
            Some(self)
        } else {
            tracing::debug!(digest = %self.digest, "artifact record parts disagree, ignoring");
            None
        }
    }
}

/// Persistence for the cache's artifact record.
pub trait ArtifactStore: Send + Sync {
    /// Loads the complete record, or `None` if any part is missing, corrupt, or
    /// from a different build than the others.
    fn load_record(&self) -> Option<ArtifactRecord>;

    /// Persists a record, replacing the previous generation.
    fn save_record(&self, record: &ArtifactRecord) -> Result<(), StoreError>;

    /// Removes the digest marker and module pointer, keeping the sources.
    fn clear(&self);

    /// Writes the build unit alone, before it is handed to the compiler.
    fn save_build_unit(&self, text: &str) -> Result<(), StoreError>;

    /// Reads the last build unit written, whether or not it compiled.
    fn load_build_unit(&self) -> Option<String>;
}

/// Artifact store backed by files in a cache directory.
pub struct DiskArtifactStore {
    cache_dir: PathBuf,
}

impl DiskArtifactStore {
    /// Creates a store rooted at the given cache directory.
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            cache_dir: cache_dir.to_path_buf(),
        }
    }

    /// Returns the cache directory.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the path of one record file.
    pub fn path_of(&self, file: RecordFile) -> PathBuf {
        self.cache_dir.join(file.file_name())
    }

    fn read(&self, file: RecordFile) -> Option<String> {
        std::fs::read_to_string(self.path_of(file)).ok()
    }

    fn write(&self, file: RecordFile, content: &str) -> Result<(), StoreError> {
        let path = self.path_of(file);
        std::fs::write(&path, content).map_err(|e| StoreError::Io { path, source: e })
    }

    fn remove(&self, file: RecordFile) {
        let path = self.path_of(file);
        match std::fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to remove cache file");
            }
        }
    }
}

impl ArtifactStore for DiskArtifactStore {
    fn load_record(&self) -> Option<ArtifactRecord> {
        let generated_source = self.read(RecordFile::GeneratedSource)?;
        let build_unit = self.read(RecordFile::BuildUnit)?;
        let digest = self.read(RecordFile::Digest)?.parse().ok()?;
        let module = serde_json::from_str(&self.read(RecordFile::ModulePointer)?).ok()?;
        ArtifactRecord {
            generated_source,
            build_unit,
            digest,
            module,
        }
        .checked()
    }

    fn save_record(&self, record: &ArtifactRecord) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.cache_dir).map_err(|e| StoreError::Io {
            path: self.cache_dir.clone(),
            source: e,
        })?;
        let pointer =
            serde_json::to_string_pretty(&record.module).map_err(|e| StoreError::Serialization {
                reason: e.to_string(),
            })?;

        // The digest goes last: a partially written generation never carries
        // a digest that matches its module.
        self.write(RecordFile::GeneratedSource, &record.generated_source)?;
        self.write(RecordFile::BuildUnit, &record.build_unit)?;
        self.write(RecordFile::ModulePointer, &pointer)?;
        self.write(RecordFile::Digest, &record.digest.to_string())
    }

    fn clear(&self) {
        self.remove(RecordFile::Digest);
        self.remove(RecordFile::ModulePointer);
    }

    fn save_build_unit(&self, text: &str) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.cache_dir).map_err(|e| StoreError::Io {
            path: self.cache_dir.clone(),
            source: e,
        })?;
        self.write(RecordFile::BuildUnit, text)
    }

    fn load_build_unit(&self) -> Option<String> {
        self.read(RecordFile::BuildUnit)
    }
}

#[derive(Default)]
struct MemoryFiles {
    generated_source: Option<String>,
    build_unit: Option<String>,
    digest: Option<ContentHash>,
    module: Option<ModulePointer>,
}

/// Artifact store kept in memory, for hosts without a writable cache
/// directory and for tests.
#[derive(Default)]
pub struct MemoryArtifactStore {
    files: Mutex<MemoryFiles>,
}

impl MemoryArtifactStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops one part of the record, as if the file had been deleted.
    pub fn remove(&self, file: RecordFile) {
        let mut files = self.files.lock();
        match file {
            RecordFile::GeneratedSource => files.generated_source = None,
            RecordFile::BuildUnit => files.build_unit = None,
            RecordFile::Digest => files.digest = None,
            RecordFile::ModulePointer => files.module = None,
        }
    }

    /// Returns `true` if the given part is present.
    pub fn contains(&self, file: RecordFile) -> bool {
        let files = self.files.lock();
        match file {
            RecordFile::GeneratedSource => files.generated_source.is_some(),
            RecordFile::BuildUnit => files.build_unit.is_some(),
            RecordFile::Digest => files.digest.is_some(),
            RecordFile::ModulePointer => files.module.is_some(),
        }
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn load_record(&self) -> Option<ArtifactRecord> {
        let files = self.files.lock();
        ArtifactRecord {
            generated_source: files.generated_source.clone()?,
            build_unit: files.build_unit.clone()?,
            digest: files.digest?,
            module: files.module.clone()?,
        }
        .checked()
    }

    fn save_record(&self, record: &ArtifactRecord) -> Result<(), StoreError> {
        let mut files = self.files.lock();
        files.generated_source = Some(record.generated_source.clone());
        files.build_unit = Some(record.build_unit.clone());
        files.digest = Some(record.digest);
        files.module = Some(record.module.clone());
        Ok(())
    }

    fn clear(&self) {
        let mut files = self.files.lock();
        files.digest = None;
        files.module = None;
    }

    fn save_build_unit(&self, text: &str) -> Result<(), StoreError> {
        self.files.lock().build_unit = Some(text.to_string());
        Ok(())
    }

    fn load_build_unit(&self) -> Option<String> {
        self.files.lock().build_unit.clone()
    }
}
