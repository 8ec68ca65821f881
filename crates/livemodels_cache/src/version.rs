//! Build versions: the identity tag that makes every rebuild a distinct module.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Monotonic identity of one compiled build unit.
///
/// Modules cannot be unloaded from the host, so two builds must never share a
/// version or the host would treat the second as already loaded.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct BuildVersion(pub u64);

impl BuildVersion {
    /// Returns `true` if this version could have been issued.
    ///
    /// Zero is never issued, and `u64::MAX` has no successor to issue after it.
    /// Anything else read back from disk is usable.
    pub fn is_issuable(self) -> bool {
        self.0 != 0 && self.0 != u64::MAX
    }
}

impl fmt::Display for BuildVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Issues build versions that are never reused.
///
/// `next` is the in-memory counter. `skip_through` is the highest version
/// known to be in use, learned from the persisted record or from a module that
/// was reused from the cache; issued versions always land above it, even when
/// the persisted record lags behind the module actually loaded.
#[derive(Debug, Clone)]
pub struct BuildVersions {
    next: u64,
    skip_through: u64,
}

impl BuildVersions {
    /// Starts counting at version 1.
    pub fn new() -> Self {
        Self {
            next: 1,
            skip_through: 0,
        }
    }

    /// Records that `version` is in use and must not be issued again.
    ///
    /// Versions that could never have been issued are ignored.
    pub fn observe(&mut self, version: BuildVersion) {
        if !version.is_issuable() {
            tracing::warn!(%version, "ignoring unusable build version");
            return;
        }
        self.skip_through = self.skip_through.max(version.0);
    }

    /// Issues a fresh version, strictly greater than every issued or observed one.
    ///
    /// Returns `None` once the version space is exhausted; a version is never
    /// handed out twice.
    pub fn issue(&mut self) -> Option<BuildVersion> {
        let version = self.next.max(self.skip_through.checked_add(1)?);
        let next = version.checked_add(1)?;
        self.next = next;
        self.skip_through = version;
        Some(BuildVersion(version))
    }

    /// The highest version issued or observed so far.
    pub fn latest(&self) -> Option<BuildVersion> {
        (self.skip_through > 0).then_some(BuildVersion(self.skip_through))
    }
}

impl Default for BuildVersions {
    fn default() -> Self {
        Self::new()
    }
}
