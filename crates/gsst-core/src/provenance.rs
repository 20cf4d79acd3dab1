//! Schema and provenance descriptors attached to persisted artefacts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Semantic version describing the schema of serialized payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SchemaVersion {
    /// Major version incremented for breaking changes.
    pub major: u32,
    /// Minor version incremented for additive changes.
    pub minor: u32,
    /// Patch version incremented for bug fixes and documentation updates.
    pub patch: u32,
}

impl SchemaVersion {
    /// Creates a new schema version descriptor.
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Returns true when a payload written with `other` can be read by `self`.
    pub fn is_compatible_with(&self, other: &SchemaVersion) -> bool {
        self.major == other.major && other.minor <= self.minor
    }
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::new(1, 0, 0)
    }
}

/// Provenance information attached to run manifests and reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RunProvenance {
    /// Hash of the configuration used to produce the data.
    pub config_hash: String,
    /// Fingerprint of the state ladder the run operated on.
    pub ladder_fingerprint: String,
    /// Master deterministic seed used for all randomness.
    pub seed: u64,
    /// RFC 3339 timestamp recording when the artifact was generated.
    pub created_at: String,
    /// Version map for all tools involved in the run.
    pub tool_versions: BTreeMap<String, String>,
}
