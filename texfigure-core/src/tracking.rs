//! Build Tracking - notifications to the typesetting session
//!
//! The manager reports every data file it hands out and every figure it
//! writes. What the session does with that is its own business.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::hashing::{canonical_json, file_sha256, sha256_hex};

pub trait BuildTracker {
    /// The build reads `path`.
    fn add_dependency(&mut self, path: &Path);
    /// The build wrote `path`.
    fn add_created(&mut self, path: &Path);
}

/// Discards every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTracker;

impl BuildTracker for NullTracker {
    fn add_dependency(&mut self, _path: &Path) {}
    fn add_created(&mut self, _path: &Path) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackedRole {
    Dependency,
    Created,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedFile {
    pub path: PathBuf,
    pub role: TrackedRole,
    pub recorded_at: DateTime<Utc>,
    /// Content digest, absent when the file did not exist yet.
    pub sha256: Option<String>,
}

/// Records notifications in order, with content digests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildManifest {
    pub entries: Vec<TrackedFile>,
}

#[derive(Serialize)]
struct DigestEntry<'a> {
    path: &'a Path,
    role: TrackedRole,
    sha256: &'a Option<String>,
}

impl BuildManifest {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, path: &Path, role: TrackedRole) {
        let sha256 = match file_sha256(path) {
            Ok(digest) => Some(digest),
            Err(e) => {
                log::debug!("not hashing {}: {}", path.display(), e);
                None
            }
        };
        self.entries.push(TrackedFile {
            path: path.to_path_buf(),
            role,
            recorded_at: Utc::now(),
            sha256,
        });
    }

    pub fn dependencies(&self) -> impl Iterator<Item = &Path> {
        self.paths(TrackedRole::Dependency)
    }

    pub fn created(&self) -> impl Iterator<Item = &Path> {
        self.paths(TrackedRole::Created)
    }

    fn paths(&self, role: TrackedRole) -> impl Iterator<Item = &Path> {
        self.entries
            .iter()
            .filter(move |e| e.role == role)
            .map(|e| e.path.as_path())
    }

    /// Digest over paths, roles and content hashes; timestamps excluded.
    pub fn digest(&self) -> Result<String, serde_json::Error> {
        let entries: Vec<_> = self
            .entries
            .iter()
            .map(|e| DigestEntry { path: &e.path, role: e.role, sha256: &e.sha256 })
            .collect();
        Ok(sha256_hex(canonical_json(&entries)?.as_bytes()))
    }
}

impl BuildTracker for BuildManifest {
    fn add_dependency(&mut self, path: &Path) {
        self.record(path, TrackedRole::Dependency);
    }

    fn add_created(&mut self, path: &Path) {
        self.record(path, TrackedRole::Created);
    }
}
