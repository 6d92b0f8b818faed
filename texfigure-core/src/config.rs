//! Manager configuration, loadable from JSON.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// One of the three directories a manager may own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectoryKind {
    Python,
    Data,
    Figures,
}

impl DirectoryKind {
    /// Subdirectory of the base path used when the setting is `true`.
    pub fn default_name(&self) -> &'static str {
        match self {
            DirectoryKind::Python => "Python",
            DirectoryKind::Data => "Data",
            DirectoryKind::Figures => "Figs",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DirectoryKind::Python => "python",
            DirectoryKind::Data => "data",
            DirectoryKind::Figures => "figure",
        }
    }
}

impl fmt::Display for DirectoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `false` = unused, `true` = default subdirectory, a string = that path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DirSetting {
    Enabled(bool),
    Custom(PathBuf),
}

impl Default for DirSetting {
    fn default() -> Self {
        DirSetting::Enabled(true)
    }
}

impl From<bool> for DirSetting {
    fn from(enabled: bool) -> Self {
        DirSetting::Enabled(enabled)
    }
}

impl From<&str> for DirSetting {
    fn from(path: &str) -> Self {
        DirSetting::Custom(PathBuf::from(path))
    }
}

impl From<PathBuf> for DirSetting {
    fn from(path: PathBuf) -> Self {
        DirSetting::Custom(path)
    }
}

impl DirSetting {
    /// Resolve against `base`; `None` when the directory is unused.
    pub fn resolve(&self, base: &Path, kind: DirectoryKind) -> Option<PathBuf> {
        match self {
            DirSetting::Enabled(false) => None,
            DirSetting::Enabled(true) => Some(base.join(kind.default_name())),
            DirSetting::Custom(path) => Some(path.clone()),
        }
    }
}

fn default_number() -> u32 { 1 }
fn default_extension() -> String { ".pdf".to_string() }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerConfig {
    pub base_path: PathBuf,
    /// Chapter/section number used in generated file names.
    #[serde(default = "default_number")]
    pub number: u32,
    #[serde(default)]
    pub python_dir: DirSetting,
    #[serde(default)]
    pub data_dir: DirSetting,
    #[serde(default)]
    pub fig_dir: DirSetting,
    #[serde(default = "default_extension")]
    pub default_extension: String,
}

impl ManagerConfig {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            number: default_number(),
            python_dir: DirSetting::default(),
            data_dir: DirSetting::default(),
            fig_dir: DirSetting::default(),
            default_extension: default_extension(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn setting(&self, kind: DirectoryKind) -> &DirSetting {
        match kind {
            DirectoryKind::Python => &self.python_dir,
            DirectoryKind::Data => &self.data_dir,
            DirectoryKind::Figures => &self.fig_dir,
        }
    }
}
