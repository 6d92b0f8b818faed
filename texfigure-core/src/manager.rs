//! Manager - single entry point for saving and looking up figures
//!
//! A manager owns one section's directories, numbers its figures and keeps
//! an ordered registry of everything it saved.

use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{DirSetting, DirectoryKind, ManagerConfig};
use crate::error::{Result, TexFigureError};
use crate::figure::{Figure, FigureStyle};
use crate::multifigure::MultiFigure;
use crate::save::{default_strategies, find_strategy, Artifact, SaveOptions, SaveStrategy};
use crate::tracking::{BuildTracker, NullTracker};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistryEntry {
    /// Value of the figure counter when this entry was registered.
    pub sequence: u32,
    pub figure: Figure,
}

/// Insertion-ordered map of reference to saved figure.
#[derive(Debug, Clone, Default)]
pub struct FigureRegistry {
    entries: Vec<(String, RegistryEntry)>,
    index: HashMap<String, usize>,
}

impl FigureRegistry {
    /// Insert or overwrite; an overwritten key keeps its position.
    /// Returns the replaced entry.
    pub fn insert(&mut self, reference: &str, entry: RegistryEntry) -> Option<RegistryEntry> {
        match self.index.get(reference) {
            Some(&i) => Some(std::mem::replace(&mut self.entries[i].1, entry)),
            None => {
                self.index.insert(reference.to_string(), self.entries.len());
                self.entries.push((reference.to_string(), entry));
                None
            }
        }
    }

    pub fn get(&self, reference: &str) -> Option<&RegistryEntry> {
        self.index.get(reference).map(|&i| &self.entries[i].1)
    }

    fn get_mut(&mut self, reference: &str) -> Option<&mut RegistryEntry> {
        let i = *self.index.get(reference)?;
        Some(&mut self.entries[i].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RegistryEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Per-call arguments to [`Manager::save`].
#[derive(Debug, Clone, Default)]
pub struct SaveRequest {
    /// Used verbatim instead of the generated name.
    pub file_name: Option<String>,
    /// Falls back to the manager's default extension.
    pub extension: Option<String>,
    pub options: SaveOptions,
}

impl SaveRequest {
    pub fn with_extension(extension: &str) -> Self {
        Self { extension: Some(extension.to_string()), ..Default::default() }
    }

    pub fn with_file_name(file_name: &str) -> Self {
        Self { file_name: Some(file_name.to_string()), ..Default::default() }
    }
}

pub struct Manager<T: BuildTracker = NullTracker> {
    tracker: T,
    number: u32,
    base_path: PathBuf,
    python_dir: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    fig_dir: Option<PathBuf>,
    default_extension: String,
    fig_count: u32,
    registry: FigureRegistry,
    strategies: Vec<Box<dyn SaveStrategy>>,
}

fn ensure_dir(path: &Path) -> Result<()> {
    let existed = path.is_dir();
    fs::create_dir_all(path)?;
    if !existed {
        log::info!("created directory {}", path.display());
    }
    Ok(())
}

impl<T: BuildTracker> Manager<T> {
    /// Create the manager and every enabled directory.
    pub fn new(config: ManagerConfig, tracker: T) -> Result<Self> {
        let mut manager = Self {
            tracker,
            number: config.number,
            base_path: config.base_path.clone(),
            python_dir: None,
            data_dir: None,
            fig_dir: None,
            default_extension: config.default_extension.clone(),
            fig_count: 1,
            registry: FigureRegistry::default(),
            strategies: default_strategies(),
        };

        for kind in [DirectoryKind::Python, DirectoryKind::Data, DirectoryKind::Figures] {
            manager.set_directory(kind, config.setting(kind))?;
        }

        Ok(manager)
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    /// Number the next saved figure will get.
    pub fn fig_count(&self) -> u32 {
        self.fig_count
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn python_dir(&self) -> Option<&Path> {
        self.python_dir.as_deref()
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    pub fn fig_dir(&self) -> Option<&Path> {
        self.fig_dir.as_deref()
    }

    pub fn directory(&self, kind: DirectoryKind) -> Option<&Path> {
        match kind {
            DirectoryKind::Python => self.python_dir(),
            DirectoryKind::Data => self.data_dir(),
            DirectoryKind::Figures => self.fig_dir(),
        }
    }

    /// Point `kind` at a new location, creating it if needed. Files already
    /// registered keep their paths.
    pub fn set_directory(&mut self, kind: DirectoryKind, setting: &DirSetting) -> Result<()> {
        let resolved = setting.resolve(&self.base_path, kind);
        if let Some(dir) = &resolved {
            ensure_dir(dir)?;
        }
        let slot = match kind {
            DirectoryKind::Python => &mut self.python_dir,
            DirectoryKind::Data => &mut self.data_dir,
            DirectoryKind::Figures => &mut self.fig_dir,
        };
        *slot = resolved;
        Ok(())
    }

    pub fn registry(&self) -> &FigureRegistry {
        &self.registry
    }

    pub fn tracker(&self) -> &T {
        &self.tracker
    }

    pub fn into_tracker(self) -> T {
        self.tracker
    }

    /// Append a strategy; it is consulted after those already registered.
    pub fn register_strategy(&mut self, strategy: Box<dyn SaveStrategy>) {
        log::debug!("registering save strategy {}", strategy.name());
        self.strategies.push(strategy);
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// `Chapter<N>-Figure<count>-<reference><extension>` unless `file_name` is given.
    pub fn figure_file_name(&self, reference: &str, file_name: Option<&str>, extension: &str) -> String {
        match file_name {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!(
                "Chapter{}-Figure{}-{}{}",
                self.number, self.fig_count, reference, extension
            ),
        }
    }

    pub fn figure_path(&self, reference: &str, file_name: Option<&str>, extension: &str) -> Result<PathBuf> {
        let dir = self
            .fig_dir
            .as_deref()
            .ok_or(TexFigureError::DirectoryDisabled(DirectoryKind::Figures.as_str()))?;
        Ok(dir.join(self.figure_file_name(reference, file_name, extension)))
    }

    /// Save `artifact` with the first matching strategy and register it.
    ///
    /// Nothing is registered and the counter is untouched if any step fails.
    pub fn save(&mut self, reference: &str, artifact: &mut dyn Artifact, request: &SaveRequest) -> Result<Figure> {
        let extension = request.extension.as_deref().unwrap_or(&self.default_extension);
        let target = self.figure_path(reference, request.file_name.as_deref(), extension)?;

        let strategy = find_strategy(&self.strategies, artifact)?;
        log::debug!(
            "saving {} with strategy {} to {}",
            artifact.kind_name(),
            strategy.name(),
            target.display()
        );
        let written = strategy.save(artifact, &target, &request.options)?;

        let figure = Figure::new(&written, Some(reference))?;
        self.register(reference, figure.clone());
        Ok(figure)
    }

    /// Track `figure` as a created output under `reference`, returning its sequence number.
    pub fn register(&mut self, reference: &str, figure: Figure) -> u32 {
        self.tracker.add_created(figure.path());

        let sequence = self.fig_count;
        let replaced = self.registry.insert(reference, RegistryEntry { sequence, figure });
        if let Some(old) = replaced {
            log::warn!(
                "figure '{}' re-registered, replacing sequence {} with {}",
                reference,
                old.sequence,
                sequence
            );
        } else {
            log::info!("registered figure '{}' as number {}", reference, sequence);
        }

        self.fig_count += 1;
        sequence
    }

    pub fn get(&self, reference: &str) -> Result<&Figure> {
        self.registry
            .get(reference)
            .map(|entry| &entry.figure)
            .ok_or_else(|| TexFigureError::NotFound(reference.to_string()))
    }

    pub fn get_multifigure<S: AsRef<str>>(
        &self,
        nrows: usize,
        ncols: usize,
        refs: &[S],
        reference: &str,
    ) -> Result<MultiFigure> {
        if nrows.checked_mul(ncols).is_some_and(|slots| refs.len() > slots) {
            return Err(TexFigureError::TooManyReferences { refs: refs.len(), nrows, ncols });
        }

        let mut multi = MultiFigure::new(nrows, ncols, reference)?;
        for r in refs {
            multi.append(self.get(r.as_ref())?.clone())?;
        }
        Ok(multi)
    }

    /// Apply presentation overrides to a registered figure.
    pub fn build_figure(&mut self, reference: &str, style: &FigureStyle) -> Result<&Figure> {
        let entry = self
            .registry
            .get_mut(reference)
            .ok_or_else(|| TexFigureError::NotFound(reference.to_string()))?;
        entry.figure.apply_style(style);
        Ok(&entry.figure)
    }

    /// Full path of `name` in the data directory, recorded as a build dependency.
    pub fn data_file(&mut self, name: &str) -> Result<PathBuf> {
        let dir = self
            .data_dir
            .as_deref()
            .ok_or(TexFigureError::DirectoryDisabled(DirectoryKind::Data.as_str()))?;
        let path = dir.join(name);
        log::debug!("data dependency {}", path.display());
        self.tracker.add_dependency(&path);
        Ok(path)
    }
}
