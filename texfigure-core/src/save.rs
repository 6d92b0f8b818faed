//! Save Strategies - Artifact Capability Dispatch
//!
//! Artifacts advertise what they can do through capability accessors.
//! Strategies claim artifacts by capability and write them to disk.
//! The manager tries strategies in registration order; first match wins.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{BackendError, Result, TexFigureError};

/// A 2-D plotting figure that can write itself to a file.
pub trait PlotFigure {
    fn savefig(&mut self, path: &Path) -> std::result::Result<(), BackendError>;
}

/// A 3-D scene renderer with a positionable camera.
pub trait SceneView {
    fn set_anti_aliasing_frames(&mut self, frames: u32);
    fn set_view(&mut self, camera: &CameraView);
    fn save_scene(&mut self, path: &Path, size: [u32; 2]) -> std::result::Result<(), BackendError>;
}

/// A container of image plots that saves under its own naming scheme.
pub trait ImagePlotContainer {
    fn plot_count(&self) -> usize;

    /// Save every plot using `stem` and `suffix` (no leading dot), returning
    /// the files actually written.
    fn save_plots(
        &mut self,
        stem: &Path,
        suffix: &str,
        options: &SaveOptions,
    ) -> std::result::Result<Vec<PathBuf>, BackendError>;
}

/// Anything that can be handed to [`crate::Manager::save`].
pub trait Artifact {
    fn kind_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn as_plot(&mut self) -> Option<&mut dyn PlotFigure> {
        None
    }

    fn as_scene(&mut self) -> Option<&mut dyn SceneView> {
        None
    }

    fn as_image_container(&mut self) -> Option<&mut dyn ImagePlotContainer> {
        None
    }

    /// Escape hatch for strategies that handle one concrete type.
    fn as_any_mut(&mut self) -> Option<&mut dyn Any> {
        None
    }
}

fn default_azimuth() -> f64 { 153.0 }
fn default_elevation() -> f64 { 62.0 }
fn default_distance() -> f64 { 400.0 }
fn default_focal_point() -> [f64; 3] { [25.0, 63.0, 60.0] }
fn default_anti_aliasing() -> u32 { 16 }
fn default_size() -> [u32; 2] { [1024, 1024] }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraView {
    #[serde(default = "default_azimuth")]
    pub azimuth: f64,
    #[serde(default = "default_elevation")]
    pub elevation: f64,
    #[serde(default = "default_distance")]
    pub distance: f64,
    #[serde(default = "default_focal_point")]
    pub focal_point: [f64; 3],
    #[serde(default = "default_anti_aliasing")]
    pub anti_aliasing: u32,
    #[serde(default = "default_size")]
    pub size: [u32; 2],
}

impl Default for CameraView {
    fn default() -> Self {
        Self {
            azimuth: default_azimuth(),
            elevation: default_elevation(),
            distance: default_distance(),
            focal_point: default_focal_point(),
            anti_aliasing: default_anti_aliasing(),
            size: default_size(),
        }
    }
}

/// Options passed through to the matched strategy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOptions {
    #[serde(default)]
    pub camera: CameraView,
    /// Backend specific settings, forwarded untouched.
    #[serde(default)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Save strategy trait - claims artifacts and writes them to disk
pub trait SaveStrategy {
    fn name(&self) -> &'static str;
    fn accepts(&self, artifact: &mut dyn Artifact) -> bool;

    /// Write `artifact` to `path`, returning the path actually written.
    fn save(&self, artifact: &mut dyn Artifact, path: &Path, options: &SaveOptions) -> Result<PathBuf>;
}

fn backend_error(strategy: &dyn SaveStrategy, source: BackendError) -> TexFigureError {
    TexFigureError::Backend { kind: strategy.name().to_string(), source }
}

fn not_accepted(artifact: &dyn Artifact) -> TexFigureError {
    TexFigureError::UnsupportedArtifactType(artifact.kind_name().to_string())
}

// --- Concrete Strategies ---

pub struct PlotFigureStrategy;

impl SaveStrategy for PlotFigureStrategy {
    fn name(&self) -> &'static str { "plot_figure" }

    fn accepts(&self, artifact: &mut dyn Artifact) -> bool {
        artifact.as_plot().is_some()
    }

    fn save(&self, artifact: &mut dyn Artifact, path: &Path, _options: &SaveOptions) -> Result<PathBuf> {
        let kind = artifact.kind_name();
        let plot = artifact
            .as_plot()
            .ok_or_else(|| TexFigureError::UnsupportedArtifactType(kind.to_string()))?;
        plot.savefig(path).map_err(|e| backend_error(self, e))?;
        Ok(path.to_path_buf())
    }
}

pub struct SceneStrategy;

impl SaveStrategy for SceneStrategy {
    fn name(&self) -> &'static str { "scene" }

    fn accepts(&self, artifact: &mut dyn Artifact) -> bool {
        artifact.as_scene().is_some()
    }

    fn save(&self, artifact: &mut dyn Artifact, path: &Path, options: &SaveOptions) -> Result<PathBuf> {
        let kind = artifact.kind_name();
        let scene = artifact
            .as_scene()
            .ok_or_else(|| TexFigureError::UnsupportedArtifactType(kind.to_string()))?;
        let camera = &options.camera;

        scene.set_anti_aliasing_frames(camera.anti_aliasing);
        scene.set_view(camera);
        scene
            .save_scene(path, camera.size)
            .map_err(|e| backend_error(self, e))?;

        Ok(path.to_path_buf())
    }
}

pub struct ImageContainerStrategy;

impl SaveStrategy for ImageContainerStrategy {
    fn name(&self) -> &'static str { "image_container" }

    fn accepts(&self, artifact: &mut dyn Artifact) -> bool {
        artifact.as_image_container().is_some()
    }

    fn save(&self, artifact: &mut dyn Artifact, path: &Path, options: &SaveOptions) -> Result<PathBuf> {
        let kind = artifact.kind_name();
        let container = artifact
            .as_image_container()
            .ok_or_else(|| TexFigureError::UnsupportedArtifactType(kind.to_string()))?;

        let plots = container.plot_count();
        if plots != 1 {
            return Err(TexFigureError::MultiPlotUnsupported(plots));
        }

        let suffix = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = path.with_extension("");

        let mut written = container
            .save_plots(&stem, &suffix, options)
            .map_err(|e| backend_error(self, e))?;
        if written.len() != 1 {
            return Err(backend_error(
                self,
                format!("expected one saved file, container reported {}", written.len()).into(),
            ));
        }
        Ok(written.remove(0))
    }
}

/// Strategies registered on every new manager, in dispatch order.
pub fn default_strategies() -> Vec<Box<dyn SaveStrategy>> {
    #[allow(unused_mut)]
    let mut strategies: Vec<Box<dyn SaveStrategy>> = vec![Box::new(PlotFigureStrategy)];

    #[cfg(feature = "scene")]
    strategies.push(Box::new(SceneStrategy));

    #[cfg(feature = "image-container")]
    strategies.push(Box::new(ImageContainerStrategy));

    strategies
}

/// Find the first strategy accepting `artifact`.
pub fn find_strategy<'a>(
    strategies: &'a [Box<dyn SaveStrategy>],
    artifact: &mut dyn Artifact,
) -> Result<&'a dyn SaveStrategy> {
    strategies
        .iter()
        .find(|s| s.accepts(&mut *artifact))
        .map(|s| s.as_ref())
        .ok_or_else(|| not_accepted(artifact))
}

/// A plot that already exists on disk; saving copies it into place.
#[derive(Debug, Clone)]
pub struct CopyFile {
    source: PathBuf,
}

impl CopyFile {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self { source: source.into() }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }
}

impl PlotFigure for CopyFile {
    fn savefig(&mut self, path: &Path) -> std::result::Result<(), BackendError> {
        fs::copy(&self.source, path)?;
        Ok(())
    }
}

impl Artifact for CopyFile {
    fn as_plot(&mut self) -> Option<&mut dyn PlotFigure> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeScene {
        frames: u32,
        view: Option<CameraView>,
        saved: Option<(PathBuf, [u32; 2])>,
    }

    impl SceneView for FakeScene {
        fn set_anti_aliasing_frames(&mut self, frames: u32) {
            self.frames = frames;
        }

        fn set_view(&mut self, camera: &CameraView) {
            self.view = Some(camera.clone());
        }

        fn save_scene(&mut self, path: &Path, size: [u32; 2]) -> std::result::Result<(), BackendError> {
            self.saved = Some((path.to_path_buf(), size));
            Ok(())
        }
    }

    impl Artifact for FakeScene {
        fn as_scene(&mut self) -> Option<&mut dyn SceneView> {
            Some(self)
        }
    }

    struct FakeContainer {
        plots: usize,
        calls: Vec<(PathBuf, String)>,
    }

    impl ImagePlotContainer for FakeContainer {
        fn plot_count(&self) -> usize {
            self.plots
        }

        fn save_plots(
            &mut self,
            stem: &Path,
            suffix: &str,
            _options: &SaveOptions,
        ) -> std::result::Result<Vec<PathBuf>, BackendError> {
            self.calls.push((stem.to_path_buf(), suffix.to_string()));
            Ok(vec![PathBuf::from(format!("{}_Slice_z.{}", stem.display(), suffix))])
        }
    }

    impl Artifact for FakeContainer {
        fn as_image_container(&mut self) -> Option<&mut dyn ImagePlotContainer> {
            Some(self)
        }
    }

    struct Opaque;
    impl Artifact for Opaque {}

    #[test]
    fn test_scene_strategy_positions_camera_before_saving() {
        let mut scene = FakeScene::default();
        let options = SaveOptions::default();
        let path = Path::new("/tmp/figs/scene.png");

        let written = SceneStrategy.save(&mut scene, path, &options).unwrap();

        assert_eq!(written, path);
        assert_eq!(scene.frames, 16);
        assert_eq!(scene.view.unwrap().focal_point, [25.0, 63.0, 60.0]);
        assert_eq!(scene.saved, Some((path.to_path_buf(), [1024, 1024])));
    }

    #[test]
    fn test_image_container_returns_backend_path() {
        let mut container = FakeContainer { plots: 1, calls: vec![] };
        let written = ImageContainerStrategy
            .save(&mut container, Path::new("/tmp/figs/slice.png"), &SaveOptions::default())
            .unwrap();

        assert_eq!(written, PathBuf::from("/tmp/figs/slice_Slice_z.png"));
        assert_eq!(container.calls, vec![(PathBuf::from("/tmp/figs/slice"), "png".to_string())]);
    }

    #[test]
    fn test_image_container_rejects_multiple_plots() {
        let mut container = FakeContainer { plots: 3, calls: vec![] };
        let err = ImageContainerStrategy
            .save(&mut container, Path::new("/tmp/figs/slice.png"), &SaveOptions::default())
            .unwrap_err();

        assert!(matches!(err, TexFigureError::MultiPlotUnsupported(3)));
        assert!(container.calls.is_empty());
    }

    #[test]
    fn test_find_strategy_by_capability() {
        let strategies = default_strategies();
        assert_eq!(find_strategy(&strategies, &mut CopyFile::new("a.pdf")).unwrap().name(), "plot_figure");

        let err = find_strategy(&strategies, &mut Opaque).err().unwrap();
        assert!(matches!(err, TexFigureError::UnsupportedArtifactType(ref k) if k.ends_with("Opaque")));
    }

    #[cfg(all(feature = "scene", feature = "image-container"))]
    #[test]
    fn test_optional_backends_registered() {
        let strategies = default_strategies();
        let names: Vec<_> = strategies.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["plot_figure", "scene", "image_container"]);
        assert_eq!(find_strategy(&strategies, &mut FakeScene::default()).unwrap().name(), "scene");
    }

    #[test]
    fn test_save_options_from_json_keeps_defaults() {
        let options: SaveOptions =
            serde_json::from_str(r#"{"camera": {"azimuth": 90}, "extra": {"dpi": 300}}"#).unwrap();
        assert_eq!(options.camera.azimuth, 90.0);
        assert_eq!(options.camera.distance, 400.0);
        assert_eq!(options.extra["dpi"], serde_json::json!(300));
    }
}
