//! Contract Invariant Tests
//!
//! Manager, Figure and MultiFigure guarantees, exercised end to end
//! against a temporary directory.

use std::fs;
use std::path::{Path, PathBuf};

use texfigure_core::{
    Artifact, BackendError, BuildManifest, CameraView, CopyFile, Figure, FigureStyle,
    ImagePlotContainer, Manager, ManagerConfig, MultiFigure, PlotFigure, SaveRequest,
    SaveStrategy, SceneView, TexFigureError,
};
use texfigure_core::save::SaveOptions;

/// Writes a fixed body wherever it is asked to save.
struct FakePlot;

impl PlotFigure for FakePlot {
    fn savefig(&mut self, path: &Path) -> Result<(), BackendError> {
        fs::write(path, b"%PDF-1.5 fake")?;
        Ok(())
    }
}

impl Artifact for FakePlot {
    fn as_plot(&mut self) -> Option<&mut dyn PlotFigure> {
        Some(self)
    }
}

/// Backend-specific type handled by a user strategy.
struct Histogram {
    bins: usize,
}

impl Artifact for Histogram {
    fn as_any_mut(&mut self) -> Option<&mut dyn std::any::Any> {
        Some(self)
    }
}

struct HistogramStrategy;

impl SaveStrategy for HistogramStrategy {
    fn name(&self) -> &'static str { "histogram" }

    fn accepts(&self, artifact: &mut dyn Artifact) -> bool {
        artifact
            .as_any_mut()
            .map_or(false, |a| a.downcast_ref::<Histogram>().is_some())
    }

    fn save(
        &self,
        artifact: &mut dyn Artifact,
        path: &Path,
        _options: &SaveOptions,
    ) -> texfigure_core::Result<PathBuf> {
        let bins = artifact
            .as_any_mut()
            .and_then(|a| a.downcast_ref::<Histogram>())
            .map(|h| h.bins)
            .unwrap_or_default();
        // backend appends its own suffix
        let written = path.with_extension("hist.png");
        fs::write(&written, format!("{} bins", bins))?;
        Ok(written)
    }
}

struct Unknown;
impl Artifact for Unknown {}

/// Remembers every camera call before writing its file.
#[derive(Default)]
struct RecordingScene {
    frames: Option<u32>,
    view: Option<CameraView>,
    size: Option<[u32; 2]>,
}

impl SceneView for RecordingScene {
    fn set_anti_aliasing_frames(&mut self, frames: u32) {
        self.frames = Some(frames);
    }

    fn set_view(&mut self, camera: &CameraView) {
        self.view = Some(camera.clone());
    }

    fn save_scene(&mut self, path: &Path, size: [u32; 2]) -> Result<(), BackendError> {
        self.size = Some(size);
        fs::write(path, b"scene")?;
        Ok(())
    }
}

impl Artifact for RecordingScene {
    fn as_scene(&mut self) -> Option<&mut dyn SceneView> {
        Some(self)
    }
}

struct PanelGrid {
    plots: usize,
    saves: usize,
}

impl ImagePlotContainer for PanelGrid {
    fn plot_count(&self) -> usize {
        self.plots
    }

    fn save_plots(
        &mut self,
        stem: &Path,
        suffix: &str,
        _options: &SaveOptions,
    ) -> Result<Vec<PathBuf>, BackendError> {
        self.saves += 1;
        let written = PathBuf::from(format!("{}_Slice_x.{}", stem.display(), suffix));
        fs::write(&written, b"panel")?;
        Ok(vec![written])
    }
}

impl Artifact for PanelGrid {
    fn as_image_container(&mut self) -> Option<&mut dyn ImagePlotContainer> {
        Some(self)
    }
}

fn create_manager(base: &Path) -> Manager<BuildManifest> {
    Manager::new(ManagerConfig::new(base), BuildManifest::new()).unwrap()
}

#[test]
fn invariant_directories_created_idempotently() {
    let dir = tempfile::tempdir().unwrap();
    let _first = create_manager(dir.path());
    let second = create_manager(dir.path());

    for name in ["Python", "Data", "Figs"] {
        assert!(dir.path().join(name).is_dir());
    }
    assert_eq!(second.fig_dir(), Some(dir.path().join("Figs").as_path()));
}

#[test]
fn invariant_default_file_name_and_sequence() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = create_manager(dir.path());

    let figure = manager.save("alpha", &mut FakePlot, &SaveRequest::default()).unwrap();

    let expected = dir.path().join("Figs").join("Chapter1-Figure1-alpha.pdf");
    assert_eq!(figure.path(), expected);
    assert!(expected.is_file());

    let entry = manager.registry().get("alpha").unwrap();
    assert_eq!(entry.sequence, 1);
    assert_eq!(entry.figure, figure);
    assert_eq!(manager.fig_count(), 2);
}

#[test]
fn invariant_save_counts_only_successes() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = create_manager(dir.path());

    manager.save("a", &mut FakePlot, &SaveRequest::default()).unwrap();
    let err = manager.save("b", &mut Unknown, &SaveRequest::default()).unwrap_err();
    assert!(matches!(err, TexFigureError::UnsupportedArtifactType(_)));
    assert_eq!(manager.fig_count(), 2);

    let second = manager.save("c", &mut FakePlot, &SaveRequest::with_extension(".png")).unwrap();
    assert_eq!(second.file_name(), "Chapter1-Figure2-c.png");
    assert_eq!(manager.fig_count(), 3);
    assert!(matches!(manager.get("b"), Err(TexFigureError::NotFound(_))));
}

#[test]
fn invariant_get_returns_saved_figure() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = create_manager(dir.path());

    let saved = manager
        .save("flux_rope", &mut FakePlot, &SaveRequest::with_file_name("rope.pgf"))
        .unwrap();
    let fetched = manager.get("flux_rope").unwrap();

    assert_eq!(fetched, &saved);
    assert_eq!(fetched.reference(), "flux-rope");
    assert_eq!(fetched.label, "fig:flux-rope");
    assert_eq!(fetched.file_name(), "rope.pgf");
}

#[test]
fn invariant_save_registers_created_output() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = create_manager(dir.path());

    let data = manager.data_file("field.csv").unwrap();
    let figure = manager.save("alpha", &mut FakePlot, &SaveRequest::default()).unwrap();

    let manifest = manager.tracker();
    assert_eq!(data, dir.path().join("Data").join("field.csv"));
    assert_eq!(manifest.dependencies().collect::<Vec<_>>(), vec![data.as_path()]);
    assert_eq!(manifest.created().collect::<Vec<_>>(), vec![figure.path()]);
    assert!(manifest.entries[1].sha256.is_some());
}

#[test]
fn invariant_strategy_returned_path_is_registered() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = create_manager(dir.path());
    manager.register_strategy(Box::new(HistogramStrategy));
    assert_eq!(manager.strategy_names().last(), Some(&"histogram"));

    let figure = manager
        .save("hist", &mut Histogram { bins: 12 }, &SaveRequest::default())
        .unwrap();

    assert_eq!(figure.file_name(), "Chapter1-Figure1-hist.hist.png");
    assert_eq!(fs::read_to_string(figure.path()).unwrap(), "12 bins");
    assert_eq!(manager.tracker().created().next(), Some(figure.path()));
}

#[test]
fn invariant_resave_overwrites_with_new_sequence() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = create_manager(dir.path());

    manager.save("a", &mut FakePlot, &SaveRequest::default()).unwrap();
    manager.save("b", &mut FakePlot, &SaveRequest::default()).unwrap();
    let again = manager.save("a", &mut FakePlot, &SaveRequest::default()).unwrap();

    let order: Vec<_> = manager.registry().iter().map(|(r, e)| (r, e.sequence)).collect();
    assert_eq!(order, vec![("a", 3), ("b", 2)]);
    assert_eq!(manager.get("a").unwrap(), &again);
    assert_eq!(again.file_name(), "Chapter1-Figure3-a.pdf");
}

#[test]
fn invariant_multifigure_from_references() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = create_manager(dir.path());
    let a = manager.save("a", &mut FakePlot, &SaveRequest::default()).unwrap();
    let b = manager.save("b", &mut FakePlot, &SaveRequest::default()).unwrap();

    let multi = manager.get_multifigure(2, 2, &["a", "b"], "pair").unwrap();

    let slots: Vec<_> = multi.figures().collect();
    assert_eq!(slots, vec![Some(&a), Some(&b), None, None]);
    assert_eq!(multi.label, "fig:pair");
}

#[test]
fn invariant_multifigure_reference_limits() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = create_manager(dir.path());
    manager.save("a", &mut FakePlot, &SaveRequest::default()).unwrap();

    let err = manager.get_multifigure(1, 2, &["a", "b", "c"], "").unwrap_err();
    assert!(matches!(err, TexFigureError::TooManyReferences { refs: 3, nrows: 1, ncols: 2 }));

    let err = manager.get_multifigure(1, 2, &["a", "missing"], "").unwrap_err();
    assert!(matches!(err, TexFigureError::NotFound(ref r) if r == "missing"));
}

#[test]
fn invariant_build_figure_overrides_presentation() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = create_manager(dir.path());
    manager.save("a", &mut FakePlot, &SaveRequest::default()).unwrap();

    let style = FigureStyle {
        caption: Some("Velocity field".to_string()),
        placement: Some("t".to_string()),
        ..Default::default()
    };
    manager.build_figure("a", &style).unwrap();

    let latex = manager.get("a").unwrap().render_figure().unwrap();
    assert!(latex.contains(r"\begin{figure}[t]"));
    assert!(latex.contains(r"\caption{Velocity field}"));
    assert!(matches!(
        manager.build_figure("nope", &style),
        Err(TexFigureError::NotFound(_))
    ));
}

#[test]
fn invariant_slice_caption_and_continuation() {
    let mut multi = MultiFigure::new(2, 3, "grid").unwrap();
    for i in 0..6 {
        multi.append(Figure::new(format!("/figs/{}.pdf", i), None).unwrap()).unwrap();
    }
    let n = multi.len();

    for k in 1..n {
        let head = multi.slice(0..k);
        assert!(!head.continuation);
        assert_eq!(head.caption, "");

        let tail = multi.slice(k..n);
        assert!(tail.continuation);
        assert_eq!(tail.caption, "MultiFigure grid");
    }
}

#[test]
fn invariant_copy_file_import() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("external.pdf");
    fs::write(&source, b"%PDF external").unwrap();
    let mut manager = create_manager(dir.path());

    let figure = manager
        .save("ext", &mut CopyFile::new(&source), &SaveRequest::default())
        .unwrap();

    assert_eq!(fs::read(figure.path()).unwrap(), b"%PDF external");
    assert!(figure.render_figure().unwrap().contains(r"\includegraphics"));
}

#[cfg(feature = "scene")]
#[test]
fn invariant_scene_camera_options_reach_backend() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = create_manager(dir.path());
    let camera = CameraView {
        azimuth: 90.0,
        elevation: 30.0,
        distance: 250.0,
        focal_point: [1.0, 2.0, 3.0],
        anti_aliasing: 4,
        size: [640, 480],
    };
    let request = SaveRequest {
        extension: Some(".png".to_string()),
        options: SaveOptions { camera: camera.clone(), ..Default::default() },
        ..Default::default()
    };
    let mut scene = RecordingScene::default();

    let figure = manager.save("corona", &mut scene, &request).unwrap();

    assert_eq!(scene.frames, Some(4));
    assert_eq!(scene.view, Some(camera));
    assert_eq!(scene.size, Some([640, 480]));
    assert_eq!(figure.file_name(), "Chapter1-Figure1-corona.png");
    assert_eq!(manager.fig_count(), 2);
}

#[cfg(feature = "image-container")]
#[test]
fn invariant_multi_plot_container_rejected_without_side_effects() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = create_manager(dir.path());
    let mut panels = PanelGrid { plots: 2, saves: 0 };

    let err = manager.save("panels", &mut panels, &SaveRequest::default()).unwrap_err();

    assert!(matches!(err, TexFigureError::MultiPlotUnsupported(2)));
    assert_eq!(panels.saves, 0);
    assert_eq!(manager.fig_count(), 1);
    assert!(manager.registry().is_empty());
    assert_eq!(manager.tracker().created().count(), 0);

    let mut single = PanelGrid { plots: 1, saves: 0 };
    let figure = manager.save("panel", &mut single, &SaveRequest::with_extension(".png")).unwrap();
    assert_eq!(figure.file_name(), "Chapter1-Figure1-panel_Slice_x.png");
    assert_eq!(manager.registry().get("panel").unwrap().sequence, 1);
}
