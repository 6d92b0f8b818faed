//! TexFigure Core - plots to LaTeX figures
//!
//! Save plots from any backend through a [`Manager`], which names the
//! files, reports them to the typesetting session, and hands back
//! [`Figure`]s that render as `figure` / `subfigure` markup.
//! Several figures can be grouped into a [`MultiFigure`] grid.

pub mod config;
pub mod error;
pub mod figure;
pub mod hashing;
pub mod manager;
pub mod multifigure;
pub mod plot_setup;
pub mod save;
pub mod tracking;

pub use config::{DirSetting, DirectoryKind, ManagerConfig};
pub use error::{BackendError, Result, TexFigureError};
pub use figure::{Figure, FigureStyle, IncludeFn, IncludeTable};
pub use manager::{FigureRegistry, Manager, RegistryEntry, SaveRequest};
pub use multifigure::{GridIndex, MultiFigure, Selection};
pub use plot_setup::{figsize, LatexPlotSettings};
pub use save::{
    Artifact, CameraView, CopyFile, ImagePlotContainer, PlotFigure, SaveOptions, SaveStrategy,
    SceneView,
};
pub use tracking::{BuildManifest, BuildTracker, NullTracker};
