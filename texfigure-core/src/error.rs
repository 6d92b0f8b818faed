//! Error type shared by every TexFigure operation.

use std::path::PathBuf;
use thiserror::Error;

/// Boxed error returned by a plotting backend's own save routine.
pub type BackendError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum TexFigureError {
    #[error("No LaTeX include registered for extension '{0}'")]
    UnsupportedFormat(String),

    #[error("Only Figures can be appended to a MultiFigure, got {0}")]
    TypeMismatch(String),

    #[error("This MultiFigure is full ({0} slots)")]
    ContainerFull(usize),

    #[error("Unsupported MultiFigure index: {0}")]
    UnsupportedIndex(String),

    #[error("Index {index} out of bounds for a MultiFigure with {len} slots")]
    OutOfBounds { index: usize, len: usize },

    #[error("MultiFigure dimensions must be at least 1x1, got {nrows}x{ncols}")]
    InvalidGrid { nrows: usize, ncols: usize },

    #[error("No save strategy registered for artifact type {0}")]
    UnsupportedArtifactType(String),

    #[error("Figure reference not found: {0}")]
    NotFound(String),

    #[error("{refs} references do not fit in a {nrows}x{ncols} MultiFigure")]
    TooManyReferences { refs: usize, nrows: usize, ncols: usize },

    #[error("Can't handle an image plot container with {0} plots, exactly one is supported")]
    MultiPlotUnsupported(usize),

    #[error("Cannot resolve {0} to an absolute path: {1}")]
    InvalidPath(PathBuf, #[source] std::io::Error),

    #[error("The {0} directory is disabled for this manager")]
    DirectoryDisabled(&'static str),

    #[error("Backend '{kind}' failed to save figure: {source}")]
    Backend {
        kind: String,
        #[source]
        source: BackendError,
    },

    #[error(
        "Text width unavailable ({0}); add \\setpythontexcontext{{figurewidth=\\the\\textwidth}} to the preamble"
    )]
    MissingTextWidth(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TexFigureError>;
