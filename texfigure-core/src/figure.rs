//! Figure - one saved file that knows how to render itself as LaTeX
//!
//! The include command used for the file is looked up by extension in an
//! [`IncludeTable`], so new file types are registered, not branched on.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Result, TexFigureError};

/// Builds the LaTeX include command for a figure's file.
pub type IncludeFn = fn(&Figure) -> String;

/// Extension (with leading dot) to include command mapping.
#[derive(Clone)]
pub struct IncludeTable {
    strategies: BTreeMap<String, IncludeFn>,
}

impl IncludeTable {
    pub fn empty() -> Self {
        Self { strategies: BTreeMap::new() }
    }

    pub fn register(&mut self, extension: &str, include: IncludeFn) {
        self.strategies.insert(extension.to_string(), include);
    }

    pub fn get(&self, extension: &str) -> Option<IncludeFn> {
        self.strategies.get(extension).copied()
    }

    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.strategies.keys().map(String::as_str)
    }
}

impl Default for IncludeTable {
    fn default() -> Self {
        let mut table = Self::empty();
        table.register(".pgf", pgf_include);
        table.register(".png", standard_include);
        table.register(".pdf", standard_include);
        table
    }
}

impl fmt::Debug for IncludeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.strategies.keys()).finish()
    }
}

/// `\IfFileExists` guarded `\import`, pgf files carry their own fonts and sizing.
pub fn pgf_include(figure: &Figure) -> String {
    format!(
        r"\IfFileExists{{{file}}}{{\import{{{dir}}}{{{name}}}}}{{}}",
        file = figure.path.display(),
        dir = figure.base_dir(),
        name = figure.file_name(),
    )
}

pub fn standard_include(figure: &Figure) -> String {
    format!(
        r"\includegraphics[width={width}]{{{file}}}",
        width = figure.figure_width,
        file = figure.path.display(),
    )
}

/// Presentation overrides applied to an existing figure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FigureStyle {
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub placement: Option<String>,
    #[serde(default)]
    pub figure_width: Option<String>,
    #[serde(default)]
    pub subfig_width: Option<String>,
    #[serde(default)]
    pub subfig_placement: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Figure {
    path: PathBuf,
    reference: String,
    pub caption: String,
    pub label: String,
    pub placement: String,
    pub figure_width: String,
    pub subfig_width: String,
    pub subfig_placement: String,
    #[serde(skip)]
    includes: IncludeTable,
}

/// Underscores are not safe in LaTeX labels.
pub(crate) fn sanitize_reference(reference: &str) -> String {
    reference.replace('_', "-")
}

impl Figure {
    /// Wrap an existing file. The reference defaults to the file stem.
    pub fn new(path: impl AsRef<Path>, reference: Option<&str>) -> Result<Self> {
        let path = path.as_ref();
        let path = std::path::absolute(path)
            .map_err(|e| TexFigureError::InvalidPath(path.to_path_buf(), e))?;

        let reference = match reference {
            Some(r) if !r.is_empty() => r.to_string(),
            _ => path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };
        let reference = sanitize_reference(&reference);

        Ok(Self {
            caption: format!("Figure {}", reference),
            label: format!("fig:{}", reference),
            placement: "h".to_string(),
            figure_width: r"0.95\columnwidth".to_string(),
            subfig_width: r"0.45\columnwidth".to_string(),
            subfig_placement: "b".to_string(),
            includes: IncludeTable::default(),
            path,
            reference,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Base name of the file.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Containing directory with a trailing slash, as `\import` expects.
    pub fn base_dir(&self) -> String {
        let dir = self
            .path
            .parent()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        format!("{}/", dir)
    }

    /// Extension with its leading dot, empty if the file has none.
    pub fn extension(&self) -> String {
        self.path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default()
    }

    pub fn register_include(&mut self, extension: &str, include: IncludeFn) {
        self.includes.register(extension, include);
    }

    pub fn includes(&self) -> &IncludeTable {
        &self.includes
    }

    pub fn apply_style(&mut self, style: &FigureStyle) {
        let fields = [
            (&mut self.caption, &style.caption),
            (&mut self.label, &style.label),
            (&mut self.placement, &style.placement),
            (&mut self.figure_width, &style.figure_width),
            (&mut self.subfig_width, &style.subfig_width),
            (&mut self.subfig_placement, &style.subfig_placement),
        ];
        for (field, value) in fields {
            if let Some(value) = value {
                *field = value.clone();
            }
        }
    }

    fn include(&self) -> Result<String> {
        let extension = self.extension();
        let include = self
            .includes
            .get(&extension)
            .ok_or(TexFigureError::UnsupportedFormat(extension))?;
        Ok(include(self))
    }

    /// A complete `figure` environment.
    pub fn render_figure(&self) -> Result<String> {
        let include = self.include()?;
        Ok(format!(
            r"
\begin{{figure}}[{placement}]
    \centering
    {include}
    \caption{{{caption}}}
    \label{{{label}}}
\end{{figure}}
",
            placement = self.placement,
            include = include,
            caption = self.caption,
            label = self.label,
        ))
    }

    /// A `subfigure` environment for use inside a [`crate::MultiFigure`].
    pub fn render_subfigure(&self) -> Result<String> {
        let include = self.include()?;
        Ok(format!(
            r"
    \begin{{subfigure}}[{placement}]{{{width}}}
        {include}
        \caption{{{caption}}}
        \label{{{label}}}
    \end{{subfigure}}",
            placement = self.subfig_placement,
            width = self.subfig_width,
            include = include,
            caption = self.caption,
            label = self.label,
        ))
    }
}

// Include tables hold fn pointers, equality is over the file and presentation.
impl PartialEq for Figure {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
            && self.reference == other.reference
            && self.caption == other.caption
            && self.label == other.label
            && self.placement == other.placement
            && self.figure_width == other.figure_width
            && self.subfig_width == other.subfig_width
            && self.subfig_placement == other.subfig_placement
    }
}
