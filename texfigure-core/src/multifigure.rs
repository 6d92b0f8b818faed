//! MultiFigure - a fixed grid of subfigures
//!
//! Slots are addressed by a flat row-major index. Slicing a grid produces a
//! new grid; a slice that does not start at 0 is a continuation of the
//! original float, and only the slice reaching the end keeps the caption.

use serde::Serialize;
use std::any::Any;
use std::ops::{Range, RangeFrom, RangeFull, RangeTo};

use crate::error::{Result, TexFigureError};
use crate::figure::{sanitize_reference, Figure};

/// Ways to index a [`MultiFigure`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridIndex {
    Flat(usize),
    /// Half-open range, clamped to the grid length.
    Span(Range<usize>),
    /// Only `step == 1` is contiguous.
    Strided { range: Range<usize>, step: usize },
}

impl From<usize> for GridIndex {
    fn from(index: usize) -> Self {
        GridIndex::Flat(index)
    }
}

impl From<Range<usize>> for GridIndex {
    fn from(range: Range<usize>) -> Self {
        GridIndex::Span(range)
    }
}

impl From<RangeFrom<usize>> for GridIndex {
    fn from(range: RangeFrom<usize>) -> Self {
        GridIndex::Span(range.start..usize::MAX)
    }
}

impl From<RangeTo<usize>> for GridIndex {
    fn from(range: RangeTo<usize>) -> Self {
        GridIndex::Span(0..range.end)
    }
}

impl From<RangeFull> for GridIndex {
    fn from(_: RangeFull) -> Self {
        GridIndex::Span(0..usize::MAX)
    }
}

/// Result of [`MultiFigure::select`].
#[derive(Debug, Clone, PartialEq)]
pub enum Selection<'a> {
    /// `None` is an empty slot.
    Slot(Option<&'a Figure>),
    Slice(MultiFigure),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiFigure {
    nrows: usize,
    ncols: usize,
    reference: String,
    pub caption: String,
    pub label: String,
    pub placement: String,
    pub continuation: bool,
    figures: Vec<Option<Figure>>,
}

impl MultiFigure {
    pub fn new(nrows: usize, ncols: usize, reference: &str) -> Result<Self> {
        let slots = nrows
            .checked_mul(ncols)
            .filter(|&n| n > 0)
            .ok_or(TexFigureError::InvalidGrid { nrows, ncols })?;
        let reference = sanitize_reference(reference);
        Ok(Self {
            nrows,
            ncols,
            caption: format!("MultiFigure {}", reference),
            label: format!("fig:{}", reference),
            placement: "H".to_string(),
            continuation: false,
            figures: vec![None; slots],
            reference,
        })
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Number of slots, occupied or not.
    pub fn len(&self) -> usize {
        self.figures.len()
    }

    /// True when no slot holds a figure.
    pub fn is_vacant(&self) -> bool {
        self.figures.iter().all(Option::is_none)
    }

    pub fn is_full(&self) -> bool {
        self.figures.iter().all(Option::is_some)
    }

    /// Place `figure` in the first empty slot, returning its flat index.
    pub fn append(&mut self, figure: Figure) -> Result<usize> {
        let slot = self
            .figures
            .iter()
            .position(Option::is_none)
            .ok_or(TexFigureError::ContainerFull(self.figures.len()))?;
        self.figures[slot] = Some(figure);
        Ok(slot)
    }

    /// [`append`](Self::append) for values whose type is only known at runtime.
    pub fn append_any(&mut self, item: Box<dyn Any>) -> Result<usize> {
        match item.downcast::<Figure>() {
            Ok(figure) => self.append(*figure),
            Err(_) => Err(TexFigureError::TypeMismatch("a non-Figure value".to_string())),
        }
    }

    pub fn get(&self, index: usize) -> Result<Option<&Figure>> {
        self.figures
            .get(index)
            .map(Option::as_ref)
            .ok_or(TexFigureError::OutOfBounds { index, len: self.figures.len() })
    }

    pub fn figures(&self) -> impl Iterator<Item = Option<&Figure>> {
        self.figures.iter().map(Option::as_ref)
    }

    pub fn select(&self, index: impl Into<GridIndex>) -> Result<Selection<'_>> {
        match index.into() {
            GridIndex::Flat(index) => self.get(index).map(Selection::Slot),
            GridIndex::Span(range) => Ok(Selection::Slice(self.slice(range))),
            GridIndex::Strided { range, step: 1 } => Ok(Selection::Slice(self.slice(range))),
            GridIndex::Strided { range, step } => Err(TexFigureError::UnsupportedIndex(format!(
                "{}..{} step {}",
                range.start, range.end, step
            ))),
        }
    }

    /// Copy a contiguous run of slots into a new grid with the same columns.
    pub fn slice(&self, range: Range<usize>) -> MultiFigure {
        let len = self.figures.len();
        let end = range.end.min(len);
        let start = range.start.min(end);
        let taken = &self.figures[start..end];

        let nrows = taken.len().div_ceil(self.ncols).max(1);
        let mut figures = vec![None; nrows * self.ncols];
        figures[..taken.len()].clone_from_slice(taken);

        MultiFigure {
            nrows,
            ncols: self.ncols,
            reference: self.reference.clone(),
            // middle slices are continuations without a caption
            caption: if end == len { self.caption.clone() } else { String::new() },
            label: self.label.clone(),
            placement: self.placement.clone(),
            continuation: start != 0,
            figures,
        }
    }

    fn frontmatter(&self) -> String {
        if self.continuation {
            "\\centering\n    \\ContinuedFloat".to_string()
        } else {
            "\\centering".to_string()
        }
    }

    /// A `figure*` environment holding each occupied slot as a subfigure.
    pub fn render(&self) -> Result<String> {
        let mut subfigures = String::new();
        for (i, figure) in self.figures.iter().enumerate() {
            if let Some(figure) = figure {
                if i % self.ncols == 0 {
                    subfigures.push('\n');
                }
                subfigures.push_str(&figure.render_subfigure()?);
            }
        }

        Ok(format!(
            r"
\begin{{figure*}}
    {frontmatter}
    {subfigures}
    \caption{{{caption}}}
    \label{{{label}}}
\end{{figure*}}
",
            frontmatter = self.frontmatter(),
            subfigures = subfigures,
            caption = self.caption,
            label = self.label,
        ))
    }
}
