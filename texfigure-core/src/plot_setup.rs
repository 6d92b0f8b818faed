//! LaTeX-native plot sizing and defaults
//!
//! Figures sized from the document's text width and drawn with the
//! document's fonts drop into the page without rescaling.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{Result, TexFigureError};

/// TeX points per inch.
pub const POINTS_PER_INCH: f64 = 72.27;

pub const DEFAULT_SCALE: f64 = 0.95;

pub fn golden_mean() -> f64 {
    (5.0_f64.sqrt() - 1.0) / 2.0
}

pub fn pt_to_in(points: f64) -> f64 {
    points / POINTS_PER_INCH
}

/// `(width, height)` in inches: `scale` of the text width, golden-ratio height.
pub fn figsize(textwidth_pt: f64, scale: f64) -> (f64, f64) {
    let width = scale * pt_to_in(textwidth_pt);
    (width, width * golden_mean())
}

/// Parse a TeX dimension such as `345.0pt` from the session context.
pub fn textwidth_from_context(value: Option<&str>) -> Result<f64> {
    let value = value.map(str::trim).unwrap_or_default();
    let number = value
        .strip_suffix("pt")
        .ok_or_else(|| TexFigureError::MissingTextWidth(format!("got '{}'", value)))?;
    let points: f64 = number
        .trim()
        .parse()
        .map_err(|_| TexFigureError::MissingTextWidth(format!("'{}' is not a length", value)))?;
    if !(points > 0.0 && points.is_finite()) {
        return Err(TexFigureError::MissingTextWidth(format!("'{}' is not positive", value)));
    }
    Ok(points)
}

/// Plotting defaults that match a pdflatex document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatexPlotSettings {
    pub tex_system: String,
    pub use_tex: bool,
    pub font_family: String,
    pub font_size: u32,
    pub axes_label_size: u32,
    pub legend_font_size: u32,
    pub tick_label_size: u32,
    pub figsize: (f64, f64),
    pub preamble: Vec<String>,
}

impl Default for LatexPlotSettings {
    fn default() -> Self {
        Self {
            tex_system: "pdflatex".to_string(),
            use_tex: true,
            font_family: "serif".to_string(),
            font_size: 10,
            axes_label_size: 10,
            legend_font_size: 8,
            tick_label_size: 8,
            // 345pt is the article class text width
            figsize: figsize(345.0, DEFAULT_SCALE),
            preamble: vec![
                r"\usepackage[utf8x]{inputenc}".to_string(),
                r"\usepackage[T1]{fontenc}".to_string(),
            ],
        }
    }
}

impl LatexPlotSettings {
    /// Defaults sized for the document's text width.
    pub fn for_textwidth(textwidth: Option<&str>, scale: f64) -> Result<Self> {
        let points = textwidth_from_context(textwidth)?;
        Ok(Self {
            figsize: figsize(points, scale),
            ..Self::default()
        })
    }

    /// Flat rc-style key/value map for a plotting backend.
    pub fn to_rc_params(&self) -> Map<String, Value> {
        let params = json!({
            "pgf.texsystem": self.tex_system,
            "text.usetex": self.use_tex,
            "font.size": self.font_size,
            "font.family": self.font_family,
            // empty lists inherit fonts from the document
            "font.serif": [],
            "font.sans-serif": [],
            "font.monospace": [],
            "axes.labelsize": self.axes_label_size,
            "legend.fontsize": self.legend_font_size,
            "xtick.labelsize": self.tick_label_size,
            "ytick.labelsize": self.tick_label_size,
            "figure.figsize": [self.figsize.0, self.figsize.1],
            "pgf.preamble": self.preamble,
        });
        match params {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}
