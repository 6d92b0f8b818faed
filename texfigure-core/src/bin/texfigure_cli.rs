//! TexFigure CLI - LaTeX markup for existing plot files
//!
//! Commands: figure, multifigure, import, figsize
//! Markup or JSON on stdout, logs on stderr (RUST_LOG)
//! Returns non-zero on any error

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

use texfigure_core::{
    BuildManifest, CopyFile, Figure, LatexPlotSettings, Manager, ManagerConfig,
    MultiFigure, SaveRequest, TexFigureError,
};

#[derive(Parser)]
#[command(name = "texfigure-cli")]
#[command(about = "TexFigure CLI - wrap plot files in LaTeX figure markup")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the figure environment for a file
    Figure {
        path: PathBuf,

        /// Reference used for caption and label (default: file stem)
        #[arg(short, long)]
        reference: Option<String>,

        /// Print a subfigure instead of a full figure
        #[arg(long)]
        subfigure: bool,
    },

    /// Print a figure* grid of subfigures
    Multifigure {
        #[arg(long)]
        rows: usize,

        #[arg(long)]
        cols: usize,

        #[arg(short, long, default_value = "")]
        reference: String,

        /// First flat slot to print
        #[arg(long)]
        start: Option<usize>,

        /// One past the last flat slot to print
        #[arg(long)]
        end: Option<usize>,

        paths: Vec<PathBuf>,
    },

    /// Copy a plot into a manager's figure directory and register it
    Import {
        /// Manager configuration (JSON)
        #[arg(short, long)]
        config: PathBuf,

        #[arg(short, long)]
        reference: String,

        source: PathBuf,

        #[arg(long)]
        file_name: Option<String>,

        #[arg(long)]
        extension: Option<String>,
    },

    /// Print the figure size and plot settings for a text width
    Figsize {
        /// Text width as a TeX dimension, e.g. 345.0pt
        #[arg(long)]
        textwidth: String,

        #[arg(long, default_value_t = texfigure_core::plot_setup::DEFAULT_SCALE)]
        scale: f64,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImportOutput<'a> {
    success: bool,
    figure: &'a Figure,
    latex: String,
    manifest: &'a BuildManifest,
    manifest_digest: String,
}

fn run(command: Commands) -> Result<String, TexFigureError> {
    match command {
        Commands::Figure { path, reference, subfigure } => {
            let figure = Figure::new(&path, reference.as_deref())?;
            if subfigure {
                figure.render_subfigure()
            } else {
                figure.render_figure()
            }
        }

        Commands::Multifigure { rows, cols, reference, start, end, paths } => {
            let mut multi = MultiFigure::new(rows, cols, &reference)?;
            for path in &paths {
                multi.append(Figure::new(path, None)?)?;
            }
            if start.is_some() || end.is_some() {
                multi = multi.slice(start.unwrap_or(0)..end.unwrap_or(usize::MAX));
            }
            multi.render()
        }

        Commands::Import { config, reference, source, file_name, extension } => {
            let config = ManagerConfig::load(&config)?;
            let mut manager = Manager::new(config, BuildManifest::new())?;
            let request = SaveRequest { file_name, extension, ..Default::default() };

            let figure = manager.save(&reference, &mut CopyFile::new(source), &request)?;
            let latex = figure.render_figure()?;
            let manifest = manager.tracker();
            let output = ImportOutput {
                success: true,
                figure: &figure,
                latex,
                manifest,
                manifest_digest: manifest.digest()?,
            };
            Ok(serde_json::to_string_pretty(&output)?)
        }

        Commands::Figsize { textwidth, scale } => {
            let settings = LatexPlotSettings::for_textwidth(Some(&textwidth), scale)?;
            let (width, height) = settings.figsize;
            let output = serde_json::json!({
                "width": width,
                "height": height,
                "rcParams": settings.to_rc_params(),
            });
            Ok(serde_json::to_string_pretty(&output)?)
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match run(cli.command) {
        Ok(out) => {
            println!("{}", out);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{}", e);
            let output = serde_json::json!({
                "success": false,
                "error": e.to_string(),
            });
            println!("{}", output);
            ExitCode::FAILURE
        }
    }
}
