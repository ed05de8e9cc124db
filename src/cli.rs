//! Command-line interface definitions.
//!
//! Defines all CLI arguments using clap.

use crate::config::defaults;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Completely automates the process of generating a LaTeX document:
/// runs the compiler as often as needed and calls bibtex and makeindex
/// only when their inputs changed.
#[derive(Parser, Debug, Clone, Default)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Input filename. If omitted the working directory is searched for a
    /// single *.tex file. Specify ".texlipse" to read the main file from a
    /// texlipse project file.
    pub filename: Option<String>,

    /// Clean all temporary files after converting
    #[arg(short, long)]
    pub clean: bool,

    /// Don't print status messages. Specify twice not to show error messages either
    #[arg(short, long, action = ArgAction::Count)]
    pub quiet: u8,

    /// Show debugging information
    #[arg(short, long)]
    pub debug: bool,

    /// Don't exit if an error occurs
    #[arg(short = 'n', long = "no-exit")]
    pub no_exit: bool,

    /// Notify through the desktop environment when the build finished and
    /// if errors occurred
    #[arg(short = 'N', long)]
    pub notify: bool,

    /// Try to open a preview of the generated document
    #[arg(short, long)]
    pub preview: bool,

    /// Use "latex" instead of "pdflatex"
    #[arg(long)]
    pub dvi: bool,

    /// The latex compiler command to use
    #[arg(short = 't', long = "tex-command")]
    pub tex_command: Option<String>,

    /// Check the bibtex file for uncited entries
    #[arg(long = "check-cite")]
    pub check_cite: bool,

    /// Working directory of the document (default: current directory)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Config file name, relative to the working directory
    #[arg(short = 'C', long, default_value = defaults::CONFIG_FILE)]
    pub config: PathBuf,
}
