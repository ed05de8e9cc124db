//! `[latex]` section configuration.
//!
//! Compiler command, its fixed flags, output format and the pass limit.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[latex]` section in latexmake.toml - compiler settings.
///
/// # Example
/// ```toml
/// [latex]
/// command = "lualatex"   # overrides the pdflatex/latex choice
/// dvi = false            # produce .pdf (default) or .dvi
/// max_runs = 4
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct LatexConfig {
    /// Explicit compiler command. When unset, `pdflatex` or `latex`
    /// depending on `dvi`.
    #[serde(default = "defaults::latex::command")]
    #[educe(Default = defaults::latex::command())]
    pub command: Option<String>,

    /// Flags passed before `-jobname`.
    #[serde(default = "defaults::latex::flags")]
    #[educe(Default = defaults::latex::flags())]
    pub flags: Vec<String>,

    /// Produce DVI instead of PDF.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub dvi: bool,

    /// Upper bound on compiler passes per run.
    #[serde(default = "defaults::latex::max_runs")]
    #[educe(Default = defaults::latex::max_runs())]
    pub max_runs: usize,
}

impl LatexConfig {
    /// The compiler command actually invoked.
    pub fn effective_command(&self) -> &str {
        match &self.command {
            Some(command) => command,
            None if self.dvi => defaults::latex::DVI_COMMAND,
            None => defaults::latex::PDF_COMMAND,
        }
    }

    /// Extension of the final document, without the dot.
    pub const fn output_ext(&self) -> &'static str {
        if self.dvi { "dvi" } else { "pdf" }
    }
}
