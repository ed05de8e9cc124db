//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#true() -> bool {
    true
}

pub fn r#false() -> bool {
    false
}

/// Config file looked up in the working directory.
pub const CONFIG_FILE: &str = "latexmake.toml";

// ============================================================================
// [latex] Section Defaults
// ============================================================================

pub mod latex {
    /// Compiler used for PDF output.
    pub const PDF_COMMAND: &str = "pdflatex";
    /// Compiler used for DVI output.
    pub const DVI_COMMAND: &str = "latex";

    pub fn command() -> Option<String> {
        None
    }

    pub fn flags() -> Vec<String> {
        vec![
            "-interaction=nonstopmode".into(),
            "-shell-escape".into(),
            "--synctex=1".into(),
        ]
    }

    pub fn max_runs() -> usize {
        4
    }
}

// ============================================================================
// [tools] Section Defaults
// ============================================================================

pub mod tools {
    pub fn bibtex() -> String {
        "bibtex".into()
    }

    pub fn makeindex() -> String {
        "makeindex".into()
    }

    pub fn viewer() -> Option<String> {
        None
    }
}
