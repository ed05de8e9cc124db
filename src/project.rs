//! Resolve the project base name (the main `.tex` file without extension).
//!
//! The name comes from, in order of precedence:
//! - an explicit filename on the command line,
//! - the `.texlipse` project file, when `.texlipse` is given as filename,
//! - the single `*.tex` file in the working directory.

use crate::{
    error::{LatexMkError, Result},
    log,
    logger::Logger,
};
use regex::Regex;
use std::{
    fs,
    path::Path,
    sync::LazyLock,
    thread,
    time::Duration,
};

/// Base name of the main document, without `.tex`.
pub type ProjectName = String;

/// Project file written by the texlipse Eclipse plugin.
pub const TEXLIPSE_FILE: &str = ".texlipse";

/// Eclipse may rewrite `.texlipse` during a workspace refresh.
const TEXLIPSE_RETRY_DELAY: Duration = Duration::from_millis(100);

static TEXLIPSE_MAIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^mainTexFile=(.*)\.tex\r?$").unwrap());

/// Resolve the base name for a run in `root`.
///
/// # Errors
/// Fails when no `.tex` file (or more than one) is found, or when the
/// `.texlipse` file is missing or does not name a main file.
pub fn resolve(root: &Path, filename: Option<&str>, logger: &Logger) -> Result<ProjectName> {
    let filename = match filename {
        Some(name) => name.to_owned(),
        None => discover(root)?,
    };

    let name = if filename == TEXLIPSE_FILE {
        parse_texlipse_config(root, logger)?
    } else {
        filename
    };

    Ok(strip_tex_ext(&name).to_owned())
}

/// Find the single `*.tex` file in `root`.
fn discover(root: &Path) -> Result<String> {
    let entries = fs::read_dir(root).map_err(|err| LatexMkError::io(root, err))?;

    let mut tex_files: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|name| name.ends_with(".tex"))
        .collect();

    match tex_files.len() {
        1 => Ok(tex_files.remove(0)),
        0 => Err(LatexMkError::Project(
            "could not find one *.tex file in current directory".into(),
        )),
        _ => {
            tex_files.sort();
            Err(LatexMkError::Project(format!(
                "ambiguous filename: multiple *.tex files in current directory ({}), specify only one",
                tex_files.join(", ")
            )))
        }
    }
}

/// Read the main file name from `.texlipse`.
fn parse_texlipse_config(root: &Path, logger: &Logger) -> Result<String> {
    let path = root.join(TEXLIPSE_FILE);

    if !path.is_file() {
        thread::sleep(TEXLIPSE_RETRY_DELAY);
        if !path.is_file() {
            return Err(LatexMkError::Project(
                "! Fatal error: File .texlipse is missing.".into(),
            ));
        }
    }

    let content = fs::read_to_string(&path).map_err(|err| LatexMkError::io(&path, err))?;
    match TEXLIPSE_MAIN.captures(&content) {
        Some(caps) => {
            let name = caps[1].to_owned();
            log!(logger, Info, "project"; "Found inputfile in \".texlipse\": {name}.tex");
            Ok(name)
        }
        None => Err(LatexMkError::Project(
            "! Fatal error: Parsing .texlipse failed.".into(),
        )),
    }
}

#[inline]
fn strip_tex_ext(name: &str) -> &str {
    name.strip_suffix(".tex").unwrap_or(name)
}

// ============================================================================
// Tests
// ============================================================================
