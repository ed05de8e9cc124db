//! Parsing of compiler-generated auxiliary files and bibliography sources.
//!
//! Only the handful of directives the build decisions depend on are
//! recognised:
//!
//! | Directive                                    | Used for                 |
//! |----------------------------------------------|--------------------------|
//! | `\citation{key}`                             | citation snapshot        |
//! | `\@input{file.aux}`                          | nested aux files         |
//! | `\bibdata{name}`                             | bibliography source      |
//! | `\bibcite{key}{..}`                          | uncited-entry check      |
//! | `\@newglossary{name}{log}{in}{out}`          | glossary registry        |
//! | `@type{key,` (in `.bib`)                     | uncited-entry check      |

use crate::error::{LatexMkError, Result};
use regex::Regex;
use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::Path,
    sync::LazyLock,
};

static CITE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\\citation\{([^}]*)\}").unwrap());
static INPUT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\@input\{([^}]*\.aux)\}").unwrap());
static BIBDATA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\\bibdata\{([^}]*)\}").unwrap());
static BIBCITE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\\bibcite\{([^}]*)\}").unwrap());
static NEWGLOSSARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\@newglossary\{([^}]*)\}\{[^}]*\}\{([^}]*)\}\{([^}]*)\}").unwrap()
});
static BIBENTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*@\w+\s*\{\s*([^,\s{}]+)\s*,").unwrap());

// ============================================================================
// Citations
// ============================================================================

/// Citation key -> number of `\citation` markers.
pub type Counts = BTreeMap<String, usize>;

/// Aux file name -> citation counts of that file.
pub type CiteCounter = BTreeMap<String, Counts>;

/// Count the citation markers in one aux file.
///
/// Returns `None` if the file cannot be read.
pub fn count_citations(path: &Path) -> Option<Counts> {
    let content = fs::read_to_string(path).ok()?;
    Some(count_citations_in(&content))
}

/// Count the citation markers in aux file content.
pub fn count_citations_in(content: &str) -> Counts {
    let mut counts = Counts::new();
    for caps in CITE.captures_iter(content) {
        *counts.entry(caps[1].to_owned()).or_default() += 1;
    }
    counts
}

/// Citation snapshot of the main aux file and every aux file it includes.
///
/// Included files that cannot be read are left out of the snapshot.
///
/// # Errors
/// Fails if the main aux file cannot be read.
pub fn citation_counter(root: &Path, main_aux: &str) -> Result<CiteCounter> {
    let path = root.join(main_aux);
    let content = fs::read_to_string(&path).map_err(|err| LatexMkError::io(&path, err))?;

    let mut counter = CiteCounter::new();
    counter.insert(main_aux.to_owned(), count_citations_in(&content));

    for caps in INPUT.captures_iter(&content) {
        let included = &caps[1];
        if let Some(counts) = count_citations(&root.join(included)) {
            counter.insert(included.to_owned(), counts);
        }
    }

    Ok(counter)
}

/// Snapshot used when no aux file exists yet.
pub fn empty_counter(main_aux: &str) -> CiteCounter {
    CiteCounter::from([(main_aux.to_owned(), Counts::new())])
}

// ============================================================================
// Glossaries
// ============================================================================

/// File extensions of one glossary.
///
/// The compiler writes `<base>.<ext_out>`; the index tool turns it into
/// `<base>.<ext_in>`, which the compiler reads on the next pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Glossary {
    pub ext_in: String,
    pub ext_out: String,
}

impl Glossary {
    pub fn input_file(&self, base: &str) -> String {
        format!("{base}.{}", self.ext_in)
    }

    pub fn output_file(&self, base: &str) -> String {
        format!("{base}.{}", self.ext_out)
    }
}

/// Glossary name -> extensions.
pub type Glossaries = BTreeMap<String, Glossary>;

/// Collect every `\@newglossary` declaration.
///
/// A later declaration of the same name replaces an earlier one.
pub fn parse_glossaries(content: &str) -> Glossaries {
    NEWGLOSSARY
        .captures_iter(content)
        .map(|caps| {
            let glossary = Glossary {
                ext_in: caps[2].to_owned(),
                ext_out: caps[3].to_owned(),
            };
            (caps[1].to_owned(), glossary)
        })
        .collect()
}

// ============================================================================
// Bibliography
// ============================================================================

/// Name of the bibliography source (without `.bib`), if the document has one.
pub fn bib_data(content: &str) -> Option<String> {
    BIBDATA.captures(content).map(|caps| caps[1].to_owned())
}

/// Keys the bibliography tool resolved (`\bibcite`).
pub fn bibcite_keys(content: &str) -> BTreeSet<String> {
    BIBCITE
        .captures_iter(content)
        .map(|caps| caps[1].to_owned())
        .collect()
}

/// Entry keys defined in a `.bib` source, in file order.
pub fn bib_entry_keys(content: &str) -> Vec<String> {
    BIBENTRY
        .captures_iter(content)
        .map(|caps| caps[1].to_owned())
        .collect()
}

/// Entries of `bib` that no `\bibcite` in `aux` refers to.
pub fn uncited_entries(aux: &str, bib: &str) -> Vec<String> {
    let cited = bibcite_keys(aux);
    bib_entry_keys(bib)
        .into_iter()
        .filter(|key| !cited.contains(key))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
