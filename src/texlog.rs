//! Scanning of the compiler's `.log` output.
//!
//! The build never looks at the compiler's stdout; every decision is taken
//! from the log file the compiler writes next to the document.

use regex::Regex;
use std::sync::LazyLock;

static ERROR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^! (.*\nl\..*)$|^! (.*)$|(No pages of output\.)").unwrap()
});
static UNDEFINED_CITATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"LaTeX Warning: Citation .* undefined").unwrap());

// ============================================================================
// Errors
// ============================================================================

/// Error messages reported in the log.
///
/// A `! message` line is kept together with the `l.<n>` context line that
/// follows it, if any.
pub fn find_errors(log: &str) -> Vec<String> {
    ERROR
        .captures_iter(log)
        .filter_map(|caps| caps.iter().skip(1).flatten().next())
        .map(|m| m.as_str().replace('\r', "").trim().to_owned())
        .filter(|msg| !msg.is_empty())
        .collect()
}

// ============================================================================
// Rerun Rules
// ============================================================================

/// A log pattern meaning the document has not settled yet.
pub struct RerunRule {
    pub name: &'static str,
    regex: Regex,
}

impl RerunRule {
    fn new(name: &'static str, pattern: &str) -> Self {
        Self {
            name,
            regex: Regex::new(pattern).unwrap(),
        }
    }

    pub fn matches(&self, log: &str) -> bool {
        self.regex.is_match(log)
    }
}

/// Rules checked after every compiler pass, in order.
pub static RERUN_RULES: LazyLock<[RerunRule; 4]> = LazyLock::new(|| {
    [
        RerunRule::new("undefined-reference", r"LaTeX Warning: Reference .* undefined"),
        RerunRule::new(
            "undefined-references",
            r"LaTeX Warning: There were undefined references\.",
        ),
        RerunRule::new("labels-changed", r"LaTeX Warning: Label\(s\) may have changed\."),
        RerunRule::new("missing-toc", r"No file .*(\.toc|\.lof)\."),
    ]
});

/// First rerun rule matching `log`, if any.
pub fn needs_rerun(log: &str) -> Option<&'static RerunRule> {
    RERUN_RULES.iter().find(|rule| rule.matches(log))
}

// ============================================================================
// Notices
// ============================================================================

/// Whether the log contains the `No file <name>.` notice.
pub fn reports_missing_file(log: &str, name: &str) -> bool {
    log.contains(&format!("No file {name}."))
}

pub fn reports_undefined_citation(log: &str) -> bool {
    UNDEFINED_CITATION.is_match(log)
}

// ============================================================================
// Tests
// ============================================================================
