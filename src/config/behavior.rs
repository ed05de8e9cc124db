//! `[behavior]` section configuration.
//!
//! Optional steps of a run. Every field can also be switched on from the
//! command line.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[behavior]` section in latexmake.toml.
///
/// # Example
/// ```toml
/// [behavior]
/// clean = true           # remove generated temporary files afterwards
/// exit_on_error = false  # keep going when the log reports errors
/// check_cite = true      # list bibliography entries that are never cited
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BehaviorConfig {
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub clean: bool,

    /// Abort when the compiler log reports errors.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub exit_on_error: bool,

    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub check_cite: bool,

    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub preview: bool,

    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub notify: bool,
}
