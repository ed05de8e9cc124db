//! `[tools]` section configuration.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[tools]` section in latexmake.toml - helper programs.
///
/// # Example
/// ```toml
/// [tools]
/// bibtex = "bibtex8"
/// makeindex = "makeindex"
/// viewer = "zathura"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsConfig {
    /// Bibliography processor, invoked as `<bibtex> <base>`.
    #[serde(default = "defaults::tools::bibtex")]
    #[educe(Default = defaults::tools::bibtex())]
    pub bibtex: String,

    /// Index processor used for every glossary.
    #[serde(default = "defaults::tools::makeindex")]
    #[educe(Default = defaults::tools::makeindex())]
    pub makeindex: String,

    /// Previewer; the platform opener when unset.
    #[serde(default = "defaults::tools::viewer")]
    #[educe(Default = defaults::tools::viewer())]
    pub viewer: Option<String>,
}
