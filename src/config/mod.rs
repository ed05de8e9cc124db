//! Build configuration from `latexmake.toml` and the command line.
//!
//! The config file is optional; every value has a default and command-line
//! flags take precedence over the file.
//!
//! # Sections
//!
//! | Section      | Purpose                                         |
//! |--------------|-------------------------------------------------|
//! | `[latex]`    | Compiler command, flags, output format, passes  |
//! | `[tools]`    | bibtex, makeindex and previewer commands        |
//! | `[behavior]` | Optional steps (clean, check-cite, preview, ..) |
//!
//! # Example
//!
//! ```toml
//! [latex]
//! command = "lualatex"
//!
//! [tools]
//! viewer = "zathura"
//!
//! [behavior]
//! clean = true
//! ```

mod behavior;
pub mod defaults;
mod error;
mod latex;
mod tools;

pub use error::ConfigError;

use behavior::BehaviorConfig;
use latex::LatexConfig;
use tools::ToolsConfig;

use crate::cli::Cli;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Root configuration structure representing latexmake.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Working directory of the document (set after loading)
    #[serde(skip)]
    pub root: PathBuf,

    /// Compiler settings
    #[serde(default)]
    pub latex: LatexConfig,

    /// Helper programs
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Optional steps
    #[serde(default)]
    pub behavior: BehaviorConfig,
}

impl Config {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Load the config file named by the CLI (if present) and apply the CLI
    /// overrides.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let root = cli.root.clone().unwrap_or_else(|| PathBuf::from("."));
        let config_path = root.join(&cli.config);

        let mut config = if config_path.is_file() {
            Self::from_path(&config_path)?
        } else {
            Self::default()
        };
        config.root = root;
        config.update_with_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        if let Some(root) = &cli.root {
            self.root = root.clone();
        }
        if let Some(command) = &cli.tex_command {
            self.latex.command = Some(command.clone());
        }

        Self::enable_if(&mut self.latex.dvi, cli.dvi);
        Self::enable_if(&mut self.behavior.clean, cli.clean);
        Self::enable_if(&mut self.behavior.check_cite, cli.check_cite);
        Self::enable_if(&mut self.behavior.preview, cli.preview);
        Self::enable_if(&mut self.behavior.notify, cli.notify);
        if cli.no_exit {
            self.behavior.exit_on_error = false;
        }
    }

    /// Boolean flags can only switch an option on.
    fn enable_if(config_option: &mut bool, flag: bool) {
        if flag {
            *config_option = true;
        }
    }

    /// Validate the effective configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.latex.max_runs == 0 {
            return Err(ConfigError::Validation(
                "[latex.max_runs] must be at least 1".into(),
            ));
        }

        let commands = [
            ("[latex.command]", self.latex.effective_command()),
            ("[tools.bibtex]", self.tools.bibtex.as_str()),
            ("[tools.makeindex]", self.tools.makeindex.as_str()),
        ];
        if let Some((field, _)) = commands.iter().find(|(_, cmd)| cmd.trim().is_empty()) {
            return Err(ConfigError::Validation(format!("{field} must not be empty")));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
