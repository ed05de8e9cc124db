//! External command execution.
//!
//! The build tools (the LaTeX compiler, `bibtex`, `makeindex`) and
//! `notify-send` run to completion with their output discarded. Only the
//! files a tool writes are inspected afterwards. The previewer is spawned
//! and left running.

use crate::error::{LatexMkError, Result};
use std::{
    env,
    ffi::OsString,
    path::Path,
    process::{Child, Command, ExitStatus, Stdio},
};

// ============================================================================
// Macros
// ============================================================================

/// Build a command line as `Vec<OsString>`, dropping empty arguments.
///
/// # Examples
/// ```ignore
/// let cmd = cmd![&self.latex_cmd, "-jobname", &self.name, format!("{}.tex", self.name)];
/// runner.run(root, &cmd)?;
/// ```
#[macro_export]
macro_rules! cmd {
    ($($arg:expr),* $(,)?) => {
        $crate::utils::exec::internal::filter_args(&[
            $($crate::utils::exec::internal::to_os($arg)),*
        ])
    };
}

// ============================================================================
// Argument Conversion
// ============================================================================

#[doc(hidden)]
pub mod internal {
    use std::ffi::OsString;

    /// Convert to `OsString`.
    #[inline]
    pub fn to_os<S: Into<OsString>>(s: S) -> OsString {
        s.into()
    }

    /// Filter out empty args.
    #[inline]
    pub fn filter_args(args: &[OsString]) -> Vec<OsString> {
        args.iter().filter(|a| !a.is_empty()).cloned().collect()
    }
}

// ============================================================================
// Runner
// ============================================================================

/// Runs external tools on behalf of the build.
///
/// The real implementation spawns processes; tests substitute a scripted
/// runner that writes the files a tool would have produced.
pub trait ToolRunner {
    /// Run `cmd` (program followed by arguments) inside `root` and block
    /// until it exits.
    ///
    /// A non-zero exit status is not an error: the compiler reports failures
    /// through its log file, which the caller scans.
    ///
    /// # Errors
    /// Returns [`LatexMkError::ToolNotFound`] if the program cannot be found
    /// or launched.
    fn run(&mut self, root: &Path, cmd: &[OsString]) -> Result<()>;

    /// Start `cmd` inside `root` without waiting for it to exit.
    ///
    /// # Errors
    /// Returns [`LatexMkError::ToolNotFound`] if the program cannot be found
    /// or launched.
    fn spawn(&mut self, root: &Path, cmd: &[OsString]) -> Result<()>;
}

/// [`ToolRunner`] backed by real child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl ToolRunner for ProcessRunner {
    fn run(&mut self, root: &Path, cmd: &[OsString]) -> Result<()> {
        exec(Some(root), cmd).map(|_| ())
    }

    fn spawn(&mut self, root: &Path, cmd: &[OsString]) -> Result<()> {
        // the viewer outlives the build; its handle is dropped unwaited
        spawn(Some(root), cmd).map(|_| ())
    }
}

// ============================================================================
// Command Execution
// ============================================================================

/// Execute a command with stdin, stdout and stderr nulled.
///
/// The program is looked up on `PATH` (relative paths resolve against
/// `root`) before spawning so a missing tool is reported by name.
///
/// # Errors
/// Returns [`LatexMkError::ToolNotFound`] if the command is empty, cannot be
/// found, or fails to spawn.
pub fn exec(root: Option<&Path>, cmd: &[OsString]) -> Result<ExitStatus> {
    let (name, mut command) = prepare(root, cmd)?;

    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    command
        .status()
        .map_err(|_| LatexMkError::ToolNotFound(name))
}

/// Spawn a command with stdin, stdout and stderr nulled and return its handle.
///
/// # Errors
/// Returns [`LatexMkError::ToolNotFound`] if the command is empty, cannot be
/// found, or fails to spawn.
pub fn spawn(root: Option<&Path>, cmd: &[OsString]) -> Result<Child> {
    let (name, mut command) = prepare(root, cmd)?;

    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    command
        .spawn()
        .map_err(|_| LatexMkError::ToolNotFound(name))
}

/// Resolve the program and prepare a `Command` from components.
fn prepare(root: Option<&Path>, cmd: &[OsString]) -> Result<(String, Command)> {
    let Some((program, args)) = cmd.split_first() else {
        return Err(LatexMkError::ToolNotFound(String::new()));
    };
    let name = program.to_string_lossy().into_owned();

    let cwd = match root {
        Some(dir) => dir.to_path_buf(),
        None => env::current_dir().map_err(|err| LatexMkError::io(".", err))?,
    };
    let resolved = which::which_in(program, env::var_os("PATH"), &cwd)
        .map_err(|_| LatexMkError::ToolNotFound(name.clone()))?;

    let mut command = Command::new(resolved);
    command.args(args);

    if let Some(dir) = root {
        command.current_dir(dir);
    }

    Ok((name, command))
}

// ============================================================================
// Tests
// ============================================================================
