//! Open the finished document in a viewer.

use crate::{
    cmd,
    log,
    logger::Logger,
    utils::exec::ToolRunner,
};
use std::{ffi::OsString, path::Path};

/// Command line opening `file` with `viewer`, or with the platform opener.
pub fn viewer_command(viewer: Option<&str>, file: &str) -> Vec<OsString> {
    match viewer {
        Some(viewer) => cmd![viewer, file],
        None if cfg!(target_os = "windows") => vec![
            OsString::from("cmd"),
            OsString::from("/C"),
            OsString::from("start"),
            OsString::from(""),
            OsString::from(file),
        ],
        None if cfg!(target_os = "macos") => cmd!["open", file],
        None => cmd!["xdg-open", file],
    }
}

/// Start a viewer for `file` in `root` without waiting for it to close.
///
/// Failures are logged, never fatal.
pub fn open_preview(
    runner: &mut impl ToolRunner,
    root: &Path,
    viewer: Option<&str>,
    file: &str,
    logger: &Logger,
) {
    log!(logger, Info, "preview"; "Opening preview...");
    let cmd = viewer_command(viewer, file);
    if let Err(err) = runner.spawn(root, &cmd) {
        log!(
            logger, Error, "preview";
            "Preview-Error: opening previewer failed with the following message:\n{err}"
        );
    }
}
