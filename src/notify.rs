//! Desktop notifications through `notify-send`.

use crate::{cmd, utils::exec::exec};

#[cfg(test)]
use std::cell::RefCell;

const NOTIFY_COMMAND: &str = "notify-send";

/// Summary and optional body of one notification.
#[cfg(test)]
pub type Notification = (String, Option<String>);

#[derive(Debug, Clone)]
enum Backend {
    Command(String),
    #[cfg(test)]
    Memory(RefCell<Vec<Notification>>),
}

/// Sends desktop notifications.
///
/// Failures are swallowed: the notifier mirrors error messages, so reporting
/// its own failure through the logger would recurse.
#[derive(Debug, Clone)]
pub struct Notifier {
    backend: Backend,
}

impl Notifier {
    /// Notifier using `notify-send` if it is installed.
    pub fn detect() -> Option<Self> {
        which::which(NOTIFY_COMMAND).ok().map(|_| Self {
            backend: Backend::Command(NOTIFY_COMMAND.into()),
        })
    }

    /// Notifier that records notifications instead of showing them.
    #[cfg(test)]
    pub fn memory() -> Self {
        Self {
            backend: Backend::Memory(RefCell::new(Vec::new())),
        }
    }

    pub fn send(&self, summary: &str, body: Option<&str>) {
        match &self.backend {
            Backend::Command(command) => {
                let cmd = cmd![command, summary, body.unwrap_or_default()];
                let _ = exec(None, &cmd);
            }
            #[cfg(test)]
            Backend::Memory(sent) => sent
                .borrow_mut()
                .push((summary.to_owned(), body.map(str::to_owned))),
        }
    }

    /// Notifications recorded by a [`Notifier::memory`] notifier.
    #[cfg(test)]
    pub fn sent(&self) -> Vec<Notification> {
        match &self.backend {
            Backend::Memory(sent) => sent.borrow().clone(),
            Backend::Command(_) => Vec::new(),
        }
    }
}
