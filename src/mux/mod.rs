//! The narrow interface the executor uses to drive a terminal multiplexer.

mod tmux;

#[cfg(test)]
pub mod fake;

use std::path::Path;

use crate::error::MuxError;
use crate::layout::{PaneSize, Split};

pub use tmux::Tmux;

/// Identifiers of a freshly created window and its only pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedWindow {
    pub window: String,
    pub pane: String,
}

/// Operations on the multiplexer's session table.
///
/// Implementations only ever add to the session table or query it; nothing
/// here kills or rewrites sessions the caller did not create.
pub trait Multiplexer {
    fn has_session(&mut self, session: &str) -> Result<bool, MuxError>;

    /// Create a detached session rooted at `root`.
    fn new_session(&mut self, session: &str, root: &Path) -> Result<CreatedWindow, MuxError>;

    /// Names of the windows currently in `session`.
    fn list_windows(&mut self, session: &str) -> Result<Vec<String>, MuxError>;

    fn new_window(
        &mut self,
        session: &str,
        name: &str,
        root: &Path,
    ) -> Result<CreatedWindow, MuxError>;

    fn rename_window(&mut self, window: &str, name: &str) -> Result<(), MuxError>;

    /// Split `pane` and return the id of the new pane.
    fn split_pane(
        &mut self,
        pane: &str,
        direction: Split,
        size: Option<PaneSize>,
        root: &Path,
    ) -> Result<String, MuxError>;

    fn select_pane(&mut self, pane: &str) -> Result<(), MuxError>;

    /// Type `line` into `pane` and press Enter.
    fn send_command(&mut self, pane: &str, line: &str) -> Result<(), MuxError>;

    /// Hand the terminal over to `session`.
    fn attach(&mut self, session: &str) -> Result<(), MuxError>;
}

impl<M: Multiplexer + ?Sized> Multiplexer for &mut M {
    fn has_session(&mut self, session: &str) -> Result<bool, MuxError> {
        (**self).has_session(session)
    }

    fn new_session(&mut self, session: &str, root: &Path) -> Result<CreatedWindow, MuxError> {
        (**self).new_session(session, root)
    }

    fn list_windows(&mut self, session: &str) -> Result<Vec<String>, MuxError> {
        (**self).list_windows(session)
    }

    fn new_window(
        &mut self,
        session: &str,
        name: &str,
        root: &Path,
    ) -> Result<CreatedWindow, MuxError> {
        (**self).new_window(session, name, root)
    }

    fn rename_window(&mut self, window: &str, name: &str) -> Result<(), MuxError> {
        (**self).rename_window(window, name)
    }

    fn split_pane(
        &mut self,
        pane: &str,
        direction: Split,
        size: Option<PaneSize>,
        root: &Path,
    ) -> Result<String, MuxError> {
        (**self).split_pane(pane, direction, size, root)
    }

    fn select_pane(&mut self, pane: &str) -> Result<(), MuxError> {
        (**self).select_pane(pane)
    }

    fn send_command(&mut self, pane: &str, line: &str) -> Result<(), MuxError> {
        (**self).send_command(pane, line)
    }

    fn attach(&mut self, session: &str) -> Result<(), MuxError> {
        (**self).attach(session)
    }
}
