//! In-memory multiplexer for tests.

use std::path::{Path, PathBuf};

use super::{CreatedWindow, Multiplexer};
use crate::error::MuxError;
use crate::layout::{PaneSize, Split};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeWindow {
    pub id: String,
    pub name: String,
    pub panes: Vec<String>,
    pub active: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeSession {
    pub name: String,
    pub root: PathBuf,
    pub windows: Vec<FakeWindow>,
}

/// Records every call and models sessions, windows and panes.
#[derive(Debug, Default)]
pub struct FakeMux {
    pub sessions: Vec<FakeSession>,
    /// `(pane, line)` for every command typed into a pane.
    pub sent: Vec<(String, String)>,
    /// Operation names in call order.
    pub calls: Vec<&'static str>,
    pub attached: Option<String>,
    /// Operation that fails instead of running.
    pub fail_on: Option<&'static str>,
    next_id: usize,
}

impl FakeMux {
    pub fn with_session(name: &str, windows: &[&str]) -> FakeMux {
        let mut mux = FakeMux::default();
        let mut session = FakeSession {
            name: name.to_string(),
            root: PathBuf::from("/existing"),
            windows: Vec::new(),
        };
        for window in windows {
            let created = mux.fresh_window(window);
            session.windows.push(created);
        }
        mux.sessions.push(session);
        mux
    }

    pub fn session(&self, name: &str) -> Option<&FakeSession> {
        self.sessions.iter().find(|s| s.name == name)
    }

    pub fn count(&self, op: &str) -> usize {
        self.calls.iter().filter(|c| **c == op).count()
    }

    fn next(&mut self, prefix: char) -> String {
        self.next_id += 1;
        format!("{prefix}{}", self.next_id)
    }

    fn fresh_window(&mut self, name: &str) -> FakeWindow {
        let id = self.next('@');
        let pane = self.next('%');
        FakeWindow {
            id,
            name: name.to_string(),
            panes: vec![pane.clone()],
            active: pane,
        }
    }

    fn record(&mut self, op: &'static str) -> Result<(), MuxError> {
        self.calls.push(op);
        if self.fail_on == Some(op) {
            return Err(MuxError::Failed {
                command: format!("tmux {op}"),
                status: "exit status: 1".to_string(),
                stderr: format!("{op} refused"),
            });
        }
        Ok(())
    }

    fn session_mut(&mut self, name: &str) -> Result<&mut FakeSession, MuxError> {
        self.sessions
            .iter_mut()
            .find(|s| s.name == name)
            .ok_or_else(|| MuxError::UnknownTarget(name.to_string()))
    }

    fn window_of_pane(&mut self, pane: &str) -> Result<&mut FakeWindow, MuxError> {
        self.sessions
            .iter_mut()
            .flat_map(|s| s.windows.iter_mut())
            .find(|w| w.panes.iter().any(|p| p == pane))
            .ok_or_else(|| MuxError::UnknownTarget(pane.to_string()))
    }
}

impl Multiplexer for FakeMux {
    fn has_session(&mut self, session: &str) -> Result<bool, MuxError> {
        self.record("has_session")?;
        Ok(self.session(session).is_some())
    }

    fn new_session(&mut self, session: &str, root: &Path) -> Result<CreatedWindow, MuxError> {
        self.record("new_session")?;
        let window = self.fresh_window("zsh");
        let created = CreatedWindow {
            window: window.id.clone(),
            pane: window.active.clone(),
        };
        self.sessions.push(FakeSession {
            name: session.to_string(),
            root: root.to_path_buf(),
            windows: vec![window],
        });
        Ok(created)
    }

    fn list_windows(&mut self, session: &str) -> Result<Vec<String>, MuxError> {
        self.record("list_windows")?;
        Ok(self
            .session_mut(session)?
            .windows
            .iter()
            .map(|w| w.name.clone())
            .collect())
    }

    fn new_window(
        &mut self,
        session: &str,
        name: &str,
        _root: &Path,
    ) -> Result<CreatedWindow, MuxError> {
        self.record("new_window")?;
        let window = self.fresh_window(name);
        let created = CreatedWindow {
            window: window.id.clone(),
            pane: window.active.clone(),
        };
        self.session_mut(session)?.windows.push(window);
        Ok(created)
    }

    fn rename_window(&mut self, window: &str, name: &str) -> Result<(), MuxError> {
        self.record("rename_window")?;
        let target = self
            .sessions
            .iter_mut()
            .flat_map(|s| s.windows.iter_mut())
            .find(|w| w.id == window)
            .ok_or_else(|| MuxError::UnknownTarget(window.to_string()))?;
        target.name = name.to_string();
        Ok(())
    }

    fn split_pane(
        &mut self,
        pane: &str,
        _direction: Split,
        _size: Option<PaneSize>,
        _root: &Path,
    ) -> Result<String, MuxError> {
        self.record("split_pane")?;
        let id = self.next('%');
        self.window_of_pane(pane)?.panes.push(id.clone());
        Ok(id)
    }

    fn select_pane(&mut self, pane: &str) -> Result<(), MuxError> {
        self.record("select_pane")?;
        self.window_of_pane(pane)?.active = pane.to_string();
        Ok(())
    }

    fn send_command(&mut self, pane: &str, line: &str) -> Result<(), MuxError> {
        self.record("send_command")?;
        self.window_of_pane(pane)?;
        self.sent.push((pane.to_string(), line.to_string()));
        Ok(())
    }

    fn attach(&mut self, session: &str) -> Result<(), MuxError> {
        self.record("attach")?;
        self.session_mut(session)?;
        self.attached = Some(session.to_string());
        Ok(())
    }
}
