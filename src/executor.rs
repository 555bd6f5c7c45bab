//! Applies planned directives to a multiplexer, strictly in order.
//!
//! Re-running a layout against a session that already exists is additive:
//! windows whose names are already present are left untouched (their panes
//! and commands are skipped), and only missing windows are built.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ExecutionError, MuxError};
use crate::mux::{CreatedWindow, Multiplexer};
use crate::plan::Directive;

/// Lifecycle of the session a layout is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Absent,
    Created,
    Populated,
    Attached,
}

/// The session a run created or found. Lives for the process only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle {
    name: String,
    root: PathBuf,
    state: SessionState,
    created: bool,
}

impl SessionHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether this run created the session (as opposed to finding it).
    pub fn created(&self) -> bool {
        self.created
    }
}

/// Panes of the window currently being built, by declaration index.
#[derive(Debug)]
struct WindowCursor {
    base: String,
    current: String,
    panes: BTreeMap<usize, String>,
}

impl WindowCursor {
    fn new(base: String) -> WindowCursor {
        WindowCursor {
            current: base.clone(),
            base,
            panes: BTreeMap::new(),
        }
    }

    /// Split panes resolve to their own id; the unsplit pane is the base pane.
    fn target(&self, pane: usize) -> &str {
        self.panes.get(&pane).unwrap_or(&self.base)
    }
}

#[derive(Debug, Default)]
struct Progress {
    session: Option<SessionHandle>,
    windows: BTreeSet<String>,
    initial_window: Option<CreatedWindow>,
    window: Option<WindowCursor>,
    skipping: bool,
}

pub struct Executor<M> {
    mux: M,
}

impl<M: Multiplexer> Executor<M> {
    pub fn new(mux: M) -> Executor<M> {
        Executor { mux }
    }

    pub fn mux(&self) -> &M {
        &self.mux
    }

    pub fn into_inner(self) -> M {
        self.mux
    }

    /// Apply `directives` in order, halting on the first failure.
    pub fn apply(&mut self, directives: &[Directive]) -> Result<SessionHandle, ExecutionError> {
        let mut progress = Progress::default();
        for (index, directive) in directives.iter().enumerate() {
            self.step(&mut progress, directive)
                .map_err(|source| ExecutionError {
                    index,
                    directive: directive.to_string(),
                    source,
                })?;
        }

        let mut handle = progress.session.ok_or_else(|| ExecutionError {
            index: 0,
            directive: directives
                .first()
                .map(|d| d.to_string())
                .unwrap_or_else(|| "(empty plan)".to_string()),
            source: MuxError::NoSession,
        })?;
        handle.state = SessionState::Populated;
        Ok(handle)
    }

    /// Hand the terminal to the session.
    pub fn attach(&mut self, handle: &mut SessionHandle) -> Result<(), MuxError> {
        self.mux.attach(&handle.name)?;
        info!(session = %handle.name, "attached");
        handle.state = SessionState::Attached;
        Ok(())
    }

    fn step(&mut self, progress: &mut Progress, directive: &Directive) -> Result<(), MuxError> {
        match directive {
            Directive::CreateSessionIfAbsent { session, root } => {
                self.ensure_session(progress, session, root)
            }
            Directive::CreateWindow { name } => self.create_window(progress, name),
            _ if progress.skipping => {
                debug!(%directive, "skipped: window already present");
                Ok(())
            }
            Directive::SplitPane {
                direction,
                size,
                pane,
            } => {
                let root = progress.session.as_ref().ok_or(MuxError::NoSession)?.root.clone();
                let cursor = progress.window.as_mut().ok_or(MuxError::NoWindow)?;
                let id = self.mux.split_pane(&cursor.current, *direction, *size, &root)?;
                cursor.panes.insert(*pane, id.clone());
                cursor.current = id;
                Ok(())
            }
            Directive::RunCommand { pane, argv } => {
                let cursor = progress.window.as_ref().ok_or(MuxError::NoWindow)?;
                self.mux
                    .send_command(cursor.target(*pane), &shell_words::join(argv))
            }
            Directive::SelectPane { pane } => {
                let cursor = progress.window.as_ref().ok_or(MuxError::NoWindow)?;
                self.mux.select_pane(cursor.target(*pane))
            }
        }
    }

    fn ensure_session(
        &mut self,
        progress: &mut Progress,
        session: &str,
        root: &Path,
    ) -> Result<(), MuxError> {
        progress.window = None;
        progress.skipping = false;

        if self.mux.has_session(session)? {
            info!(session, "session exists, adding missing windows");
            progress.windows = self.mux.list_windows(session)?.into_iter().collect();
            progress.initial_window = None;
            progress.session = Some(SessionHandle {
                name: session.to_string(),
                root: root.to_path_buf(),
                state: SessionState::Populated,
                created: false,
            });
            return Ok(());
        }

        let initial = self.mux.new_session(session, root)?;
        info!(session, root = %root.display(), "created session");
        progress.windows.clear();
        progress.initial_window = Some(initial);
        progress.session = Some(SessionHandle {
            name: session.to_string(),
            root: root.to_path_buf(),
            state: SessionState::Created,
            created: true,
        });
        Ok(())
    }

    fn create_window(&mut self, progress: &mut Progress, name: &str) -> Result<(), MuxError> {
        let session = progress.session.as_mut().ok_or(MuxError::NoSession)?;
        if progress.windows.contains(name) {
            info!(session = %session.name, window = name, "window exists, skipping");
            progress.skipping = true;
            progress.window = None;
            return Ok(());
        }
        progress.skipping = false;

        // A fresh session already has one window; the first layout window takes it over.
        let created = match progress.initial_window.take() {
            Some(initial) => {
                self.mux.rename_window(&initial.window, name)?;
                initial
            }
            None => self.mux.new_window(&session.name, name, &session.root)?,
        };
        debug!(session = %session.name, window = name, id = %created.window, "window ready");

        progress.windows.insert(name.to_string());
        session.state = SessionState::Populated;
        progress.window = Some(WindowCursor::new(created.pane));
        Ok(())
    }
}
