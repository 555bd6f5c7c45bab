use std::path::Path;
use std::process::{Command, Output};

use tracing::debug;

use super::{CreatedWindow, Multiplexer};
use crate::config::Settings;
use crate::error::MuxError;
use crate::layout::{PaneSize, Split};

const CREATED_FORMAT: &str = "#{window_id} #{pane_id}";

/// Drives a tmux server through its command-line client.
#[derive(Debug, Clone)]
pub struct Tmux {
    binary: String,
    socket: Option<String>,
    inside_tmux: bool,
}

impl Tmux {
    pub fn new(binary: impl Into<String>, socket: Option<String>) -> Tmux {
        Tmux {
            binary: binary.into(),
            socket,
            inside_tmux: false,
        }
    }

    pub fn from_settings(settings: &Settings) -> Tmux {
        Tmux {
            binary: settings.tmux_binary.clone(),
            socket: settings.socket.clone(),
            inside_tmux: settings.inside_tmux,
        }
    }

    fn command(&self, args: &[String]) -> Command {
        let mut cmd = Command::new(&self.binary);
        if let Some(socket) = &self.socket {
            cmd.arg("-L").arg(socket);
        }
        cmd.args(args);
        cmd
    }

    fn describe(&self, args: &[String]) -> String {
        let mut parts = vec![self.binary.clone()];
        if let Some(socket) = &self.socket {
            parts.push("-L".to_string());
            parts.push(socket.clone());
        }
        parts.extend(args.iter().cloned());
        shell_words::join(parts)
    }

    fn output(&self, args: &[String]) -> Result<Output, MuxError> {
        debug!(command = %self.describe(args), "tmux");
        self.command(args).output().map_err(|source| MuxError::Spawn {
            program: self.binary.clone(),
            source,
        })
    }

    /// Run a tmux command and return its trimmed stdout.
    fn run(&self, args: &[String]) -> Result<String, MuxError> {
        let out = self.output(args)?;
        if !out.status.success() {
            return Err(MuxError::Failed {
                command: self.describe(args),
                status: out.status.to_string(),
                stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&out.stdout).trim().to_string())
    }
}

impl Multiplexer for Tmux {
    fn has_session(&mut self, session: &str) -> Result<bool, MuxError> {
        // Non-zero covers both "no such session" and "no server running".
        let out = self.output(&args(["has-session", "-t", exact(session).as_str()]))?;
        Ok(out.status.success())
    }

    fn new_session(&mut self, session: &str, root: &Path) -> Result<CreatedWindow, MuxError> {
        let root = root.to_string_lossy();
        let args = args([
            "new-session",
            "-d",
            "-s",
            session,
            "-c",
            &*root,
            "-P",
            "-F",
            CREATED_FORMAT,
        ]);
        let raw = self.run(&args)?;
        parse_created(&self.describe(&args), &raw)
    }

    fn list_windows(&mut self, session: &str) -> Result<Vec<String>, MuxError> {
        let raw = self.run(&args([
            "list-windows",
            "-t",
            exact(session).as_str(),
            "-F",
            "#{window_name}",
        ]))?;
        Ok(parse_window_names(&raw))
    }

    fn new_window(
        &mut self,
        session: &str,
        name: &str,
        root: &Path,
    ) -> Result<CreatedWindow, MuxError> {
        let target = format!("{}:", exact(session));
        let root = root.to_string_lossy();
        let args = args([
            "new-window",
            "-d",
            "-t",
            target.as_str(),
            "-n",
            name,
            "-c",
            &*root,
            "-P",
            "-F",
            CREATED_FORMAT,
        ]);
        let raw = self.run(&args)?;
        parse_created(&self.describe(&args), &raw)
    }

    fn rename_window(&mut self, window: &str, name: &str) -> Result<(), MuxError> {
        self.run(&args(["rename-window", "-t", window, name]))?;
        Ok(())
    }

    fn split_pane(
        &mut self,
        pane: &str,
        direction: Split,
        size: Option<PaneSize>,
        root: &Path,
    ) -> Result<String, MuxError> {
        let args = split_args(pane, direction, size, root);
        let raw = self.run(&args)?;
        if !raw.starts_with('%') {
            return Err(MuxError::UnexpectedOutput {
                command: self.describe(&args),
                output: raw,
            });
        }
        Ok(raw)
    }

    fn select_pane(&mut self, pane: &str) -> Result<(), MuxError> {
        self.run(&args(["select-pane", "-t", pane]))?;
        Ok(())
    }

    fn send_command(&mut self, pane: &str, line: &str) -> Result<(), MuxError> {
        // -l sends the line literally so key names inside it are not interpreted.
        self.run(&args(["send-keys", "-t", pane, "-l", line]))?;
        self.run(&args(["send-keys", "-t", pane, "Enter"]))?;
        Ok(())
    }

    fn attach(&mut self, session: &str) -> Result<(), MuxError> {
        if self.inside_tmux {
            self.run(&args(["switch-client", "-t", exact(session).as_str()]))?;
            return Ok(());
        }

        let args = args(["attach-session", "-t", exact(session).as_str()]);
        debug!(command = %self.describe(&args), "tmux");
        let status = self
            .command(&args)
            .status()
            .map_err(|source| MuxError::Spawn {
                program: self.binary.clone(),
                source,
            })?;
        if !status.success() {
            return Err(MuxError::Failed {
                command: self.describe(&args),
                status: status.to_string(),
                stderr: String::new(),
            });
        }
        Ok(())
    }
}

fn args<const N: usize>(parts: [&str; N]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

/// Target `session` by exact name rather than tmux's prefix matching.
fn exact(session: &str) -> String {
    format!("={session}")
}

fn split_args(pane: &str, direction: Split, size: Option<PaneSize>, root: &Path) -> Vec<String> {
    let flag = match direction {
        Split::Horizontal => "-h",
        Split::Vertical => "-v",
    };
    let mut out = args(["split-window", "-d", flag, "-t", pane]);
    out.push("-c".to_string());
    out.push(root.to_string_lossy().to_string());
    if let Some(size) = size {
        out.push("-l".to_string());
        out.push(size.to_string());
    }
    out.extend(args(["-P", "-F", "#{pane_id}"]));
    out
}

fn parse_created(command: &str, raw: &str) -> Result<CreatedWindow, MuxError> {
    let mut parts = raw.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(window), Some(pane), None) if window.starts_with('@') && pane.starts_with('%') => {
            Ok(CreatedWindow {
                window: window.to_string(),
                pane: pane.to_string(),
            })
        }
        _ => Err(MuxError::UnexpectedOutput {
            command: command.to_string(),
            output: raw.to_string(),
        }),
    }
}

fn parse_window_names(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| l.to_string())
        .collect()
}
