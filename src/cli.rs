//! CLI argument parsing via clap, and the subcommands behind it.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use tracing::info;

use crate::config::Settings;
use crate::error::{TrellisError, TrellisResult};
use crate::executor::Executor;
use crate::layout::{is_valid_session_name, LayoutSpec, PaneSpec, WindowSpec};
use crate::mux::{Multiplexer, Tmux};
use crate::plan::plan;
use crate::store::LayoutStore;
use crate::utils::{filter_names_fuzzy, resolve_root};

/// Build tmux sessions from declarative layout files.
#[derive(Debug, Parser)]
#[command(name = "trellis", version)]
pub struct Args {
    /// Directory holding layout files (default: $TRELLIS_LAYOUTS or ~/.config/trellis/layouts).
    #[arg(long = "layouts-dir", global = true)]
    pub layouts_dir: Option<PathBuf>,

    /// tmux server socket name, passed to tmux as -L.
    #[arg(short = 'L', long = "socket", global = true)]
    pub socket: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: CommandArgs,
}

#[derive(Debug, Subcommand)]
pub enum CommandArgs {
    /// Build the named layout (adding only what is missing) and attach to it.
    Run {
        layout: String,
        /// Leave the session in the background instead of attaching.
        #[arg(short = 'd', long = "detached")]
        detached: bool,
    },
    /// List stored layouts, optionally fuzzy-filtered.
    List { filter: Option<String> },
    /// Print the directives a layout expands to without touching tmux.
    Plan {
        layout: String,
        #[arg(long = "json")]
        json: bool,
    },
    /// Write a starter layout file.
    New {
        name: String,
        /// Session root (default: $TRELLIS_ROOT or the home directory).
        #[arg(long = "root")]
        root: Option<String>,
        /// Replace an existing layout file.
        #[arg(long = "force")]
        force: bool,
    },
}

impl Args {
    /// Apply command-line overrides on top of environment settings.
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(dir) = &self.layouts_dir {
            settings.layouts_dir = dir.clone();
        }
        if let Some(socket) = &self.socket {
            settings.socket = Some(socket.clone());
        }
    }
}

pub fn execute(args: &Args, settings: &Settings, out: &mut dyn Write) -> TrellisResult<()> {
    let store = LayoutStore::new(&settings.layouts_dir);
    match &args.command {
        CommandArgs::Run { layout, detached } => run_layout(
            &store,
            settings,
            layout,
            *detached,
            Tmux::from_settings(settings),
            out,
        ),
        CommandArgs::List { filter } => list_layouts(&store, filter.as_deref().unwrap_or(""), out),
        CommandArgs::Plan { layout, json } => print_plan(&store, settings, layout, *json, out),
        CommandArgs::New { name, root, force } => {
            new_layout(&store, settings, name, root.as_deref(), *force, out)
        }
    }
}

pub fn run_layout<M: Multiplexer>(
    store: &LayoutStore,
    settings: &Settings,
    name: &str,
    detached: bool,
    mux: M,
    out: &mut dyn Write,
) -> TrellisResult<()> {
    // Parse and plan fully before the multiplexer is touched.
    let spec = store.load(name, settings)?;
    let directives = plan(&spec)?;

    let mut executor = Executor::new(mux);
    let mut handle = executor.apply(&directives)?;
    info!(session = handle.name(), created = handle.created(), "layout applied");

    if detached {
        writeln!(out, "{}", handle.name()).context("write output")?;
        return Ok(());
    }
    executor.attach(&mut handle).map_err(|source| {
        TrellisError::Execution(crate::error::ExecutionError {
            index: directives.len(),
            directive: format!("attach {}", handle.name()),
            source,
        })
    })?;
    Ok(())
}

pub fn list_layouts(store: &LayoutStore, filter: &str, out: &mut dyn Write) -> TrellisResult<()> {
    let names = store.names()?;
    for idx in filter_names_fuzzy(&names, filter) {
        writeln!(out, "{}", names[idx]).context("write output")?;
    }
    Ok(())
}

pub fn print_plan(
    store: &LayoutStore,
    settings: &Settings,
    name: &str,
    json: bool,
    out: &mut dyn Write,
) -> TrellisResult<()> {
    let spec = store.load(name, settings)?;
    let directives = plan(&spec)?;
    if json {
        let rendered = serde_json::to_string_pretty(&directives).context("encode plan")?;
        writeln!(out, "{rendered}").context("write output")?;
        return Ok(());
    }
    for (idx, directive) in directives.iter().enumerate() {
        writeln!(out, "{idx:>3}  {directive}").context("write output")?;
    }
    Ok(())
}

pub fn new_layout(
    store: &LayoutStore,
    settings: &Settings,
    name: &str,
    root: Option<&str>,
    force: bool,
    out: &mut dyn Write,
) -> TrellisResult<()> {
    let name = name.trim();
    if !is_valid_session_name(name) || name.contains(std::path::is_separator) {
        return Err(TrellisError::Config(format!("invalid layout name `{name}`")));
    }
    let root = match root {
        Some(raw) => resolve_root(raw, settings.home.as_deref(), settings.default_root.as_deref()),
        None => settings.default_root.clone(),
    }
    .ok_or_else(|| TrellisError::Config("cannot resolve a root for the layout".to_string()))?;

    let spec = LayoutSpec {
        name: name.to_string(),
        root,
        windows: vec![WindowSpec {
            name: name.to_string(),
            panes: vec![PaneSpec::default()],
        }],
    };
    let path = store.save(&spec, force)?;
    writeln!(out, "{}", path.display()).context("write output")?;
    Ok(())
}
