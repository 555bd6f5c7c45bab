//! Layout definitions and their KDL representation.
//!
//! A layout file names a session, its root directory and an ordered list of
//! windows. Each window holds panes; a pane either is the window's base pane
//! (`split="none"`, the default) or is created by splitting the current pane.

use std::fmt;
use std::path::PathBuf;

use kdl::{KdlDocument, KdlEntry, KdlError, KdlNode, KdlValue};
use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::utils::resolve_root;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LayoutSpec {
    pub name: String,
    pub root: PathBuf,
    pub windows: Vec<WindowSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WindowSpec {
    pub name: String,
    pub panes: Vec<PaneSpec>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaneSpec {
    #[serde(default)]
    pub split: SplitDirection,
    #[serde(default)]
    pub size: Option<PaneSize>,
    #[serde(default)]
    pub commands: Vec<PaneCommand>,
    #[serde(default)]
    pub focus: bool,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SplitDirection {
    #[default]
    None,
    Horizontal,
    Vertical,
}

/// Orientation of a pane split that actually happens.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    /// New pane to the right of the current one.
    Horizontal,
    /// New pane below the current one.
    Vertical,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PaneSize {
    Lines(u16),
    Percent(u8),
}

/// A startup command as an explicit argument vector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct PaneCommand(pub Vec<String>);

/// Defaults applied while parsing: the file-derived name and the global root.
#[derive(Debug, Clone, Default)]
pub struct ParseContext {
    pub name: Option<String>,
    pub default_root: Option<PathBuf>,
    pub home: Option<PathBuf>,
}

impl SplitDirection {
    pub fn as_split(self) -> Option<Split> {
        match self {
            SplitDirection::None => None,
            SplitDirection::Horizontal => Some(Split::Horizontal),
            SplitDirection::Vertical => Some(Split::Vertical),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SplitDirection::None => "none",
            SplitDirection::Horizontal => "horizontal",
            SplitDirection::Vertical => "vertical",
        }
    }

    fn from_name(value: &str) -> Option<SplitDirection> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" => Some(SplitDirection::None),
            "horizontal" => Some(SplitDirection::Horizontal),
            "vertical" => Some(SplitDirection::Vertical),
            _ => None,
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Split::Horizontal => f.write_str("horizontal"),
            Split::Vertical => f.write_str("vertical"),
        }
    }
}

impl PaneSize {
    pub fn is_valid(self) -> bool {
        match self {
            PaneSize::Lines(n) => n > 0,
            PaneSize::Percent(p) => (1..=100).contains(&p),
        }
    }

    fn from_kdl(value: &KdlValue) -> Option<PaneSize> {
        if let Some(n) = value.as_i64() {
            return u16::try_from(n).ok().map(PaneSize::Lines);
        }
        let raw = value.as_string()?.trim();
        let size = match raw.strip_suffix('%') {
            Some(pct) => PaneSize::Percent(pct.trim().parse().ok()?),
            None => PaneSize::Lines(raw.parse().ok()?),
        };
        Some(size)
    }
}

impl fmt::Display for PaneSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaneSize::Lines(n) => write!(f, "{n}"),
            PaneSize::Percent(p) => write!(f, "{p}%"),
        }
    }
}

impl PaneCommand {
    pub fn new<I, S>(argv: I) -> PaneCommand
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PaneCommand(argv.into_iter().map(Into::into).collect())
    }

    pub fn argv(&self) -> &[String] {
        &self.0
    }

    /// True when there is no program to run.
    pub fn is_empty(&self) -> bool {
        self.0.first().map_or(true, |program| program.trim().is_empty())
    }

    /// The command line as it is typed into the pane's shell.
    pub fn to_shell_line(&self) -> String {
        shell_words::join(&self.0)
    }
}

/// tmux rewrites `.` and `:` in session names, so such names never match
/// on a later lookup.
pub fn is_valid_session_name(name: &str) -> bool {
    let name = name.trim();
    !name.is_empty() && !name.contains(['.', ':'])
}

/// Parse a layout document, filling in the defaults from `ctx`.
pub fn parse(source: &str, ctx: &ParseContext) -> Result<LayoutSpec, ParseError> {
    let doc: KdlDocument = source
        .parse()
        .map_err(|e: KdlError| ParseError::Syntax(e.to_string()))?;

    let mut name: Option<String> = None;
    let mut root: Option<String> = None;
    let mut windows = Vec::new();
    for node in doc.nodes() {
        match node.name().value() {
            "session" => {
                if name.is_some() {
                    return Err(ParseError::DuplicateNode("session".to_string()));
                }
                name = Some(single_string(node)?);
            }
            "root" => {
                if root.is_some() {
                    return Err(ParseError::DuplicateNode("root".to_string()));
                }
                root = Some(single_string(node)?);
            }
            "window" => windows.push(window_from_kdl(node, windows.len())?),
            other => {
                return Err(ParseError::UnexpectedNode {
                    node: other.to_string(),
                    context: "layout".to_string(),
                })
            }
        }
    }

    let name = name
        .or_else(|| ctx.name.clone())
        .map(|n| n.trim().to_string())
        .unwrap_or_default();
    if name.is_empty() {
        return Err(ParseError::EmptyName);
    }
    if !is_valid_session_name(&name) {
        return Err(ParseError::InvalidName(name));
    }

    let root = match root {
        Some(raw) => resolve_root(&raw, ctx.home.as_deref(), ctx.default_root.as_deref()),
        None => ctx.default_root.clone().filter(|p| p.is_absolute()),
    }
    .ok_or(ParseError::MissingRoot)?;

    Ok(LayoutSpec {
        name,
        root,
        windows,
    })
}

/// Render a layout back into the KDL form accepted by [`parse`].
pub fn to_kdl(spec: &LayoutSpec) -> String {
    let mut doc = KdlDocument::new();

    let mut session = KdlNode::new("session");
    session.push(spec.name.clone());
    doc.nodes_mut().push(session);

    let mut root = KdlNode::new("root");
    root.push(spec.root.to_string_lossy().to_string());
    doc.nodes_mut().push(root);

    for window in &spec.windows {
        let mut node = KdlNode::new("window");
        node.push(window.name.clone());
        let mut panes = KdlDocument::new();
        for pane in &window.panes {
            panes.nodes_mut().push(pane_to_kdl(pane));
        }
        node.set_children(panes);
        doc.nodes_mut().push(node);
    }
    doc.to_string()
}

fn pane_to_kdl(pane: &PaneSpec) -> KdlNode {
    let mut node = KdlNode::new("pane");
    if pane.split != SplitDirection::None {
        node.insert("split", pane.split.as_str());
    }
    match pane.size {
        Some(PaneSize::Lines(n)) => {
            node.insert("size", i64::from(n));
        }
        Some(size @ PaneSize::Percent(_)) => {
            node.insert("size", size.to_string());
        }
        None => {}
    }
    if pane.focus {
        node.insert("focus", true);
    }
    if !pane.commands.is_empty() {
        let mut children = KdlDocument::new();
        for command in &pane.commands {
            let mut run = KdlNode::new("run");
            for arg in command.argv() {
                run.push(arg.clone());
            }
            children.nodes_mut().push(run);
        }
        node.set_children(children);
    }
    node
}

fn single_string(node: &KdlNode) -> Result<String, ParseError> {
    let name = node.name().value();
    match node.entries() {
        [entry] if entry.name().is_none() => entry
            .value()
            .as_string()
            .map(|s| s.to_string())
            .ok_or_else(|| ParseError::ExpectedString(name.to_string())),
        _ => Err(ParseError::ExpectedString(name.to_string())),
    }
}

fn window_from_kdl(node: &KdlNode, index: usize) -> Result<WindowSpec, ParseError> {
    let name = node
        .get(0)
        .and_then(|e| e.value().as_string())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or(ParseError::MissingWindowName(index))?;
    let context = format!("window '{name}'");
    if node.entries().len() > 1 {
        let extra = node
            .entries()
            .iter()
            .find(|e| e.name().is_some())
            .unwrap_or(&node.entries()[1]);
        return Err(ParseError::UnexpectedProperty {
            property: entry_label(extra),
            context,
        });
    }

    let mut panes = Vec::new();
    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "pane" => panes.push(pane_from_kdl(child, &name)?),
                other => {
                    return Err(ParseError::UnexpectedNode {
                        node: other.to_string(),
                        context,
                    })
                }
            }
        }
    }
    if panes.is_empty() {
        return Err(ParseError::EmptyWindow(name));
    }
    Ok(WindowSpec { name, panes })
}

fn pane_from_kdl(node: &KdlNode, window: &str) -> Result<PaneSpec, ParseError> {
    let mut pane = PaneSpec::default();
    for entry in node.entries() {
        let key = entry.name().map(|n| n.value());
        match key {
            Some("split") => {
                let value = entry.value().as_string().unwrap_or_default();
                pane.split =
                    SplitDirection::from_name(value).ok_or_else(|| ParseError::InvalidSplit {
                        window: window.to_string(),
                        value: entry.value().to_string(),
                    })?;
            }
            Some("size") => {
                let size = PaneSize::from_kdl(entry.value())
                    .filter(|s| s.is_valid())
                    .ok_or_else(|| ParseError::InvalidSize {
                        window: window.to_string(),
                        value: entry.value().to_string(),
                    })?;
                pane.size = Some(size);
            }
            Some("focus") => {
                pane.focus = entry.value().as_bool().ok_or_else(|| ParseError::InvalidFocus {
                    window: window.to_string(),
                })?;
            }
            _ => {
                return Err(ParseError::UnexpectedProperty {
                    property: entry_label(entry),
                    context: format!("a pane in window '{window}'"),
                })
            }
        }
    }

    if let Some(children) = node.children() {
        for child in children.nodes() {
            let command = match child.name().value() {
                "run" => run_from_kdl(child, window)?,
                "shell" => shell_from_kdl(child, window)?,
                other => {
                    return Err(ParseError::UnexpectedNode {
                        node: other.to_string(),
                        context: format!("a pane in window '{window}'"),
                    })
                }
            };
            pane.commands.push(command);
        }
    }
    Ok(pane)
}

fn run_from_kdl(node: &KdlNode, window: &str) -> Result<PaneCommand, ParseError> {
    let mut argv = Vec::new();
    for entry in node.entries() {
        if entry.name().is_some() {
            return Err(ParseError::UnexpectedProperty {
                property: entry_label(entry),
                context: format!("a run command in window '{window}'"),
            });
        }
        if let Some(s) = entry.value().as_string() {
            argv.push(s.to_string());
        } else {
            argv.push(entry.value().to_string());
        }
    }
    let command = PaneCommand(argv);
    if command.is_empty() {
        return Err(ParseError::EmptyCommand {
            window: window.to_string(),
        });
    }
    Ok(command)
}

/// Split a `shell` line into argv. Lines that only a real shell could run
/// are rejected, since every word is typed back quoted.
fn shell_from_kdl(node: &KdlNode, window: &str) -> Result<PaneCommand, ParseError> {
    let line = single_string(node)?;
    if let Some(found) = shell_feature(&line) {
        return Err(ParseError::ShellFeature {
            window: window.to_string(),
            found,
        });
    }
    let argv = shell_words::split(&line).map_err(|e| ParseError::ShellSyntax {
        window: window.to_string(),
        message: e.to_string(),
    })?;
    let command = PaneCommand(argv);
    if command.is_empty() {
        return Err(ParseError::EmptyCommand {
            window: window.to_string(),
        });
    }
    Ok(command)
}

/// First operator, expansion or `~` that shell-words would turn into a literal.
/// Single quotes make everything literal; double quotes still expand `$` and `` ` ``.
fn shell_feature(line: &str) -> Option<String> {
    let mut single = false;
    let mut double = false;
    let mut escaped = false;
    let mut word_start = true;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        if escaped {
            escaped = false;
            word_start = false;
            continue;
        }
        match c {
            '\\' if !single => escaped = true,
            '\'' if !double => single = !single,
            '"' if !single => double = !double,
            '$' | '`' if !single => return Some(c.to_string()),
            '|' | '&' | ';' | '<' | '>' | '(' | ')' | '*' | '?' if !single && !double => {
                let mut found = c.to_string();
                if chars.peek() == Some(&c) {
                    found.push(c);
                }
                return Some(found);
            }
            '~' if word_start && !single && !double => return Some("~".to_string()),
            _ => {}
        }
        word_start = c.is_whitespace() && !single && !double;
    }
    None
}

fn entry_label(entry: &KdlEntry) -> String {
    match entry.name() {
        Some(name) => name.value().to_string(),
        None => entry.value().to_string(),
    }
}
