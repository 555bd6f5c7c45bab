//! Turns a layout into the ordered directives the executor applies.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::PlanError;
use crate::layout::{
    is_valid_session_name, LayoutSpec, PaneCommand, PaneSize, Split, SplitDirection, WindowSpec,
};

/// One atomic instruction for the multiplexer.
///
/// `pane` is the pane's declaration index inside the most recently created
/// window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Directive {
    CreateSessionIfAbsent { session: String, root: PathBuf },
    CreateWindow { name: String },
    SplitPane {
        direction: Split,
        size: Option<PaneSize>,
        pane: usize,
    },
    RunCommand { pane: usize, argv: Vec<String> },
    SelectPane { pane: usize },
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::CreateSessionIfAbsent { session, root } => {
                write!(f, "create-session {} {}", session, root.display())
            }
            Directive::CreateWindow { name } => write!(f, "create-window {name}"),
            Directive::SplitPane {
                direction,
                size,
                pane,
            } => match size {
                Some(size) => write!(f, "split-pane {direction} {size} (pane {pane})"),
                None => write!(f, "split-pane {direction} (pane {pane})"),
            },
            Directive::RunCommand { pane, argv } => {
                write!(f, "run (pane {pane}): {}", shell_words::join(argv))
            }
            Directive::SelectPane { pane } => write!(f, "select-pane {pane}"),
        }
    }
}

/// Plan the directives for `spec`. Pure: equal input gives equal output.
pub fn plan(spec: &LayoutSpec) -> Result<Vec<Directive>, PlanError> {
    validate(spec)?;

    let mut directives = vec![Directive::CreateSessionIfAbsent {
        session: spec.name.trim().to_string(),
        root: spec.root.clone(),
    }];
    for window in &spec.windows {
        plan_window(window, &mut directives);
    }
    Ok(directives)
}

fn plan_window(window: &WindowSpec, out: &mut Vec<Directive>) {
    // tmux reports window names trimmed; re-runs compare against that.
    out.push(Directive::CreateWindow {
        name: window.name.trim().to_string(),
    });

    let mut focus = None;
    for (idx, pane) in window.panes.iter().enumerate() {
        if let Some(direction) = pane.split.as_split() {
            out.push(Directive::SplitPane {
                direction,
                size: pane.size,
                pane: idx,
            });
        }
        for command in &pane.commands {
            out.push(Directive::RunCommand {
                pane: idx,
                argv: command.argv().to_vec(),
            });
        }
        if pane.focus {
            focus = Some(idx);
        }
    }

    if let Some(pane) = focus {
        out.push(Directive::SelectPane { pane });
    }
}

fn validate(spec: &LayoutSpec) -> Result<(), PlanError> {
    if spec.name.trim().is_empty() {
        return Err(PlanError::EmptyName);
    }
    if !is_valid_session_name(&spec.name) {
        return Err(PlanError::InvalidName(spec.name.trim().to_string()));
    }
    if !spec.root.is_absolute() {
        return Err(PlanError::RelativeRoot(spec.root.clone()));
    }

    let mut seen = BTreeSet::new();
    for window in &spec.windows {
        let name = window.name.trim();
        if name.is_empty() {
            return Err(PlanError::EmptyWindowName);
        }
        if window.panes.is_empty() {
            return Err(PlanError::EmptyWindow(name.to_string()));
        }
        if !seen.insert(name.to_string()) {
            return Err(PlanError::DuplicateWindow(name.to_string()));
        }

        let base_panes = window
            .panes
            .iter()
            .filter(|p| p.split == SplitDirection::None)
            .count();
        if base_panes > 1 {
            return Err(PlanError::MultipleBasePanes(name.to_string()));
        }
        if window.panes.iter().filter(|p| p.focus).count() > 1 {
            return Err(PlanError::MultipleFocus(name.to_string()));
        }

        for (idx, pane) in window.panes.iter().enumerate() {
            if let Some(size) = pane.size {
                if pane.split == SplitDirection::None {
                    return Err(PlanError::SizeWithoutSplit {
                        window: name.to_string(),
                        pane: idx,
                    });
                }
                if !size.is_valid() {
                    return Err(PlanError::InvalidSize {
                        window: name.to_string(),
                        pane: idx,
                    });
                }
            }
            if pane.commands.iter().any(PaneCommand::is_empty) {
                return Err(PlanError::EmptyCommand {
                    window: name.to_string(),
                    pane: idx,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::PaneSpec;
    use crate::test_helpers::idx_layout;

    #[test]
    fn test_idx_scenario() {
        let directives = plan(&idx_layout()).unwrap();
        assert_eq!(
            directives,
            vec![
                Directive::CreateSessionIfAbsent {
                    session: "idx".to_string(),
                    root: PathBuf::from("/proj"),
                },
                Directive::CreateWindow {
                    name: "idx".to_string(),
                },
                Directive::SplitPane {
                    direction: Split::Vertical,
                    size: Some(PaneSize::Lines(15)),
                    pane: 0,
                },
                Directive::RunCommand {
                    pane: 1,
                    argv: vec!["nvim".to_string()],
                },
            ]
        );
    }

    #[test]
    fn test_plan_is_deterministic() {
        let spec = idx_layout();
        assert_eq!(plan(&spec).unwrap(), plan(&spec.clone()).unwrap());
    }

    #[test]
    fn test_windows_and_panes_keep_declaration_order() {
        let mut spec = idx_layout();
        spec.windows.push(WindowSpec {
            name: "server".to_string(),
            panes: vec![
                PaneSpec {
                    commands: vec![
                        PaneCommand::new(["cd", "api"]),
                        PaneCommand::new(["cargo", "run"]),
                    ],
                    ..PaneSpec::default()
                },
                PaneSpec {
                    split: SplitDirection::Horizontal,
                    size: Some(PaneSize::Percent(40)),
                    commands: vec![PaneCommand::new(["htop"])],
                    focus: true,
                },
            ],
        });

        let directives = plan(&spec).unwrap();
        let tail: Vec<String> = directives[4..].iter().map(|d| d.to_string()).collect();
        assert_eq!(
            tail,
            vec![
                "create-window server",
                "run (pane 0): cd api",
                "run (pane 0): cargo run",
                "split-pane horizontal 40% (pane 1)",
                "run (pane 1): htop",
                "select-pane 1",
            ]
        );
        assert_eq!(
            directives
                .iter()
                .filter(|d| matches!(d, Directive::CreateSessionIfAbsent { .. }))
                .count(),
            1
        );
    }

    #[test]
    fn test_names_are_emitted_trimmed() {
        let mut spec = idx_layout();
        spec.name = " idx ".to_string();
        spec.windows.push(WindowSpec {
            name: "  logs ".to_string(),
            panes: vec![PaneSpec::default()],
        });

        let directives = plan(&spec).unwrap();
        assert_eq!(directives[0].to_string(), "create-session idx /proj");
        assert_eq!(
            directives[4],
            Directive::CreateWindow {
                name: "logs".to_string(),
            }
        );
    }

    #[test]
    fn test_layout_without_windows_only_creates_session() {
        let mut spec = idx_layout();
        spec.windows.clear();
        assert_eq!(plan(&spec).unwrap().len(), 1);
    }

    #[test]
    fn test_rejects_zero_panes() {
        let mut spec = idx_layout();
        spec.windows[0].panes.clear();
        assert_eq!(
            plan(&spec).unwrap_err(),
            PlanError::EmptyWindow("idx".to_string())
        );
    }

    #[test]
    fn test_rejects_invariant_violations() {
        let mut spec = idx_layout();
        spec.name = " ".to_string();
        assert_eq!(plan(&spec).unwrap_err(), PlanError::EmptyName);

        let mut spec = idx_layout();
        spec.name = "my.app".to_string();
        assert_eq!(
            plan(&spec).unwrap_err(),
            PlanError::InvalidName("my.app".to_string())
        );

        let mut spec = idx_layout();
        spec.root = PathBuf::from("proj");
        assert!(matches!(plan(&spec), Err(PlanError::RelativeRoot(_))));

        let mut spec = idx_layout();
        spec.windows.push(spec.windows[0].clone());
        assert_eq!(
            plan(&spec).unwrap_err(),
            PlanError::DuplicateWindow("idx".to_string())
        );

        let mut spec = idx_layout();
        spec.windows[0].panes.push(PaneSpec::default());
        assert_eq!(
            plan(&spec).unwrap_err(),
            PlanError::MultipleBasePanes("idx".to_string())
        );

        let mut spec = idx_layout();
        spec.windows[0].panes[1].size = Some(PaneSize::Lines(3));
        assert!(matches!(
            plan(&spec),
            Err(PlanError::SizeWithoutSplit { pane: 1, .. })
        ));

        let mut spec = idx_layout();
        spec.windows[0].panes[1].commands.push(PaneCommand(Vec::new()));
        assert!(matches!(
            plan(&spec),
            Err(PlanError::EmptyCommand { pane: 1, .. })
        ));
    }

    #[test]
    fn test_directives_serialize_as_tagged_json() {
        let directives = plan(&idx_layout()).unwrap();
        let json = serde_json::to_value(&directives).unwrap();
        assert_eq!(json[0]["op"], "create-session-if-absent");
        assert_eq!(json[2]["direction"], "vertical");
        assert_eq!(json[2]["size"]["lines"], 15);
        assert_eq!(json[3]["argv"][0], "nvim");
    }
}
