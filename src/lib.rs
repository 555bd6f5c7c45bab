pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod layout;
pub mod mux;
pub mod plan;
pub mod store;
pub mod utils;

pub use config::Settings;
pub use error::{ExecutionError, MuxError, ParseError, PlanError, TrellisError, TrellisResult};
pub use executor::{Executor, SessionHandle, SessionState};
pub use layout::{LayoutSpec, PaneCommand, PaneSize, PaneSpec, SplitDirection, WindowSpec};
pub use mux::{Multiplexer, Tmux};
pub use plan::{plan, Directive};
pub use store::LayoutStore;

#[cfg(test)]
pub mod test_helpers {
    use std::path::{Path, PathBuf};

    use crate::config::Settings;
    use crate::layout::{LayoutSpec, PaneCommand, PaneSize, PaneSpec, SplitDirection, WindowSpec};

    /// `idx` at `/proj`: a 15-line split below and nvim in the base pane.
    pub fn idx_layout() -> LayoutSpec {
        LayoutSpec {
            name: "idx".to_string(),
            root: PathBuf::from("/proj"),
            windows: vec![WindowSpec {
                name: "idx".to_string(),
                panes: vec![
                    PaneSpec {
                        split: SplitDirection::Vertical,
                        size: Some(PaneSize::Lines(15)),
                        ..PaneSpec::default()
                    },
                    PaneSpec {
                        commands: vec![PaneCommand::new(["nvim"])],
                        ..PaneSpec::default()
                    },
                ],
            }],
        }
    }

    pub fn test_settings(layouts_dir: &Path) -> Settings {
        Settings {
            default_root: Some(PathBuf::from("/home/dev")),
            home: Some(PathBuf::from("/home/dev")),
            layouts_dir: layouts_dir.to_path_buf(),
            tmux_binary: "tmux".to_string(),
            socket: None,
            inside_tmux: false,
        }
    }
}
