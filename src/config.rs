//! Runtime settings resolved from the environment.
//!
//! `TRELLIS_ROOT` sets the root used by layouts that name none (falling back
//! to the home directory). `TRELLIS_LAYOUTS`, `TRELLIS_TMUX` and
//! `TRELLIS_SOCKET` locate the layout files and the tmux server.

use std::path::{Path, PathBuf};

use crate::error::{TrellisError, TrellisResult};
use crate::layout::ParseContext;
use crate::utils::resolve_root;

pub const ROOT_ENV: &str = "TRELLIS_ROOT";
pub const LAYOUTS_ENV: &str = "TRELLIS_LAYOUTS";
pub const TMUX_BINARY_ENV: &str = "TRELLIS_TMUX";
pub const SOCKET_ENV: &str = "TRELLIS_SOCKET";

const DEFAULT_TMUX_BINARY: &str = "tmux";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub default_root: Option<PathBuf>,
    pub home: Option<PathBuf>,
    pub layouts_dir: PathBuf,
    pub tmux_binary: String,
    pub socket: Option<String>,
    /// Set when running inside a tmux client (`$TMUX`).
    pub inside_tmux: bool,
}

impl Settings {
    pub fn from_env() -> TrellisResult<Settings> {
        Settings::from_lookup(
            &|key| std::env::var(key).ok(),
            dirs::home_dir(),
            dirs::config_dir(),
        )
    }

    pub fn from_lookup<FEnv>(
        env_lookup: &FEnv,
        home: Option<PathBuf>,
        config_dir: Option<PathBuf>,
    ) -> TrellisResult<Settings>
    where
        FEnv: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| env_lookup(key).filter(|v| !v.trim().is_empty());

        let default_root = match non_empty(ROOT_ENV) {
            Some(raw) => Some(resolve_root(&raw, home.as_deref(), None).ok_or_else(|| {
                TrellisError::Config(format!("{ROOT_ENV} must be an absolute path, got `{raw}`"))
            })?),
            None => home.clone(),
        };

        let layouts_dir = match non_empty(LAYOUTS_ENV) {
            Some(raw) => PathBuf::from(raw.trim()),
            None => config_dir
                .map(|d| d.join("trellis").join("layouts"))
                .ok_or_else(|| {
                    TrellisError::Config(format!(
                        "cannot locate a config directory; set {LAYOUTS_ENV}"
                    ))
                })?,
        };

        Ok(Settings {
            default_root,
            home,
            layouts_dir,
            tmux_binary: non_empty(TMUX_BINARY_ENV)
                .unwrap_or_else(|| DEFAULT_TMUX_BINARY.to_string()),
            socket: non_empty(SOCKET_ENV),
            inside_tmux: non_empty("TMUX").is_some(),
        })
    }

    /// Parse defaults for the layout stored at `path`.
    pub fn parse_context(&self, path: &Path) -> ParseContext {
        ParseContext {
            name: crate::utils::layout_name_from_path(path),
            default_root: self.default_root.clone(),
            home: self.home.clone(),
        }
    }
}
