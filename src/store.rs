//! One KDL file per layout, kept in a single directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

use crate::config::Settings;
use crate::error::{TrellisError, TrellisResult};
use crate::layout::{self, LayoutSpec};
use crate::utils::layout_name_from_path;

pub const LAYOUT_EXTENSION: &str = "kdl";

#[derive(Debug, Clone)]
pub struct LayoutStore {
    dir: PathBuf,
}

impl LayoutStore {
    pub fn new(dir: impl Into<PathBuf>) -> LayoutStore {
        LayoutStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Locate a layout by name, or use the argument directly when it is a path.
    pub fn path_for(&self, name: &str) -> PathBuf {
        let as_path = Path::new(name);
        let is_file = as_path.extension().is_some_and(|e| e == LAYOUT_EXTENSION);
        if is_file || as_path.components().count() > 1 {
            return as_path.to_path_buf();
        }
        self.file_for(name)
    }

    fn file_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{LAYOUT_EXTENSION}"))
    }

    /// Names of all stored layouts, sorted. A missing directory holds none.
    pub fn names(&self) -> TrellisResult<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("read layouts dir {}", self.dir.display()))
                    .into())
            }
        };

        let mut names = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            let is_layout = path.extension().is_some_and(|e| e == LAYOUT_EXTENSION);
            if !is_layout || !path.is_file() {
                continue;
            }
            if let Some(name) = layout_name_from_path(&path) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn load(&self, name: &str, settings: &Settings) -> TrellisResult<LayoutSpec> {
        let path = self.path_for(name);
        let data = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TrellisError::LayoutNotFound(name.to_string()))
            }
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("read layout {}", path.display()))
                    .into())
            }
        };
        debug!(path = %path.display(), "loaded layout");
        Ok(layout::parse(&data, &settings.parse_context(&path))?)
    }

    /// Write `spec` as `<name>.kdl` in the layouts directory, replacing the file atomically.
    pub fn save(&self, spec: &LayoutSpec, overwrite: bool) -> TrellisResult<PathBuf> {
        let path = self.file_for(&spec.name);
        if path.exists() && !overwrite {
            return Err(TrellisError::LayoutExists(path));
        }
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).context("create layouts dir")?;
        }

        let payload = layout::to_kdl(spec);
        let tmp_path = path.with_extension("kdl.tmp");
        fs::write(&tmp_path, payload.as_bytes()).context("write temp layout file")?;
        fs::rename(&tmp_path, &path).context("atomically replace layout file")?;
        Ok(path)
    }
}
