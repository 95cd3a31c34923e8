//! Workspace discovery and structure

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the marker directory holding the store, config and session
const WORKSPACE_DIR: &str = ".hwatm";

/// Represents an hwatm workspace
#[derive(Debug)]
pub struct Workspace {
    /// Root directory of the workspace (parent of .hwatm/)
    root: PathBuf,
}

impl Workspace {
    /// Find workspace root by walking up from the current directory
    pub fn discover() -> Result<Self, WorkspaceError> {
        let current = std::env::current_dir()
            .map_err(|e| WorkspaceError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find workspace root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, WorkspaceError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| WorkspaceError::IoError(e.to_string()))?;

        loop {
            if current.join(WORKSPACE_DIR).is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(WorkspaceError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Open the workspace at an explicit root without walking up
    pub fn at(root: &Path) -> Result<Self, WorkspaceError> {
        if root.join(WORKSPACE_DIR).is_dir() {
            Ok(Self {
                root: root.to_path_buf(),
            })
        } else {
            Err(WorkspaceError::NotFound {
                searched_from: root.to_path_buf(),
            })
        }
    }

    /// Create a new workspace at the given path
    pub fn init(path: &Path) -> Result<Self, WorkspaceError> {
        let root = path
            .canonicalize()
            .unwrap_or_else(|_| path.to_path_buf());

        if root.join(WORKSPACE_DIR).exists() {
            return Err(WorkspaceError::AlreadyExists(root));
        }

        Self::init_force(&root)
    }

    /// Force initialization even if .hwatm/ exists
    ///
    /// The store itself is left in place; only the directory layout and the
    /// default config are rewritten.
    pub fn init_force(path: &Path) -> Result<Self, WorkspaceError> {
        let root = path
            .canonicalize()
            .unwrap_or_else(|_| path.to_path_buf());

        let dir = root.join(WORKSPACE_DIR);
        std::fs::create_dir_all(&dir).map_err(|e| WorkspaceError::IoError(e.to_string()))?;

        std::fs::write(dir.join("config.yaml"), Self::default_config())
            .map_err(|e| WorkspaceError::IoError(e.to_string()))?;

        // Session tokens and the store are user-local
        std::fs::write(dir.join(".gitignore"), "store.db*\nsession\n")
            .map_err(|e| WorkspaceError::IoError(e.to_string()))?;

        Ok(Self { root })
    }

    fn default_config() -> &'static str {
        r#"# hwatm workspace configuration

# Minutes a login session stays valid
# session_ttl_minutes: 30

# PBKDF2 iterations for new password hashes
# password_iterations: 100000

# Fill blank cells from the row above when ingesting a sheet
# forward_fill: true

# Band used by `hwatm fmeca` when --filter is omitted (red, orange, yellow, green, all)
# default_filter: all

# Upload size limit in bytes
# max_upload_bytes: 52428800
"#
    }

    /// Get the workspace root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .hwatm directory
    pub fn hwatm_dir(&self) -> PathBuf {
        self.root.join(WORKSPACE_DIR)
    }

    pub fn config_path(&self) -> PathBuf {
        self.hwatm_dir().join("config.yaml")
    }

    pub fn store_path(&self) -> PathBuf {
        self.hwatm_dir().join("store.db")
    }

    pub fn session_path(&self) -> PathBuf {
        self.hwatm_dir().join("session")
    }
}

/// Errors that can occur during workspace operations
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("not an hwatm workspace (searched from {searched_from:?}). Run 'hwatm init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("hwatm workspace already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),
}
