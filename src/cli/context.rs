//! Per-invocation state: workspace, configuration, store and login session

use std::fs;

use miette::{IntoDiagnostic, Result};

use crate::cli::GlobalOpts;
use crate::core::auth::{require_role, AuthError, Authenticator, Role, User};
use crate::core::{Config, DocumentStore, Workspace};

/// Environment variable that overrides the stored session token
pub const TOKEN_ENV: &str = "HWATM_TOKEN";

pub struct Context {
    pub workspace: Workspace,
    pub config: Config,
    pub store: DocumentStore,
}

impl Context {
    /// Discover the workspace (or use `--workspace`) and open its store
    pub fn open(global: &GlobalOpts) -> Result<Self> {
        let workspace = match &global.workspace {
            Some(root) => Workspace::at(root),
            None => Workspace::discover(),
        }
        .into_diagnostic()?;

        let config = Config::load_for(Some(&workspace));
        let store = DocumentStore::open(&workspace)?;
        tracing::debug!(root = %workspace.root().display(), "opened workspace");

        Ok(Self {
            workspace,
            config,
            store,
        })
    }

    pub fn auth(&self) -> Authenticator<'_> {
        Authenticator::new(&self.store, &self.config)
    }

    /// Session token from the environment or the workspace session file
    pub fn token(&self) -> Option<String> {
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            if !token.trim().is_empty() {
                return Some(token.trim().to_string());
            }
        }
        fs::read_to_string(self.workspace.session_path())
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    pub fn save_token(&self, token: &str) -> Result<()> {
        let path = self.workspace.session_path();
        fs::write(&path, format!("{}\n", token)).into_diagnostic()?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o600)).into_diagnostic()?;
        }
        Ok(())
    }

    pub fn clear_token(&self) -> Result<()> {
        let path = self.workspace.session_path();
        if path.exists() {
            fs::remove_file(&path).into_diagnostic()?;
        }
        Ok(())
    }

    /// The logged-in, active user
    pub fn current_user(&self) -> Result<User> {
        let token = self
            .token()
            .ok_or(AuthError::NotAuthenticated)
            .into_diagnostic()?;
        self.auth().authenticate(&token).into_diagnostic()
    }

    /// The logged-in user, who must be an admin
    pub fn require_admin(&self) -> Result<User> {
        let user = self.current_user()?;
        require_role(&user, Role::Admin).into_diagnostic()?;
        Ok(user)
    }
}
