//! `hwatm init` command - Initialize a workspace

use console::style;
use miette::{IntoDiagnostic, Result};

use super::new_password_or_prompt;
use crate::cli::GlobalOpts;
use crate::core::auth::{Authenticator, NewUser, Role};
use crate::core::{Config, DocumentStore, Workspace, WorkspaceError};

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: std::path::PathBuf,

    /// Username of the first admin account
    #[arg(long, default_value = "admin")]
    pub admin_user: String,

    /// Password of the first admin account (prompted if omitted)
    #[arg(long, env = "HWATM_ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,

    /// Email of the first admin account
    #[arg(long)]
    pub admin_email: Option<String>,

    /// Force initialization even if .hwatm/ already exists
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs, global: &GlobalOpts) -> Result<()> {
    let path = if args.path.as_os_str() == "." {
        std::env::current_dir().into_diagnostic()?
    } else {
        args.path.clone()
    };

    if !path.exists() {
        std::fs::create_dir_all(&path).into_diagnostic()?;
    }

    let workspace = if args.force {
        Workspace::init_force(&path)
    } else {
        Workspace::init(&path)
    };

    let workspace = match workspace {
        Ok(ws) => ws,
        Err(WorkspaceError::AlreadyExists(path)) => {
            println!(
                "{} hwatm workspace already exists at {}",
                style("!").yellow(),
                style(path.display()).cyan()
            );
            println!();
            println!("Use {} to reinitialize", style("hwatm init --force").yellow());
            return Ok(());
        }
        Err(e) => return Err(miette::miette!("{}", e)),
    };

    let config = Config::load_for(Some(&workspace));
    let store = DocumentStore::open(&workspace)?;
    let auth = Authenticator::new(&store, &config);

    let admin_created = if store.get_user(&args.admin_user)?.is_none() {
        let password = new_password_or_prompt(args.admin_password, "Admin password")?;
        auth.create_user(NewUser {
            email: args.admin_email,
            ..NewUser::new(&args.admin_user, password, Role::Admin)
        })
        .into_diagnostic()?;
        true
    } else {
        false
    };

    if global.quiet {
        return Ok(());
    }

    println!(
        "{} Initialized hwatm workspace at {}",
        style("✓").green(),
        style(workspace.root().display()).cyan()
    );
    if admin_created {
        println!(
            "{} Created admin account {}",
            style("✓").green(),
            style(&args.admin_user).cyan()
        );
    }
    println!();
    println!("Next steps:");
    println!("  {} Log in", style(format!("hwatm login --username {}", args.admin_user)).yellow());
    println!("  {} Register a board", style("hwatm board add <NAME>").yellow());
    println!(
        "  {} Upload its sheets",
        style("hwatm upload <BOARD> --kind fmeca <FILE>").yellow()
    );
    Ok(())
}
