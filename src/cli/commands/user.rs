//! `hwatm user` command - account administration (admin only)

use clap::{Args, Subcommand};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use super::auth::print_user;
use super::new_password_or_prompt;
use crate::cli::helpers::{format_timestamp, truncate_str, yes_no};
use crate::cli::output::{emit, emit_message, Listing};
use crate::cli::{Context, GlobalOpts};
use crate::core::auth::{NewUser, Role, UserUpdate, ROLES};

#[derive(Debug, Subcommand)]
pub enum UserCommands {
    /// List accounts
    List(UserListArgs),
    /// Show one account
    Show(UsernameArg),
    /// Create an account with any role
    New(UserNewArgs),
    /// Change email, full name or role
    Update(UserUpdateArgs),
    /// Disable an account and end its sessions
    Disable(UsernameArg),
    /// Re-enable a disabled account
    Enable(UsernameArg),
    /// Delete an account
    Delete(UsernameArg),
    /// List available roles
    Roles,
}

#[derive(Debug, Args)]
pub struct UserListArgs {
    /// Filter by role
    #[arg(long, short = 'r')]
    pub role: Option<Role>,

    /// Case-insensitive search over username, email and full name
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Skip this many accounts
    #[arg(long, default_value = "0")]
    pub skip: usize,

    /// Show at most this many accounts
    #[arg(long, default_value = "100")]
    pub limit: usize,
}

#[derive(Debug, Args)]
pub struct UsernameArg {
    pub username: String,
}

#[derive(Debug, Args)]
pub struct UserNewArgs {
    pub username: String,

    /// Password (prompted if omitted)
    #[arg(long)]
    pub password: Option<String>,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub full_name: Option<String>,

    #[arg(long, short = 'r', default_value = "user")]
    pub role: Role,

    /// Create the account disabled
    #[arg(long)]
    pub disabled: bool,
}

#[derive(Debug, Args)]
pub struct UserUpdateArgs {
    pub username: String,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub full_name: Option<String>,

    #[arg(long, short = 'r')]
    pub role: Option<Role>,
}

#[derive(Serialize)]
struct RolesResponse {
    roles: Vec<Role>,
}

pub fn run(cmd: UserCommands, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::open(global)?;
    let admin = ctx.require_admin()?;
    let auth = ctx.auth();

    match cmd {
        UserCommands::List(args) => {
            let users: Vec<_> = ctx
                .store
                .list_users(args.role, args.search.as_deref())?
                .into_iter()
                .skip(args.skip)
                .take(args.limit)
                .collect();

            let mut listing = Listing::new([
                "USERNAME", "ROLE", "EMAIL", "FULL NAME", "ACTIVE", "LAST LOGIN",
            ]);
            for user in &users {
                listing.push([
                    user.username.clone(),
                    user.role.to_string(),
                    user.email.clone().unwrap_or_else(|| "-".into()),
                    truncate_str(user.full_name.as_deref().unwrap_or("-"), 24),
                    yes_no(!user.disabled).to_string(),
                    user.last_login
                        .as_ref()
                        .map(format_timestamp)
                        .unwrap_or_else(|| "-".into()),
                ]);
            }
            let summary = format!("{} user(s) found", users.len());
            emit(global, &users, &listing, Some(&summary))
        }
        UserCommands::Show(arg) => {
            let user = auth.get_user(&arg.username).into_diagnostic()?;
            print_user(global, &user)
        }
        UserCommands::New(args) => {
            let password = new_password_or_prompt(args.password, "Password")?;
            let user = auth
                .create_user(NewUser {
                    email: args.email,
                    full_name: args.full_name,
                    disabled: args.disabled,
                    ..NewUser::new(args.username, password, args.role)
                })
                .into_diagnostic()?;
            emit_message(
                global,
                &format!("Created user {} with role {}", user.username, user.role),
            )
        }
        UserCommands::Update(args) => {
            let update = UserUpdate {
                email: args.email,
                full_name: args.full_name,
                role: args.role,
            };
            if update.is_empty() {
                return Err(miette::miette!(
                    "Nothing to update. Pass --email, --full-name or --role."
                ));
            }
            let user = auth.update_user(&args.username, update).into_diagnostic()?;
            print_user(global, &user)
        }
        UserCommands::Disable(arg) => {
            auth.set_disabled(&admin, &arg.username, true)
                .into_diagnostic()?;
            emit_message(global, &format!("User {} disabled", arg.username))
        }
        UserCommands::Enable(arg) => {
            auth.set_disabled(&admin, &arg.username, false)
                .into_diagnostic()?;
            emit_message(global, &format!("User {} enabled", arg.username))
        }
        UserCommands::Delete(arg) => {
            auth.delete_user(&admin, &arg.username).into_diagnostic()?;
            emit_message(global, &format!("User {} deleted", arg.username))
        }
        UserCommands::Roles => {
            let mut listing = Listing::new(["ROLE"]);
            for role in ROLES {
                listing.push([role.to_string()]);
            }
            emit(
                global,
                &RolesResponse {
                    roles: ROLES.to_vec(),
                },
                &listing,
                None,
            )
        }
    }
}
