//! Login session and self-service account commands

use console::style;
use dialoguer::{theme::ColorfulTheme, Input};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use super::{new_password_or_prompt, password_or_prompt};
use crate::cli::helpers::format_timestamp;
use crate::cli::output::{emit, print_json, Listing};
use crate::cli::{Context, GlobalOpts, OutputFormat};
use crate::core::User;

#[derive(clap::Args, Debug)]
pub struct LoginArgs {
    /// Username (prompted if omitted)
    #[arg(long, short = 'u')]
    pub username: Option<String>,

    /// Password (prompted if omitted)
    #[arg(long, env = "HWATM_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Print the token instead of storing it in the workspace
    #[arg(long)]
    pub print_token: bool,
}

#[derive(clap::Args, Debug)]
pub struct RegisterArgs {
    /// Username for the new account
    #[arg(long, short = 'u')]
    pub username: String,

    /// Password (prompted if omitted)
    #[arg(long, env = "HWATM_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Email address
    #[arg(long)]
    pub email: Option<String>,

    /// Full name
    #[arg(long)]
    pub full_name: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct PasswdArgs {
    /// Current password (prompted if omitted)
    #[arg(long)]
    pub current: Option<String>,

    /// New password (prompted if omitted)
    #[arg(long)]
    pub new: Option<String>,
}

#[derive(Serialize)]
struct TokenResponse<'a> {
    access_token: &'a str,
    token_type: &'static str,
    expires_at: String,
    user: &'a User,
}

pub fn run_login(args: LoginArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::open(global)?;

    let username = match args.username {
        Some(u) => u,
        None => Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt("Username")
            .interact_text()
            .into_diagnostic()?,
    };
    let password = password_or_prompt(args.password, "Password")?;

    let session = ctx.auth().login(&username, &password).into_diagnostic()?;
    if !args.print_token {
        ctx.save_token(&session.token)?;
    }

    if global.format == OutputFormat::Json {
        return print_json(&TokenResponse {
            access_token: &session.token,
            token_type: "bearer",
            expires_at: session.expires_at.to_rfc3339(),
            user: &session.user,
        });
    }

    if args.print_token {
        println!("{}", session.token);
    } else if !global.quiet {
        println!(
            "{} Logged in as {} ({}) until {}",
            style("✓").green(),
            style(&session.user.username).cyan(),
            session.user.role,
            format_timestamp(&session.expires_at)
        );
    }
    Ok(())
}

pub fn run_logout(global: &GlobalOpts) -> Result<()> {
    let ctx = Context::open(global)?;

    let ended = match ctx.token() {
        Some(token) => ctx.auth().logout(&token).into_diagnostic()?,
        None => false,
    };
    ctx.clear_token()?;

    if !global.quiet {
        if ended {
            println!("{} Logged out", style("✓").green());
        } else {
            println!("{} No active session", style("!").yellow());
        }
    }
    Ok(())
}

pub fn run_whoami(global: &GlobalOpts) -> Result<()> {
    let ctx = Context::open(global)?;
    let user = ctx.current_user()?;
    print_user(global, &user)
}

pub fn run_register(args: RegisterArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::open(global)?;
    let password = new_password_or_prompt(args.password, "Password")?;

    let user = ctx
        .auth()
        .register(&args.username, &password, args.email, args.full_name)
        .into_diagnostic()?;

    if global.format == OutputFormat::Json {
        return print_json(&user);
    }
    if !global.quiet {
        println!(
            "{} Registered {} with role {}",
            style("✓").green(),
            style(&user.username).cyan(),
            user.role
        );
    }
    Ok(())
}

pub fn run_passwd(args: PasswdArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::open(global)?;
    let user = ctx.current_user()?;

    let current = password_or_prompt(args.current, "Current password")?;
    let new = new_password_or_prompt(args.new, "New password")?;
    ctx.auth()
        .change_password(&user, &current, &new)
        .into_diagnostic()?;

    if !global.quiet {
        println!("{} Password updated successfully", style("✓").green());
    }
    Ok(())
}

/// Key/value view of one account
pub(crate) fn print_user(global: &GlobalOpts, user: &User) -> Result<()> {
    let mut listing = Listing::new(["Field", "Value"]);
    listing.push(["Username".to_string(), user.username.clone()]);
    listing.push(["Role".to_string(), user.role.to_string()]);
    listing.push([
        "Email".to_string(),
        user.email.clone().unwrap_or_else(|| "-".into()),
    ]);
    listing.push([
        "Full name".to_string(),
        user.full_name.clone().unwrap_or_else(|| "-".into()),
    ]);
    listing.push([
        "Status".to_string(),
        if user.disabled { "disabled" } else { "active" }.to_string(),
    ]);
    listing.push(["Created".to_string(), format_timestamp(&user.created_at)]);
    listing.push([
        "Last login".to_string(),
        user.last_login
            .as_ref()
            .map(format_timestamp)
            .unwrap_or_else(|| "-".into()),
    ]);
    emit(global, user, &listing, None)
}
