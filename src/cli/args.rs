//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    atm::AtmCheckArgs,
    auth::{LoginArgs, PasswdArgs, RegisterArgs},
    board::BoardCommands,
    data::DataCommands,
    fmeca::FmecaArgs,
    init::InitArgs,
    upload::UploadArgs,
    user::UserCommands,
};

#[derive(Parser)]
#[command(name = "hwatm")]
#[command(author, version, about = "FMECA / ATM coverage reconciliation toolkit")]
#[command(
    long_about = "Upload a failure-mode sheet (FMECA) and a test-coverage sheet per board, then \
cross-reference their reference designators: filter FMECA rows by RPN band with a coverage \
verdict attached, or list coverage designators missing from the FMECA (ATM check)."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug logging)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Workspace root (default: auto-detect by finding .hwatm/)
    #[arg(long, global = true, env = "HWATM_WORKSPACE")]
    pub workspace: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a workspace and its first admin account
    Init(InitArgs),

    /// Log in and store a session token
    Login(LoginArgs),

    /// End the current session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Create a regular user account
    Register(RegisterArgs),

    /// Change your password
    Passwd(PasswdArgs),

    /// User administration (admin only)
    #[command(subcommand)]
    User(UserCommands),

    /// Board management
    #[command(subcommand)]
    Board(BoardCommands),

    /// Upload an FMECA or coverage sheet for a board (admin only)
    Upload(UploadArgs),

    /// Inspect or delete stored sheets
    #[command(subcommand)]
    Data(DataCommands),

    /// FMECA rows filtered by RPN band, with coverage verdicts
    Fmeca(FmecaArgs),

    /// Coverage designators missing from the FMECA
    AtmCheck(AtmCheckArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Table for terminals
    #[default]
    Auto,
    /// JSON format (for programming)
    Json,
    /// Markdown tables
    Md,
    /// Tab-separated values (for piping)
    Tsv,
    /// CSV format (for spreadsheets)
    Csv,
}

impl OutputFormat {
    /// Formats meant for other programs, where status lines are noise
    pub fn is_machine(&self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::Tsv | OutputFormat::Csv)
    }
}
