//! CLI module - argument parsing and command dispatch

pub mod args;
pub mod commands;
pub mod context;
pub mod helpers;
pub mod output;

pub use args::{Cli, Commands, GlobalOpts, OutputFormat};
pub use context::Context;

use miette::Result;

/// Run a parsed command line
pub fn run(cli: Cli) -> Result<()> {
    let global = cli.global;

    match cli.command {
        Commands::Init(args) => commands::init::run(args, &global),
        Commands::Login(args) => commands::auth::run_login(args, &global),
        Commands::Logout => commands::auth::run_logout(&global),
        Commands::Whoami => commands::auth::run_whoami(&global),
        Commands::Register(args) => commands::auth::run_register(args, &global),
        Commands::Passwd(args) => commands::auth::run_passwd(args, &global),
        Commands::User(cmd) => commands::user::run(cmd, &global),
        Commands::Board(cmd) => commands::board::run(cmd, &global),
        Commands::Upload(args) => commands::upload::run(args, &global),
        Commands::Data(cmd) => commands::data::run(cmd, &global),
        Commands::Fmeca(args) => commands::fmeca::run(args, &global),
        Commands::AtmCheck(args) => commands::atm::run(args, &global),
    }
}
