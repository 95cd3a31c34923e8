//! CLI command implementations

pub mod atm;
pub mod auth;
pub mod board;
pub mod data;
pub mod fmeca;
pub mod init;
pub mod upload;
pub mod user;

use dialoguer::{theme::ColorfulTheme, Password};
use miette::{IntoDiagnostic, Result};

/// Use the given password or prompt for one without echo
pub(crate) fn password_or_prompt(given: Option<String>, prompt: &str) -> Result<String> {
    match given {
        Some(password) => Ok(password),
        None => Password::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .interact()
            .into_diagnostic(),
    }
}

/// Use the given password or prompt twice for a new one
pub(crate) fn new_password_or_prompt(given: Option<String>, prompt: &str) -> Result<String> {
    match given {
        Some(password) => Ok(password),
        None => Password::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .with_confirmation("Repeat password", "Passwords do not match")
            .interact()
            .into_diagnostic(),
    }
}
