//! Core module - workspace, storage, accounts and table types

pub mod auth;
pub mod board;
pub mod config;
pub mod store;
pub mod table;
pub mod workspace;

pub use auth::{AuthError, Authenticator, NewUser, Role, Session, User, UserUpdate};
pub use board::{Board, BoardInfo, BoardSelector, TableKind};
pub use config::Config;
pub use store::{DocumentStore, TableSource};
pub use table::{CellValue, Table};
pub use workspace::{Workspace, WorkspaceError};
