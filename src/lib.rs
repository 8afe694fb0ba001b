//! Batch operations on Google Calendar events chosen by name or id selectors.

pub mod cli;
pub mod command;
pub mod dispatch;
pub mod session;

pub use cli::Cli;
pub use command::{usage, Command, Invocation};
pub use dispatch::{run, DispatchSettings};
pub use session::Session;
