pub mod cli;
pub mod commands;
pub mod config;
pub mod dispatcher;
pub mod driver;
pub mod pages;
pub mod session;
pub mod wait;

pub use commands::{CommandError, CommandResult, CommandTable};
pub use driver::{Driver, DriverError, ElementHandle};
pub use session::{LineOutcome, Session, SessionError, SessionState, SetupError};
pub use uiscript_common as common;
pub use uiscript_parser as parser;
