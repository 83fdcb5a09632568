//! @acp:module "Commands"
//! @acp:summary "CLI command implementations"
//! @acp:domain engine
//! @acp:layer handler
//!
//! Provides implementations for all CLI commands.
//! Each command is in its own submodule for maintainability.

pub mod check;
pub mod expand;
pub mod parse;
pub mod vars;

pub use check::{execute_check, CheckOptions};
pub use expand::{execute_expand, ExpandOptions};
pub use parse::{execute_parse, ParseOptions};
pub use vars::{execute_vars, VarsOptions};
