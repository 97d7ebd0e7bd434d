//! CLI domain: parse, route, help, output, and presentation only.
//! No engine logic; a single route table dispatches to the engines.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::{command_name, is_mutation};
pub use output::{exit_code, map_error};
pub use parse::{Cli, Commands, GetMode, OutputFormat, WriteOp};
pub use route::RunContext;
