//! Command-name contract used in log events.

use crate::cli::parse::Commands;

/// Stable command name (e.g. "lsk", "write.put").
pub fn command_name(command: &Commands) -> String {
    match command {
        Commands::Meta => "meta".to_string(),
        Commands::Lsb { .. } => "lsb".to_string(),
        Commands::Lsk { .. } => "lsk".to_string(),
        Commands::Get { .. } => "get".to_string(),
        Commands::Search { .. } => "search".to_string(),
        Commands::Export { .. } => "export".to_string(),
        Commands::Write { op, .. } => format!("write.{}", op.as_str()),
    }
}

/// Whether the command needs a read-write store.
pub fn is_mutation(command: &Commands) -> bool {
    matches!(command, Commands::Write { .. })
}
