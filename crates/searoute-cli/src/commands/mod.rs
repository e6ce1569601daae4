// Subcommand handlers. main.rs parses arguments and dispatches here.

pub mod graph;
pub mod profiles;
pub mod route;
pub mod snap;
