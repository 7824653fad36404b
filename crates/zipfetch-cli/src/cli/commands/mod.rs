//! CLI command handlers, one file per subcommand.

mod serve;
mod sweep;

pub use serve::run_serve;
pub use sweep::run_sweep;
