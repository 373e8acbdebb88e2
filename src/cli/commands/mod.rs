mod search;
mod sweep;

pub use search::cmd_search;
pub use sweep::cmd_sweep;
