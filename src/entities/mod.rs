pub mod prelude;

pub mod search_cache;
pub mod viewed_state;
