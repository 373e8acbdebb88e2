pub use super::search_cache::Entity as SearchCache;
pub use super::viewed_state::Entity as ViewedState;
