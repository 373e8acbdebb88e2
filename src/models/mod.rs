pub mod continuation;
pub mod platform;
pub mod query;
pub mod result;
pub mod view;

pub use continuation::ContinuationToken;
pub use platform::{PaginationScheme, Platform};
pub use query::{SearchQuery, UserId};
pub use result::EnrichedResult;
pub use view::MergedView;
