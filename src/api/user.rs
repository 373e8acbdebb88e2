use axum::{extract::FromRequestParts, http::request::Parts};
use std::convert::Infallible;

use crate::models::UserId;

/// Header set by the upstream authentication proxy.
pub const USER_HEADER: &str = "x-user-id";

/// Caller identity, if the request was authenticated upstream.
///
/// Anonymous callers still get shared cache results but no watermarks.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<UserId>);

impl CurrentUser {
    #[must_use]
    pub const fn id(&self) -> Option<&UserId> {
        self.0.as_ref()
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .headers
            .get(USER_HEADER)
            .and_then(|h| h.to_str().ok())
            .and_then(UserId::new);

        if let Some(user) = &user {
            tracing::Span::current().record("user_id", user.as_str());
        }

        Ok(Self(user))
    }
}
