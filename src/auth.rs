//! Request identity.
//!
//! Authentication happens upstream; the edge forwards the resolved user id
//! in the `x-user-id` header. The extractor turns it into an explicit
//! handler parameter so core operations never read ambient state.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::error::ShopError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// An authenticated caller. Rejects with 401 when the header is absent.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

fn user_id(parts: &Parts) -> Option<Uuid> {
    parts
        .headers
        .get(USER_ID_HEADER)?
        .to_str()
        .ok()
        .and_then(|v| Uuid::parse_str(v).ok())
}

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = ShopError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        user_id(parts).map(AuthUser).ok_or(ShopError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(USER_ID_HEADER, value);
        }
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[test]
    fn parses_valid_header() {
        let id = Uuid::new_v4();
        let parts = parts_with(Some(&id.to_string()));
        assert_eq!(user_id(&parts), Some(id));
    }

    #[test]
    fn missing_or_malformed_header_is_anonymous() {
        assert_eq!(user_id(&parts_with(None)), None);
        assert_eq!(user_id(&parts_with(Some("not-a-uuid"))), None);
    }
}
