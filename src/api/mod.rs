use crate::error::AppError;
use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::str::FromStr;
use uuid::Uuid;

pub mod auth;
pub mod conversations;
pub mod roleplays;
pub mod sessions;
pub mod teachers;
pub mod vocabulary;

const X_USER_ID: &str = "X-User-ID";

/// Authenticated user id, resolved from the auth proxy's identity header.
/// Operations fail closed when it is absent.
#[derive(Debug)]
pub struct ExtractUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for ExtractUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, AppError> {
        if let Some(user_id) = parts.headers.get(X_USER_ID) {
            let user_id = user_id
                .to_str()
                .map_err(|_| AppError::Auth("invalid user id"))?;
            let user_id =
                Uuid::from_str(user_id).map_err(|_| AppError::Auth("invalid user id"))?;
            Ok(ExtractUser(user_id))
        } else {
            Err(AppError::Auth("`X-User-ID` header is missing"))
        }
    }
}
