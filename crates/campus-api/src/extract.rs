use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use tracing::debug;

use crate::error::ApiError;

/// `Json` whose rejections answer with the usual `{message}` body and a 400.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => {
                debug!("Rejected request body: {}", rejection.body_text());
                Err(ApiError::Validation("Malformed request body".into()))
            }
        }
    }
}
