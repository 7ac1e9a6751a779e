//! Extractors whose rejections come back as the usual `{error}` body.

use async_trait::async_trait;
use axum::extract::{FromRequest, Multipart, Request};

use crate::error::AppError;

/// Multipart upload body; a missing or broken `multipart/form-data`
/// envelope is a validation error.
pub struct UploadForm(pub Multipart);

#[async_trait]
impl<S> FromRequest<S> for UploadForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Multipart::from_request(req, state)
            .await
            .map(Self)
            .map_err(AppError::from)
    }
}
