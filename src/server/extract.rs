use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts, Path, Query, Request,
    },
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use super::error::ApiError;
use crate::errors::CoreError;

/// `axum::Json` whose rejections render as 400 `VALIDATION_FAILED`.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(ApiError(rejection_to_error(rejection))),
        }
    }
}

/// Query string extractor with the same error body as [`ApiJson`].
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(ApiQuery(value)),
            Err(rejection) => Err(ApiError(query_rejection_to_error(rejection))),
        }
    }
}

/// Path parameter extractor; a non-numeric id is a validation error.
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(ApiPath(value)),
            Err(rejection) => Err(ApiError(path_rejection_to_error(rejection))),
        }
    }
}

fn rejection_to_error(rejection: JsonRejection) -> CoreError {
    let message = match &rejection {
        JsonRejection::MissingJsonContentType(_) => {
            "Request body must be JSON (Content-Type: application/json)".to_string()
        }
        _ => format!("Invalid request body: {}", rejection.body_text()),
    };
    CoreError::validation(message)
}

fn query_rejection_to_error(rejection: QueryRejection) -> CoreError {
    CoreError::validation(format!("Invalid query string: {}", rejection.body_text()))
}

fn path_rejection_to_error(rejection: PathRejection) -> CoreError {
    match &rejection {
        PathRejection::MissingPathParams(_) => {
            CoreError::internal(format!("Route is missing path parameters: {}", rejection.body_text()))
        }
        _ => CoreError::validation(format!("Invalid path parameter: {}", rejection.body_text())),
    }
}
