use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};

use super::MessageResponse;
use crate::server::app::AppState;
use crate::server::error::ApiResult;
use crate::server::extract::{ApiJson, ApiPath, ApiQuery};
use crate::services::grant_service::{GrantDetail, GrantService, GrantUpdate, NewGrant};
use crate::services::pagination::{Page, PageParams};
use crate::services::views::GrantView;

#[utoipa::path(
    get,
    path = "/api/grants",
    params(PageParams),
    responses(
        (status = 200, description = "One page of grants", body = GrantPage)
    )
)]
pub async fn list_grants(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> ApiResult<Json<Page<GrantView>>> {
    Ok(Json(GrantService::new(state.db).list(params).await?))
}

#[utoipa::path(
    post,
    path = "/api/grants",
    request_body = NewGrant,
    responses(
        (status = 201, description = "Grant created", body = GrantDetail),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 404, description = "Grant or a linked record not found", body = ErrorBody),
        (status = 409, description = "Grant number already in use", body = ErrorBody)
    )
)]
pub async fn create_grant(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<NewGrant>,
) -> ApiResult<(StatusCode, Json<GrantDetail>)> {
    let created = GrantService::new(state.db).create(payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/grants/{id}",
    params(("id" = i32, Path, description = "Grant ID")),
    responses(
        (status = 200, description = "Grant with relationships", body = GrantDetail),
        (status = 404, description = "Grant not found", body = ErrorBody)
    )
)]
pub async fn get_grant(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<Json<GrantDetail>> {
    Ok(Json(GrantService::new(state.db).get(id).await?))
}

#[utoipa::path(
    put,
    path = "/api/grants/{id}",
    params(("id" = i32, Path, description = "Grant ID")),
    request_body = GrantUpdate,
    responses(
        (status = 200, description = "Grant updated", body = GrantDetail),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 404, description = "Grant or a linked record not found", body = ErrorBody),
        (status = 409, description = "Grant number already in use", body = ErrorBody)
    )
)]
pub async fn update_grant(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<GrantUpdate>,
) -> ApiResult<Json<GrantDetail>> {
    Ok(Json(GrantService::new(state.db).update(id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/grants/{id}",
    params(("id" = i32, Path, description = "Grant ID")),
    responses(
        (status = 200, description = "Grant deleted", body = MessageResponse),
        (status = 404, description = "Grant not found", body = ErrorBody)
    )
)]
pub async fn delete_grant(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<Json<MessageResponse>> {
    GrantService::new(state.db).delete(id).await?;
    Ok(Json(MessageResponse::new(format!("Grant {} deleted", id))))
}
