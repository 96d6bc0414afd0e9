use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};

use super::MessageResponse;
use crate::server::app::AppState;
use crate::server::error::ApiResult;
use crate::server::extract::{ApiJson, ApiPath, ApiQuery};
use crate::services::compute_resource_service::{
    ComputeResourceDetail, ComputeResourceService, ComputeResourceUpdate, NewComputeResource,
};
use crate::services::pagination::{Page, PageParams};
use crate::services::views::ComputeResourceView;

#[utoipa::path(
    get,
    path = "/api/compute-resources",
    params(PageParams),
    responses(
        (status = 200, description = "One page of compute resources", body = ComputeResourcePage)
    )
)]
pub async fn list_compute_resources(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> ApiResult<Json<Page<ComputeResourceView>>> {
    Ok(Json(ComputeResourceService::new(state.db).list(params).await?))
}

#[utoipa::path(
    post,
    path = "/api/compute-resources",
    request_body = NewComputeResource,
    responses(
        (status = 201, description = "Compute resource created", body = ComputeResourceDetail),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 404, description = "Compute resource or a linked project not found", body = ErrorBody)
    )
)]
pub async fn create_compute_resource(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<NewComputeResource>,
) -> ApiResult<(StatusCode, Json<ComputeResourceDetail>)> {
    let created = ComputeResourceService::new(state.db).create(payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/compute-resources/{id}",
    params(("id" = i32, Path, description = "Compute resource ID")),
    responses(
        (status = 200, description = "Compute resource with relationships", body = ComputeResourceDetail),
        (status = 404, description = "Compute resource not found", body = ErrorBody)
    )
)]
pub async fn get_compute_resource(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<Json<ComputeResourceDetail>> {
    Ok(Json(ComputeResourceService::new(state.db).get(id).await?))
}

#[utoipa::path(
    put,
    path = "/api/compute-resources/{id}",
    params(("id" = i32, Path, description = "Compute resource ID")),
    request_body = ComputeResourceUpdate,
    responses(
        (status = 200, description = "Compute resource updated", body = ComputeResourceDetail),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 404, description = "Compute resource or a linked project not found", body = ErrorBody)
    )
)]
pub async fn update_compute_resource(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<ComputeResourceUpdate>,
) -> ApiResult<Json<ComputeResourceDetail>> {
    Ok(Json(ComputeResourceService::new(state.db).update(id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/compute-resources/{id}",
    params(("id" = i32, Path, description = "Compute resource ID")),
    responses(
        (status = 200, description = "Compute resource deleted", body = MessageResponse),
        (status = 404, description = "Compute resource not found", body = ErrorBody)
    )
)]
pub async fn delete_compute_resource(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<Json<MessageResponse>> {
    ComputeResourceService::new(state.db).delete(id).await?;
    Ok(Json(MessageResponse::new(format!("Compute resource {} deleted", id))))
}
