use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};

use super::MessageResponse;
use crate::server::app::AppState;
use crate::server::error::ApiResult;
use crate::server::extract::{ApiJson, ApiPath, ApiQuery};
use crate::services::lab_service::{LabDetail, LabService, LabUpdate, NewLab};
use crate::services::pagination::{Page, PageParams};
use crate::services::views::LabView;

#[utoipa::path(
    get,
    path = "/api/labs",
    params(PageParams),
    responses(
        (status = 200, description = "One page of labs", body = LabPage)
    )
)]
pub async fn list_labs(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> ApiResult<Json<Page<LabView>>> {
    Ok(Json(LabService::new(state.db).list(params).await?))
}

#[utoipa::path(
    post,
    path = "/api/labs",
    request_body = NewLab,
    responses(
        (status = 201, description = "Lab created", body = LabDetail),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 404, description = "Lab or principal investigator not found", body = ErrorBody),
        (status = 409, description = "Lab name already in use", body = ErrorBody)
    )
)]
pub async fn create_lab(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<NewLab>,
) -> ApiResult<(StatusCode, Json<LabDetail>)> {
    let created = LabService::new(state.db).create(payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/labs/{id}",
    params(("id" = i32, Path, description = "Lab ID")),
    responses(
        (status = 200, description = "Lab with relationships", body = LabDetail),
        (status = 404, description = "Lab not found", body = ErrorBody)
    )
)]
pub async fn get_lab(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<Json<LabDetail>> {
    Ok(Json(LabService::new(state.db).get(id).await?))
}

#[utoipa::path(
    put,
    path = "/api/labs/{id}",
    params(("id" = i32, Path, description = "Lab ID")),
    request_body = LabUpdate,
    responses(
        (status = 200, description = "Lab updated", body = LabDetail),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 404, description = "Lab or principal investigator not found", body = ErrorBody),
        (status = 409, description = "Lab name already in use", body = ErrorBody)
    )
)]
pub async fn update_lab(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<LabUpdate>,
) -> ApiResult<Json<LabDetail>> {
    Ok(Json(LabService::new(state.db).update(id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/labs/{id}",
    params(("id" = i32, Path, description = "Lab ID")),
    responses(
        (status = 200, description = "Lab deleted", body = MessageResponse),
        (status = 404, description = "Lab not found", body = ErrorBody)
    )
)]
pub async fn delete_lab(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<Json<MessageResponse>> {
    LabService::new(state.db).delete(id).await?;
    Ok(Json(MessageResponse::new(format!("Lab {} deleted", id))))
}
