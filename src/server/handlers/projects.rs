use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};

use super::MessageResponse;
use crate::server::app::AppState;
use crate::server::error::ApiResult;
use crate::server::extract::{ApiJson, ApiPath, ApiQuery};
use crate::services::project_service::{NewProject, ProjectDetail, ProjectService, ProjectUpdate};
use crate::services::pagination::{Page, PageParams};
use crate::services::views::ProjectView;

#[utoipa::path(
    get,
    path = "/api/projects",
    params(PageParams),
    responses(
        (status = 200, description = "One page of projects", body = ProjectPage)
    )
)]
pub async fn list_projects(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> ApiResult<Json<Page<ProjectView>>> {
    Ok(Json(ProjectService::new(state.db).list(params).await?))
}

#[utoipa::path(
    post,
    path = "/api/projects",
    request_body = NewProject,
    responses(
        (status = 201, description = "Project created", body = ProjectDetail),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 404, description = "Project or a linked record not found", body = ErrorBody)
    )
)]
pub async fn create_project(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<NewProject>,
) -> ApiResult<(StatusCode, Json<ProjectDetail>)> {
    let created = ProjectService::new(state.db).create(payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/projects/{id}",
    params(("id" = i32, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project with relationships", body = ProjectDetail),
        (status = 404, description = "Project not found", body = ErrorBody)
    )
)]
pub async fn get_project(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<Json<ProjectDetail>> {
    Ok(Json(ProjectService::new(state.db).get(id).await?))
}

#[utoipa::path(
    put,
    path = "/api/projects/{id}",
    params(("id" = i32, Path, description = "Project ID")),
    request_body = ProjectUpdate,
    responses(
        (status = 200, description = "Project updated", body = ProjectDetail),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 404, description = "Project or a linked record not found", body = ErrorBody)
    )
)]
pub async fn update_project(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<ProjectUpdate>,
) -> ApiResult<Json<ProjectDetail>> {
    Ok(Json(ProjectService::new(state.db).update(id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/projects/{id}",
    params(("id" = i32, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project deleted", body = MessageResponse),
        (status = 404, description = "Project not found", body = ErrorBody)
    )
)]
pub async fn delete_project(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<Json<MessageResponse>> {
    ProjectService::new(state.db).delete(id).await?;
    Ok(Json(MessageResponse::new(format!("Project {} deleted", id))))
}
