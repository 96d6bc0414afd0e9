use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};

use super::MessageResponse;
use crate::server::app::AppState;
use crate::server::error::ApiResult;
use crate::server::extract::{ApiJson, ApiPath, ApiQuery};
use crate::services::note_service::{NewNote, NoteService, NoteUpdate};
use crate::services::pagination::{Page, PageParams};
use crate::services::researcher_service::{
    NewResearcher, ResearcherDetail, ResearcherService, ResearcherUpdate,
};
use crate::services::views::{NoteView, ResearcherView};

#[utoipa::path(
    get,
    path = "/api/researchers",
    params(PageParams),
    responses(
        (status = 200, description = "One page of researchers", body = ResearcherPage)
    )
)]
pub async fn list_researchers(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> ApiResult<Json<Page<ResearcherView>>> {
    let page = ResearcherService::new(state.db).list(params).await?;
    Ok(Json(page))
}

#[utoipa::path(
    post,
    path = "/api/researchers",
    request_body = NewResearcher,
    responses(
        (status = 201, description = "Researcher created", body = ResearcherDetail),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 404, description = "Referenced lab not found", body = ErrorBody),
        (status = 409, description = "Email already in use", body = ErrorBody)
    )
)]
pub async fn create_researcher(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<NewResearcher>,
) -> ApiResult<(StatusCode, Json<ResearcherDetail>)> {
    let researcher = ResearcherService::new(state.db).create(payload).await?;
    Ok((StatusCode::CREATED, Json(researcher)))
}

#[utoipa::path(
    get,
    path = "/api/researchers/{id}",
    params(("id" = i32, Path, description = "Researcher ID")),
    responses(
        (status = 200, description = "Researcher with relationships", body = ResearcherDetail),
        (status = 404, description = "Researcher not found", body = ErrorBody)
    )
)]
pub async fn get_researcher(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<Json<ResearcherDetail>> {
    Ok(Json(ResearcherService::new(state.db).get(id).await?))
}

#[utoipa::path(
    put,
    path = "/api/researchers/{id}",
    params(("id" = i32, Path, description = "Researcher ID")),
    request_body = ResearcherUpdate,
    responses(
        (status = 200, description = "Researcher updated", body = ResearcherDetail),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 404, description = "Researcher or lab not found", body = ErrorBody),
        (status = 409, description = "Email already in use", body = ErrorBody)
    )
)]
pub async fn update_researcher(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<ResearcherUpdate>,
) -> ApiResult<Json<ResearcherDetail>> {
    Ok(Json(ResearcherService::new(state.db).update(id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/researchers/{id}",
    params(("id" = i32, Path, description = "Researcher ID")),
    responses(
        (status = 200, description = "Researcher deleted", body = MessageResponse),
        (status = 404, description = "Researcher not found", body = ErrorBody),
        (status = 409, description = "Researcher is still a principal investigator", body = ErrorBody)
    )
)]
pub async fn delete_researcher(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<Json<MessageResponse>> {
    ResearcherService::new(state.db).delete(id).await?;
    Ok(Json(MessageResponse::new(format!("Researcher {} deleted", id))))
}

#[utoipa::path(
    get,
    path = "/api/researchers/{id}/notes",
    params(("id" = i32, Path, description = "Researcher ID")),
    responses(
        (status = 200, description = "Notes of the researcher, newest first", body = [NoteView]),
        (status = 404, description = "Researcher not found", body = ErrorBody)
    )
)]
pub async fn list_notes(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<Json<Vec<NoteView>>> {
    Ok(Json(NoteService::new(state.db).list_for_researcher(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/researchers/{id}/notes",
    params(("id" = i32, Path, description = "Researcher ID")),
    request_body = NewNote,
    responses(
        (status = 201, description = "Note created", body = NoteView),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 404, description = "Researcher or project not found", body = ErrorBody)
    )
)]
pub async fn create_note(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<NewNote>,
) -> ApiResult<(StatusCode, Json<NoteView>)> {
    let note = NoteService::new(state.db).create(id, payload).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

#[utoipa::path(
    put,
    path = "/api/researchers/{id}/notes/{note_id}",
    params(
        ("id" = i32, Path, description = "Researcher ID"),
        ("note_id" = i32, Path, description = "Note ID")
    ),
    request_body = NoteUpdate,
    responses(
        (status = 200, description = "Note updated", body = NoteView),
        (status = 403, description = "Note belongs to another researcher", body = ErrorBody),
        (status = 404, description = "Researcher, note or project not found", body = ErrorBody)
    )
)]
pub async fn update_note(
    State(state): State<AppState>,
    ApiPath((id, note_id)): ApiPath<(i32, i32)>,
    ApiJson(payload): ApiJson<NoteUpdate>,
) -> ApiResult<Json<NoteView>> {
    Ok(Json(
        NoteService::new(state.db).update(id, note_id, payload).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/researchers/{id}/notes/{note_id}",
    params(
        ("id" = i32, Path, description = "Researcher ID"),
        ("note_id" = i32, Path, description = "Note ID")
    ),
    responses(
        (status = 200, description = "Note deleted", body = MessageResponse),
        (status = 403, description = "Note belongs to another researcher", body = ErrorBody),
        (status = 404, description = "Researcher or note not found", body = ErrorBody)
    )
)]
pub async fn delete_note(
    State(state): State<AppState>,
    ApiPath((id, note_id)): ApiPath<(i32, i32)>,
) -> ApiResult<Json<MessageResponse>> {
    NoteService::new(state.db).delete(id, note_id).await?;
    Ok(Json(MessageResponse::new(format!("Note {} deleted", note_id))))
}
