use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Json},
};

use crate::server::app::AppState;
use crate::server::error::ApiResult;
use crate::server::extract::ApiJson;
use crate::services::export_service::EXPORT_FILENAME;
use crate::services::snapshot::{ImportSummary, Snapshot};
use crate::services::{ExportService, ImportService};

#[utoipa::path(
    get,
    path = "/api/data/export",
    responses(
        (status = 200, description = "Full snapshot of the store as a downloadable JSON file", body = Snapshot)
    )
)]
pub async fn export_data(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let snapshot = ExportService::new(state.db).export().await?;
    let disposition = format!("attachment; filename={}", EXPORT_FILENAME);
    Ok(([(header::CONTENT_DISPOSITION, disposition)], Json(snapshot)))
}

#[utoipa::path(
    post,
    path = "/api/data/import",
    request_body = Snapshot,
    responses(
        (status = 200, description = "Store replaced by the snapshot", body = ImportSummary),
        (status = 400, description = "Malformed snapshot or dangling reference; nothing was changed", body = ErrorBody)
    )
)]
pub async fn import_data(
    State(state): State<AppState>,
    ApiJson(snapshot): ApiJson<Snapshot>,
) -> ApiResult<Json<ImportSummary>> {
    let summary = ImportService::new(state.db).import(&snapshot).await?;
    Ok(Json(summary))
}
