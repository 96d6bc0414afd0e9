use axum::{extract::State, response::Json};

use crate::server::app::AppState;
use crate::server::error::ApiResult;
use crate::server::extract::ApiJson;
use crate::services::ai_assistant_service::{
    AnalyzeNotesRequest, EmailDraft, ExternalGrant, ExternalGrantSearchRequest,
    GlobalSearchRequest, GrantEmailRequest, MatchResearchersRequest, NotesAnalysis,
    ResearcherMatches, SearchHit, SummarizeTextRequest, TextSummary,
};
use crate::services::AiAssistantService;

fn assistant(state: &AppState) -> AiAssistantService {
    AiAssistantService::new(state.db.clone(), state.ai.clone())
}

#[utoipa::path(
    post,
    path = "/api/ai/summarize-text",
    request_body = SummarizeTextRequest,
    responses(
        (status = 200, description = "Summary of the text", body = TextSummary),
        (status = 400, description = "Missing or empty text", body = ErrorBody),
        (status = 502, description = "AI collaborator failure", body = ErrorBody)
    )
)]
pub async fn summarize_text(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SummarizeTextRequest>,
) -> ApiResult<Json<TextSummary>> {
    Ok(Json(assistant(&state).summarize_text(payload).await?))
}

#[utoipa::path(
    post,
    path = "/api/ai/analyze-notes",
    request_body = AnalyzeNotesRequest,
    responses(
        (status = 200, description = "Sentiment, themes and summary", body = NotesAnalysis),
        (status = 400, description = "Missing or empty notesText", body = ErrorBody),
        (status = 502, description = "AI collaborator failure", body = ErrorBody)
    )
)]
pub async fn analyze_notes(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<AnalyzeNotesRequest>,
) -> ApiResult<Json<NotesAnalysis>> {
    Ok(Json(assistant(&state).analyze_notes(payload).await?))
}

#[utoipa::path(
    post,
    path = "/api/ai/global-search",
    request_body = GlobalSearchRequest,
    responses(
        (status = 200, description = "Records relevant to the query", body = [SearchHit]),
        (status = 400, description = "Missing or empty query", body = ErrorBody),
        (status = 502, description = "AI collaborator failure", body = ErrorBody)
    )
)]
pub async fn global_search(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<GlobalSearchRequest>,
) -> ApiResult<Json<Vec<SearchHit>>> {
    Ok(Json(assistant(&state).global_search(payload).await?))
}

#[utoipa::path(
    post,
    path = "/api/ai/search-external-grants",
    request_body = ExternalGrantSearchRequest,
    responses(
        (status = 200, description = "Suggested funding opportunities", body = [ExternalGrant]),
        (status = 400, description = "Neither keywords nor focusArea given", body = ErrorBody),
        (status = 502, description = "AI collaborator failure", body = ErrorBody)
    )
)]
pub async fn search_external_grants(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ExternalGrantSearchRequest>,
) -> ApiResult<Json<Vec<ExternalGrant>>> {
    Ok(Json(assistant(&state).search_external_grants(payload).await?))
}

#[utoipa::path(
    post,
    path = "/api/ai/match-researchers",
    request_body = MatchResearchersRequest,
    responses(
        (status = 200, description = "Researchers suited to the grant", body = ResearcherMatches),
        (status = 400, description = "Missing or empty grantDescription", body = ErrorBody),
        (status = 502, description = "AI collaborator failure", body = ErrorBody)
    )
)]
pub async fn match_researchers(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<MatchResearchersRequest>,
) -> ApiResult<Json<ResearcherMatches>> {
    Ok(Json(assistant(&state).match_researchers(payload).await?))
}

#[utoipa::path(
    post,
    path = "/api/ai/generate-grant-email",
    request_body = GrantEmailRequest,
    responses(
        (status = 200, description = "Draft email to the principal investigator", body = EmailDraft),
        (status = 400, description = "Missing grant details or piId", body = ErrorBody),
        (status = 404, description = "Principal investigator not found", body = ErrorBody),
        (status = 502, description = "AI collaborator failure", body = ErrorBody)
    )
)]
pub async fn generate_grant_email(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<GrantEmailRequest>,
) -> ApiResult<Json<EmailDraft>> {
    Ok(Json(assistant(&state).generate_grant_email(payload).await?))
}
