use std::sync::Arc;

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Json, Router,
};
use sea_orm::DatabaseConnection;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use super::handlers::{ai, compute_resources, data, grants, health, labs, projects, researchers};
use crate::ai::TextGenerator;
use crate::errors::CoreError;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub ai: Arc<dyn TextGenerator>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, ai: Arc<dyn TextGenerator>) -> Self {
        Self { db, ai }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(title = "research-admin", description = "Research administration records API"),
    paths(
        health::health_check,
        researchers::list_researchers,
        researchers::create_researcher,
        researchers::get_researcher,
        researchers::update_researcher,
        researchers::delete_researcher,
        researchers::list_notes,
        researchers::create_note,
        researchers::update_note,
        researchers::delete_note,
        labs::list_labs,
        labs::create_lab,
        labs::get_lab,
        labs::update_lab,
        labs::delete_lab,
        projects::list_projects,
        projects::create_project,
        projects::get_project,
        projects::update_project,
        projects::delete_project,
        compute_resources::list_compute_resources,
        compute_resources::create_compute_resource,
        compute_resources::get_compute_resource,
        compute_resources::update_compute_resource,
        compute_resources::delete_compute_resource,
        grants::list_grants,
        grants::create_grant,
        grants::get_grant,
        grants::update_grant,
        grants::delete_grant,
        data::export_data,
        data::import_data,
        ai::summarize_text,
        ai::analyze_notes,
        ai::global_search,
        ai::search_external_grants,
        ai::match_researchers,
        ai::generate_grant_email,
    ),
    components(schemas(
        crate::server::error::ErrorBody,
        crate::server::handlers::MessageResponse,
        crate::services::views::ResearcherRef,
        crate::services::views::LabRef,
        crate::services::views::ProjectRef,
        crate::services::views::ComputeResourceRef,
        crate::services::views::GrantRef,
        crate::services::views::NoteView,
        crate::services::views::ResearcherView,
        crate::services::views::LabView,
        crate::services::views::ProjectView,
        crate::services::views::ComputeResourceView,
        crate::services::views::GrantView,
        crate::services::pagination::ResearcherPage,
        crate::services::pagination::LabPage,
        crate::services::pagination::ProjectPage,
        crate::services::pagination::ComputeResourcePage,
        crate::services::pagination::GrantPage,
        crate::services::researcher_service::NewResearcher,
        crate::services::researcher_service::ResearcherUpdate,
        crate::services::researcher_service::ResearcherDetail,
        crate::services::lab_service::NewLab,
        crate::services::lab_service::LabUpdate,
        crate::services::lab_service::LabDetail,
        crate::services::project_service::NewProject,
        crate::services::project_service::ProjectUpdate,
        crate::services::project_service::ProjectDetail,
        crate::services::compute_resource_service::NewComputeResource,
        crate::services::compute_resource_service::ComputeResourceUpdate,
        crate::services::compute_resource_service::ComputeResourceDetail,
        crate::services::grant_service::NewGrant,
        crate::services::grant_service::GrantUpdate,
        crate::services::grant_service::GrantDetail,
        crate::services::note_service::NewNote,
        crate::services::note_service::NoteUpdate,
        crate::services::snapshot::Snapshot,
        crate::services::snapshot::ResearcherRecord,
        crate::services::snapshot::NoteRecord,
        crate::services::snapshot::LabRecord,
        crate::services::snapshot::ProjectRecord,
        crate::services::snapshot::ComputeResourceRecord,
        crate::services::snapshot::GrantRecord,
        crate::services::snapshot::ExternalId,
        crate::services::snapshot::ImportCounts,
        crate::services::snapshot::ImportSummary,
        crate::services::ai_assistant_service::SummarizeTextRequest,
        crate::services::ai_assistant_service::TextSummary,
        crate::services::ai_assistant_service::AnalyzeNotesRequest,
        crate::services::ai_assistant_service::NotesAnalysis,
        crate::services::ai_assistant_service::GlobalSearchRequest,
        crate::services::ai_assistant_service::SearchHit,
        crate::services::ai_assistant_service::GrantSearchCriteria,
        crate::services::ai_assistant_service::ExternalGrantSearchRequest,
        crate::services::ai_assistant_service::ExternalGrant,
        crate::services::ai_assistant_service::MatchResearchersRequest,
        crate::services::ai_assistant_service::ResearcherMatch,
        crate::services::ai_assistant_service::ResearcherMatches,
        crate::services::ai_assistant_service::EmailGrantDetails,
        crate::services::ai_assistant_service::GrantEmailRequest,
        crate::services::ai_assistant_service::EmailDraft,
    ))
)]
pub struct ApiDoc;

fn cors_layer(cors_origin: Option<&str>) -> Result<CorsLayer, CoreError> {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match cors_origin {
        Some(origin) => {
            let origin = origin.parse::<HeaderValue>().map_err(|e| {
                CoreError::invalid_field("cors_origin", format!("Invalid CORS origin '{}': {}", origin, e))
            })?;
            Ok(layer.allow_origin(origin))
        }
        None => Ok(layer.allow_origin(Any)),
    }
}

pub fn create_app(state: AppState, cors_origin: Option<&str>) -> Result<Router, CoreError> {
    let cors = cors_layer(cors_origin)?;

    let app = Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state);

    Ok(app)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/openapi.json", get(openapi_json))
        .route(
            "/researchers",
            get(researchers::list_researchers).post(researchers::create_researcher),
        )
        .route(
            "/researchers/:id",
            get(researchers::get_researcher)
                .put(researchers::update_researcher)
                .delete(researchers::delete_researcher),
        )
        .route(
            "/researchers/:id/notes",
            get(researchers::list_notes).post(researchers::create_note),
        )
        .route(
            "/researchers/:id/notes/:note_id",
            axum::routing::put(researchers::update_note).delete(researchers::delete_note),
        )
        .route("/labs", get(labs::list_labs).post(labs::create_lab))
        .route(
            "/labs/:id",
            get(labs::get_lab).put(labs::update_lab).delete(labs::delete_lab),
        )
        .route(
            "/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route(
            "/projects/:id",
            get(projects::get_project)
                .put(projects::update_project)
                .delete(projects::delete_project),
        )
        .route(
            "/compute-resources",
            get(compute_resources::list_compute_resources)
                .post(compute_resources::create_compute_resource),
        )
        .route(
            "/compute-resources/:id",
            get(compute_resources::get_compute_resource)
                .put(compute_resources::update_compute_resource)
                .delete(compute_resources::delete_compute_resource),
        )
        .route("/grants", get(grants::list_grants).post(grants::create_grant))
        .route(
            "/grants/:id",
            get(grants::get_grant)
                .put(grants::update_grant)
                .delete(grants::delete_grant),
        )
        .route("/data/export", get(data::export_data))
        .route("/data/import", post(data::import_data))
        .route("/ai/summarize-text", post(ai::summarize_text))
        .route("/ai/analyze-notes", post(ai::analyze_notes))
        .route("/ai/global-search", post(ai::global_search))
        .route("/ai/search-external-grants", post(ai::search_external_grants))
        .route("/ai/match-researchers", post(ai::match_researchers))
        .route("/ai/generate-grant-email", post(ai::generate_grant_email))
}
