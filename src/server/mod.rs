pub mod app;
pub mod error;
pub mod extract;
pub mod handlers;

use clap::Subcommand;

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum MigrateDirection {
    Up,
    Down,
    Fresh,
}

use crate::ai::build_generator;
use crate::common::write_string_to_file;
use crate::config::AiConfig;
use crate::database::{connection::*, migrations::Migrator};
use crate::services::{ExportService, ImportService};
use anyhow::Result;
use sea_orm_migration::prelude::*;
use tracing::info;

pub async fn start_server(port: u16, database_path: &str, cors_origin: Option<&str>) -> Result<()> {
    let database_url = get_database_url(Some(database_path));
    let db = establish_connection(&database_url).await?;

    Migrator::up(&db, None).await?;
    info!("Database migrations completed");

    let ai = build_generator(&AiConfig::from_env());
    let app = app::create_app(app::AppState::new(db, ai), cors_origin)?;

    log_routes();

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Server running on http://0.0.0.0:{}", port);

    axum::serve(listener, app).await?;

    Ok(())
}

fn log_routes() {
    info!("API Endpoints:");
    info!("  /health                     - Health check");
    info!("  /api/openapi.json           - OpenAPI document");
    info!("  /api/researchers            - Researchers and their notes");
    info!("  /api/labs                   - Labs");
    info!("  /api/projects               - Projects");
    info!("  /api/compute-resources      - Compute resources");
    info!("  /api/grants                 - Grants");
    info!("  /api/data/export            - Full snapshot download (GET)");
    info!("  /api/data/import            - Full snapshot restore (POST)");
    info!("  /api/ai/*                   - AI assistance");
}

pub async fn migrate_database(database_path: &str, direction: MigrateDirection) -> Result<()> {
    let database_url = get_database_url(Some(database_path));
    let db = establish_connection(&database_url).await?;

    match direction {
        MigrateDirection::Up => {
            info!("Running migrations up");
            Migrator::up(&db, None).await?;
        }
        MigrateDirection::Down => {
            info!("Running migrations down");
            Migrator::down(&db, None).await?;
        }
        MigrateDirection::Fresh => {
            info!("Running fresh migrations (down then up)");
            Migrator::down(&db, None).await?;
            Migrator::up(&db, None).await?;
        }
    }

    info!("Database migration completed");
    Ok(())
}

pub async fn export_database(database_path: &str, output: &str) -> Result<()> {
    let db = setup_database(database_path).await?;
    let json = ExportService::new(db).export_json().await?;
    write_string_to_file(output, &json)?;
    info!("Snapshot written to {}", output);
    Ok(())
}

pub async fn import_database(database_path: &str, input: &str) -> Result<()> {
    let db = setup_database(database_path).await?;
    let json = std::fs::read_to_string(input)?;
    let summary = ImportService::new(db).import_json(&json).await?;
    info!("{} from {}", summary.message, input);
    Ok(())
}
