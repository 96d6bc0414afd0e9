use sea_orm::{DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;

use super::connection::establish_connection;
use super::migrations::Migrator;

/// In-memory SQLite database with the full schema applied.
pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    let db = establish_connection("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}
