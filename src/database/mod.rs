//! Database connection setup and the transactional operations the core
//! depends on (§4.7 match recording, §4.9 rank recomputation).

use log::info;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use std::path::Path;
use tokio::fs::{create_dir_all, File};

use crate::errors::ServerError;

pub mod entities;
pub mod interface;
pub mod migration;

pub type DbResult<T> = Result<T, sea_orm::DbErr>;

pub async fn connect(database_file: &str) -> Result<DatabaseConnection, ServerError> {
    info!("Connecting to database..");

    let file_path = Path::new(database_file);
    if let Some(parent) = file_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            create_dir_all(parent).await?;
        }
    }

    if !file_path.exists() {
        File::create(file_path).await?;
    }

    let connection_string = format!("sqlite:{database_file}");
    let connection = sea_orm::Database::connect(&connection_string).await?;

    info!("Connected to database: {connection_string}");
    info!("Running migrations...");

    migration::Migrator::up(&connection, None).await?;

    info!("Migrations complete.");

    Ok(connection)
}
