pub mod unit_tests;

use crate::config::AppConfig;
use crate::database::Database;
use crate::Result;

/// Test helper to create a test database connection
#[allow(dead_code)]
pub async fn create_test_database() -> Result<Database> {
    let config = AppConfig::load()?;
    let database = Database::from_config(&config).await?;
    Ok(database)
}
