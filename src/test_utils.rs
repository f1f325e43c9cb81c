use crate::db::Database;
use anyhow::Result;
use std::path::PathBuf;
use tempfile::TempDir;

/// Test utilities for setting up isolated test environments
pub struct TestContext {
    pub temp_dir: TempDir,
    pub db_path: PathBuf,
    pub database: Database,
}

impl TestContext {
    /// Create a new isolated test context with a temporary database
    pub fn new() -> Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let db_path = temp_dir.path().join("timebill-test.db");

        // Opening the database runs migrations
        let database = Database::new(&db_path)?;

        Ok(Self {
            temp_dir,
            db_path,
            database,
        })
    }

    /// Get the database connection
    pub fn connection(&self) -> &rusqlite::Connection {
        &self.database.connection
    }
}

/// Helper for testing database operations
pub fn with_test_db<F>(test_fn: F)
where
    F: FnOnce(&TestContext) -> Result<()>,
{
    let ctx = TestContext::new().expect("Failed to create test context");
    test_fn(&ctx).expect("Test function failed");
}

/// Helper for async tests with database
pub async fn with_test_db_async<F, Fut>(test_fn: F)
where
    F: FnOnce(TestContext) -> Fut,
    Fut: std::future::Future<Output = Result<()>>,
{
    let ctx = TestContext::new().expect("Failed to create test context");
    test_fn(ctx).await.expect("Async test function failed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_creation() {
        let ctx = TestContext::new().unwrap();
        assert!(ctx.db_path.exists());
        assert!(ctx.temp_dir.path().exists());
    }

    #[test]
    fn test_contexts_are_isolated() {
        let a = TestContext::new().unwrap();
        let b = TestContext::new().unwrap();
        assert_ne!(a.db_path, b.db_path);
    }

    #[test]
    fn test_with_test_db() {
        with_test_db(|ctx| {
            let count: i64 = ctx.connection().query_row(
                "SELECT COUNT(*) FROM clients",
                [],
                |row| row.get(0),
            )?;
            assert_eq!(count, 0);
            Ok(())
        });
    }

    #[tokio::test]
    async fn test_with_test_db_async() {
        with_test_db_async(|ctx| async move {
            assert!(ctx.database.get_schema_version()?.is_some());
            Ok(())
        })
        .await;
    }
}
