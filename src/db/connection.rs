use anyhow::Result;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;

pub struct Database {
    pub connection: Connection,
}

impl Database {
    pub fn new(db_path: &Path) -> Result<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let connection = Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        // Enable foreign key constraints (invoice cascades rely on them)
        connection.pragma_update(None, "foreign_keys", "ON")?;

        // Set WAL mode for better concurrent access
        connection.pragma_update(None, "journal_mode", "WAL")?;

        // Set synchronous to NORMAL for better performance
        connection.pragma_update(None, "synchronous", "NORMAL")?;

        connection.pragma_update(None, "cache_size", "-64000")?;

        let db = Self { connection };

        // Run migrations automatically
        crate::db::migrations::run_migrations(&db.connection)?;

        Ok(db)
    }

    pub fn in_memory() -> Result<Self> {
        let connection = Connection::open_in_memory()?;
        connection.pragma_update(None, "foreign_keys", "ON")?;
        crate::db::migrations::run_migrations(&connection)?;
        Ok(Self { connection })
    }

    pub fn backup_to(&self, backup_path: &Path) -> Result<()> {
        let mut backup_conn = Connection::open(backup_path)?;
        let backup = rusqlite::backup::Backup::new(&self.connection, &mut backup_conn)?;
        backup.run_to_completion(5, std::time::Duration::from_millis(250), None)?;
        Ok(())
    }

    pub fn get_schema_version(&self) -> Result<Option<i32>> {
        use rusqlite::OptionalExtension;

        let mut stmt = self
            .connection
            .prepare("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")?;

        let version = stmt.query_row([], |row| row.get::<_, i32>(0)).optional()?;

        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_database_is_migrated() {
        let db = Database::in_memory().unwrap();
        assert_eq!(db.get_schema_version().unwrap(), Some(1));
    }

    #[test]
    fn backup_copies_data() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(&dir.path().join("live.db")).unwrap();
        db.connection
            .execute(
                "INSERT INTO clients (name, default_rate) VALUES ('Acme', 100.0)",
                [],
            )
            .unwrap();

        let backup_path = dir.path().join("backup.db");
        db.backup_to(&backup_path).unwrap();

        let restored = Connection::open(&backup_path).unwrap();
        let count: i64 = restored
            .query_row("SELECT COUNT(*) FROM clients", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
