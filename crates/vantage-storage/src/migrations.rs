//! Schema migrations, tracked with SQLite's `user_version` pragma

use crate::Result;
use rusqlite::Connection;

type Migration = fn(&Connection) -> Result<()>;

/// Applied in order; the schema version is the number applied so far
const MIGRATIONS: &[(&str, Migration)] = &[("key-value storage", create_storage_table)];

pub fn run_migrations(conn: &Connection) -> Result<()> {
    let applied: usize = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    for (version, (label, migrate)) in MIGRATIONS.iter().enumerate().skip(applied) {
        let version = version + 1;
        tracing::info!(version, migration = *label, "Running storage migration");
        migrate(conn)?;
        conn.pragma_update(None, "user_version", version)?;
    }

    Ok(())
}

fn create_storage_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS storage (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
    "#,
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_version(conn: &Connection) -> usize {
        conn.query_row("PRAGMA user_version", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_migrations_are_applied_once() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(user_version(&conn), MIGRATIONS.len());

        conn.execute(
            "INSERT INTO storage (key, value, updated_at) VALUES ('token', 'abc', 'now')",
            [],
        )
        .unwrap();
        run_migrations(&conn).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM storage", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
