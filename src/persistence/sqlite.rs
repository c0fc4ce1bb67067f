use super::{PersistenceResult, TextStore};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use tracing::debug;

/// One named document inside a SQLite database.
///
/// Several stores can point at the same database file with different document names.
pub struct SqliteStore {
    connection: Mutex<Connection>,
    document: String,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P, document: impl Into<String>) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::with_connection(connection, document)
    }

    pub fn in_memory(document: impl Into<String>) -> PersistenceResult<Self> {
        Self::with_connection(Connection::open_in_memory()?, document)
    }

    fn with_connection(connection: Connection, document: impl Into<String>) -> PersistenceResult<Self> {
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
            document: document.into(),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            CREATE TABLE IF NOT EXISTS documents (
                name TEXT PRIMARY KEY,
                body TEXT NOT NULL
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn load(&self) -> PersistenceResult<Option<String>> {
        let conn = self.connection.lock();
        let mut stmt = conn.prepare("SELECT body FROM documents WHERE name = ?1")?;
        let body = stmt
            .query_row(params![self.document], |row| row.get::<_, String>(0))
            .optional()?;
        Ok(body)
    }
}

impl TextStore for SqliteStore {
    fn describe(&self) -> String {
        format!("sqlite document '{}'", self.document)
    }

    fn is_readable(&self) -> bool {
        match self.load() {
            Ok(body) => body.is_some(),
            Err(err) => {
                debug!(document = %self.document, error = %err, "sqlite lookup failed");
                false
            }
        }
    }

    fn is_writable(&self) -> bool {
        true
    }

    fn read_text(&self) -> PersistenceResult<String> {
        self.load()?
            .ok_or_else(|| super::PersistenceError::Access(format!("{} is empty", self.describe())))
    }

    fn write_text(&self, text: &str) -> PersistenceResult<()> {
        let conn = self.connection.lock();
        conn.execute(
            "INSERT INTO documents (name, body) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET body = excluded.body",
            params![self.document, text],
        )?;
        Ok(())
    }
}
