//! Database Connection and Setup
//!
//! Manages the SQLite connection and schema migrations.

use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Database state wrapper
#[derive(Clone)]
pub struct DbState {
    pub conn: Arc<Mutex<Option<Connection>>>,
    pub db_path: PathBuf,
}

impl DbState {
    pub fn new(db_path: PathBuf) -> Self {
        Self {
            conn: Arc::new(Mutex::new(None)),
            db_path,
        }
    }

    /// Shared handle to the connection slot
    pub fn connection(&self) -> Arc<Mutex<Option<Connection>>> {
        self.conn.clone()
    }

    pub async fn is_initialized(&self) -> bool {
        self.conn.lock().await.is_some()
    }

    /// Drop the connection; later store calls fail with "Database not initialized"
    pub async fn close(&self) {
        let mut guard = self.conn.lock().await;
        *guard = None;
    }
}

/// Open the database at `db_path` (":memory:" for a private in-memory database)
pub async fn init_db(db_path: &PathBuf) -> Result<DbState, String> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {}", parent.display(), e))?;
        }
    }

    let conn = Connection::open(db_path).map_err(|e| format!("Failed to open db: {}", e))?;
    conn.busy_timeout(Duration::from_secs(5))
        .map_err(|e| format!("Failed to set busy timeout: {}", e))?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(|e| format!("Failed to enable foreign keys: {}", e))?;

    run_migrations(&conn)?;

    let state = DbState::new(db_path.clone());
    *state.conn.lock().await = Some(conn);

    log::info!("Database ready at {}", db_path.display());
    Ok(state)
}

/// Check if a column exists in a table
fn column_exists(conn: &Connection, table: &str, column: &str) -> bool {
    let query = format!("PRAGMA table_info({})", table);
    let Ok(mut stmt) = conn.prepare(&query) else {
        return false;
    };
    let Ok(mut rows) = stmt.query([]) else {
        return false;
    };
    while let Ok(Some(row)) = rows.next() {
        if let Ok(name) = row.get::<_, String>(1) {
            if name == column {
                return true;
            }
        }
    }
    false
}

/// Run database migrations
fn run_migrations(conn: &Connection) -> Result<(), String> {
    // One row per (user, item)
    conn.execute(
        "CREATE TABLE IF NOT EXISTS checklist_items (
            user_id INTEGER NOT NULL,
            item_id INTEGER NOT NULL,
            quantity_needed INTEGER NOT NULL CHECK (quantity_needed >= 0),
            quantity_acquired INTEGER NOT NULL DEFAULT 0
                CHECK (quantity_acquired >= 0 AND quantity_acquired <= quantity_needed),
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            PRIMARY KEY (user_id, item_id)
        )",
        [],
    )
    .map_err(|e| e.to_string())?;

    // Provenance: one row per design contributing to a checklist row
    conn.execute(
        "CREATE TABLE IF NOT EXISTS checklist_contributions (
            user_id INTEGER NOT NULL,
            item_id INTEGER NOT NULL,
            design_id INTEGER NOT NULL,
            quantity INTEGER NOT NULL CHECK (quantity > 0),
            added_at INTEGER NOT NULL,
            PRIMARY KEY (user_id, item_id, design_id),
            FOREIGN KEY (user_id, item_id)
                REFERENCES checklist_items(user_id, item_id) ON DELETE CASCADE
        )",
        [],
    )
    .map_err(|e| e.to_string())?;

    // Databases created before contribution order was stored
    if !column_exists(conn, "checklist_contributions", "ordinal") {
        conn.execute(
            "ALTER TABLE checklist_contributions ADD COLUMN ordinal INTEGER NOT NULL DEFAULT 0",
            [],
        )
        .map_err(|e| format!("Failed to add ordinal: {}", e))?;
    }

    // isDesignInList and removeDesign look rows up by design
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_contributions_design
            ON checklist_contributions(user_id, design_id)",
        [],
    )
    .map_err(|e| e.to_string())?;

    Ok(())
}
