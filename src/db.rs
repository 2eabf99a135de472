use std::path::{Path, PathBuf};

use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::Result;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT UNIQUE NOT NULL,
    email TEXT UNIQUE NOT NULL,
    password_hash TEXT NOT NULL,
    full_name TEXT NOT NULL,
    phone TEXT,
    created_at TEXT DEFAULT CURRENT_TIMESTAMP,
    active INTEGER DEFAULT 1,
    trial_start_date TEXT DEFAULT CURRENT_TIMESTAMP,
    trial_end_date TEXT,
    subscription_plan TEXT DEFAULT 'trial',
    subscription_status TEXT DEFAULT 'trial',
    subscription_end_date TEXT
);

CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    account_type TEXT NOT NULL,
    amount REAL DEFAULT 0,
    due_date TEXT,
    status TEXT DEFAULT 'pending',
    created_at TEXT DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    description TEXT NOT NULL,
    amount REAL NOT NULL,
    transaction_type TEXT NOT NULL,
    category TEXT,
    date TEXT NOT NULL,
    created_at TEXT DEFAULT CURRENT_TIMESTAMP,
    is_recurring INTEGER DEFAULT 0,
    recurrence_type TEXT,
    account_id INTEGER,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (account_id) REFERENCES accounts(id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS financial_goals (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    title TEXT NOT NULL,
    target_amount REAL NOT NULL,
    current_amount REAL DEFAULT 0,
    target_date TEXT,
    created_at TEXT DEFAULT CURRENT_TIMESTAMP,
    is_completed INTEGER DEFAULT 0,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_transactions_user_date ON transactions(user_id, date);
CREATE INDEX IF NOT EXISTS idx_accounts_user ON accounts(user_id);
CREATE INDEX IF NOT EXISTS idx_goals_user ON financial_goals(user_id);
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// Connection factory. Holds only the database path; every record operation
/// opens its own connection and drops it when the statement completes.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    /// Open (creating if needed) the database at `path` and ensure the schema exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let db = Self { path: path.into() };
        let conn = db.connect()?;
        init_db(&conn)?;
        info!(path = %db.path.display(), "database initialized");
        Ok(db)
    }

    pub fn connect(&self) -> Result<Connection> {
        debug!(path = %self.path.display(), "opening connection");
        get_connection(&self.path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
pub(crate) fn test_db() -> (tempfile::TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("test.db")).unwrap();
    (dir, db)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_db_creates_tables() {
        let (_dir, db) = test_db();
        let conn = db.connect().unwrap();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        for expected in &["users", "transactions", "accounts", "financial_goals"] {
            assert!(tables.contains(&expected.to_string()), "missing table: {expected}");
        }
    }

    #[test]
    fn test_init_db_is_idempotent() {
        let (_dir, db) = test_db();
        let conn = db.connect().unwrap();
        init_db(&conn).unwrap();
        Database::open(db.path()).unwrap();
    }

    #[test]
    fn test_foreign_keys_enabled_per_connection() {
        let (_dir, db) = test_db();
        let conn = db.connect().unwrap();
        let enabled: i64 = conn.query_row("PRAGMA foreign_keys", [], |r| r.get(0)).unwrap();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn test_children_cascade_with_user() {
        let (_dir, db) = test_db();
        let conn = db.connect().unwrap();
        conn.execute(
            "INSERT INTO users (username, email, password_hash, full_name) VALUES ('ana', 'ana@x.com', 'h', 'Ana')",
            [],
        ).unwrap();
        let uid = conn.last_insert_rowid();
        conn.execute(
            "INSERT INTO accounts (user_id, name, account_type, amount) VALUES (?1, 'Rent', 'payable', 900.0)",
            [uid],
        ).unwrap();
        conn.execute(
            "INSERT INTO transactions (user_id, description, amount, transaction_type, date) \
             VALUES (?1, 'Sale', 100.0, 'income', '2025-01-15')",
            [uid],
        ).unwrap();
        conn.execute(
            "INSERT INTO financial_goals (user_id, title, target_amount) VALUES (?1, 'Van', 5000.0)",
            [uid],
        ).unwrap();

        conn.execute("DELETE FROM users WHERE id = ?1", [uid]).unwrap();

        for table in &["accounts", "transactions", "financial_goals"] {
            let count: i64 = conn
                .query_row(&format!("SELECT count(*) FROM {table}"), [], |r| r.get(0))
                .unwrap();
            assert_eq!(count, 0, "{table} rows survived user deletion");
        }
    }

    #[test]
    fn test_each_connect_is_independent() {
        let (_dir, db) = test_db();
        let a = db.connect().unwrap();
        a.execute(
            "INSERT INTO users (username, email, password_hash, full_name) VALUES ('bia', 'bia@x.com', 'h', 'Bia')",
            [],
        ).unwrap();
        drop(a);
        let b = db.connect().unwrap();
        let count: i64 = b.query_row("SELECT count(*) FROM users", [], |r| r.get(0)).unwrap();
        assert_eq!(count, 1);
    }
}
