use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

pub const DB_FILE_NAME: &str = "gradeplanner.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE_NAME);
    let conn = Connection::open(db_path)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv(
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )?;
    ensure_kv_updated_at(&conn)?;

    Ok(conn)
}

pub fn kv_get(conn: &Connection, key: &str) -> anyhow::Result<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM kv WHERE key = ?", [key], |r| r.get(0))
        .optional()?;
    Ok(value)
}

pub fn kv_set(conn: &Connection, key: &str, value: &str) -> anyhow::Result<()> {
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO kv(key, value, updated_at) VALUES(?, ?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        (key, value, &now),
    )?;
    Ok(())
}

// Workspaces created before timestamps were tracked lack the column.
fn ensure_kv_updated_at(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "kv", "updated_at")? {
        return Ok(());
    }
    conn.execute("ALTER TABLE kv ADD COLUMN updated_at TEXT", [])?;
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(prefix: &str) -> PathBuf {
        let p = std::env::temp_dir().join(format!(
            "{}-{}",
            prefix,
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("clock")
                .as_nanos()
        ));
        std::fs::create_dir_all(&p).expect("create temp dir");
        p
    }

    #[test]
    fn kv_set_overwrites_and_survives_reopen() {
        let ws = temp_dir("gradeplanner-db-kv");
        {
            let conn = open_db(&ws).expect("open");
            assert_eq!(kv_get(&conn, "k").expect("get"), None);
            kv_set(&conn, "k", "one").expect("set");
            kv_set(&conn, "k", "two").expect("set");
        }
        let conn = open_db(&ws).expect("reopen");
        assert_eq!(kv_get(&conn, "k").expect("get"), Some("two".to_string()));
    }

    #[test]
    fn old_kv_table_gains_updated_at() {
        let ws = temp_dir("gradeplanner-db-migrate");
        {
            let conn = Connection::open(ws.join(DB_FILE_NAME)).expect("open raw");
            conn.execute(
                "CREATE TABLE kv(key TEXT PRIMARY KEY, value TEXT NOT NULL)",
                [],
            )
            .expect("create");
            conn.execute("INSERT INTO kv(key, value) VALUES('a', 'b')", [])
                .expect("insert");
        }
        let conn = open_db(&ws).expect("open");
        assert!(table_has_column(&conn, "kv", "updated_at").expect("pragma"));
        assert_eq!(kv_get(&conn, "a").expect("get"), Some("b".to_string()));
    }
}
