use anyhow::Context;
use rusqlite::Connection;
use std::path::Path;

pub const WORKBOOK_FILE: &str = "growthd.sqlite3";

pub fn open_workbook(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace).with_context(|| {
        format!(
            "failed to create workspace {}",
            workspace.to_string_lossy()
        )
    })?;
    let db_path = workspace.join(WORKBOOK_FILE);
    let conn = Connection::open(&db_path)
        .with_context(|| format!("failed to open workbook {}", db_path.to_string_lossy()))?;
    ensure_schema(&conn)?;
    Ok(conn)
}

pub fn ensure_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS worksheets(
            title TEXT PRIMARY KEY,
            header TEXT NOT NULL
        )",
        [],
    )?;

    // `position` is the 0-based data row index; the header is not stored as a row.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS worksheet_rows(
            id TEXT PRIMARY KEY,
            worksheet TEXT NOT NULL,
            position INTEGER NOT NULL,
            cells TEXT NOT NULL,
            FOREIGN KEY(worksheet) REFERENCES worksheets(title)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_worksheet_rows_position ON worksheet_rows(worksheet, position)",
        [],
    )?;
    Ok(())
}
