//! Worksheet backends.
//!
//! A worksheet is a header row plus data rows addressed by 1-based
//! position, where position 1 is the header. This mirrors how the
//! spreadsheet the dashboard was built around numbers its rows, so
//! callers compute `data_index + 2` to address a data row.

use crate::error::StoreError;
use crate::record::RowMap;
use rusqlite::{Connection, OptionalExtension};
use serde_json::Value;
use uuid::Uuid;

pub trait Worksheet {
    fn title(&self) -> &str;

    fn header(&self) -> &[String];

    /// Data rows in positional order, keyed by header name.
    fn list_all(&self) -> Result<Vec<RowMap>, StoreError>;

    /// Appends one row. `values` must line up with the header.
    fn append_row(&mut self, values: Vec<Value>) -> Result<(), StoreError>;

    /// Removes the row at `index` (1-based, header is row 1). Later rows shift up.
    fn delete_row(&mut self, index: usize) -> Result<(), StoreError>;
}

fn to_row_map(header: &[String], cells: Vec<Value>) -> RowMap {
    let mut cells = cells.into_iter();
    header
        .iter()
        .map(|h| (h.clone(), cells.next().unwrap_or_else(|| Value::String(String::new()))))
        .collect()
}

fn check_shape(header: &[String], values: &[Value]) -> Result<(), StoreError> {
    if values.len() != header.len() {
        return Err(StoreError::Shape {
            expected: header.len(),
            actual: values.len(),
        });
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct MemoryWorksheet {
    title: String,
    header: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl MemoryWorksheet {
    pub fn new(title: &str, header: &[&str]) -> Self {
        Self {
            title: title.to_string(),
            header: header.iter().map(|s| s.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Raw cells, for inspecting exactly what was written.
    #[cfg(test)]
    pub fn raw_rows(&self) -> &[Vec<Value>] {
        &self.rows
    }
}

impl Worksheet for MemoryWorksheet {
    fn title(&self) -> &str {
        &self.title
    }

    fn header(&self) -> &[String] {
        &self.header
    }

    fn list_all(&self) -> Result<Vec<RowMap>, StoreError> {
        Ok(self
            .rows
            .iter()
            .map(|cells| to_row_map(&self.header, cells.clone()))
            .collect())
    }

    fn append_row(&mut self, values: Vec<Value>) -> Result<(), StoreError> {
        check_shape(&self.header, &values)?;
        self.rows.push(values);
        Ok(())
    }

    fn delete_row(&mut self, index: usize) -> Result<(), StoreError> {
        if index < 2 || index - 2 >= self.rows.len() {
            return Err(StoreError::RowOutOfRange {
                index,
                rows: self.rows.len() + 1,
            });
        }
        self.rows.remove(index - 2);
        Ok(())
    }
}

/// Worksheet persisted in a workbook opened by `db::open_workbook`.
pub struct SqliteWorksheet {
    conn: Connection,
    title: String,
    header: Vec<String>,
}

impl SqliteWorksheet {
    /// Opens `title`, creating it with `header` if the workbook has no such
    /// worksheet. An existing worksheet keeps the header it was created with.
    pub fn open(conn: Connection, title: &str, header: &[&str]) -> Result<Self, StoreError> {
        let stored: Option<String> = conn
            .query_row(
                "SELECT header FROM worksheets WHERE title = ?",
                [title],
                |r| r.get(0),
            )
            .optional()?;
        let header: Vec<String> = match stored {
            Some(json_text) => serde_json::from_str(&json_text)?,
            None => {
                let header: Vec<String> = header.iter().map(|s| s.to_string()).collect();
                conn.execute(
                    "INSERT INTO worksheets(title, header) VALUES(?, ?)",
                    (title, serde_json::to_string(&header)?),
                )?;
                header
            }
        };
        Ok(Self {
            conn,
            title: title.to_string(),
            header,
        })
    }

    fn row_count(&self) -> Result<usize, StoreError> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM worksheet_rows WHERE worksheet = ?",
            [&self.title],
            |r| r.get(0),
        )?;
        Ok(n as usize)
    }
}

impl Worksheet for SqliteWorksheet {
    fn title(&self) -> &str {
        &self.title
    }

    fn header(&self) -> &[String] {
        &self.header
    }

    fn list_all(&self) -> Result<Vec<RowMap>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT cells FROM worksheet_rows WHERE worksheet = ? ORDER BY position",
        )?;
        let raw = stmt
            .query_map([&self.title], |r| r.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        raw.iter()
            .map(|text| -> Result<RowMap, StoreError> {
                let cells: Vec<Value> = serde_json::from_str(text)?;
                Ok(to_row_map(&self.header, cells))
            })
            .collect()
    }

    fn append_row(&mut self, values: Vec<Value>) -> Result<(), StoreError> {
        check_shape(&self.header, &values)?;
        let cells = serde_json::to_string(&values)?;
        self.conn.execute(
            "INSERT INTO worksheet_rows(id, worksheet, position, cells)
             VALUES(?, ?, (SELECT COALESCE(MAX(position), -1) + 1 FROM worksheet_rows WHERE worksheet = ?), ?)",
            (
                Uuid::new_v4().to_string(),
                &self.title,
                &self.title,
                cells,
            ),
        )?;
        Ok(())
    }

    fn delete_row(&mut self, index: usize) -> Result<(), StoreError> {
        let rows = self.row_count()?;
        if index < 2 || index - 2 >= rows {
            return Err(StoreError::RowOutOfRange {
                index,
                rows: rows + 1,
            });
        }
        let position = (index - 2) as i64;

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM worksheet_rows WHERE worksheet = ? AND position = ?",
            (&self.title, position),
        )?;
        tx.execute(
            "UPDATE worksheet_rows SET position = position - 1
             WHERE worksheet = ? AND position > ?",
            (&self.title, position),
        )?;
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use serde_json::json;

    fn sqlite_sheet() -> SqliteWorksheet {
        let conn = Connection::open_in_memory().expect("open");
        db::ensure_schema(&conn).expect("schema");
        SqliteWorksheet::open(conn, "Sheet1", &["A", "B"]).expect("sheet")
    }

    fn exercise_contract(sheet: &mut dyn Worksheet) {
        assert_eq!(sheet.header(), &["A".to_string(), "B".to_string()]);
        assert!(sheet.list_all().expect("list").is_empty());

        sheet.append_row(vec![json!("1"), json!(10)]).expect("append 1");
        sheet.append_row(vec![json!("2"), json!(20)]).expect("append 2");
        sheet.append_row(vec![json!("3"), json!(30)]).expect("append 3");

        let err = sheet.append_row(vec![json!("4")]).unwrap_err();
        assert!(matches!(err, StoreError::Shape { expected: 2, actual: 1 }));
        assert_eq!(sheet.list_all().expect("list").len(), 3);

        // Header row and past-the-end rows are refused.
        assert!(matches!(
            sheet.delete_row(1),
            Err(StoreError::RowOutOfRange { index: 1, .. })
        ));
        assert!(matches!(
            sheet.delete_row(5),
            Err(StoreError::RowOutOfRange { index: 5, rows: 4 })
        ));

        // Row 3 is the second data row.
        sheet.delete_row(3).expect("delete");
        let rows = sheet.list_all().expect("list");
        let keys: Vec<_> = rows.iter().map(|r| r["A"].clone()).collect();
        assert_eq!(keys, vec![json!("1"), json!("3")]);
        assert_eq!(rows[1]["B"], json!(30));

        // Positions shifted up, so row 3 is now the last one.
        sheet.delete_row(3).expect("delete last");
        sheet.append_row(vec![json!("5"), json!(50)]).expect("append after delete");
        let keys: Vec<_> = sheet
            .list_all()
            .expect("list")
            .iter()
            .map(|r| r["A"].clone())
            .collect();
        assert_eq!(keys, vec![json!("1"), json!("5")]);
    }

    #[test]
    fn memory_worksheet_honours_contract() {
        let mut sheet = MemoryWorksheet::new("Sheet1", &["A", "B"]);
        exercise_contract(&mut sheet);
    }

    #[test]
    fn sqlite_worksheet_honours_contract() {
        let mut sheet = sqlite_sheet();
        exercise_contract(&mut sheet);
    }

    #[test]
    fn sqlite_worksheet_keeps_stored_header_on_reopen() {
        let conn = Connection::open_in_memory().expect("open");
        db::ensure_schema(&conn).expect("schema");
        conn.execute(
            "INSERT INTO worksheets(title, header) VALUES('Legacy', '[\"X\"]')",
            [],
        )
        .expect("seed");
        let sheet = SqliteWorksheet::open(conn, "Legacy", &["A", "B"]).expect("sheet");
        assert_eq!(sheet.header(), &["X".to_string()]);
    }

    #[test]
    fn short_rows_read_back_as_blank_cells() {
        let header = vec!["A".to_string(), "B".to_string()];
        let row = to_row_map(&header, vec![json!("1")]);
        assert_eq!(row["B"], json!(""));
    }
}
