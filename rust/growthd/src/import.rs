use crate::error::RepoError;
use crate::record::{
    parse_number, StudentRecord, COLUMNS, COL_ATTENDANCE, COL_MARKS,
    COL_ROLL_NUMBER, COL_STUDENT_NAME, COL_STUDY_HOURS, COL_SUBJECT,
};
use serde_json::Value;
use std::collections::HashMap;

/// One data line of an uploaded CSV, already mapped onto a record or
/// carrying the reason it could not be.
#[derive(Debug, Clone)]
pub struct ImportRow {
    pub line: usize,
    pub roll_number: Option<String>,
    pub parsed: Result<StudentRecord, String>,
}

pub fn parse_csv_record(line: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut buf = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                buf.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => out.push(std::mem::take(&mut buf)),
            _ => buf.push(ch),
        }
    }
    out.push(buf);
    out
}

/// Checks the header before any row is touched. Names are exact; only
/// surrounding whitespace and a leading BOM are ignored.
pub fn header_index(header_line: &str) -> Result<HashMap<String, usize>, RepoError> {
    let mut idx = HashMap::<String, usize>::new();
    for (i, name) in parse_csv_record(header_line).into_iter().enumerate() {
        let name = name.trim_start_matches('\u{feff}').trim().to_string();
        idx.entry(name).or_insert(i);
    }
    let missing: Vec<String> = COLUMNS
        .iter()
        .filter(|c| !idx.contains_key(**c))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(RepoError::SchemaMismatch { missing });
    }
    Ok(idx)
}

/// Groups physical lines into CSV records. A line that leaves a quoted
/// field open continues onto the next one, keeping the newline. Each
/// record carries the 1-based line it starts on.
fn csv_records(text: &str) -> Vec<(usize, String)> {
    let mut records = Vec::new();
    let mut open: Option<(usize, String)> = None;
    for (i, line) in text.lines().enumerate() {
        let (start, record) = match open.take() {
            Some((start, mut buf)) => {
                buf.push('\n');
                buf.push_str(line);
                (start, buf)
            }
            None => (i + 1, line.to_string()),
        };
        // Doubled quotes flip twice, so parity tracks whether a field is open.
        if record.matches('"').count() % 2 == 1 {
            open = Some((start, record));
            continue;
        }
        records.push((start, record));
    }
    records.extend(open);
    records
}

/// Splits CSV text into rows ready for `Repository::import_rows`.
/// Fails only on the header; per-row problems ride along in `parsed`.
pub fn parse_student_csv(text: &str) -> Result<Vec<ImportRow>, RepoError> {
    let mut records = csv_records(text)
        .into_iter()
        .filter(|(_, r)| !r.trim().is_empty());
    let Some((_, header)) = records.next() else {
        return Err(RepoError::SchemaMismatch {
            missing: COLUMNS.iter().map(|c| c.to_string()).collect(),
        });
    };
    let idx = header_index(&header)?;

    let mut rows = Vec::new();
    for (line, raw) in records {
        let fields = parse_csv_record(&raw);
        let field = |col: &str| -> String {
            idx.get(col)
                .and_then(|i| fields.get(*i))
                .map(|s| s.trim().to_string())
                .unwrap_or_default()
        };
        let roll_number = Some(field(COL_ROLL_NUMBER)).filter(|s| !s.is_empty());
        rows.push(ImportRow {
            line,
            roll_number,
            parsed: build_record(&field),
        });
    }
    Ok(rows)
}

fn build_record(field: &dyn Fn(&str) -> String) -> Result<StudentRecord, String> {
    let number = |col: &str| -> Result<f64, String> {
        let raw = field(col);
        parse_number(&Value::String(raw.clone()))
            .ok_or_else(|| format!("{} is not a number: {}", col, raw))
    };
    Ok(StudentRecord {
        roll_number: field(COL_ROLL_NUMBER),
        student_name: field(COL_STUDENT_NAME),
        subject: field(COL_SUBJECT),
        marks: number(COL_MARKS)?,
        attendance: number(COL_ATTENDANCE)?,
        study_hours: number(COL_STUDY_HOURS)?,
    })
}
