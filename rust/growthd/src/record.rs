use crate::error::RepoError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

pub const COL_ROLL_NUMBER: &str = "Roll Number";
pub const COL_STUDENT_NAME: &str = "Student Name";
pub const COL_SUBJECT: &str = "Subject";
pub const COL_MARKS: &str = "Marks";
pub const COL_ATTENDANCE: &str = "Attendance";
pub const COL_STUDY_HOURS: &str = "Study Hours";

/// Worksheet header, in the positional order every append writes.
pub const COLUMNS: [&str; 6] = [
    COL_ROLL_NUMBER,
    COL_STUDENT_NAME,
    COL_SUBJECT,
    COL_MARKS,
    COL_ATTENDANCE,
    COL_STUDY_HOURS,
];

/// One data row keyed by header name.
pub type RowMap = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub roll_number: String,
    pub student_name: String,
    pub subject: String,
    pub marks: f64,
    pub attendance: f64,
    pub study_hours: f64,
}

impl StudentRecord {
    pub fn validate(&self) -> Result<(), RepoError> {
        if self.roll_number.trim().is_empty() {
            return Err(RepoError::InvalidRecord(
                "roll number must not be empty".into(),
            ));
        }
        if self.student_name.trim().is_empty() {
            return Err(RepoError::InvalidRecord(
                "student name must not be empty".into(),
            ));
        }
        if self.subject.trim().is_empty() {
            return Err(RepoError::InvalidRecord("subject must not be empty".into()));
        }
        check_range(COL_MARKS, self.marks, Some(100.0))?;
        check_range(COL_ATTENDANCE, self.attendance, Some(100.0))?;
        check_range(COL_STUDY_HOURS, self.study_hours, None)?;
        Ok(())
    }

    /// Cell values in `COLUMNS` order.
    pub fn to_cells(&self) -> Vec<Value> {
        vec![
            json!(self.roll_number),
            json!(self.student_name),
            json!(self.subject),
            json!(self.marks),
            json!(self.attendance),
            json!(self.study_hours),
        ]
    }

    /// Reads a stored row. Numbers may come back as strings and the roll
    /// number may come back as a number; both are accepted.
    pub fn from_row(row: &RowMap) -> Result<Self, String> {
        let roll_number = cell_text(row.get(COL_ROLL_NUMBER).unwrap_or(&Value::Null));
        if roll_number.trim().is_empty() {
            return Err(format!("{} is empty", COL_ROLL_NUMBER));
        }
        Ok(Self {
            roll_number,
            student_name: cell_text(row.get(COL_STUDENT_NAME).unwrap_or(&Value::Null)),
            subject: cell_text(row.get(COL_SUBJECT).unwrap_or(&Value::Null)),
            marks: cell_number(row, COL_MARKS)?,
            attendance: cell_number(row, COL_ATTENDANCE)?,
            study_hours: cell_number(row, COL_STUDY_HOURS)?,
        })
    }
}

fn check_range(column: &str, v: f64, max: Option<f64>) -> Result<(), RepoError> {
    if !v.is_finite() || v < 0.0 {
        return Err(RepoError::InvalidRecord(format!(
            "{} must be a non-negative number",
            column
        )));
    }
    if let Some(max) = max {
        if v > max {
            return Err(RepoError::InvalidRecord(format!(
                "{} must be between 0 and {}",
                column, max
            )));
        }
    }
    Ok(())
}

/// Textual form of a cell, used for every roll-number comparison.
pub fn cell_text(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

pub fn parse_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn cell_number(row: &RowMap, column: &str) -> Result<f64, String> {
    let v = row.get(column).unwrap_or(&Value::Null);
    parse_number(v).ok_or_else(|| format!("{} is not a number: {}", column, cell_text(v)))
}
