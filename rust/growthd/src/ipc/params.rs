use serde_json::Value;

use super::error::HandlerErr;
use super::types::AppState;
use crate::record::{cell_text, parse_number};
use crate::repo::Repository;
use crate::store::SqliteWorksheet;

pub fn repo(state: &AppState) -> Result<&Repository<SqliteWorksheet>, HandlerErr> {
    state
        .repo
        .as_ref()
        .ok_or_else(|| HandlerErr::new("no_workspace", "select a workspace first"))
}

pub fn repo_mut(state: &mut AppState) -> Result<&mut Repository<SqliteWorksheet>, HandlerErr> {
    state
        .repo
        .as_mut()
        .ok_or_else(|| HandlerErr::new("no_workspace", "select a workspace first"))
}

pub fn get_required_str(params: &Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

/// Accepts a string or a number. Roll numbers arrive either way from the
/// front-end and are used in their textual form: `7` becomes `"7"` but a
/// JSON float `7.0` stays `"7.0"` and does not match a stored `7`.
pub fn get_required_text(params: &Value, key: &str) -> Result<String, HandlerErr> {
    match params.get(key) {
        Some(v @ (Value::String(_) | Value::Number(_))) => {
            let t = cell_text(v).trim().to_string();
            if t.is_empty() {
                Err(HandlerErr::bad_params(format!("{} must not be empty", key)))
            } else {
                Ok(t)
            }
        }
        Some(_) => Err(HandlerErr::bad_params(format!(
            "{} must be a string or number",
            key
        ))),
        None => Err(HandlerErr::bad_params(format!("missing {}", key))),
    }
}

pub fn get_required_number(params: &Value, key: &str) -> Result<f64, HandlerErr> {
    let Some(v) = params.get(key) else {
        return Err(HandlerErr::bad_params(format!("missing {}", key)));
    };
    parse_number(v).ok_or_else(|| HandlerErr::bad_params(format!("{} must be a number", key)))
}

pub fn get_optional_usize(params: &Value, key: &str) -> Result<Option<usize>, HandlerErr> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| HandlerErr::bad_params(format!("{} must be a non-negative integer", key))),
    }
}
