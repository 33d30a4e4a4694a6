use crate::import::parse_student_csv;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::params::{get_required_str, repo_mut};
use crate::ipc::types::{AppState, Request};
use serde_json::{json, Value};
use tracing::warn;

/// Uploaded CSV text comes inline as `csv`, or from disk via `path`.
fn handle_students_import(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let repo = repo_mut(state)?;
    let text = match req.params.get("csv").and_then(|v| v.as_str()) {
        Some(t) => t.to_string(),
        None => {
            let in_path = get_required_str(&req.params, "path")
                .map_err(|_| HandlerErr::bad_params("missing csv or path"))?;
            std::fs::read_to_string(&in_path).map_err(|e| HandlerErr {
                code: "parse_failed",
                message: e.to_string(),
                details: Some(json!({ "path": in_path })),
            })?
        }
    };

    let rows = parse_student_csv(&text).map_err(|e| {
        warn!(error = %e, "import rejected");
        HandlerErr::from(e)
    })?;
    let report = repo.import_rows(rows)?;
    let students = repo.list_all()?;
    Ok(json!({ "report": report, "students": students }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "students.import" => Some(respond(&req.id, handle_students_import(state, req))),
        _ => None,
    }
}
