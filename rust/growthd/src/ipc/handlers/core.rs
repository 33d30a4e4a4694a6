use crate::config;
use crate::db;
use crate::ipc::error::{ok, respond, HandlerErr};
use crate::ipc::params::get_required_str;
use crate::ipc::types::{AppState, Request};
use crate::record::COLUMNS;
use crate::repo::Repository;
use crate::store::SqliteWorksheet;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::info;

fn handle_health(state: &mut AppState, req: &Request) -> Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
            "sheet": state.repo.as_ref().map(|_| state.settings.sheet.clone()),
        }),
    )
}

/// Opens the workbook in `path` and the configured worksheet, replacing
/// whatever was open before. On failure the previous handle is kept.
pub fn select_workspace(
    state: &mut AppState,
    path: &Path,
    sheet: Option<&str>,
) -> Result<Value, HandlerErr> {
    let file_cfg = config::load_file_config(path)
        .map_err(|e| HandlerErr::new("config_invalid", format!("{e:#}")))?;
    let sheet_override = sheet.or(state.sheet_override.as_deref());
    let settings = config::resolve(sheet_override, &file_cfg);

    let conn = db::open_workbook(path)
        .map_err(|e| HandlerErr::new("db_open_failed", format!("{e:#}")))?;
    let worksheet = SqliteWorksheet::open(conn, &settings.sheet, &COLUMNS)
        .map_err(|e| HandlerErr::new("db_open_failed", e.to_string()))?;
    let repo = Repository::new(worksheet)?;

    info!(
        workspace = %path.to_string_lossy(),
        sheet = %settings.sheet,
        "workspace opened"
    );
    state.workspace = Some(path.to_path_buf());
    state.repo = Some(repo);
    let result = json!({
        "workspacePath": path.to_string_lossy(),
        "sheet": settings.sheet,
    });
    state.settings = settings;
    Ok(result)
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> Value {
    let result = get_required_str(&req.params, "path").and_then(|p| {
        let sheet = req.params.get("sheet").and_then(|v| v.as_str());
        select_workspace(state, &PathBuf::from(p), sheet)
    });
    respond(&req.id, result)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
