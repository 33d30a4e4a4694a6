use std::path::PathBuf;

use serde::Deserialize;

use crate::config::Settings;
use crate::repo::Repository;
use crate::store::SqliteWorksheet;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub settings: Settings,
    /// Sheet named on the command line; wins over the workspace config file.
    pub sheet_override: Option<String>,
    pub repo: Option<Repository<SqliteWorksheet>>,
}

impl AppState {
    pub fn new(sheet_override: Option<String>) -> Self {
        Self {
            workspace: None,
            settings: Settings::default(),
            sheet_override,
            repo: None,
        }
    }
}
