//! Startup configuration.
//!
//! Resolution order for each setting:
//! 1. Command-line argument / environment variable (via clap)
//! 2. `growthd.toml` in the workspace folder
//! 3. Compiled default

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "growthd.toml";
pub const DEFAULT_SHEET: &str = "GrowthMindsetData";
pub const DEFAULT_HISTOGRAM_BUCKETS: usize = 20;
pub const DEFAULT_LEADERBOARD_LIMIT: usize = 10;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "growthd")]
#[command(about = "Student performance sidecar speaking JSON lines on stdin/stdout")]
#[command(version)]
pub struct Args {
    /// Workspace folder holding the workbook; may also be chosen later via workspace.select
    #[arg(short, long, env = "GROWTHD_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Worksheet to open inside the workbook
    #[arg(short, long, env = "GROWTHD_SHEET")]
    pub sheet: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub sheet: Option<String>,
    pub histogram_buckets: Option<usize>,
    pub leaderboard_limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub sheet: String,
    pub histogram_buckets: usize,
    pub leaderboard_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sheet: DEFAULT_SHEET.to_string(),
            histogram_buckets: DEFAULT_HISTOGRAM_BUCKETS,
            leaderboard_limit: DEFAULT_LEADERBOARD_LIMIT,
        }
    }
}

/// Missing file is not an error; a file that fails to parse is.
pub fn load_file_config(workspace: &Path) -> anyhow::Result<FileConfig> {
    let path = workspace.join(CONFIG_FILE);
    if !path.is_file() {
        return Ok(FileConfig::default());
    }
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.to_string_lossy()))?;
    toml::from_str(&text).with_context(|| format!("failed to parse {}", path.to_string_lossy()))
}

pub fn resolve(sheet_override: Option<&str>, file: &FileConfig) -> Settings {
    let defaults = Settings::default();
    Settings {
        sheet: sheet_override
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .or_else(|| file.sheet.clone())
            .unwrap_or(defaults.sheet),
        histogram_buckets: file
            .histogram_buckets
            .filter(|n| *n > 0)
            .unwrap_or(defaults.histogram_buckets),
        leaderboard_limit: file.leaderboard_limit.unwrap_or(defaults.leaderboard_limit),
    }
}
