use std::env;
use std::path::PathBuf;

use crate::error::{Result, TrafficError};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_UPLOAD_URL: &str = "http://localhost:3000/api/upload";

/// What happens to the merged data once it is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Render `plots.png` next to the CSV files.
    Chart,
    /// PUT the merged data to the upload endpoint.
    Upload { key: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub repository: String,
    pub token: String,
    pub output_dir: PathBuf,
    pub api_url: String,
    pub upload_url: String,
    pub mode: Mode,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`Config::from_env`] but reads variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let repository = non_empty("REPOSITORY_NAME")
            .or_else(|| non_empty("GITHUB_REPOSITORY"))
            .ok_or(TrafficError::MissingConfig("REPOSITORY_NAME or GITHUB_REPOSITORY"))?;
        let token =
            non_empty("TRAFFIC_ACTION_TOKEN").ok_or(TrafficError::MissingConfig("TRAFFIC_ACTION_TOKEN"))?;
        let workspace =
            non_empty("GITHUB_WORKSPACE").ok_or(TrafficError::MissingConfig("GITHUB_WORKSPACE"))?;

        let mode = match non_empty("UPLOAD_KEY") {
            Some(key) => Mode::Upload { key },
            None => Mode::Chart,
        };

        Ok(Self {
            repository,
            token,
            output_dir: PathBuf::from(workspace).join("traffic"),
            api_url: non_empty("TRAFFIC_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            upload_url: non_empty("UPLOAD_URL").unwrap_or_else(|| DEFAULT_UPLOAD_URL.to_string()),
            mode,
        })
    }

    pub fn chart_path(&self) -> PathBuf {
        self.output_dir.join("plots.png")
    }
}
