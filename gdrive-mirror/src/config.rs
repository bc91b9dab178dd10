use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::sync::materializer::StatusPolicy;

const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com";
const DEFAULT_MIRROR_DIR_NAME: &str = "gdrive-mirror";

#[derive(Clone, Debug)]
pub struct MirrorConfig {
    pub local_root: PathBuf,
    pub api_key: String,
    pub root_folder_id: String,
    pub api_base_url: String,
    pub status_policy: StatusPolicy,
}

impl MirrorConfig {
    /// Reads the process environment. `root_override` (the positional CLI
    /// argument) wins over `GDRIVE_MIRROR_DIR`.
    pub fn from_env(root_override: Option<PathBuf>) -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok(), root_override)
    }

    pub fn from_lookup<F>(lookup: F, root_override: Option<PathBuf>) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let api_key = read("GDRIVE_API_KEY").context("GDRIVE_API_KEY is not set")?;
        let root_folder_id =
            read("GDRIVE_ROOT_FOLDER_ID").context("GDRIVE_ROOT_FOLDER_ID is not set")?;
        let api_base_url =
            read("GDRIVE_API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let local_root = match root_override {
            Some(root) => root,
            None => read("GDRIVE_MIRROR_DIR")
                .map(|value| match dirs::home_dir() {
                    Some(home) => expand_with_home(&value, &home),
                    None => PathBuf::from(value),
                })
                .unwrap_or_else(default_mirror_root),
        };
        let status_policy = if read("GDRIVE_LENIENT_DOWNLOADS").is_some_and(|v| parse_bool(&v)) {
            StatusPolicy::Lenient
        } else {
            StatusPolicy::Reject
        };

        Ok(Self {
            local_root,
            api_key,
            root_folder_id,
            api_base_url,
            status_policy,
        })
    }
}

fn expand_with_home(value: &str, home: &Path) -> PathBuf {
    if value == "~" {
        return home.to_path_buf();
    }
    if let Some(rest) = value.strip_prefix("~/") {
        return home.join(rest);
    }
    PathBuf::from(value)
}

fn default_mirror_root() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(DEFAULT_MIRROR_DIR_NAME)
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
