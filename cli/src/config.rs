// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{error::Error, path::PathBuf};

use tasksync_core::{APP_NAME, SyncConfig, get_config_dir};
use tokio::fs;

const TASKSYNC_CONFIG_ENV: &str = "TASKSYNC_CONFIG";

/// Loads the configuration from `path`, `$TASKSYNC_CONFIG`, or the user config
/// directory, in that order.
#[tracing::instrument]
pub async fn parse_config(path: Option<PathBuf>) -> Result<SyncConfig, Box<dyn Error>> {
    let path = if let Some(path) = path {
        path
    } else if let Ok(env_path) = std::env::var(TASKSYNC_CONFIG_ENV) {
        PathBuf::from(env_path)
    } else {
        let config = get_config_dir()?.join(format!("{APP_NAME}/config.toml"));
        if !config.exists() {
            return Err(format!("No config found at: {}", config.display()).into());
        }
        config
    };

    let content = fs::read_to_string(&path)
        .await
        .map_err(|e| format!("Failed to read config file at {}: {}", path.display(), e))?;
    parse_config_str(&content)
}

fn parse_config_str(content: &str) -> Result<SyncConfig, Box<dyn Error>> {
    let mut config: SyncConfig = toml::from_str(content)?;
    config.normalize()?;
    Ok(config)
}
