use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::state::DEFAULT_NOTIFICATION_PAGE_SIZE;

const CONFIG_FILE: &str = "drive_config.json";
const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8081";
const DEFAULT_CHANNEL_TOPIC: &str = "global";
const DEFAULT_TOAST_DISMISS_SECS: u64 = 3;

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct AppConfig {
    pub(crate) api_base_url: Option<String>,
    pub(crate) channel_topic: Option<String>,
    pub(crate) disable_network: Option<bool>,
    pub(crate) toast_dismiss_secs: Option<u64>,
    pub(crate) notification_page_size: Option<usize>,
}

impl AppConfig {
    /// Config file, then `DRIVE_API_URL`, then the local default.
    pub(crate) fn api_base_url(&self) -> String {
        self.api_base_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .or_else(|| {
                std::env::var("DRIVE_API_URL")
                    .ok()
                    .filter(|s| !s.trim().is_empty())
            })
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string()
    }

    pub(crate) fn channel_topic(&self) -> &str {
        self.channel_topic
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_CHANNEL_TOPIC)
    }

    pub(crate) fn network_enabled(&self) -> bool {
        self.disable_network != Some(true)
    }

    pub(crate) fn toast_dismiss_after(&self) -> Duration {
        Duration::from_secs(self.toast_dismiss_secs.unwrap_or(DEFAULT_TOAST_DISMISS_SECS))
    }

    pub(crate) fn notification_page_size(&self) -> usize {
        self.notification_page_size
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_NOTIFICATION_PAGE_SIZE)
    }
}

fn read_app_config(path: &Path) -> anyhow::Result<AppConfig> {
    let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parse {}", path.display()))
}

pub(crate) fn load_app_config(data_dir: &str) -> AppConfig {
    let path = Path::new(data_dir).join(CONFIG_FILE);
    if !path.exists() {
        return AppConfig::default();
    }
    match read_app_config(&path) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::warn!(err = format!("{e:#}"), "invalid app config, using defaults");
            AppConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_app_config(&dir.path().to_string_lossy());
        assert!(cfg.network_enabled());
        assert_eq!(cfg.channel_topic(), "global");
        assert_eq!(cfg.toast_dismiss_after(), Duration::from_secs(3));
        assert_eq!(cfg.notification_page_size(), 10);
    }

    #[test]
    fn file_values_win() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{"api_base_url":"http://drive.local:9000/","channel_topic":"t","disable_network":true,"notification_page_size":25}"#,
        )
        .unwrap();
        let cfg = load_app_config(&dir.path().to_string_lossy());
        assert_eq!(cfg.api_base_url(), "http://drive.local:9000");
        assert_eq!(cfg.channel_topic(), "t");
        assert!(!cfg.network_enabled());
        assert_eq!(cfg.notification_page_size(), 25);
    }

    #[test]
    fn garbage_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "{not json").unwrap();
        let cfg = load_app_config(&dir.path().to_string_lossy());
        assert!(cfg.api_base_url.is_none());
    }
}
