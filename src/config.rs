//! Configuration handling

use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::backend::DEFAULT_API_URL;
use crate::render::DEFAULT_NO_ANSWER_TEXT;

/// Environment variable overriding the configured API URL
pub const API_URL_ENV: &str = "EVENT_FORMS_API_URL";

const DEFAULT_LANGUAGE: &str = "en";

/// A language forms are authored in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageConfig {
    pub code: String,
    /// Human-readable name, e.g. "English"
    #[serde(default)]
    pub description: Option<String>,
}

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Backend address, without the `/api/v1` suffix
    pub api_url: Option<String>,
    /// Languages every form carries
    pub languages: Option<Vec<LanguageConfig>>,
    /// Language used for display
    pub default_language: Option<String>,
    /// Shown where an applicant gave no answer
    pub no_answer_text: Option<String>,
    /// Event used when a command does not name one
    pub event_id: Option<i64>,
}

impl AppConfig {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("org", "event-forms", "event-forms")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load configuration from file
    pub fn load() -> Result<Self> {
        let path = Self::config_path();

        if let Some(path) = path {
            if path.exists() {
                let content = fs::read_to_string(&path)?;
                let config: AppConfig = serde_json::from_str(&content)?;
                return Ok(config);
            }
        }

        Ok(Self::default())
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        if let Some(path) = Self::config_path() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let content = serde_json::to_string_pretty(self)?;
            fs::write(&path, content)?;
        }
        Ok(())
    }

    /// API URL: environment first, then the file, then the default
    pub fn api_url(&self) -> String {
        self.resolve_api_url(std::env::var(API_URL_ENV).ok())
    }

    fn resolve_api_url(&self, from_env: Option<String>) -> String {
        from_env
            .filter(|url| !url.trim().is_empty())
            .or_else(|| self.api_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    /// Configured language codes, English when none are set
    pub fn language_codes(&self) -> Vec<String> {
        match &self.languages {
            Some(languages) if !languages.is_empty() => {
                languages.iter().map(|l| l.code.clone()).collect()
            }
            _ => vec![DEFAULT_LANGUAGE.to_string()],
        }
    }

    /// The default language if it is configured, otherwise the first one
    pub fn display_language(&self) -> String {
        let codes = self.language_codes();
        self.default_language
            .as_ref()
            .filter(|lang| codes.contains(lang))
            .cloned()
            .or_else(|| codes.into_iter().next())
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string())
    }

    pub fn no_answer_text(&self) -> &str {
        self.no_answer_text
            .as_deref()
            .unwrap_or(DEFAULT_NO_ANSWER_TEXT)
    }
}
