use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::ModelConfig;

/// Credentials and optional lineup overrides. Every field is optional: a
/// missing credential disables the dependent feature instead of failing
/// startup.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Config {
    pub openrouter_api_key: Option<String>,
    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,
    pub model_a: Option<ModelConfig>,
    pub model_b: Option<ModelConfig>,
}

impl Config {
    /// Config file contents, without environment overrides. A missing file
    /// is an empty config, not an error.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Full resolution chain: environment variables win, the config file
    /// fills the gaps.
    pub fn resolved() -> Self {
        Self::load()
            .unwrap_or_default()
            .with_env(|var| std::env::var(var).ok())
    }

    /// Applies environment overrides through an injectable lookup.
    pub fn with_env(self, env: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            openrouter_api_key: env_or(env("OPENROUTER_API_KEY"), self.openrouter_api_key),
            supabase_url: env_or(env("SUPABASE_URL"), self.supabase_url),
            supabase_key: env_or(env("SUPABASE_KEY"), self.supabase_key),
            ..self
        }
    }

    /// Names of the credentials that are still unset, for the startup
    /// warning banner.
    pub fn missing_keys(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.openrouter_api_key.is_none() {
            missing.push("OPENROUTER_API_KEY");
        }
        if self.supabase_url.is_none() {
            missing.push("SUPABASE_URL");
        }
        if self.supabase_key.is_none() {
            missing.push("SUPABASE_KEY");
        }
        missing
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("arena").join("config.json"))
    }
}

fn env_or(env_value: Option<String>, fallback: Option<String>) -> Option<String> {
    env_value.filter(|v| !v.is_empty()).or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_env_wins_over_file() {
        let file = Config {
            openrouter_api_key: Some("from-file".to_string()),
            ..Config::default()
        };
        let env = env_map(&[("OPENROUTER_API_KEY", "from-env")]);
        let resolved = file.with_env(|var| env.get(var).cloned());
        assert_eq!(resolved.openrouter_api_key.as_deref(), Some("from-env"));
    }

    #[test]
    fn test_file_fills_env_gaps() {
        let file = Config {
            supabase_url: Some("https://project.supabase.co".to_string()),
            supabase_key: Some("service-key".to_string()),
            ..Config::default()
        };
        let resolved = file.with_env(|_| None);
        assert_eq!(
            resolved.supabase_url.as_deref(),
            Some("https://project.supabase.co")
        );
        assert_eq!(resolved.supabase_key.as_deref(), Some("service-key"));
        assert!(resolved.openrouter_api_key.is_none());
    }

    #[test]
    fn test_empty_env_var_does_not_shadow_file() {
        let file = Config {
            supabase_key: Some("from-file".to_string()),
            ..Config::default()
        };
        let env = env_map(&[("SUPABASE_KEY", "")]);
        let resolved = file.with_env(|var| env.get(var).cloned());
        assert_eq!(resolved.supabase_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn test_missing_keys_reported_by_name() {
        let config = Config::default();
        assert_eq!(
            config.missing_keys(),
            vec!["OPENROUTER_API_KEY", "SUPABASE_URL", "SUPABASE_KEY"]
        );

        let config = Config {
            openrouter_api_key: Some("key".to_string()),
            ..Config::default()
        };
        assert_eq!(config.missing_keys(), vec!["SUPABASE_URL", "SUPABASE_KEY"]);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"openrouter_api_key": "sk-or-test", "supabase_url": "https://project.supabase.co"}"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.openrouter_api_key.as_deref(), Some("sk-or-test"));
        assert_eq!(
            config.supabase_url.as_deref(),
            Some("https://project.supabase.co")
        );
        assert!(config.supabase_key.is_none());
    }

    #[test]
    fn test_load_from_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert!(config.openrouter_api_key.is_none());
        assert!(config.model_a.is_none());
    }
}
