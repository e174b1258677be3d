//! Runtime configuration.
//!
//! Values come from the process environment first (a `.env` file is loaded on
//! native targets), then from the `assets/config.env` file bundled into the
//! binary. Web builds only see the bundled file.

use anyhow::{Context, Result, bail};
use std::collections::HashMap;
use std::time::Duration;

use crate::reveal::DEFAULT_TICK;

/// Bundled config for web and mobile builds
const BUNDLED_CONFIG: &str = include_str!("../assets/config.env");

pub const DEFAULT_API_BASE: &str = "http://localhost:5000";
pub const API_BASE_VAR: &str = "RAG_API_BASE";
pub const REVEAL_INTERVAL_VAR: &str = "RAG_REVEAL_INTERVAL_MS";

#[derive(Clone, Debug, PartialEq)]
pub struct ClientConfig {
    pub api_base: String,
    pub reveal_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            reveal_interval: DEFAULT_TICK,
        }
    }
}

/// Parses `KEY=VALUE` lines, skipping blanks and `#` comments.
pub fn parse_env_file(contents: &str) -> HashMap<String, String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .filter(|(key, _)| !key.is_empty())
        .collect()
}

#[cfg(not(target_arch = "wasm32"))]
fn load_dotenv() {
    if let Err(err) = dotenvy::dotenv() {
        tracing::debug!(error = %err, "no .env file loaded");
    }
}

impl ClientConfig {
    /// Loads the configuration for this platform.
    pub fn load() -> Result<Self> {
        let bundled = parse_env_file(BUNDLED_CONFIG);

        #[cfg(not(target_arch = "wasm32"))]
        {
            load_dotenv();
            Self::from_lookup(|key| {
                std::env::var(key)
                    .ok()
                    .or_else(|| bundled.get(key).cloned())
            })
        }

        #[cfg(target_arch = "wasm32")]
        {
            Self::from_lookup(|key| bundled.get(key).cloned())
        }
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base = match lookup(API_BASE_VAR).filter(|value| !value.trim().is_empty()) {
            Some(value) => validate_api_base(&value)
                .with_context(|| format!("invalid {API_BASE_VAR}"))?,
            None => DEFAULT_API_BASE.to_string(),
        };

        let reveal_interval = match lookup(REVEAL_INTERVAL_VAR) {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(ms) => Duration::from_millis(ms),
                Err(err) => {
                    tracing::warn!(value = %raw, error = %err, "ignoring {REVEAL_INTERVAL_VAR}");
                    DEFAULT_TICK
                }
            },
            None => DEFAULT_TICK,
        };

        Ok(Self {
            api_base,
            reveal_interval,
        })
    }
}

fn validate_api_base(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = reqwest::Url::parse(trimmed).with_context(|| format!("`{trimmed}` is not a URL"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("`{trimmed}` must use http or https");
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn parses_env_lines() {
        let parsed = parse_env_file(
            "# comment\n\nRAG_API_BASE = http://rag.local:7860\nBROKEN\n=orphan\nRAG_REVEAL_INTERVAL_MS=8\n",
        );
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed["RAG_API_BASE"], "http://rag.local:7860");
        assert_eq!(parsed["RAG_REVEAL_INTERVAL_MS"], "8");
    }

    #[test]
    fn defaults_when_unset() {
        let config = ClientConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.reveal_interval, Duration::from_millis(16));
    }

    #[test]
    fn reads_overrides() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            (API_BASE_VAR, "https://rag.example.com/"),
            (REVEAL_INTERVAL_VAR, "5"),
        ]))
        .unwrap();
        assert_eq!(config.api_base, "https://rag.example.com");
        assert_eq!(config.reveal_interval, Duration::from_millis(5));
    }

    #[test]
    fn bad_interval_falls_back() {
        let config =
            ClientConfig::from_lookup(lookup_from(&[(REVEAL_INTERVAL_VAR, "fast")])).unwrap();
        assert_eq!(config.reveal_interval, DEFAULT_TICK);
    }

    #[test]
    fn rejects_non_http_base() {
        assert!(ClientConfig::from_lookup(lookup_from(&[(API_BASE_VAR, "ftp://files")])).is_err());
        assert!(ClientConfig::from_lookup(lookup_from(&[(API_BASE_VAR, "not a url")])).is_err());
    }

    #[test]
    fn bundled_config_is_valid() {
        let bundled = parse_env_file(BUNDLED_CONFIG);
        assert!(ClientConfig::from_lookup(|key| bundled.get(key).cloned()).is_ok());
    }
}
