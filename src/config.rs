// ⚙️ Configuration - one injected config, no hard-coded paths
// Values come from `.env` / the environment, then CLI flags override them

use crate::error::{FinanceError, Result};
use std::path::PathBuf;

pub const DEFAULT_DB_PATH: &str = "politicaldata.db";
pub const DEFAULT_FEC_BASE_URL: &str = "https://api.open.fec.gov/v1";
pub const DEFAULT_LITTLESIS_BASE_URL: &str = "https://littlesis.org/api";

/// How to pick among several remote search results for one name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisambiguationMode {
    /// Most recent election year wins, non-presidential preferred on ties
    Auto,
    /// Present every candidate and take an explicit selection
    Interactive,
}

impl From<&str> for DisambiguationMode {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "interactive" | "manual" => DisambiguationMode::Interactive,
            _ => DisambiguationMode::Auto,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FecConfig {
    pub base_url: String,
    pub api_key: String,
    pub per_page: u32,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub fec: FecConfig,
    pub entity_graph_base_url: String,
    pub llm: Option<LlmConfig>,
    pub disambiguation: DisambiguationMode,
    /// Never call the remote candidate registry
    pub offline: bool,
    pub http_timeout_secs: u64,
}

impl Config {
    /// Create a default configuration for the given store
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            fec: FecConfig {
                base_url: DEFAULT_FEC_BASE_URL.to_string(),
                api_key: "DEMO_KEY".to_string(),
                per_page: 20,
            },
            entity_graph_base_url: DEFAULT_LITTLESIS_BASE_URL.to_string(),
            llm: None,
            disambiguation: DisambiguationMode::Auto,
            offline: false,
            http_timeout_secs: 30,
        }
    }

    /// Load `.env` (if any) and read the process environment
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = ConfigBuilder::new(
            lookup("OPEN_POCKETS_DB").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
        );

        if let Some(key) = lookup("FEC_API_KEY") {
            builder = builder.fec_api_key(key);
        }
        if let Some(url) = lookup("FEC_BASE_URL") {
            builder = builder.fec_base_url(url);
        }
        if let Some(url) = lookup("LITTLESIS_BASE_URL") {
            builder = builder.entity_graph_base_url(url);
        }
        if let Some(endpoint) = lookup("LLM_ENDPOINT") {
            builder = builder.llm(
                endpoint,
                lookup("LLM_API_KEY"),
                lookup("LLM_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
            );
        }
        if let Some(mode) = lookup("OPEN_POCKETS_DISAMBIGUATION") {
            builder = builder.disambiguation(DisambiguationMode::from(mode.as_str()));
        }
        if let Some(flag) = lookup("OPEN_POCKETS_OFFLINE") {
            builder = builder.offline(parse_flag("OPEN_POCKETS_OFFLINE", &flag)?);
        }
        if let Some(secs) = lookup("OPEN_POCKETS_HTTP_TIMEOUT") {
            let secs = secs.parse::<u64>().map_err(|_| {
                FinanceError::Config(format!("OPEN_POCKETS_HTTP_TIMEOUT is not a number: {}", secs))
            })?;
            builder = builder.http_timeout_secs(secs);
        }

        builder.build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.db_path.as_os_str().is_empty() {
            return Err(FinanceError::Config("Database path is empty".to_string()));
        }

        if self.fec.per_page == 0 {
            return Err(FinanceError::Config(
                "Registry page size must be at least 1".to_string(),
            ));
        }

        if let Some(llm) = &self.llm {
            if llm.endpoint.trim().is_empty() {
                return Err(FinanceError::Config("LLM endpoint is empty".to_string()));
            }
        }

        Ok(())
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        other => Err(FinanceError::Config(format!("{} is not a boolean: {}", key, other))),
    }
}

/// Builder for creating configurations
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            config: Config::new(db_path),
        }
    }

    pub fn db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.db_path = path.into();
        self
    }

    pub fn fec_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.fec.api_key = key.into();
        self
    }

    pub fn fec_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.fec.base_url = url.into();
        self
    }

    pub fn fec_per_page(mut self, per_page: u32) -> Self {
        self.config.fec.per_page = per_page;
        self
    }

    pub fn entity_graph_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.entity_graph_base_url = url.into();
        self
    }

    /// Enable LLM summaries against an OpenAI-compatible endpoint
    pub fn llm(
        mut self,
        endpoint: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
    ) -> Self {
        self.config.llm = Some(LlmConfig {
            endpoint: endpoint.into(),
            api_key,
            model: model.into(),
        });
        self
    }

    pub fn disambiguation(mut self, mode: DisambiguationMode) -> Self {
        self.config.disambiguation = mode;
        self
    }

    pub fn offline(mut self, offline: bool) -> Self {
        self.config.offline = offline;
        self
    }

    pub fn http_timeout_secs(mut self, secs: u64) -> Self {
        self.config.http_timeout_secs = secs;
        self
    }

    /// Build and validate
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_without_environment() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.db_path, PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!(config.fec.base_url, DEFAULT_FEC_BASE_URL);
        assert_eq!(config.fec.api_key, "DEMO_KEY");
        assert!(config.llm.is_none());
        assert_eq!(config.disambiguation, DisambiguationMode::Auto);
        assert!(!config.offline);
    }

    #[test]
    fn test_offline_flag() {
        let on = Config::from_lookup(|k| (k == "OPEN_POCKETS_OFFLINE").then(|| "true".to_string())).unwrap();
        assert!(on.offline);

        let off = Config::from_lookup(|k| (k == "OPEN_POCKETS_OFFLINE").then(|| "0".to_string())).unwrap();
        assert!(!off.offline);

        let bad = Config::from_lookup(|k| (k == "OPEN_POCKETS_OFFLINE").then(|| "maybe".to_string()));
        assert!(matches!(bad, Err(FinanceError::Config(_))));

        assert!(ConfigBuilder::new("x.db").offline(true).build().unwrap().offline);
    }

    #[test]
    fn test_environment_overrides() {
        let env: HashMap<&str, &str> = [
            ("OPEN_POCKETS_DB", "/tmp/fec.db"),
            ("FEC_API_KEY", "abc123"),
            ("LLM_ENDPOINT", "http://localhost:8080/v1"),
            ("OPEN_POCKETS_DISAMBIGUATION", "interactive"),
        ]
        .into_iter()
        .collect();

        let config = Config::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/fec.db"));
        assert_eq!(config.fec.api_key, "abc123");
        assert_eq!(config.llm.unwrap().endpoint, "http://localhost:8080/v1");
        assert_eq!(config.disambiguation, DisambiguationMode::Interactive);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(ConfigBuilder::new("").build().is_err());
        assert!(ConfigBuilder::new("x.db").fec_per_page(0).build().is_err());
        assert!(ConfigBuilder::new("x.db").llm("  ", None, "m").build().is_err());

        let bad_timeout = Config::from_lookup(|k| {
            (k == "OPEN_POCKETS_HTTP_TIMEOUT").then(|| "soon".to_string())
        });
        assert!(matches!(bad_timeout, Err(FinanceError::Config(_))));
    }
}
