use serde::Deserialize;

use crate::domain::knowledge_base::{DEFAULT_THRESHOLD, DEFAULT_TOP_K};
use crate::domain::{AllowList, KnowledgeBase, SearchDefaults};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    /// Knowledge bases seeded into the owner registry at startup
    #[serde(default)]
    pub knowledge_bases: Vec<KnowledgeBase>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub path: String,
}

/// Owner-side session settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Knowledge base ids to replicate; empty replicates everything
    pub knowledge_base_ids: Vec<String>,
    pub channel_buffer: usize,
    /// Start a session as soon as the server is up
    pub start_on_boot: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub default_top_k: u32,
    pub default_threshold: f32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub endpoint: String,
    pub timeout_ms: u64,
    /// Bearer token for the retrieval service itself
    pub api_key: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/metrics".to_string(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            knowledge_base_ids: Vec::new(),
            channel_buffer: 32,
            start_on_boot: true,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_top_k: DEFAULT_TOP_K,
            default_threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8000/search".to_string(),
            timeout_ms: 30_000,
            api_key: None,
        }
    }
}

impl SyncConfig {
    pub fn allow_list(&self) -> AllowList {
        AllowList::new(self.knowledge_base_ids.iter().cloned())
    }
}

impl SearchConfig {
    pub fn defaults(&self) -> SearchDefaults {
        SearchDefaults {
            default_top_k: self.default_top_k,
            default_threshold: self.default_threshold,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_with(Self::environment())
    }

    /// `APP__SECTION__KEY` environment source
    fn environment() -> config::Environment {
        config::Environment::with_prefix("APP")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("sync.knowledge_base_ids")
            .try_parsing(true)
    }

    fn load_with(environment: config::Environment) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(environment)
            .build()?;

        config.try_deserialize()
    }
}
