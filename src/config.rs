use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub store: StoreSettings,
    pub database: Option<DatabaseSettings>,
    pub documents: Option<DocumentSettings>,
    pub auth: AuthSettings,
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub realtime: RealtimeSettings,
    #[serde(default)]
    pub swipes: SwipeSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Which backing store serves reads and writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Relational,
    Document,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct StoreSettings {
    #[serde(default)]
    pub backend: StoreBackend,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentSettings {
    pub endpoint: String,
    pub api_key: String,
    pub project_id: String,
    pub database_id: String,
    #[serde(default)]
    pub collections: CollectionSettings,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page_size() -> u32 { 500 }

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionSettings {
    pub profiles: String,
    pub swipes: String,
    pub matches: String,
    pub messages: String,
    pub categories: String,
    pub posts: String,
    pub comments: String,
    pub votes: String,
}

impl Default for CollectionSettings {
    fn default() -> Self {
        Self {
            profiles: "users".to_string(),
            swipes: "swipes".to_string(),
            matches: "matches".to_string(),
            messages: "messages".to_string(),
            categories: "categories".to_string(),
            posts: "posts".to_string(),
            comments: "comments".to_string(),
            votes: "votes".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    /// Base URL of the identity provider (GoTrue-compatible)
    pub provider_url: String,
    pub provider_api_key: String,
    /// Secret the provider signs access tokens with
    pub jwt_secret: String,
    #[serde(default)]
    pub audience: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmSettings {
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default)]
    pub models: ModelSettings,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
            models: ModelSettings::default(),
        }
    }
}

fn default_llm_endpoint() -> String { "https://api.groq.com/openai/v1".to_string() }
fn default_timeout_secs() -> u64 { 30 }
fn default_temperature() -> f32 { 0.7 }

/// Model used for each generated feature
#[derive(Debug, Clone, Deserialize)]
pub struct ModelSettings {
    #[serde(default = "default_large_model")]
    pub conversation_starters: String,
    #[serde(default = "default_small_model")]
    pub reply_suggestions: String,
    #[serde(default = "default_small_model")]
    pub post_suggestions: String,
    #[serde(default = "default_large_model")]
    pub recommendations: String,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            conversation_starters: default_large_model(),
            reply_suggestions: default_small_model(),
            post_suggestions: default_small_model(),
            recommendations: default_large_model(),
        }
    }
}

fn default_large_model() -> String { "llama-3.1-70b-versatile".to_string() }
fn default_small_model() -> String { "llama-3.1-8b-instant".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeSettings {
    #[serde(default)]
    pub redis_url: Option<String>,
    #[serde(default = "default_channel")]
    pub channel: String,
    #[serde(default = "default_buffer")]
    pub buffer: usize,
}

impl Default for RealtimeSettings {
    fn default() -> Self {
        Self {
            redis_url: None,
            channel: default_channel(),
            buffer: default_buffer(),
        }
    }
}

fn default_channel() -> String { "stackswipe:messages".to_string() }
fn default_buffer() -> usize { 256 }

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SwipeSettings {
    #[serde(default = "default_daily_limit")]
    pub daily_limit: u32,
}

impl Default for SwipeSettings {
    fn default() -> Self {
        Self { daily_limit: default_daily_limit() }
    }
}

fn default_daily_limit() -> u32 { 10 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "compact".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Later sources override earlier ones:
    /// 1. `config/default.toml`
    /// 2. `config/local.toml` (development overrides)
    /// 3. Environment variables prefixed with `STACKSWIPE__`
    /// 4. Well-known variables (`DATABASE_URL`, `GROQ_API_KEY`, `AUTH_JWT_SECRET`)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., STACKSWIPE__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("STACKSWIPE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings = apply_well_known_vars(settings, |name| std::env::var(name).ok())?;

        settings.try_deserialize()
    }
}

/// Override config keys from the unprefixed variables hosting platforms set
fn apply_well_known_vars<F>(settings: Config, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    const OVERRIDES: &[(&str, &str)] = &[
        ("DATABASE_URL", "database.url"),
        ("GROQ_API_KEY", "llm.api_key"),
        ("AUTH_JWT_SECRET", "auth.jwt_secret"),
    ];

    let mut builder = Config::builder().add_source(settings);
    for (var, key) in OVERRIDES {
        if let Some(value) = lookup(var) {
            builder = builder.set_override(*key, value)?;
        }
    }

    builder.build()
}
