use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::tools::builtins::job_search;

/// Environment variable overriding `server.addr`.
pub const ADDR_ENV: &str = "RECRUIT_CHAT_ADDR";

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a world class recruiter and a HR professional. \
You are chatting with a job seeker who is looking for a job. You are trying to help them find a job.";

/// Top-level configuration loaded from `config.yaml`.
///
/// Every section is optional; an empty file yields a working local setup.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Listen address, e.g. `127.0.0.1:3000`.
    #[serde(default = "default_addr")]
    pub addr: String,
    /// Directory holding the chat UI assets.
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            static_dir: default_static_dir(),
        }
    }
}

fn default_addr() -> String {
    "127.0.0.1:3000".into()
}

fn default_static_dir() -> String {
    "static".into()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// SQLite file.  Relative paths are resolved against the app home.
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> String {
    "db.sqlite".into()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    #[serde(default = "default_cookie_days")]
    pub cookie_max_age_days: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_max_age_days: default_cookie_days(),
        }
    }
}

/// Upper bound for `session.cookie_max_age_days` (about 100 years).
const MAX_COOKIE_DAYS: u64 = 36_500;

fn default_cookie_days() -> u64 {
    crate::session::DEFAULT_MAX_AGE_DAYS
}

/// Chat-completions model used by the tool agent.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    #[serde(default = "default_model_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Literal key or `$ENV_VAR` reference.
    #[serde(default = "default_openai_key")]
    pub api_key: Option<String>,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_max_tool_iterations")]
    pub max_tool_iterations: usize,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: default_model_endpoint(),
            model: default_model(),
            api_key: default_openai_key(),
            temperature: 0.0,
            max_tool_iterations: default_max_tool_iterations(),
            system_prompt: default_system_prompt(),
        }
    }
}

fn default_model_endpoint() -> String {
    crate::models::openai::DEFAULT_ENDPOINT.into()
}

fn default_model() -> String {
    "gpt-4o-mini".into()
}

fn default_openai_key() -> Option<String> {
    Some("$OPENAI_API_KEY".into())
}

fn default_max_tool_iterations() -> usize {
    5
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.into()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ToolsConfig {
    #[serde(default = "default_job_base")]
    pub job_search_base_url: String,
    #[serde(default)]
    pub web_search: WebSearchConfig,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            job_search_base_url: default_job_base(),
            web_search: WebSearchConfig::default(),
        }
    }
}

fn default_job_base() -> String {
    job_search::DEFAULT_BASE_URL.into()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WebSearchConfig {
    #[serde(default = "default_tavily_endpoint")]
    pub endpoint: String,
    /// Literal key or `$ENV_VAR` reference.
    #[serde(default = "default_tavily_key")]
    pub api_key: Option<String>,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_tavily_endpoint(),
            api_key: default_tavily_key(),
            max_results: default_max_results(),
        }
    }
}

fn default_tavily_endpoint() -> String {
    "https://api.tavily.com/search".into()
}

fn default_tavily_key() -> Option<String> {
    Some("$TAVILY_API_KEY".into())
}

fn default_max_results() -> u32 {
    1
}

/// Expand a `$VAR` reference from the environment.  Plain values pass
/// through; an unset variable yields `None`.
pub fn resolve_secret(raw: Option<&str>) -> Option<String> {
    let raw = raw?.trim();
    match raw.strip_prefix('$') {
        Some(var) => std::env::var(var).ok().filter(|v| !v.is_empty()),
        None if raw.is_empty() => None,
        None => Some(raw.to_string()),
    }
}

impl Config {
    /// Read and parse a YAML configuration file.
    ///
    /// A missing file yields the defaults.
    pub async fn load(path: &Path) -> anyhow::Result<Config> {
        let contents = match tokio::fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "config file not found, using defaults");
                String::new()
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to read config file: {}", path.display()));
            }
        };
        let mut config = Self::parse(&contents)?;
        config.apply_env();

        tracing::debug!(
            addr = %config.server.addr,
            db = %config.database.path,
            model = %config.model.model,
            "configuration loaded"
        );
        Ok(config)
    }

    /// Parse and validate YAML text.  Empty text yields the defaults.
    pub fn parse(contents: &str) -> anyhow::Result<Config> {
        let mut config: Config = if contents.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml_ng::from_str(contents).context("failed to parse config YAML")?
        };
        config.validate()?;
        config.resolve_paths(&crate::app_home());
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(addr) = std::env::var(ADDR_ENV) {
            if !addr.trim().is_empty() {
                self.server.addr = addr.trim().to_string();
            }
        }
    }

    fn resolve_paths(&mut self, home: &Path) {
        let db = Path::new(&self.database.path);
        if db.is_relative() && self.database.path != ":memory:" {
            self.database.path = home.join(db).to_string_lossy().to_string();
        }
    }

    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.database.path)
    }

    /// Validate semantic constraints that serde cannot enforce.
    fn validate(&self) -> anyhow::Result<()> {
        if self.session.cookie_max_age_days == 0 {
            anyhow::bail!("config: session.cookie_max_age_days must be > 0");
        }
        if self.session.cookie_max_age_days > MAX_COOKIE_DAYS {
            anyhow::bail!("config: session.cookie_max_age_days must be <= {MAX_COOKIE_DAYS}");
        }
        if self.model.max_tool_iterations == 0 {
            anyhow::bail!("config: model.max_tool_iterations must be > 0");
        }
        if self.model.endpoint.trim().is_empty() {
            anyhow::bail!("config: model.endpoint must not be empty");
        }
        if self.tools.web_search.max_results == 0 {
            anyhow::bail!("config: tools.web_search.max_results must be > 0");
        }
        if self.server.addr.trim().is_empty() {
            anyhow::bail!("config: server.addr must not be empty");
        }
        Ok(())
    }
}
