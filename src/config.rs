use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Supports ${ENV_VAR} substitution
    #[serde(default)]
    pub api_key: String,
    /// API base URL, for OpenAI-compatible gateways.
    /// Defaults to the hosted OpenAI endpoint.
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens_per_request: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    /// Substrings that cause generated code to be rejected before
    /// execution. Case-insensitive, matched anywhere in the text.
    #[serde(default = "default_denylist")]
    pub denylist: Vec<String>,
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_denylist() -> Vec<String> {
    crate::engine::policy::DEFAULT_DENYLIST
        .iter()
        .map(|p| (*p).to_string())
        .collect()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            // Only read from the environment here; the engine decides
            // what a missing credential means.
            api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            host: None,
            max_tokens_per_request: default_max_tokens(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            denylist: default_denylist(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        // Expand environment variables like ${OPENAI_API_KEY}
        let expanded = shellexpand::env(&content)?;
        let config: Config = toml::from_str(&expanded)?;
        Ok(config)
    }
}
