//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` (or the path given with `-f`), then applies
//! `CHAT_RELAY_BIND` and `CHAT_RELAY_LOG_LEVEL` env overrides. The upstream
//! API key is read from `OPENAI_API_KEY` only.

use std::{env, fs, path::Path};

use serde::Deserialize;

use crate::error::AppError;
use crate::llm::models::{ModelDescriptor, ModelRegistry};
use crate::logger;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Persona injected as the first (system) message of every completion.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are Tyo Technologies' advanced AI assistant. \
You are helpful, knowledgeable, and professional.";

/// OpenAI / OpenAI-compatible provider configuration.
/// Populated from `[llm.openai]` in the TOML.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Full chat completions endpoint URL.
    pub api_base_url: String,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
}

/// LLM provider configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Which provider is active (`"openai"` or `"dummy"`).
    /// Maps to `default` in `[llm]` TOML.
    pub provider: String,
    pub openai: OpenAiConfig,
}

/// Conversation behaviour.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Model used when a request omits `model`. Always a registry key.
    pub default_model: String,
    pub system_prompt: String,
    /// Keep at most this many exchanges per conversation. `None` = unbounded.
    pub max_turns: Option<usize>,
}

/// Fully-resolved relay configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Socket address the HTTP server binds to.
    pub bind: String,
    pub log_level: String,
    pub llm: LlmConfig,
    pub chat: ChatConfig,
    pub models: ModelRegistry,
    /// API key from `OPENAI_API_KEY`: `None` for keyless local servers.
    /// Never sourced from TOML.
    pub api_key: Option<String>,
}

/// Raw TOML shape: `serde` target before resolution.
#[derive(Deserialize)]
struct RawConfig {
    #[serde(default)]
    server: RawServer,
    #[serde(default)]
    llm: RawLlm,
    #[serde(default)]
    chat: RawChat,
    #[serde(default)]
    models: Vec<ModelDescriptor>,
}

#[derive(Deserialize)]
struct RawServer {
    #[serde(default = "default_bind")]
    bind: String,
    #[serde(default = "default_log_level")]
    log_level: String,
}

impl Default for RawServer {
    fn default() -> Self {
        Self { bind: default_bind(), log_level: default_log_level() }
    }
}

#[derive(Deserialize)]
struct RawLlm {
    #[serde(rename = "default", default = "default_llm_provider")]
    provider: String,
    #[serde(default)]
    openai: RawOpenAiConfig,
}

impl Default for RawLlm {
    fn default() -> Self {
        Self { provider: default_llm_provider(), openai: RawOpenAiConfig::default() }
    }
}

#[derive(Deserialize)]
struct RawOpenAiConfig {
    #[serde(default = "default_openai_api_base_url")]
    api_base_url: String,
    #[serde(default = "default_openai_timeout_seconds")]
    timeout_seconds: u64,
}

impl Default for RawOpenAiConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_openai_api_base_url(),
            timeout_seconds: default_openai_timeout_seconds(),
        }
    }
}

#[derive(Deserialize)]
struct RawChat {
    #[serde(default = "default_model")]
    default_model: String,
    #[serde(default = "default_system_prompt")]
    system_prompt: String,
    #[serde(default)]
    max_turns: Option<usize>,
}

impl Default for RawChat {
    fn default() -> Self {
        Self {
            default_model: default_model(),
            system_prompt: default_system_prompt(),
            max_turns: None,
        }
    }
}

fn default_bind() -> String { "127.0.0.1:5000".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_llm_provider() -> String { "openai".to_string() }
fn default_openai_api_base_url() -> String { "https://api.openai.com/v1/chat/completions".to_string() }
fn default_openai_timeout_seconds() -> u64 { 60 }
fn default_model() -> String { "gpt-3.5-turbo".to_string() }
fn default_system_prompt() -> String { DEFAULT_SYSTEM_PROMPT.to_string() }

/// Load config from `path` (default `config/default.toml`), then apply env-var overrides.
pub fn load(path: Option<&str>) -> Result<Config, AppError> {
    let bind_override = env::var("CHAT_RELAY_BIND").ok();
    let log_level_override = env::var("CHAT_RELAY_LOG_LEVEL").ok();
    let api_key = env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty());
    load_from(
        Path::new(path.unwrap_or(DEFAULT_CONFIG_PATH)),
        bind_override.as_deref(),
        log_level_override.as_deref(),
        api_key,
    )
}

/// Internal loader: accepts an explicit path and optional overrides.
/// Tests pass overrides directly instead of mutating env vars.
pub fn load_from(
    path: &Path,
    bind_override: Option<&str>,
    log_level_override: Option<&str>,
    api_key: Option<String>,
) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let parsed: RawConfig = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    resolve(parsed, bind_override, log_level_override, api_key)
}

fn resolve(
    parsed: RawConfig,
    bind_override: Option<&str>,
    log_level_override: Option<&str>,
    api_key: Option<String>,
) -> Result<Config, AppError> {
    let models = if parsed.models.is_empty() {
        ModelRegistry::default()
    } else {
        ModelRegistry::new(parsed.models)
    };

    if !models.contains(&parsed.chat.default_model) {
        return Err(AppError::Config(format!(
            "chat.default_model '{}' is not one of the configured models ({})",
            parsed.chat.default_model,
            models.keys().join(", ")
        )));
    }
    if parsed.chat.max_turns == Some(0) {
        return Err(AppError::Config("chat.max_turns must be at least 1 when set".into()));
    }

    let log_level = log_level_override.unwrap_or(&parsed.server.log_level).to_string();
    // Plain levels are checked here; full filter directives are left to the subscriber.
    if !logger::is_directive(&log_level) {
        logger::parse_level(&log_level).map_err(|e| AppError::Config(e.to_string()))?;
    }

    Ok(Config {
        bind: bind_override.unwrap_or(&parsed.server.bind).to_string(),
        log_level,
        llm: LlmConfig {
            provider: parsed.llm.provider,
            openai: OpenAiConfig {
                api_base_url: parsed.llm.openai.api_base_url,
                timeout_seconds: parsed.llm.openai.timeout_seconds,
            },
        },
        chat: ChatConfig {
            default_model: parsed.chat.default_model,
            system_prompt: parsed.chat.system_prompt,
            max_turns: parsed.chat.max_turns,
        },
        models,
        api_key,
    })
}

// ── offline defaults ──────────────────────────────────────────────────────────

impl Config {
    /// Built-in defaults with the offline `dummy` provider. Used by tests and
    /// as a starting point for embedding the relay in another binary.
    pub fn dummy() -> Self {
        Self {
            bind: default_bind(),
            log_level: default_log_level(),
            llm: LlmConfig {
                provider: "dummy".into(),
                openai: OpenAiConfig {
                    api_base_url: default_openai_api_base_url(),
                    timeout_seconds: default_openai_timeout_seconds(),
                },
            },
            chat: ChatConfig {
                default_model: default_model(),
                system_prompt: default_system_prompt(),
                max_turns: None,
            },
            models: ModelRegistry::default(),
            api_key: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL_TOML: &str = r#"
[server]
bind = "0.0.0.0:8080"
log_level = "debug"
"#;

    fn write_toml(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn parse_basic_config() {
        let f = write_toml(MINIMAL_TOML);
        let cfg = load_from(f.path(), None, None, None).unwrap();
        assert_eq!(cfg.bind, "0.0.0.0:8080");
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.llm.provider, "openai");
        assert_eq!(cfg.chat.default_model, "gpt-3.5-turbo");
        assert_eq!(cfg.chat.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(cfg.chat.max_turns, None);
        assert_eq!(cfg.models.keys(), vec!["gpt-4-0", "gpt-4", "gpt-3.5-turbo"]);
    }

    #[test]
    fn empty_file_uses_defaults() {
        let f = write_toml("");
        let cfg = load_from(f.path(), None, None, None).unwrap();
        assert_eq!(cfg.bind, "127.0.0.1:5000");
        assert_eq!(cfg.llm.openai.timeout_seconds, 60);
        assert!(cfg.api_key.is_none());
    }

    #[test]
    fn missing_file_errors() {
        let result = load_from(Path::new("/nonexistent/config.toml"), None, None, None);
        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("config error"));
    }

    #[test]
    fn malformed_toml_errors() {
        let f = write_toml("[server\nbind = ");
        let msg = load_from(f.path(), None, None, None).unwrap_err().to_string();
        assert!(msg.contains("parse error"));
    }

    #[test]
    fn env_overrides_win() {
        let f = write_toml(MINIMAL_TOML);
        let cfg = load_from(f.path(), Some("127.0.0.1:9999"), Some("trace"), Some("sk-x".into())).unwrap();
        assert_eq!(cfg.bind, "127.0.0.1:9999");
        assert_eq!(cfg.log_level, "trace");
        assert_eq!(cfg.api_key.as_deref(), Some("sk-x"));
    }

    #[test]
    fn custom_model_table_replaces_defaults() {
        let f = write_toml(
            r#"
[chat]
default_model = "llama3"
max_turns = 10

[[models]]
key = "llama3"
display_name = "Llama 3"
max_tokens = 2048
"#,
        );
        let cfg = load_from(f.path(), None, None, None).unwrap();
        assert_eq!(cfg.models.keys(), vec!["llama3"]);
        assert_eq!(cfg.chat.max_turns, Some(10));
    }

    #[test]
    fn default_model_must_be_registered() {
        let f = write_toml("[chat]\ndefault_model = \"gpt-5\"\n");
        let msg = load_from(f.path(), None, None, None).unwrap_err().to_string();
        assert!(msg.contains("gpt-5"));
    }

    #[test]
    fn bad_log_level_rejected() {
        let f = write_toml(MINIMAL_TOML);
        let msg = load_from(f.path(), None, Some("verbose"), None).unwrap_err().to_string();
        assert!(msg.contains("verbose"));
        // Filter directives pass through untouched.
        let cfg = load_from(f.path(), None, Some("info,tower_http=debug"), None).unwrap();
        assert_eq!(cfg.log_level, "info,tower_http=debug");
    }

    #[test]
    fn zero_max_turns_rejected() {
        let f = write_toml("[chat]\nmax_turns = 0\n");
        assert!(load_from(f.path(), None, None, None).is_err());
    }

    #[test]
    fn dummy_config_is_offline() {
        let cfg = Config::dummy();
        assert_eq!(cfg.llm.provider, "dummy");
        assert_eq!(cfg.models.len(), 3);
    }
}
