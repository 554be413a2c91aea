use serde::Deserialize;
use std::env;

use crate::models::GeoPoint;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

/// First non-empty value among the given environment variables.
fn first_env(vars: &[&str]) -> Option<String> {
    vars.iter()
        .filter_map(|var| env::var(var).ok())
        .map(|val| val.trim().to_string())
        .find(|val| !val.is_empty())
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub locale: LocaleConfig,
    pub llm: Option<LlmConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// City scoping for queries, prompts and the default map viewport.
#[derive(Debug, Clone, Deserialize)]
pub struct LocaleConfig {
    pub city: String,
    pub country: String,
    pub default_center: GeoPoint,
    pub default_zoom: u8,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            city: "Seoul".to_string(),
            country: "Korea".to_string(),
            default_center: GeoPoint {
                latitude: 37.5665,
                longitude: 126.9780,
            },
            default_zoom: 11,
        }
    }
}

/// LLM configuration for the search and chat models
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// `provider/model` used for place searches.
    pub model: String,
    /// `provider/model` used for the chat assistant. Falls back to `model`.
    pub chat_model: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl LlmConfig {
    pub fn chat_model(&self) -> &str {
        self.chat_model.as_deref().unwrap_or(&self.model)
    }
}

impl Default for Config {
    fn default() -> Self {
        let locale_defaults = LocaleConfig::default();

        Self {
            server: ServerConfig {
                host: env::var("BITES_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or("BITES_PORT", 3000),
            },
            locale: LocaleConfig {
                city: first_env(&["BITES_CITY"]).unwrap_or(locale_defaults.city),
                country: first_env(&["BITES_COUNTRY"]).unwrap_or(locale_defaults.country),
                default_center: GeoPoint {
                    latitude: parse_env_or(
                        "BITES_DEFAULT_LAT",
                        locale_defaults.default_center.latitude,
                    ),
                    longitude: parse_env_or(
                        "BITES_DEFAULT_LNG",
                        locale_defaults.default_center.longitude,
                    ),
                },
                default_zoom: parse_env_or("BITES_DEFAULT_ZOOM", locale_defaults.default_zoom),
            },
            llm: first_env(&["LLM_MODEL"]).map(|model| LlmConfig {
                model,
                chat_model: first_env(&["LLM_CHAT_MODEL"]),
                api_key: first_env(&["LLM_API_KEY", "GEMINI_API_KEY", "API_KEY"]),
                base_url: first_env(&["LLM_BASE_URL"]),
                timeout_secs: parse_env_or("LLM_TIMEOUT", 30),
                max_retries: parse_env_or("LLM_MAX_RETRIES", 2),
            }),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}

/// Known LLM providers. `gemini` speaks the native generateContent API, the
/// rest are OpenAI-compatible.
pub const KNOWN_LLM_PROVIDERS: &[&str] = &["gemini", "openai", "openrouter", "ollama", "lmstudio"];

/// Parse an LLM model name into (provider, model) tuple.
pub fn parse_llm_provider_model(model: &str) -> (&str, &str) {
    if let Some((prefix, rest)) = model.split_once('/') {
        let prefix_lower = prefix.to_lowercase();
        if KNOWN_LLM_PROVIDERS.contains(&prefix_lower.as_str()) {
            return (prefix, rest);
        }
    }
    // Default to treating the whole string as a local model
    ("local", model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_llm_env() {
        for var in [
            "LLM_MODEL",
            "LLM_CHAT_MODEL",
            "LLM_API_KEY",
            "GEMINI_API_KEY",
            "API_KEY",
            "LLM_BASE_URL",
            "LLM_TIMEOUT",
            "LLM_MAX_RETRIES",
        ] {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_llm_config_absent_without_model() {
        clear_llm_env();
        let config = Config::default();
        assert!(config.llm.is_none());
    }

    #[test]
    #[serial]
    fn test_llm_config_from_env() {
        clear_llm_env();
        std::env::set_var("LLM_MODEL", "gemini/gemini-2.5-flash");
        std::env::set_var("LLM_CHAT_MODEL", "gemini/gemini-3-pro-preview");
        std::env::set_var("LLM_API_KEY", "secret");
        std::env::set_var("LLM_TIMEOUT", "12");

        let llm = Config::default().llm.expect("llm config");
        assert_eq!(llm.model, "gemini/gemini-2.5-flash");
        assert_eq!(llm.chat_model(), "gemini/gemini-3-pro-preview");
        assert_eq!(llm.api_key.as_deref(), Some("secret"));
        assert_eq!(llm.timeout_secs, 12);
        assert_eq!(llm.max_retries, 2);

        clear_llm_env();
    }

    #[test]
    #[serial]
    fn test_api_key_falls_back_to_gemini_key() {
        clear_llm_env();
        std::env::set_var("LLM_MODEL", "gemini/gemini-2.5-flash");
        std::env::set_var("GEMINI_API_KEY", "from-gemini");

        let llm = Config::default().llm.expect("llm config");
        assert_eq!(llm.api_key.as_deref(), Some("from-gemini"));
        assert_eq!(llm.chat_model(), "gemini/gemini-2.5-flash");

        clear_llm_env();
    }

    #[test]
    #[serial]
    fn test_locale_defaults() {
        std::env::remove_var("BITES_CITY");
        std::env::remove_var("BITES_DEFAULT_LAT");
        let config = Config::default();
        assert_eq!(config.locale.city, "Seoul");
        assert_eq!(config.locale.country, "Korea");
        assert_eq!(config.locale.default_center.latitude, 37.5665);
        assert_eq!(config.locale.default_zoom, 11);
    }

    #[test]
    #[serial]
    fn test_invalid_numeric_env_uses_default() {
        std::env::set_var("BITES_PORT", "not-a-port");
        let config = Config::default();
        assert_eq!(config.server.port, 3000);
        std::env::remove_var("BITES_PORT");
    }

    #[test]
    fn test_parse_llm_provider_model() {
        assert_eq!(
            parse_llm_provider_model("gemini/gemini-2.5-flash"),
            ("gemini", "gemini-2.5-flash")
        );
        assert_eq!(
            parse_llm_provider_model("openrouter/openai/gpt-4o"),
            ("openrouter", "openai/gpt-4o")
        );
        assert_eq!(parse_llm_provider_model("llama3"), ("local", "llama3"));
    }
}
