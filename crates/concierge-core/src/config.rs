//! Service configuration.
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | app_name | Concierge | Name used in startup logs. |
//! | host / port | 127.0.0.1 / 8000 | Gateway bind address. |
//! | storage_path | ./data/faq_store | Sled directory for the FAQ store. |
//! | seed_path | none | JSONL file imported when the store is empty. |
//! | llm_api_url | https://openrouter.ai/api/v1 | OpenAI-compatible base URL. |
//! | llm_model | openai/gpt-4-turbo | Fixed model for every generation. |
//! | llm_api_key | none | Falls back to OPENROUTER_API_KEY, then OPENAI_API_KEY. |
//! | lookup_timeout_secs | 5 | Bound on one knowledge-base lookup. |
//! | generation_timeout_secs | 60 | Bound on one generation call. |
//! | reject_empty_generation | false | Fail instead of answering empty when generation has no text. |
//!
//! Precedence: `CONCIERGE__*` env > file at `CONCIERGE_CONFIG` (default `config/concierge.toml`) > defaults.

use crate::generation::{DEFAULT_API_URL, DEFAULT_MODEL};
use crate::router::{EmptyGenerationPolicy, RouterSettings};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const DEFAULT_CONFIG_PATH: &str = "config/concierge.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConciergeConfig {
    pub app_name: String,
    pub host: String,
    pub port: u16,
    pub storage_path: String,
    #[serde(default)]
    pub seed_path: Option<String>,
    pub llm_api_url: String,
    pub llm_model: String,
    #[serde(default)]
    pub llm_api_key: Option<String>,
    pub lookup_timeout_secs: u64,
    pub generation_timeout_secs: u64,
    #[serde(default)]
    pub reject_empty_generation: bool,
}

impl Default for ConciergeConfig {
    fn default() -> Self {
        Self {
            app_name: "Concierge".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8000,
            storage_path: "./data/faq_store".to_string(),
            seed_path: None,
            llm_api_url: DEFAULT_API_URL.to_string(),
            llm_model: DEFAULT_MODEL.to_string(),
            llm_api_key: None,
            lookup_timeout_secs: 5,
            generation_timeout_secs: 60,
            reject_empty_generation: false,
        }
    }
}

impl ConciergeConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("CONCIERGE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(Path::new(&config_path))
    }

    /// Defaults, then the file at `path` if it exists, then `CONCIERGE__*` env.
    pub fn load_from(path: &Path) -> Result<Self, config::ConfigError> {
        let d = Self::default();
        let builder = config::Config::builder()
            .set_default("app_name", d.app_name)?
            .set_default("host", d.host)?
            .set_default("port", i64::from(d.port))?
            .set_default("storage_path", d.storage_path)?
            .set_default("llm_api_url", d.llm_api_url)?
            .set_default("llm_model", d.llm_model)?
            .set_default("lookup_timeout_secs", d.lookup_timeout_secs as i64)?
            .set_default("generation_timeout_secs", d.generation_timeout_secs as i64)?
            .set_default("reject_empty_generation", d.reject_empty_generation)?;

        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder
        };

        builder
            .add_source(config::Environment::with_prefix("CONCIERGE").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Configured key, else OPENROUTER_API_KEY, else OPENAI_API_KEY. Blank values count as unset.
    pub fn api_key(&self) -> Option<String> {
        self.llm_api_key
            .clone()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| std::env::var("OPENROUTER_API_KEY").ok())
            .filter(|s| !s.trim().is_empty())
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|s| !s.trim().is_empty())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    pub fn router_settings(&self) -> RouterSettings {
        RouterSettings {
            model: self.llm_model.clone(),
            lookup_timeout: Duration::from_secs(self.lookup_timeout_secs),
            generation_timeout: self.generation_timeout(),
            empty_generation: if self.reject_empty_generation {
                EmptyGenerationPolicy::Reject
            } else {
                EmptyGenerationPolicy::Accept
            },
            ..RouterSettings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, MutexGuard};

    // Tests that read or write process env must not interleave.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Sets variables for one test and restores the previous values on drop.
    struct ScopedEnv {
        saved: Vec<(&'static str, Option<String>)>,
        _lock: MutexGuard<'static, ()>,
    }

    impl ScopedEnv {
        fn set(vars: &[(&'static str, Option<&str>)]) -> Self {
            let lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
            let mut saved = Vec::new();
            for (key, value) in vars {
                saved.push((*key, std::env::var(key).ok()));
                match value {
                    Some(v) => std::env::set_var(key, v),
                    None => std::env::remove_var(key),
                }
            }
            Self { saved, _lock: lock }
        }
    }

    impl Drop for ScopedEnv {
        fn drop(&mut self) {
            for (key, value) in self.saved.drain(..) {
                match value {
                    Some(v) => std::env::set_var(key, v),
                    None => std::env::remove_var(key),
                }
            }
        }
    }

    const CONCIERGE_VARS: [(&str, Option<&str>); 3] = [
        ("CONCIERGE__PORT", None),
        ("CONCIERGE__APP_NAME", None),
        ("CONCIERGE__LLM_MODEL", None),
    ];

    #[test]
    fn file_values_override_defaults() {
        let _env = ScopedEnv::set(&CONCIERGE_VARS);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("concierge.toml");
        std::fs::write(
            &path,
            "app_name = \"Hotel Adriatic\"\nport = 9100\nlookup_timeout_secs = 2\nreject_empty_generation = true\n",
        )
        .unwrap();

        let cfg = ConciergeConfig::load_from(&path).unwrap();
        assert_eq!(cfg.app_name, "Hotel Adriatic");
        assert_eq!(cfg.port, 9100);
        assert_eq!(cfg.llm_model, DEFAULT_MODEL);

        let settings = cfg.router_settings();
        assert_eq!(settings.lookup_timeout, Duration::from_secs(2));
        assert_eq!(settings.empty_generation, EmptyGenerationPolicy::Reject);
    }

    #[test]
    fn missing_file_means_defaults() {
        let _env = ScopedEnv::set(&CONCIERGE_VARS);
        let cfg = ConciergeConfig::load_from(Path::new("does/not/exist.toml")).unwrap();
        assert_eq!(cfg.bind_addr(), "127.0.0.1:8000");
        assert_eq!(cfg.router_settings().empty_generation, EmptyGenerationPolicy::Accept);
    }

    #[test]
    fn explicit_key_wins() {
        let cfg = ConciergeConfig {
            llm_api_key: Some("sk-test".into()),
            ..ConciergeConfig::default()
        };
        assert_eq!(cfg.api_key().as_deref(), Some("sk-test"));
    }

    #[test]
    fn env_overrides_file() {
        let _env = ScopedEnv::set(&[
            ("CONCIERGE__PORT", Some("9200")),
            ("CONCIERGE__LLM_MODEL", Some("openai/gpt-4o-mini")),
            ("CONCIERGE__APP_NAME", None),
        ]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("concierge.toml");
        std::fs::write(
            &path,
            "app_name = \"Hotel Adriatic\"\nport = 9100\nllm_model = \"openai/gpt-4-turbo\"\n",
        )
        .unwrap();

        let cfg = ConciergeConfig::load_from(&path).unwrap();
        assert_eq!(cfg.port, 9200);
        assert_eq!(cfg.llm_model, "openai/gpt-4o-mini");
        assert_eq!(cfg.app_name, "Hotel Adriatic");
        assert_eq!(cfg.router_settings().model, "openai/gpt-4o-mini");
    }

    #[test]
    fn api_key_falls_back_through_env() {
        let cfg = ConciergeConfig::default();

        {
            let _env = ScopedEnv::set(&[
                ("OPENROUTER_API_KEY", Some("sk-or")),
                ("OPENAI_API_KEY", Some("sk-oa")),
            ]);
            assert_eq!(cfg.api_key().as_deref(), Some("sk-or"));
        }
        {
            let _env = ScopedEnv::set(&[
                ("OPENROUTER_API_KEY", Some("   ")),
                ("OPENAI_API_KEY", Some("sk-oa")),
            ]);
            assert_eq!(cfg.api_key().as_deref(), Some("sk-oa"));
        }
        {
            let _env = ScopedEnv::set(&[
                ("OPENROUTER_API_KEY", None),
                ("OPENAI_API_KEY", Some("")),
            ]);
            assert_eq!(cfg.api_key(), None);
        }
    }

    #[test]
    fn blank_configured_key_falls_back() {
        let _env = ScopedEnv::set(&[
            ("OPENROUTER_API_KEY", Some("sk-or")),
            ("OPENAI_API_KEY", None),
        ]);
        let cfg = ConciergeConfig {
            llm_api_key: Some("  ".into()),
            ..ConciergeConfig::default()
        };
        assert_eq!(cfg.api_key().as_deref(), Some("sk-or"));
    }
}
