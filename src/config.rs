use std::{collections::HashMap, time::Duration};

/// Settings for the hosted text-generation collaborator, loaded from the environment.
#[derive(Clone, Debug)]
pub struct AiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self::from_map(&HashMap::new())
    }
}

impl AiConfig {
    pub fn from_env() -> Self {
        let mut values = HashMap::new();
        for key in Self::tracked_keys() {
            if let Ok(value) = std::env::var(key) {
                values.insert(key.to_string(), value);
            }
        }
        Self::from_map(&values)
    }

    pub fn from_map(values: &HashMap<String, String>) -> Self {
        fn read(values: &HashMap<String, String>, key: &str) -> Option<String> {
            values
                .get(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        }

        fn read_number<T: std::str::FromStr>(
            values: &HashMap<String, String>,
            key: &str,
            default: T,
        ) -> T {
            read(values, key)
                .and_then(|value| value.parse().ok())
                .unwrap_or(default)
        }

        let api_key = read(values, "GEMINI_API_KEY").or_else(|| read(values, "API_KEY"));
        let model =
            read(values, "RESEARCH_ADMIN_AI_MODEL").unwrap_or_else(|| "gemini-1.5-flash".into());
        let base_url = read(values, "RESEARCH_ADMIN_AI_BASE_URL")
            .unwrap_or_else(|| "https://generativelanguage.googleapis.com".into())
            .trim_end_matches('/')
            .to_string();

        Self {
            api_key,
            model,
            base_url,
            request_timeout: Duration::from_secs(read_number(
                values,
                "RESEARCH_ADMIN_AI_TIMEOUT_SECS",
                60,
            )),
            max_retries: read_number(values, "RESEARCH_ADMIN_AI_MAX_RETRIES", 2),
            initial_backoff: Duration::from_millis(read_number(
                values,
                "RESEARCH_ADMIN_AI_BACKOFF_MS",
                500,
            )),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn tracked_keys() -> [&'static str; 7] {
        [
            "GEMINI_API_KEY",
            "API_KEY",
            "RESEARCH_ADMIN_AI_MODEL",
            "RESEARCH_ADMIN_AI_BASE_URL",
            "RESEARCH_ADMIN_AI_TIMEOUT_SECS",
            "RESEARCH_ADMIN_AI_MAX_RETRIES",
            "RESEARCH_ADMIN_AI_BACKOFF_MS",
        ]
    }
}
