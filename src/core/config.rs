use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::openai::RetryPolicy;

#[derive(Clone)]
pub struct AppConfig {
    pub openai_api_hostname: String,
    pub openai_api_key: String,
    pub openai_model: String,
    pub max_tokens: u32,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub static_dir: String,
}

impl AppConfig {
    /// Reads configuration from the process environment. This should
    /// only be called once at startup, everything downstream gets the
    /// values passed in explicitly.
    pub fn from_env() -> Self {
        let openai_api_hostname = env::var("CHATBOT_LLM_HOST")
            .unwrap_or_else(|_| "https://api.openai.com".to_string());
        let openai_api_key = env::var("OPENAI_API_KEY").unwrap_or_default();
        if openai_api_key.is_empty() {
            tracing::warn!("OPENAI_API_KEY is not set, completion requests will be rejected");
        }
        let openai_model =
            env::var("CHATBOT_LLM_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".to_string());
        let max_tokens = parse_env_or("CHATBOT_MAX_TOKENS", 500);
        let max_retries = parse_env_or("CHATBOT_MAX_RETRIES", 2);
        let retry_delay_ms = parse_env_or("CHATBOT_RETRY_DELAY_MS", 2000);
        let static_dir =
            env::var("CHATBOT_STATIC_DIR").unwrap_or_else(|_| "./web-ui/src".to_string());

        Self {
            openai_api_hostname,
            openai_api_key,
            openai_model,
            max_tokens,
            max_retries,
            retry_delay_ms,
            static_dir,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.retry_delay_ms))
    }
}

// Never print the API key
impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("openai_api_hostname", &self.openai_api_hostname)
            .field("openai_api_key", &"<redacted>")
            .field("openai_model", &self.openai_model)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("static_dir", &self.static_dir)
            .finish()
    }
}

fn parse_env_or<T: FromStr + Copy + fmt::Display>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(val) => val.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid value for {}: {:?}, using {}", key, val, default);
            default
        }),
        Err(_) => default,
    }
}
