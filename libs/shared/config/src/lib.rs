use std::env;
use std::time::Duration;
use tracing::warn;

const DEFAULT_DIRECTORY_URL: &str = "http://localhost:5000";
const DEFAULT_GEMINI_MODEL: &str = "gemma-3n-e4b-it";
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub schedule_seed_path: Option<String>,
    pub storage_timeout_ms: u64,
    pub booking_max_retries: u32,
    pub strict_name_matching: bool,
    pub doctor_directory_url: String,
    pub directory_timeout_secs: u64,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub server_port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            schedule_seed_path: None,
            storage_timeout_ms: 5_000,
            booking_max_retries: 3,
            strict_name_matching: false,
            doctor_directory_url: DEFAULT_DIRECTORY_URL.to_string(),
            directory_timeout_secs: 10,
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            server_port: 3000,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Missing or
    /// unparsable values fall back to defaults with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let config = Self {
            supabase_url: non_empty("SUPABASE_URL").unwrap_or_else(|| {
                warn!("SUPABASE_URL not set, schedule will use in-memory storage");
                String::new()
            }),
            supabase_anon_key: non_empty("SUPABASE_ANON_PUBLIC_KEY").unwrap_or_else(|| {
                warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                String::new()
            }),
            schedule_seed_path: non_empty("SCHEDULE_SEED_PATH"),
            storage_timeout_ms: parse_or(&lookup, "SCHEDULE_STORAGE_TIMEOUT_MS", defaults.storage_timeout_ms),
            booking_max_retries: parse_or(&lookup, "SCHEDULE_BOOKING_MAX_RETRIES", defaults.booking_max_retries),
            strict_name_matching: parse_or(&lookup, "SCHEDULE_STRICT_NAME_MATCH", defaults.strict_name_matching),
            doctor_directory_url: non_empty("DOCTOR_DIRECTORY_URL").unwrap_or_else(|| {
                warn!("DOCTOR_DIRECTORY_URL not set, using default");
                defaults.doctor_directory_url.clone()
            }),
            directory_timeout_secs: parse_or(&lookup, "DOCTOR_DIRECTORY_TIMEOUT_SECS", defaults.directory_timeout_secs),
            gemini_api_key: non_empty("GEMINI_API_KEY"),
            gemini_model: non_empty("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            gemini_base_url: non_empty("GEMINI_BASE_URL").unwrap_or(defaults.gemini_base_url),
            server_port: parse_or(&lookup, "PORT", defaults.server_port),
        };

        if !config.is_llm_configured() {
            warn!("GEMINI_API_KEY not set - chat fallback will report a missing key");
        }

        config
    }

    pub fn is_storage_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()
    }

    pub fn is_llm_configured(&self) -> bool {
        self.gemini_api_key.is_some()
    }

    pub fn storage_timeout(&self) -> Duration {
        Duration::from_millis(self.storage_timeout_ms)
    }

    pub fn directory_timeout(&self) -> Duration {
        Duration::from_secs(self.directory_timeout_secs)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + std::fmt::Debug,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value {:?}, using default {:?}", key, raw, default);
            default
        }),
        _ => default,
    }
}
