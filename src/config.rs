use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::sync::RwLock;

/// Minimum level a log entry must have to pass the filter. Ordering matters:
/// `Error` is the quietest setting, `Debug` lets everything through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "error" => Some(LogLevel::Error),
            "warn" | "warning" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

/// Runtime configuration for the whole client.
///
/// Loaded once at startup from the environment; tests adjust it through
/// `set_config` / `reset_for_tests`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Request origin, e.g. `https://api.example.com/api`
    pub base_url: String,
    /// Per-request deadline in milliseconds
    pub request_timeout_ms: u64,
    /// Mirror log entries to the tracing subscriber
    pub error_logging: bool,
    /// Forward error-level entries to the external reporting sink
    pub error_reporting: bool,
    /// Default retry budget for recoverable operations
    pub max_retries: u32,
    /// Base retry delay in milliseconds
    pub retry_delay_ms: u64,
    pub log_level: LogLevel,
    /// Surface developer messages in boundary UIs
    pub show_error_details: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://upskilling-egypt.com:3005/api".to_string(),
            request_timeout_ms: 10_000,
            error_logging: true,
            error_reporting: true,
            max_retries: 3,
            retry_delay_ms: 1_000,
            log_level: LogLevel::Error,
            show_error_details: false,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        // Load .env if present so standalone runs pick up QUIZHUB_* settings
        let _ = dotenvy::dotenv();
        Self::default().with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("QUIZHUB_BASE_URL") {
            if !v.is_empty() {
                self.base_url = v;
            }
        }
        if let Ok(v) = env::var("QUIZHUB_REQUEST_TIMEOUT_MS") {
            self.request_timeout_ms = v.parse().unwrap_or(self.request_timeout_ms);
        }
        if let Ok(v) = env::var("QUIZHUB_ERROR_LOGGING") {
            self.error_logging = v.parse().unwrap_or(self.error_logging);
        }
        if let Ok(v) = env::var("QUIZHUB_ERROR_REPORTING") {
            self.error_reporting = v.parse().unwrap_or(self.error_reporting);
        }
        if let Ok(v) = env::var("QUIZHUB_MAX_RETRIES") {
            self.max_retries = v.parse().unwrap_or(self.max_retries);
        }
        if let Ok(v) = env::var("QUIZHUB_RETRY_DELAY_MS") {
            self.retry_delay_ms = v.parse().unwrap_or(self.retry_delay_ms);
        }
        if let Ok(v) = env::var("QUIZHUB_LOG_LEVEL") {
            self.log_level = LogLevel::parse(&v).unwrap_or(self.log_level);
        }
        if let Ok(v) = env::var("QUIZHUB_SHOW_ERROR_DETAILS") {
            self.show_error_details = v.parse().unwrap_or(self.show_error_details);
        }
        self
    }
}

// Global singleton config - initialized once at startup, adjustable for tests
static CONFIG: Lazy<RwLock<ClientConfig>> = Lazy::new(|| RwLock::new(ClientConfig::from_env()));

/// Snapshot of the current configuration
pub fn config() -> ClientConfig {
    CONFIG.read().unwrap_or_else(|e| e.into_inner()).clone()
}

/// Replace the whole configuration
pub fn set_config(new: ClientConfig) {
    *CONFIG.write().unwrap_or_else(|e| e.into_inner()) = new;
}

/// Apply a partial update in place
pub fn update_config(f: impl FnOnce(&mut ClientConfig)) {
    let mut guard = CONFIG.write().unwrap_or_else(|e| e.into_inner());
    f(&mut guard);
}

/// Restore defaults, ignoring the environment. Test isolation only.
pub fn reset_for_tests() {
    *CONFIG.write().unwrap_or_else(|e| e.into_inner()) = ClientConfig::default();
}

// Tests in several modules adjust the global config; they serialize on this
// so a temporary override in one cannot skew assertions in another.
#[cfg(test)]
pub(crate) static TEST_GUARD: std::sync::Mutex<()> = std::sync::Mutex::new(());
