// Error logger: bounded in-memory ring with metrics
//
// Every recorded entry is mirrored to the tracing subscriber at the matching
// level; error-level entries are additionally forwarded to the external
// reporting sink when reporting is enabled. The ring keeps the most recent
// 1000 entries for metrics and diagnostics.
use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, RwLock};

use chrono::Utc;
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::config::{self, LogLevel};
use crate::error::{AppError, ErrorContext, ErrorSeverity, ErrorType};
use crate::host::ReportingSink;

const MAX_LOG_SIZE: usize = 1000;
const TOP_ERRORS_LIMIT: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub id: String,
    pub level: LogLevel,
    pub message: String,
    pub error: Option<AppError>,
    pub context: Option<ErrorContext>,
    /// Epoch milliseconds
    pub timestamp: i64,
    pub stack: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopError {
    /// `type:message` identity shared with the suppression set
    pub identity: String,
    pub error_type: ErrorType,
    pub count: u64,
    /// Epoch milliseconds of the latest occurrence
    pub last_occurrence: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorMetrics {
    pub total_errors: u64,
    pub errors_by_type: HashMap<ErrorType, u64>,
    pub errors_by_severity: HashMap<ErrorSeverity, u64>,
    pub top_errors: Vec<TopError>,
}

pub struct ErrorLogger {
    logs: Mutex<VecDeque<LogEntry>>,
    reporting_sink: RwLock<Option<Arc<dyn ReportingSink>>>,
}

impl ErrorLogger {
    pub fn new() -> Self {
        Self {
            logs: Mutex::new(VecDeque::with_capacity(MAX_LOG_SIZE)),
            reporting_sink: RwLock::new(None),
        }
    }

    pub fn set_reporting_sink(&self, sink: Arc<dyn ReportingSink>) {
        *self
            .reporting_sink
            .write()
            .unwrap_or_else(|e| e.into_inner()) = Some(sink);
    }

    pub fn log(
        &self,
        level: LogLevel,
        message: impl Into<String>,
        error: Option<AppError>,
        context: Option<ErrorContext>,
    ) {
        let cfg = config::config();
        if !cfg.error_logging {
            return;
        }
        if level > cfg.log_level {
            return;
        }

        let message = message.into();
        let entry = LogEntry {
            id: uuid::Uuid::new_v4().to_string(),
            level,
            message,
            stack: error.as_ref().and_then(|e| e.stack.clone()),
            error,
            context,
            timestamp: Utc::now().timestamp_millis(),
        };

        self.push(entry.clone());
        mirror_to_tracing(&entry);

        if cfg.error_reporting && level == LogLevel::Error {
            let sink = self
                .reporting_sink
                .read()
                .unwrap_or_else(|e| e.into_inner())
                .clone();
            if let Some(sink) = sink {
                match serde_json::to_value(&entry) {
                    Ok(record) => sink.report(record),
                    Err(e) => tracing::warn!("failed to serialize log entry for reporting: {}", e),
                }
            }
        }
    }

    pub fn error(&self, message: impl Into<String>, error: Option<AppError>) {
        self.log(LogLevel::Error, message, error, None);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message, None, None);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message, None, None);
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message, None, None);
    }

    /// Record an AppError at error level with its own context attached
    pub fn record(&self, error: &AppError) {
        self.log(
            LogLevel::Error,
            error.developer_message.clone(),
            Some(error.clone()),
            Some(error.context.clone()),
        );
    }

    pub fn logs(&self) -> Vec<LogEntry> {
        self.logs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .cloned()
            .collect()
    }

    pub fn logs_by_level(&self, level: LogLevel) -> Vec<LogEntry> {
        self.logs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|entry| entry.level == level)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.logs.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.logs.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    /// Aggregate view over the error-level entries currently in the ring
    pub fn metrics(&self) -> ErrorMetrics {
        let logs = self.logs.lock().unwrap_or_else(|e| e.into_inner());

        let mut errors_by_type: HashMap<ErrorType, u64> = HashMap::new();
        let mut errors_by_severity: HashMap<ErrorSeverity, u64> = HashMap::new();
        for t in ErrorType::ALL {
            errors_by_type.insert(t, 0);
        }
        for s in ErrorSeverity::ALL {
            errors_by_severity.insert(s, 0);
        }

        let mut total = 0u64;
        let mut counts: HashMap<String, TopError> = HashMap::new();
        for entry in logs.iter() {
            let Some(error) = entry.error.as_ref().filter(|_| entry.level == LogLevel::Error)
            else {
                continue;
            };
            total += 1;
            *errors_by_type.entry(error.error_type).or_default() += 1;
            *errors_by_severity.entry(error.severity).or_default() += 1;

            let identity = error.identity();
            counts
                .entry(identity.clone())
                .and_modify(|top| {
                    top.count += 1;
                    top.last_occurrence = top.last_occurrence.max(error.timestamp);
                })
                .or_insert(TopError {
                    identity,
                    error_type: error.error_type,
                    count: 1,
                    last_occurrence: error.timestamp,
                });
        }

        let mut top_errors: Vec<TopError> = counts.into_values().collect();
        top_errors.sort_by(|a, b| b.count.cmp(&a.count));
        top_errors.truncate(TOP_ERRORS_LIMIT);

        ErrorMetrics {
            total_errors: total,
            errors_by_type,
            errors_by_severity,
            top_errors,
        }
    }

    /// Drop ring contents and the reporting sink. Test isolation only.
    pub fn reset_for_tests(&self) {
        self.clear();
        *self
            .reporting_sink
            .write()
            .unwrap_or_else(|e| e.into_inner()) = None;
    }

    fn push(&self, entry: LogEntry) {
        let mut logs = self.logs.lock().unwrap_or_else(|e| e.into_inner());
        if logs.len() == MAX_LOG_SIZE {
            logs.pop_front();
        }
        logs.push_back(entry);
    }
}

fn mirror_to_tracing(entry: &LogEntry) {
    match entry.level {
        LogLevel::Error => tracing::error!(entry_id = %entry.id, "{}", entry.message),
        LogLevel::Warn => tracing::warn!(entry_id = %entry.id, "{}", entry.message),
        LogLevel::Info => tracing::info!(entry_id = %entry.id, "{}", entry.message),
        LogLevel::Debug => tracing::debug!(entry_id = %entry.id, "{}", entry.message),
    }
}

// Process-wide logger instance
static LOGGER: Lazy<ErrorLogger> = Lazy::new(ErrorLogger::new);

pub fn logger() -> &'static ErrorLogger {
    &LOGGER
}

/// Install a console subscriber for the tracing mirror, honoring RUST_LOG.
/// Hosts that already run their own subscriber skip this; calling it twice
/// is harmless.
pub fn init_console_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
