// Global error capture
//
// Process-wide funnel for failures: records every error in the logger ring,
// throttles user-visible surfaces (at most one per second, at most 100 per
// session, suppressed identities dropped), and drives the declarative
// auto-recovery policy. Installed once at startup; `reset_for_tests`
// restores a clean slate between tests.
use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;

use crate::error::{AppError, ErrorSeverity, ErrorType};
use crate::host::{ConnectivityProbe, Navigator, NotificationSink, Toast};
use crate::logger::logger;

const SURFACE_THROTTLE: Duration = Duration::from_millis(1000);
const MAX_SURFACES_PER_SESSION: u32 = 100;
const NETWORK_RECOVERY_DELAY: Duration = Duration::from_secs(5);
const AUTH_REDIRECT_DELAY: Duration = Duration::from_secs(2);

#[derive(Default)]
struct HandlerState {
    installed: bool,
    last_surface: Option<Instant>,
    session_surface_count: u32,
    suppressed: HashSet<String>,
}

pub struct GlobalErrorHandler {
    state: Mutex<HandlerState>,
    notifications: RwLock<Option<Arc<dyn NotificationSink>>>,
    navigator: RwLock<Option<Arc<dyn Navigator>>>,
    probe: RwLock<Option<Arc<dyn ConnectivityProbe>>>,
}

impl GlobalErrorHandler {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(HandlerState::default()),
            notifications: RwLock::new(None),
            navigator: RwLock::new(None),
            probe: RwLock::new(None),
        }
    }

    /// Install the process-wide capture hooks. Safe to call more than once;
    /// only the first call takes effect.
    pub fn install(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.installed {
            return;
        }
        state.installed = true;
        drop(state);

        // Runtime errors that never reach a Result: capture panics with a
        // severity derived from the panic message.
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let message = panic_message(info);
            let severity = runtime_error_severity(&message);
            let err = AppError::unexpected(format!("panic: {}", message))
                .with_severity(severity)
                .recoverable(false)
                .with_stack(info.location().map(|l| l.to_string()).unwrap_or_default());
            handler().capture_error(&err);
            previous(info);
        }));

        logger().info("global error handler installed");
    }

    pub fn uninstall(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if !state.installed {
            return;
        }
        state.installed = false;
        drop(state);
        let _ = std::panic::take_hook();
        logger().info("global error handler uninstalled");
    }

    pub fn set_notification_sink(&self, sink: Arc<dyn NotificationSink>) {
        *self
            .notifications
            .write()
            .unwrap_or_else(|e| e.into_inner()) = Some(sink);
    }

    pub fn set_navigator(&self, navigator: Arc<dyn Navigator>) {
        *self.navigator.write().unwrap_or_else(|e| e.into_inner()) = Some(navigator);
    }

    pub fn set_connectivity_probe(&self, probe: Arc<dyn ConnectivityProbe>) {
        *self.probe.write().unwrap_or_else(|e| e.into_inner()) = Some(probe);
    }

    /// Funnel one error through record -> throttle -> surface -> recovery
    pub fn capture_error(&self, err: &AppError) {
        // The log ring sees everything; only the surface is throttled
        logger().record(err);

        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.suppressed.contains(&err.identity()) {
            return;
        }
        let now = Instant::now();
        if let Some(last) = state.last_surface {
            if now.duration_since(last) < SURFACE_THROTTLE {
                return;
            }
        }
        if state.session_surface_count >= MAX_SURFACES_PER_SESSION {
            return;
        }
        state.last_surface = Some(now);
        state.session_surface_count += 1;
        drop(state);

        let sink = self
            .notifications
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        if let Some(sink) = sink {
            sink.notify(Toast::for_severity(err.severity, err.user_message.clone()));
        }

        self.attempt_auto_recovery(err);
    }

    /// Mark an identity (`type:message`) as silently dropped
    pub fn suppress(&self, error_type: ErrorType, message: &str) {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .suppressed
            .insert(format!("{}:{}", error_type.as_str(), message));
    }

    pub fn unsuppress(&self, error_type: ErrorType, message: &str) {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .suppressed
            .remove(&format!("{}:{}", error_type.as_str(), message));
    }

    pub fn session_surface_count(&self) -> u32 {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .session_surface_count
    }

    pub fn reset_session_surface_count(&self) {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .session_surface_count = 0;
    }

    /// Clear all throttle state, suppressions and host wiring. Test isolation.
    pub fn reset_for_tests(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.last_surface = None;
        state.session_surface_count = 0;
        state.suppressed.clear();
        drop(state);
        *self
            .notifications
            .write()
            .unwrap_or_else(|e| e.into_inner()) = None;
        *self.navigator.write().unwrap_or_else(|e| e.into_inner()) = None;
        *self.probe.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    fn attempt_auto_recovery(&self, err: &AppError) {
        // Timers need a runtime; when called from sync test contexts there
        // is none, and recovery is simply skipped.
        let Ok(rt) = tokio::runtime::Handle::try_current() else {
            return;
        };

        match err.error_type {
            ErrorType::NetworkError if err.recoverable => {
                let probe = self.probe.read().unwrap_or_else(|e| e.into_inner()).clone();
                let navigator = self
                    .navigator
                    .read()
                    .unwrap_or_else(|e| e.into_inner())
                    .clone();
                rt.spawn(async move {
                    tokio::time::sleep(NETWORK_RECOVERY_DELAY).await;
                    let online = match probe {
                        Some(probe) => probe.is_online().await,
                        None => false,
                    };
                    if online {
                        if let Some(navigator) = navigator {
                            navigator.reload();
                        }
                    }
                });
            }
            ErrorType::AuthenticationError => {
                let navigator = self
                    .navigator
                    .read()
                    .unwrap_or_else(|e| e.into_inner())
                    .clone();
                rt.spawn(async move {
                    tokio::time::sleep(AUTH_REDIRECT_DELAY).await;
                    if let Some(navigator) = navigator {
                        navigator.navigate("/login");
                    }
                });
            }
            _ => {}
        }
    }
}

impl Default for GlobalErrorHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(info: &std::panic::PanicHookInfo<'_>) -> String {
    if let Some(s) = info.payload().downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = info.payload().downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Severity for runtime errors that carry only a message
fn runtime_error_severity(message: &str) -> ErrorSeverity {
    let lower = message.to_lowercase();
    if lower.contains("out of memory") || lower.contains("stack overflow") {
        ErrorSeverity::Critical
    } else if lower.contains("network") || lower.contains("fetch") {
        ErrorSeverity::High
    } else {
        ErrorSeverity::Medium
    }
}

// Process-wide handler instance
static HANDLER: Lazy<GlobalErrorHandler> = Lazy::new(GlobalErrorHandler::new);

pub fn handler() -> &'static GlobalErrorHandler {
    &HANDLER
}

/// Shorthand used by the pipeline and orchestrator
pub fn capture(err: &AppError) {
    handler().capture_error(err);
}

/// Spawn a background task whose failure is captured instead of lost.
/// The async analogue of an unhandled-rejection hook.
pub fn spawn_captured<F>(label: &'static str, future: F) -> tokio::task::JoinHandle<()>
where
    F: Future<Output = Result<(), AppError>> + Send + 'static,
{
    tokio::spawn(async move {
        match future.await {
            Ok(()) => {}
            Err(err) => {
                let err = AppError::unexpected(format!(
                    "background task '{}' failed: {}",
                    label, err.developer_message
                ))
                .with_severity(ErrorSeverity::High)
                .recoverable(false)
                .with_original(err);
                capture(&err);
            }
        }
    })
}

/// Report a failed asset load (script, image, stylesheet, audio)
pub fn report_resource_failure(kind: &str, url: &str) {
    let err = AppError::network(format!("resource loading failed: {} - {}", kind, url))
        .with_severity(ErrorSeverity::Medium)
        .with_url(url);
    capture(&err);
}

/// Observe an HTTP call made outside the request pipeline: same
/// classification, same capture funnel.
pub async fn observed_fetch(
    builder: reqwest::RequestBuilder,
) -> Result<reqwest::Response, AppError> {
    match builder.send().await {
        Ok(response) => {
            let status = response.status().as_u16();
            if !(200..300).contains(&status) {
                let err = AppError::from_status(
                    status,
                    format!("http error: {} {}", status, response.url()),
                )
                .with_url(response.url().as_str());
                capture(&err);
            }
            Ok(response)
        }
        Err(e) => {
            let err = if e.is_timeout() {
                AppError::timeout(format!("request exceeded deadline: {}", e))
            } else {
                AppError::network(format!("network error: {}", e))
            };
            let err = err.with_original(e);
            capture(&err);
            Err(err)
        }
    }
}
