// Traits the embedding application implements
//
// The crate never draws UI or owns a router; it talks to the host through
// these seams. All of them have no-op defaults so headless and test setups
// work without wiring.
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ErrorSeverity;

/// Route changes requested by the session layer (post-login landing,
/// 401 redirects, boundary "go home" actions).
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);

    /// Full view reload, used by network auto-recovery and fatal boundaries
    fn reload(&self) {}
}

/// A user-visible error notification
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
    /// `None` means sticky; the host decides how to render that
    pub auto_close: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Warning,
    Error,
}

impl Toast {
    /// Severity governs kind and duration: critical is sticky, high shows
    /// for 5 s, medium 3 s, low 2 s.
    pub fn for_severity(severity: ErrorSeverity, message: impl Into<String>) -> Self {
        let (kind, auto_close) = match severity {
            ErrorSeverity::Critical => (ToastKind::Error, None),
            ErrorSeverity::High => (ToastKind::Error, Some(Duration::from_secs(5))),
            ErrorSeverity::Medium => (ToastKind::Warning, Some(Duration::from_secs(3))),
            ErrorSeverity::Low => (ToastKind::Info, Some(Duration::from_secs(2))),
        };
        Self {
            kind,
            message: message.into(),
            auto_close,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Info,
            message: message.into(),
            auto_close: Some(Duration::from_secs(3)),
        }
    }
}

pub trait NotificationSink: Send + Sync {
    fn notify(&self, toast: Toast);
}

/// External error reporting (Sentry-style). Receives the serialized log
/// entry; the transport is the host's concern.
pub trait ReportingSink: Send + Sync {
    fn report(&self, record: serde_json::Value);
}

/// Connectivity check used by network auto-recovery
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn is_online(&self) -> bool;
}

/// Default implementations that do nothing, for headless use and tests

pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn navigate(&self, _path: &str) {}
}

pub struct NoopNotificationSink;

impl NotificationSink for NoopNotificationSink {
    fn notify(&self, _toast: Toast) {}
}

pub struct NoopReportingSink;

impl ReportingSink for NoopReportingSink {
    fn report(&self, _record: serde_json::Value) {}
}

/// Probe that always reports online; hosts with real reachability checks
/// substitute their own.
pub struct AlwaysOnlineProbe;

#[async_trait]
impl ConnectivityProbe for AlwaysOnlineProbe {
    async fn is_online(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toast_durations_follow_severity() {
        assert_eq!(
            Toast::for_severity(ErrorSeverity::Critical, "x").auto_close,
            None
        );
        assert_eq!(
            Toast::for_severity(ErrorSeverity::High, "x").auto_close,
            Some(Duration::from_secs(5))
        );
        assert_eq!(
            Toast::for_severity(ErrorSeverity::Medium, "x").auto_close,
            Some(Duration::from_secs(3))
        );
        assert_eq!(
            Toast::for_severity(ErrorSeverity::Low, "x").auto_close,
            Some(Duration::from_secs(2))
        );
    }

    #[test]
    fn toast_kinds_follow_severity() {
        assert_eq!(
            Toast::for_severity(ErrorSeverity::Critical, "x").kind,
            ToastKind::Error
        );
        assert_eq!(
            Toast::for_severity(ErrorSeverity::Medium, "x").kind,
            ToastKind::Warning
        );
        assert_eq!(
            Toast::for_severity(ErrorSeverity::Low, "x").kind,
            ToastKind::Info
        );
    }
}
