// Error boundary state machine
//
// One per protected view region. Captures descendant failures, offers
// recovery actions, and walks ok -> capturing -> retrying -> ok, with
// capturing -> fatal once the retry budget is spent. The pending retry
// timer is cancelled when the boundary is dropped, so no state mutation
// can land after unmount.
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::config;
use crate::error::{AppError, ErrorType};
use crate::global;

const RETRY_DELAY_CAP_MS: u64 = 5_000;
const RETRY_DELAY_BASE_MS: u64 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryPhase {
    Ok,
    Capturing,
    Retrying,
    Fatal,
}

/// What the boundary UI may offer for the current error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    Retry,
    Refresh,
    Report,
    Dismiss,
    SaveDraft,
    ExitQuiz,
    GoBack,
    GoHome,
}

#[derive(Debug, Clone)]
pub struct BoundarySnapshot {
    pub phase: BoundaryPhase,
    pub error: Option<AppError>,
    pub retry_count: u32,
}

struct BoundaryInner {
    phase: BoundaryPhase,
    error: Option<AppError>,
    retry_count: u32,
}

pub struct ErrorBoundary {
    name: &'static str,
    inner: Arc<Mutex<BoundaryInner>>,
    max_retries: u32,
    retry_timer: Mutex<Option<JoinHandle<()>>>,
    on_recover: RwLock<Option<Arc<dyn Fn() + Send + Sync>>>,
}

impl ErrorBoundary {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            inner: Arc::new(Mutex::new(BoundaryInner {
                phase: BoundaryPhase::Ok,
                error: None,
                retry_count: 0,
            })),
            max_retries: config::config().max_retries,
            retry_timer: Mutex::new(None),
            on_recover: RwLock::new(None),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Callback fired when a scheduled retry completes and the boundary
    /// returns to ok; hosts re-run the failed region here.
    pub fn set_on_recover(&self, hook: Arc<dyn Fn() + Send + Sync>) {
        *self.on_recover.write().unwrap_or_else(|e| e.into_inner()) = Some(hook);
    }

    /// A descendant failed. The error has already been recorded by its
    /// originating operation; this only drives the boundary state.
    pub fn capture(&self, error: AppError) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.phase = if inner.retry_count >= self.max_retries || !error.recoverable {
            BoundaryPhase::Fatal
        } else {
            BoundaryPhase::Capturing
        };
        inner.error = Some(error);
    }

    /// A render failure inside the protected region itself: build the
    /// component error, report it, and capture it.
    pub fn capture_render_failure(&self, message: impl Into<String>) {
        let err = AppError::component(message);
        global::capture(&err);
        self.capture(err);
    }

    /// Schedule a retry. Delay is `min(1000 * 2^n, 5000)` ms for the n-th
    /// retry; when the timer fires the boundary returns to ok and the
    /// recover hook runs. Exhausting the budget goes fatal instead.
    pub fn recover(&self) {
        let n = {
            let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            if inner.phase != BoundaryPhase::Capturing {
                return;
            }
            if inner.retry_count >= self.max_retries {
                inner.phase = BoundaryPhase::Fatal;
                return;
            }
            let n = inner.retry_count;
            inner.retry_count += 1;
            inner.phase = BoundaryPhase::Retrying;
            n
        };

        let delay_ms =
            (RETRY_DELAY_BASE_MS.saturating_mul(1u64 << n.min(63))).min(RETRY_DELAY_CAP_MS);
        let inner = Arc::clone(&self.inner);
        let hook = self.on_recover.read().unwrap_or_else(|e| e.into_inner()).clone();

        let complete = move || {
            let mut guard = inner.lock().unwrap_or_else(|e| e.into_inner());
            if guard.phase != BoundaryPhase::Retrying {
                return;
            }
            guard.phase = BoundaryPhase::Ok;
            guard.error = None;
            drop(guard);
            if let Some(hook) = hook {
                hook();
            }
        };

        match tokio::runtime::Handle::try_current() {
            Ok(rt) => {
                let handle = rt.spawn(async move {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    complete();
                });
                let mut timer = self.retry_timer.lock().unwrap_or_else(|e| e.into_inner());
                if let Some(previous) = timer.replace(handle) {
                    previous.abort();
                }
            }
            // No runtime to host the timer (sync tests): recover at once
            Err(_) => complete(),
        }
    }

    /// Clear the error without retrying
    pub fn dismiss(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.phase == BoundaryPhase::Fatal {
            return;
        }
        inner.phase = BoundaryPhase::Ok;
        inner.error = None;
    }

    pub fn snapshot(&self) -> BoundarySnapshot {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        BoundarySnapshot {
            phase: inner.phase,
            error: inner.error.clone(),
            retry_count: inner.retry_count,
        }
    }

    pub fn phase(&self) -> BoundaryPhase {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).phase
    }

    /// Message the boundary UI shows for the current error. Developer detail
    /// is appended only when the configuration asks for it.
    pub fn display_message(&self) -> Option<String> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.error.as_ref().map(|error| {
            if config::config().show_error_details {
                format!("{} ({})", error.user_message, error.developer_message)
            } else {
                error.user_message.clone()
            }
        })
    }

    /// Actions the boundary UI should offer for the current error. Fatal
    /// errors lose the retry option and force a harder exit.
    pub fn recovery_actions(&self) -> Vec<RecoveryAction> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let Some(error) = inner.error.as_ref() else {
            return Vec::new();
        };

        if inner.phase == BoundaryPhase::Fatal {
            return vec![
                RecoveryAction::Refresh,
                RecoveryAction::GoHome,
                RecoveryAction::Report,
            ];
        }

        let mut actions = vec![
            RecoveryAction::Retry,
            RecoveryAction::Refresh,
            RecoveryAction::Report,
            RecoveryAction::Dismiss,
        ];
        match error.error_type {
            ErrorType::QuizError => {
                actions.push(RecoveryAction::SaveDraft);
                actions.push(RecoveryAction::ExitQuiz);
            }
            ErrorType::NotFoundError => {
                actions.push(RecoveryAction::GoBack);
                actions.push(RecoveryAction::GoHome);
            }
            _ => {}
        }
        actions
    }
}

impl Drop for ErrorBoundary {
    fn drop(&mut self) {
        // Unmount: a pending retry must never mutate state afterwards
        if let Some(timer) = self
            .retry_timer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            timer.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn capture_then_dismiss_returns_to_ok() {
        let boundary = ErrorBoundary::new("quizzes");
        assert_eq!(boundary.phase(), BoundaryPhase::Ok);
        boundary.capture(AppError::server("500"));
        assert_eq!(boundary.phase(), BoundaryPhase::Capturing);
        boundary.dismiss();
        assert_eq!(boundary.phase(), BoundaryPhase::Ok);
        assert!(boundary.snapshot().error.is_none());
    }

    #[test]
    fn non_recoverable_error_is_fatal_immediately() {
        let boundary = ErrorBoundary::new("auth");
        boundary.capture(AppError::unexpected("corrupted state"));
        assert_eq!(boundary.phase(), BoundaryPhase::Fatal);
        assert_eq!(
            boundary.recovery_actions(),
            vec![
                RecoveryAction::Refresh,
                RecoveryAction::GoHome,
                RecoveryAction::Report
            ]
        );
    }

    #[test]
    fn retry_budget_exhaustion_goes_fatal() {
        let boundary = ErrorBoundary::new("groups");
        let budget = boundary.max_retries;
        for _ in 0..budget {
            boundary.capture(AppError::server("still down"));
            boundary.recover(); // no runtime: completes synchronously
            assert_eq!(boundary.phase(), BoundaryPhase::Ok);
        }
        boundary.capture(AppError::server("still down"));
        assert_eq!(boundary.phase(), BoundaryPhase::Fatal);
    }

    #[test]
    fn display_message_honors_the_detail_switch() {
        let _guard = crate::config::TEST_GUARD
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        crate::config::reset_for_tests();

        let boundary = ErrorBoundary::new("details");
        boundary.capture(AppError::server("pool exhausted"));
        assert_eq!(
            boundary.display_message().as_deref(),
            Some("Server error occurred. Please try again later.")
        );

        crate::config::update_config(|c| c.show_error_details = true);
        assert_eq!(
            boundary.display_message().as_deref(),
            Some("Server error occurred. Please try again later. (pool exhausted)")
        );
        crate::config::reset_for_tests();
    }

    #[test]
    fn quiz_errors_offer_domain_actions() {
        let boundary = ErrorBoundary::new("take-quiz");
        boundary.capture(AppError::quiz("submission rejected"));
        let actions = boundary.recovery_actions();
        assert!(actions.contains(&RecoveryAction::SaveDraft));
        assert!(actions.contains(&RecoveryAction::ExitQuiz));
        assert!(actions.contains(&RecoveryAction::Retry));
    }

    #[tokio::test(start_paused = true)]
    async fn scheduled_retry_fires_hook_after_backoff_delay() {
        let boundary = ErrorBoundary::new("students");
        let fired = Arc::new(AtomicU32::new(0));
        let fired_clone = fired.clone();
        boundary.set_on_recover(Arc::new(move || {
            fired_clone.fetch_add(1, Ordering::SeqCst);
        }));

        boundary.capture(AppError::server("x"));
        boundary.recover();
        assert_eq!(boundary.phase(), BoundaryPhase::Retrying);

        // First retry waits 1000 ms
        tokio::time::sleep(Duration::from_millis(1100)).await;
        tokio::task::yield_now().await;
        assert_eq!(boundary.phase(), BoundaryPhase::Ok);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_boundary_cancels_the_pending_retry() {
        let fired = Arc::new(AtomicU32::new(0));
        {
            let boundary = ErrorBoundary::new("doomed");
            let fired_clone = fired.clone();
            boundary.set_on_recover(Arc::new(move || {
                fired_clone.fetch_add(1, Ordering::SeqCst);
            }));
            boundary.capture(AppError::server("x"));
            boundary.recover();
        } // dropped with the timer pending

        tokio::time::sleep(Duration::from_millis(6000)).await;
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn retry_delay_is_capped() {
        // 1000 * 2^3 would be 8000; the cap holds it at 5000
        let delay = (RETRY_DELAY_BASE_MS.saturating_mul(1u64 << 3)).min(RETRY_DELAY_CAP_MS);
        assert_eq!(delay, RETRY_DELAY_CAP_MS);
    }
}
