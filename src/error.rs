// Client-side error taxonomy
//
// Every failure path in the crate produces an AppError: the request pipeline
// maps HTTP statuses onto it, the orchestrator propagates it to boundaries,
// and the logger/global handler consume it for reporting and recovery.
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What kind of failure this is. Drives default severity, recoverability and
/// the fixed user-facing message table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorType {
    NetworkError,
    AuthenticationError,
    AuthorizationError,
    ValidationError,
    NotFoundError,
    ServerError,
    TimeoutError,
    QuizError,
    StudentError,
    GroupError,
    QuestionError,
    ComponentError,
    UnexpectedError,
}

impl ErrorType {
    pub const ALL: [ErrorType; 13] = [
        ErrorType::NetworkError,
        ErrorType::AuthenticationError,
        ErrorType::AuthorizationError,
        ErrorType::ValidationError,
        ErrorType::NotFoundError,
        ErrorType::ServerError,
        ErrorType::TimeoutError,
        ErrorType::QuizError,
        ErrorType::StudentError,
        ErrorType::GroupError,
        ErrorType::QuestionError,
        ErrorType::ComponentError,
        ErrorType::UnexpectedError,
    ];

    pub fn default_severity(&self) -> ErrorSeverity {
        match self {
            ErrorType::NetworkError => ErrorSeverity::High,
            ErrorType::AuthenticationError => ErrorSeverity::High,
            ErrorType::AuthorizationError => ErrorSeverity::High,
            ErrorType::ValidationError => ErrorSeverity::Medium,
            ErrorType::NotFoundError => ErrorSeverity::Medium,
            ErrorType::ServerError => ErrorSeverity::Critical,
            ErrorType::TimeoutError => ErrorSeverity::High,
            ErrorType::QuizError
            | ErrorType::StudentError
            | ErrorType::GroupError
            | ErrorType::QuestionError => ErrorSeverity::Medium,
            ErrorType::ComponentError => ErrorSeverity::High,
            ErrorType::UnexpectedError => ErrorSeverity::High,
        }
    }

    pub fn default_recoverable(&self) -> bool {
        !matches!(
            self,
            ErrorType::AuthenticationError
                | ErrorType::AuthorizationError
                | ErrorType::UnexpectedError
        )
    }

    /// Fixed user-facing message, one per type
    pub fn default_user_message(&self) -> &'static str {
        match self {
            ErrorType::NetworkError => {
                "Network connection issue. Please check your internet connection and try again."
            }
            ErrorType::AuthenticationError => {
                "Authentication required. Please log in and try again."
            }
            ErrorType::AuthorizationError => {
                "You do not have permission to perform this action."
            }
            ErrorType::ValidationError => "Please check your input and try again.",
            ErrorType::NotFoundError => "The requested resource was not found.",
            ErrorType::ServerError => "Server error occurred. Please try again later.",
            ErrorType::TimeoutError => "Request timed out. Please try again.",
            ErrorType::QuizError => "Quiz operation failed. Please try again.",
            ErrorType::StudentError => "Student operation failed. Please try again.",
            ErrorType::GroupError => "Group operation failed. Please try again.",
            ErrorType::QuestionError => "Question operation failed. Please try again.",
            ErrorType::ComponentError => "Something went wrong rendering this view.",
            ErrorType::UnexpectedError => "An unexpected error occurred. Please try again.",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::NetworkError => "NETWORK_ERROR",
            ErrorType::AuthenticationError => "AUTHENTICATION_ERROR",
            ErrorType::AuthorizationError => "AUTHORIZATION_ERROR",
            ErrorType::ValidationError => "VALIDATION_ERROR",
            ErrorType::NotFoundError => "NOT_FOUND_ERROR",
            ErrorType::ServerError => "SERVER_ERROR",
            ErrorType::TimeoutError => "TIMEOUT_ERROR",
            ErrorType::QuizError => "QUIZ_ERROR",
            ErrorType::StudentError => "STUDENT_ERROR",
            ErrorType::GroupError => "GROUP_ERROR",
            ErrorType::QuestionError => "QUESTION_ERROR",
            ErrorType::ComponentError => "COMPONENT_ERROR",
            ErrorType::UnexpectedError => "UNEXPECTED_ERROR",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    pub const ALL: [ErrorSeverity; 4] = [
        ErrorSeverity::Low,
        ErrorSeverity::Medium,
        ErrorSeverity::High,
        ErrorSeverity::Critical,
    ];
}

/// Where and when an error happened
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Epoch milliseconds
    pub timestamp: i64,
    pub url: Option<String>,
    pub route: Option<String>,
    pub user_agent: Option<String>,
    pub additional_data: Option<Value>,
}

impl ErrorContext {
    pub fn capture() -> Self {
        Self {
            timestamp: Utc::now().timestamp_millis(),
            url: None,
            route: None,
            user_agent: Some(concat!("quizhub-client/", env!("CARGO_PKG_VERSION")).to_string()),
            additional_data: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.additional_data = Some(data);
        self
    }
}

/// The single error shape every failure path resolves to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppError {
    #[serde(rename = "type")]
    pub error_type: ErrorType,
    pub severity: ErrorSeverity,
    pub code: Option<String>,
    pub status_code: Option<u16>,
    pub user_message: String,
    pub developer_message: String,
    /// Display text of the underlying failure, when one exists
    pub original_error: Option<String>,
    pub context: ErrorContext,
    pub recoverable: bool,
    pub retry_count: u32,
    pub max_retries: u32,
    /// Epoch milliseconds
    pub timestamp: i64,
    pub stack: Option<String>,
}

impl AppError {
    pub fn new(error_type: ErrorType, developer_message: impl Into<String>) -> Self {
        let developer_message = developer_message.into();
        let context = ErrorContext::capture();
        Self {
            error_type,
            severity: error_type.default_severity(),
            code: None,
            status_code: None,
            user_message: error_type.default_user_message().to_string(),
            developer_message,
            original_error: None,
            timestamp: context.timestamp,
            context,
            recoverable: error_type.default_recoverable(),
            retry_count: 0,
            max_retries: crate::config::config().max_retries,
            stack: None,
        }
    }

    // Per-type constructors

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorType::NetworkError, message)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ErrorType::AuthenticationError, message).with_status_code(401)
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(ErrorType::AuthorizationError, message).with_status_code(403)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorType::ValidationError, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorType::NotFoundError, message).with_status_code(404)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ErrorType::ServerError, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorType::TimeoutError, message)
    }

    pub fn quiz(message: impl Into<String>) -> Self {
        Self::new(ErrorType::QuizError, message)
    }

    pub fn student(message: impl Into<String>) -> Self {
        Self::new(ErrorType::StudentError, message)
    }

    pub fn group(message: impl Into<String>) -> Self {
        Self::new(ErrorType::GroupError, message)
    }

    pub fn question(message: impl Into<String>) -> Self {
        Self::new(ErrorType::QuestionError, message)
    }

    pub fn component(message: impl Into<String>) -> Self {
        Self::new(ErrorType::ComponentError, message)
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorType::UnexpectedError, message)
    }

    // Builder-style refinements

    pub fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_status_code(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_user_message(mut self, message: impl Into<String>) -> Self {
        self.user_message = message.into();
        self
    }

    pub fn with_original(mut self, original: impl std::fmt::Display) -> Self {
        self.original_error = Some(original.to_string());
        self
    }

    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.context.url = Some(url.into());
        self
    }

    pub fn recoverable(mut self, recoverable: bool) -> Self {
        self.recoverable = recoverable;
        self
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Map a non-2xx HTTP status onto the taxonomy. The server's own message
    /// string, when present, becomes the developer message.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        let err = match status {
            400 => Self::validation(message),
            401 => Self::authentication(message),
            403 => Self::authorization(message),
            404 => Self::not_found(message),
            408 => Self::timeout(message),
            s if s >= 500 => Self::server(message),
            _ => Self::unexpected(message),
        };
        err.with_status_code(status)
    }

    /// Classify an arbitrary error by inspecting its message, the fallback
    /// transformer for failures that did not come through the pipeline.
    pub fn transform(error: &dyn std::error::Error) -> Self {
        Self::transform_message(&error.to_string())
    }

    pub fn transform_message(message: &str) -> Self {
        let lower = message.to_lowercase();
        let err = if lower.contains("network error") || lower.contains("fetch") {
            Self::network(message)
        } else if message.contains("401") || lower.contains("unauthorized") {
            Self::authentication(message)
        } else if message.contains("403") || lower.contains("forbidden") {
            Self::authorization(message)
        } else if message.contains("404") || lower.contains("not found") {
            Self::not_found(message)
        } else if message.contains("500") || lower.contains("internal server error") {
            Self::server(message)
        } else if lower.contains("timeout") || lower.contains("timed out") {
            Self::timeout(message)
        } else {
            Self::unexpected(message)
        };
        err.with_original(message)
    }

    /// Identifier used by the suppression set and the top-errors metric
    pub fn identity(&self) -> String {
        format!("{}:{}", self.error_type.as_str(), self.developer_message)
    }

    pub fn is_fatal(&self) -> bool {
        !self.recoverable || self.retry_count >= self.max_retries
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_type.as_str(), self.developer_message)
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_the_taxonomy_table() {
        let err = AppError::server("boom");
        assert_eq!(err.severity, ErrorSeverity::Critical);
        assert!(err.recoverable);

        let err = AppError::authentication("expired");
        assert_eq!(err.severity, ErrorSeverity::High);
        assert!(!err.recoverable);
        assert_eq!(err.status_code, Some(401));

        let err = AppError::unexpected("?");
        assert!(!err.recoverable);
    }

    #[test]
    fn status_mapping() {
        assert_eq!(
            AppError::from_status(401, "jwt expired").error_type,
            ErrorType::AuthenticationError
        );
        assert_eq!(
            AppError::from_status(403, "no").error_type,
            ErrorType::AuthorizationError
        );
        assert_eq!(
            AppError::from_status(404, "gone").error_type,
            ErrorType::NotFoundError
        );
        assert_eq!(
            AppError::from_status(503, "down").error_type,
            ErrorType::ServerError
        );
        assert_eq!(
            AppError::from_status(418, "teapot").error_type,
            ErrorType::UnexpectedError
        );
    }

    #[test]
    fn transform_classifies_by_substring() {
        assert_eq!(
            AppError::transform_message("Network Error").error_type,
            ErrorType::NetworkError
        );
        assert_eq!(
            AppError::transform_message("Request failed with status 401").error_type,
            ErrorType::AuthenticationError
        );
        assert_eq!(
            AppError::transform_message("operation timed out").error_type,
            ErrorType::TimeoutError
        );
        assert_eq!(
            AppError::transform_message("something odd").error_type,
            ErrorType::UnexpectedError
        );
    }

    #[test]
    fn user_message_comes_from_fixed_table() {
        let err = AppError::not_found("GET /group/42 -> 404");
        assert_eq!(err.user_message, "The requested resource was not found.");
        assert_eq!(err.developer_message, "GET /group/42 -> 404");
    }

    #[test]
    fn fatal_when_retries_exhausted() {
        let mut err = AppError::network("flaky");
        assert!(!err.is_fatal());
        err.retry_count = err.max_retries;
        assert!(err.is_fatal());
    }
}
