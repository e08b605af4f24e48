use std::sync::Arc;

use serde_json::Value;

use crate::error::AppError;
use crate::http::ApiClient;
use crate::types::{
    ChangePasswordRequest, Credential, ForgotPasswordRequest, LoginRequest, RegisterRequest,
    ResetPasswordRequest,
};

/// Credential lifecycle endpoints
pub struct AuthApi {
    client: Arc<ApiClient>,
}

impl AuthApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// POST /auth/login - the issued credential is the envelope's `data`
    pub async fn login(&self, request: &LoginRequest) -> Result<Credential, AppError> {
        if request.email.is_empty() || request.password.is_empty() {
            return Err(AppError::validation("email and password are required"));
        }
        self.client.post("/auth/login", request).await
    }

    /// POST /auth/register - registration also issues a credential
    pub async fn register(&self, request: &RegisterRequest) -> Result<Credential, AppError> {
        if request.email.is_empty() || request.password.is_empty() {
            return Err(AppError::validation("email and password are required"));
        }
        self.client.post("/auth/register", request).await
    }

    pub async fn forgot_password(
        &self,
        request: &ForgotPasswordRequest,
    ) -> Result<Value, AppError> {
        self.client.post("/auth/forgot-password", request).await
    }

    pub async fn reset_password(&self, request: &ResetPasswordRequest) -> Result<Value, AppError> {
        self.client.post("/auth/reset-password", request).await
    }

    pub async fn change_password(
        &self,
        request: &ChangePasswordRequest,
    ) -> Result<Value, AppError> {
        self.client.post("/auth/change-password", request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::CredentialStore;
    use crate::error::ErrorType;

    fn api() -> AuthApi {
        let store = Arc::new(CredentialStore::at(
            std::env::temp_dir().join(format!("quizhub-auth-{}", uuid::Uuid::new_v4().simple())),
        ));
        let client = ApiClient::with_base_url(store, "http://localhost:1", 100).unwrap();
        AuthApi::new(Arc::new(client))
    }

    #[tokio::test]
    async fn login_rejects_empty_credentials_before_the_wire() {
        let err = api()
            .login(&LoginRequest {
                email: String::new(),
                password: "p".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.error_type, ErrorType::ValidationError);
    }
}
