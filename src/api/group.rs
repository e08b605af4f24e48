use std::sync::Arc;

use serde_json::Value;

use crate::error::AppError;
use crate::http::ApiClient;
use crate::types::{Group, GroupPayload};

/// Group CRUD
pub struct GroupApi {
    client: Arc<ApiClient>,
}

impl GroupApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<Group>, AppError> {
        self.client.get("/group").await
    }

    pub async fn get(&self, id: &str) -> Result<Group, AppError> {
        self.client.get(&format!("/group/{}", id)).await
    }

    pub async fn create(&self, payload: &GroupPayload) -> Result<Group, AppError> {
        if payload.name.is_empty() {
            return Err(AppError::group("group name is required"));
        }
        self.client.post("/group", payload).await
    }

    pub async fn update(&self, id: &str, payload: &GroupPayload) -> Result<Group, AppError> {
        if payload.name.is_empty() {
            return Err(AppError::group("group name is required"));
        }
        self.client.put(&format!("/group/{}", id), payload).await
    }

    pub async fn delete(&self, id: &str) -> Result<Value, AppError> {
        self.client.delete(&format!("/group/{}", id)).await
    }
}
