use std::sync::Arc;

use serde_json::{json, Value};

use crate::error::AppError;
use crate::http::ApiClient;
use crate::types::StudentRef;

/// Student queries and group membership moves
pub struct StudentApi {
    client: Arc<ApiClient>,
}

impl StudentApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<StudentRef>, AppError> {
        self.client.get("/student").await
    }

    pub async fn get(&self, id: &str) -> Result<StudentRef, AppError> {
        self.client.get(&format!("/student/{}", id)).await
    }

    /// GET /student/top-five - leaderboard shown on the instructor dashboard
    pub async fn top_five(&self) -> Result<Vec<StudentRef>, AppError> {
        self.client.get("/student/top-five").await
    }

    pub async fn without_group(&self) -> Result<Vec<StudentRef>, AppError> {
        self.client.get("/student/without-group").await
    }

    /// PUT /student/:studentId/:groupId - the body is an empty object; the
    /// path carries the whole instruction.
    pub async fn move_to_group(
        &self,
        student_id: &str,
        group_id: &str,
    ) -> Result<Value, AppError> {
        if student_id.is_empty() || group_id.is_empty() {
            return Err(AppError::student("student and group ids are required"));
        }
        self.client
            .put(&format!("/student/{}/{}", student_id, group_id), &json!({}))
            .await
    }

    pub async fn remove_from_group(
        &self,
        student_id: &str,
        group_id: &str,
    ) -> Result<Value, AppError> {
        if student_id.is_empty() || group_id.is_empty() {
            return Err(AppError::student("student and group ids are required"));
        }
        self.client
            .delete(&format!("/student/{}/{}", student_id, group_id))
            .await
    }
}
