use std::sync::Arc;

use serde_json::Value;

use crate::error::AppError;
use crate::http::ApiClient;
use crate::normalize;
use crate::types::{JoinQuizRequest, Question, Quiz, QuizPayload, QuizResult, Role, SubmitQuizRequest};

/// Quiz endpoints. List and record payloads go through the normalizer so
/// schedule-field drift never escapes this layer.
pub struct QuizApi {
    client: Arc<ApiClient>,
}

impl QuizApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// GET /quiz/incomming - the server route is misspelled and that
    /// spelling is authoritative; do not "fix" it here.
    pub async fn incoming(&self) -> Result<Vec<Quiz>, AppError> {
        let payload = self.client.get_value("/quiz/incomming").await?;
        Ok(normalize::quizzes_from_value(&payload))
    }

    /// GET /quiz/completed - the role is advisory metadata for logging only;
    /// the server derives scope from the bearer token.
    pub async fn completed(&self, role: Role) -> Result<Vec<Quiz>, AppError> {
        tracing::debug!(role = role.as_str(), "fetching completed quizzes");
        let payload = self.client.get_value("/quiz/completed").await?;
        Ok(normalize::quizzes_from_value(&payload))
    }

    pub async fn create(&self, payload: &QuizPayload) -> Result<Quiz, AppError> {
        if payload.title.is_empty() {
            return Err(AppError::quiz("quiz title is required"));
        }
        let value: Value = self.client.post("/quiz", payload).await?;
        quiz_record(&value)
    }

    pub async fn update(&self, id: &str, payload: &QuizPayload) -> Result<Quiz, AppError> {
        let value: Value = self.client.put(&format!("/quiz/{}", id), payload).await?;
        quiz_record(&value)
    }

    pub async fn delete(&self, id: &str) -> Result<Value, AppError> {
        self.client.delete(&format!("/quiz/{}", id)).await
    }

    /// POST /quiz/join - student joins a published quiz by code
    pub async fn join(&self, request: &JoinQuizRequest) -> Result<Value, AppError> {
        if request.code.trim().is_empty() {
            return Err(AppError::quiz("a join code is required"));
        }
        self.client.post("/quiz/join", request).await
    }

    /// GET /quiz/without-answers/:id - question set for a live take
    pub async fn questions_without_answers(
        &self,
        quiz_id: &str,
    ) -> Result<Vec<Question>, AppError> {
        self.client
            .get(&format!("/quiz/without-answers/{}", quiz_id))
            .await
    }

    pub async fn submit(
        &self,
        quiz_id: &str,
        request: &SubmitQuizRequest,
    ) -> Result<Value, AppError> {
        if request.answers.is_empty() {
            return Err(AppError::quiz("cannot submit a quiz without answers"));
        }
        self.client
            .post(&format!("/quiz/submit/{}", quiz_id), request)
            .await
    }

    /// GET /quiz/result - instructor result listing
    pub async fn results(&self) -> Result<Vec<QuizResult>, AppError> {
        self.client.get("/quiz/result").await
    }
}

/// A single quiz record also passes through the normalizer; some write
/// endpoints echo the drifted spelling back.
fn quiz_record(value: &Value) -> Result<Quiz, AppError> {
    normalize::quiz_from_value(value)
        .ok_or_else(|| AppError::unexpected("quiz endpoint returned a non-object payload"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::CredentialStore;
    use crate::error::ErrorType;
    use serde_json::json;

    fn api() -> QuizApi {
        let store = Arc::new(CredentialStore::at(
            std::env::temp_dir().join(format!("quizhub-quiz-{}", uuid::Uuid::new_v4().simple())),
        ));
        let client = ApiClient::with_base_url(store, "http://localhost:1", 100).unwrap();
        QuizApi::new(Arc::new(client))
    }

    #[tokio::test]
    async fn join_requires_a_code() {
        let err = api()
            .join(&JoinQuizRequest {
                code: "   ".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.error_type, ErrorType::QuizError);
    }

    #[tokio::test]
    async fn submit_requires_answers() {
        let err = api()
            .submit("q1", &SubmitQuizRequest { answers: vec![] })
            .await
            .unwrap_err();
        assert_eq!(err.error_type, ErrorType::QuizError);
    }

    #[test]
    fn quiz_record_repairs_drift() {
        let quiz = quiz_record(&json!({
            "_id": "q1",
            "schadule": "2025-03-03T09:00:00Z"
        }))
        .unwrap();
        assert_eq!(quiz.schedule.as_deref(), Some("2025-03-03T09:00:00Z"));
    }
}
