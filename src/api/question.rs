use std::sync::Arc;

use serde_json::Value;

use crate::error::AppError;
use crate::http::ApiClient;
use crate::types::{Question, QuestionPayload};

/// Question bank CRUD (instructor only on the server side)
pub struct QuestionApi {
    client: Arc<ApiClient>,
}

impl QuestionApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<Question>, AppError> {
        self.client.get("/question").await
    }

    pub async fn get(&self, id: &str) -> Result<Question, AppError> {
        self.client.get(&format!("/question/{}", id)).await
    }

    pub async fn create(&self, payload: &QuestionPayload) -> Result<Question, AppError> {
        validate(payload)?;
        self.client.post("/question", payload).await
    }

    pub async fn update(&self, id: &str, payload: &QuestionPayload) -> Result<Question, AppError> {
        validate(payload)?;
        self.client.put(&format!("/question/{}", id), payload).await
    }

    pub async fn delete(&self, id: &str) -> Result<Value, AppError> {
        self.client.delete(&format!("/question/{}", id)).await
    }
}

fn validate(payload: &QuestionPayload) -> Result<(), AppError> {
    if payload.title.is_empty() {
        return Err(AppError::question("question title is required"));
    }
    let options = &payload.options;
    if [&options.a, &options.b, &options.c, &options.d]
        .iter()
        .any(|o| o.is_empty())
    {
        return Err(AppError::question("all four answer options are required"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorType;
    use crate::types::{AnswerKey, Difficulty, QuestionOptions, QuizType};

    #[test]
    fn validation_requires_title_and_options() {
        let payload = QuestionPayload {
            title: "What is ownership?".into(),
            description: String::new(),
            options: QuestionOptions {
                a: "a".into(),
                b: "b".into(),
                c: String::new(),
                d: "d".into(),
            },
            answer: AnswerKey::A,
            difficulty: Difficulty::Easy,
            question_type: QuizType::Mcq,
        };
        let err = validate(&payload).unwrap_err();
        assert_eq!(err.error_type, ErrorType::QuestionError);
    }
}
