/// Shared domain types used across the codebase
///
/// Wire shapes come from the QuizHub backend, which predates this client and
/// carries a few legacy field names (`_id`, `questions_number`, ...). Serde
/// aliases absorb those here so the rest of the crate only sees the internal
/// names.
use serde::{Deserialize, Serialize};

/// User role as issued by the backend. Exactly two values exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Student,
    Instructor,
}

impl Role {
    /// Landing route for this role after a successful login
    pub fn home_route(&self) -> &'static str {
        match self {
            Role::Student => "/student",
            Role::Instructor => "/dashboard",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "Student",
            Role::Instructor => "Instructor",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, alias = "_id")]
    pub id: String,
    #[serde(default, alias = "firstName")]
    pub first_name: String,
    #[serde(default, alias = "lastName")]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    pub role: Role,
}

/// Bearer credential issued on login/register and persisted across restarts.
///
/// Invariant: when a credential exists, `access_token` is non-empty and the
/// profile role is one of the two known values. `refresh_token` is carried
/// and persisted but no refresh flow consumes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(default, rename = "refreshToken", skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub profile: Profile,
}

impl Credential {
    pub fn is_valid(&self) -> bool {
        !self.access_token.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QuizStatus {
    #[default]
    Draft,
    Published,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QuizType {
    #[default]
    #[serde(rename = "MCQ")]
    Mcq,
    #[serde(rename = "True/False")]
    TrueFalse,
}

/// A quiz as the store observes it.
///
/// The wire may spell the schedule field `schadule`; the normalizer repairs
/// that before anything is deserialized into this type, so `schedule` is the
/// only spelling that exists past that point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Quiz {
    #[serde(default, alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: QuizStatus,
    #[serde(default, alias = "questions_number")]
    pub questions_count: u32,
    /// ISO-8601, kept as received from the server
    #[serde(default)]
    pub schedule: Option<String>,
    /// Minutes
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub score_per_question: u32,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default, rename = "type")]
    pub quiz_type: QuizType,
    #[serde(default, alias = "group")]
    pub group_id: String,
    #[serde(default, alias = "instructor")]
    pub instructor_id: String,
    #[serde(default, alias = "createdAt")]
    pub created_at: String,
    #[serde(default, alias = "updatedAt")]
    pub updated_at: String,
    #[serde(default, alias = "closedAt")]
    pub closed_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StudentRef {
    #[serde(default, alias = "_id")]
    pub id: String,
    #[serde(default, alias = "firstName")]
    pub first_name: String,
    #[serde(default, alias = "lastName")]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, alias = "groupName")]
    pub group_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Group {
    #[serde(default, alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub students: Vec<StudentRef>,
    #[serde(default)]
    pub max_students: Option<u32>,
}

/// Four fixed answer options per question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct QuestionOptions {
    #[serde(default, rename = "A")]
    pub a: String,
    #[serde(default, rename = "B")]
    pub b: String,
    #[serde(default, rename = "C")]
    pub c: String,
    #[serde(default, rename = "D")]
    pub d: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AnswerKey {
    #[default]
    A,
    B,
    C,
    D,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Question {
    #[serde(default, alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub options: QuestionOptions,
    #[serde(default)]
    pub answer: AnswerKey,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default, rename = "type")]
    pub question_type: QuizType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Submission {
    #[serde(default, alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub participant: StudentRef,
    #[serde(default)]
    pub score: f64,
    #[serde(default, alias = "startedAt")]
    pub started_at: String,
    #[serde(default, alias = "finishedAt")]
    pub finished_at: String,
}

/// Instructor-facing result listing: one quiz plus everyone who took it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct QuizResult {
    #[serde(default)]
    pub quiz: Quiz,
    #[serde(default)]
    pub participants: Vec<Submission>,
}

// --- Request payloads ---

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub seed: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct JoinQuizRequest {
    pub code: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmittedAnswer {
    pub question: String,
    pub answer: AnswerKey,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitQuizRequest {
    pub answers: Vec<SubmittedAnswer>,
}

/// Create/update payload for quizzes. The server expects its own legacy
/// field names here, so this serializes to the wire spelling directly.
#[derive(Debug, Clone, Serialize)]
pub struct QuizPayload {
    pub title: String,
    pub description: String,
    pub group: String,
    pub questions_number: u32,
    pub difficulty: Difficulty,
    #[serde(rename = "type")]
    pub quiz_type: QuizType,
    pub schedule: String,
    pub duration: u32,
    pub score_per_question: u32,
    pub category: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionPayload {
    pub title: String,
    pub description: String,
    pub options: QuestionOptions,
    pub answer: AnswerKey,
    pub difficulty: Difficulty,
    #[serde(rename = "type")]
    pub question_type: QuizType,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupPayload {
    pub name: String,
    pub students: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiz_deserializes_legacy_wire_names() {
        let raw = serde_json::json!({
            "_id": "q1",
            "title": "Midterm",
            "questions_number": 12,
            "score_per_question": 5,
            "group": "g1",
            "instructor": "i1",
            "status": "published",
            "type": "MCQ"
        });
        let quiz: Quiz = serde_json::from_value(raw).unwrap();
        assert_eq!(quiz.id, "q1");
        assert_eq!(quiz.questions_count, 12);
        assert_eq!(quiz.group_id, "g1");
        assert_eq!(quiz.instructor_id, "i1");
        assert_eq!(quiz.status, QuizStatus::Published);
    }

    #[test]
    fn quiz_tolerates_missing_fields() {
        let quiz: Quiz = serde_json::from_value(serde_json::json!({ "_id": "q2" })).unwrap();
        assert_eq!(quiz.id, "q2");
        assert_eq!(quiz.schedule, None);
        assert_eq!(quiz.status, QuizStatus::Draft);
    }

    #[test]
    fn credential_roundtrips_camel_case() {
        let cred = Credential {
            access_token: "T".into(),
            refresh_token: Some("R".into()),
            profile: Profile {
                id: "u1".into(),
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
                email: "ada@example.com".into(),
                role: Role::Instructor,
            },
        };
        let json = serde_json::to_value(&cred).unwrap();
        assert_eq!(json["accessToken"], "T");
        let back: Credential = serde_json::from_value(json).unwrap();
        assert_eq!(back, cred);
    }

    #[test]
    fn role_home_routes() {
        assert_eq!(Role::Student.home_route(), "/student");
        assert_eq!(Role::Instructor.home_route(), "/dashboard");
    }
}
