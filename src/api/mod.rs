// Typed endpoint services over the request pipeline
//
// One service per backend resource, mirroring the server's route families.
// Services add client-side precondition checks (mapped to the domain error
// types) and route quiz payloads through the normalizer; everything else is
// a thin typed call.
pub mod auth;
pub mod group;
pub mod question;
pub mod quiz;
pub mod student;

use std::sync::Arc;

pub use auth::AuthApi;
pub use group::GroupApi;
pub use question::QuestionApi;
pub use quiz::QuizApi;
pub use student::StudentApi;

use crate::http::ApiClient;

/// Bundle of all endpoint services sharing one pipeline
pub struct Api {
    pub auth: AuthApi,
    pub quiz: QuizApi,
    pub question: QuestionApi,
    pub group: GroupApi,
    pub student: StudentApi,
}

impl Api {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            auth: AuthApi::new(client.clone()),
            quiz: QuizApi::new(client.clone()),
            question: QuestionApi::new(client.clone()),
            group: GroupApi::new(client.clone()),
            student: StudentApi::new(client),
        }
    }
}
