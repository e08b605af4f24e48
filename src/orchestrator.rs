// Fetch orchestrator
//
// The thunks views invoke: each sets its slice loading, performs the call
// through the pipeline, and commits exactly one of `set` or `set_error`.
// Failures propagate to the caller so a boundary can offer recovery; the
// pipeline has already recorded them with the error subsystem.
use std::sync::{Arc, RwLock};

use crate::api::Api;
use crate::error::AppError;
use crate::host::{Navigator, NotificationSink, Toast};
use crate::store::SessionStore;
use crate::types::{
    ChangePasswordRequest, Credential, ForgotPasswordRequest, LoginRequest, Quiz, RegisterRequest,
    ResetPasswordRequest, Role,
};

pub struct Orchestrator {
    api: Api,
    store: Arc<SessionStore>,
    navigator: RwLock<Option<Arc<dyn Navigator>>>,
    notifications: RwLock<Option<Arc<dyn NotificationSink>>>,
}

impl Orchestrator {
    pub fn new(api: Api, store: Arc<SessionStore>) -> Self {
        Self {
            api,
            store,
            navigator: RwLock::new(None),
            notifications: RwLock::new(None),
        }
    }

    pub fn set_navigator(&self, navigator: Arc<dyn Navigator>) {
        *self.navigator.write().unwrap_or_else(|e| e.into_inner()) = Some(navigator);
    }

    pub fn set_notification_sink(&self, sink: Arc<dyn NotificationSink>) {
        *self
            .notifications
            .write()
            .unwrap_or_else(|e| e.into_inner()) = Some(sink);
    }

    pub fn api(&self) -> &Api {
        &self.api
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    // --- Data thunks ---

    pub async fn fetch_incoming_quizzes(&self) -> Result<Vec<Quiz>, AppError> {
        self.store.incoming_quizzes.set_loading(true);
        match self.api.quiz.incoming().await {
            Ok(quizzes) => {
                self.store.incoming_quizzes.set(quizzes.clone());
                Ok(quizzes)
            }
            Err(err) => {
                self.store
                    .incoming_quizzes
                    .set_error(err.developer_message.clone());
                Err(err)
            }
        }
    }

    pub async fn fetch_completed_quizzes(&self, role: Role) -> Result<Vec<Quiz>, AppError> {
        self.store.completed_quizzes.set_loading(true);
        match self.api.quiz.completed(role).await {
            Ok(quizzes) => {
                self.store.completed_quizzes.set(quizzes.clone());
                Ok(quizzes)
            }
            Err(err) => {
                self.store
                    .completed_quizzes
                    .set_error(err.developer_message.clone());
                Err(err)
            }
        }
    }

    /// Load both quiz lists in parallel. Each branch commits to its own
    /// slice independently, so one list surviving a failure of the other
    /// stays visible; the combined thunk reports the first failure.
    pub async fn fetch_all_quizzes(
        &self,
        role: Role,
    ) -> Result<(Vec<Quiz>, Vec<Quiz>), AppError> {
        self.store.incoming_quizzes.set_loading(true);
        self.store.completed_quizzes.set_loading(true);

        let (incoming, completed) =
            futures::join!(self.api.quiz.incoming(), self.api.quiz.completed(role));

        let incoming = match incoming {
            Ok(quizzes) => {
                self.store.incoming_quizzes.set(quizzes.clone());
                Ok(quizzes)
            }
            Err(err) => {
                self.store
                    .incoming_quizzes
                    .set_error(err.developer_message.clone());
                Err(err)
            }
        };
        let completed = match completed {
            Ok(quizzes) => {
                self.store.completed_quizzes.set(quizzes.clone());
                Ok(quizzes)
            }
            Err(err) => {
                self.store
                    .completed_quizzes
                    .set_error(err.developer_message.clone());
                Err(err)
            }
        };

        match (incoming, completed) {
            (Ok(i), Ok(c)) => Ok((i, c)),
            (Err(e), _) | (_, Err(e)) => Err(e),
        }
    }

    pub async fn fetch_groups(&self) -> Result<(), AppError> {
        self.store.groups.set_loading(true);
        match self.api.group.list().await {
            Ok(groups) => {
                self.store.groups.set(groups);
                Ok(())
            }
            Err(err) => {
                self.store.groups.set_error(err.developer_message.clone());
                Err(err)
            }
        }
    }

    pub async fn fetch_top_students(&self) -> Result<(), AppError> {
        self.store.students.set_loading(true);
        match self.api.student.top_five().await {
            Ok(students) => {
                self.store.students.set(students);
                Ok(())
            }
            Err(err) => {
                self.store
                    .students
                    .set_error(err.developer_message.clone());
                Err(err)
            }
        }
    }

    /// Role-conditional post-login load, used by the route gate.
    /// Individual failures have already been recorded and committed to their
    /// slices; the first one is reported.
    pub async fn fetch_for_role(&self, role: Role) -> Result<(), AppError> {
        match role {
            Role::Instructor => {
                let (quizzes, groups, students) = futures::join!(
                    self.fetch_all_quizzes(role),
                    self.fetch_groups(),
                    self.fetch_top_students()
                );
                quizzes.map(|_| ()).and(groups).and(students)
            }
            Role::Student => self.fetch_all_quizzes(role).await.map(|_| ()),
        }
    }

    // --- Session operations ---

    /// Authenticate, persist the credential, land on the role's home route
    pub async fn login(&self, request: LoginRequest) -> Result<Credential, AppError> {
        self.store.auth.set_loading(true);
        match self.api.auth.login(&request).await {
            Ok(credential) => self.adopt_credential(credential, "Login successful!"),
            Err(err) => {
                self.store.auth.set_error(err.developer_message.clone());
                Err(err)
            }
        }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<Credential, AppError> {
        self.store.auth.set_loading(true);
        match self.api.auth.register(&request).await {
            Ok(credential) => self.adopt_credential(credential, "Registration successful!"),
            Err(err) => {
                self.store.auth.set_error(err.developer_message.clone());
                Err(err)
            }
        }
    }

    pub async fn forgot_password(&self, request: ForgotPasswordRequest) -> Result<(), AppError> {
        self.api.auth.forgot_password(&request).await?;
        self.notify(Toast::success("Reset password email sent!"));
        self.navigate("/reset-password");
        Ok(())
    }

    pub async fn reset_password(&self, request: ResetPasswordRequest) -> Result<(), AppError> {
        self.api.auth.reset_password(&request).await?;
        self.notify(Toast::success("Password reset successful!"));
        self.navigate("/login");
        Ok(())
    }

    pub async fn change_password(&self, request: ChangePasswordRequest) -> Result<(), AppError> {
        self.api.auth.change_password(&request).await?;
        self.notify(Toast::success("Password changed successfully!"));
        Ok(())
    }

    /// Drop the session everywhere and land on the login route
    pub fn log_out(&self) {
        self.store.log_out();
        self.navigate("/login");
    }

    fn adopt_credential(
        &self,
        credential: Credential,
        toast: &str,
    ) -> Result<Credential, AppError> {
        let role = credential.profile.role;
        if let Err(e) = self.store.auth.set_credential(credential.clone()) {
            // The session still works in memory; only durability failed
            tracing::warn!("failed to persist credential: {}", e);
        }
        self.notify(Toast::success(toast));
        self.navigate(role.home_route());
        Ok(credential)
    }

    fn navigate(&self, path: &str) {
        let navigator = self
            .navigator
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        if let Some(navigator) = navigator {
            navigator.navigate(path);
        }
    }

    fn notify(&self, toast: Toast) {
        let sink = self
            .notifications
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        if let Some(sink) = sink {
            sink.notify(toast);
        }
    }
}
