// Reactive session store
//
// Five slices with a uniform `{value, loading, error, last_fetched}` shape.
// The store exclusively owns slice state; views take snapshots and watch a
// per-slice version channel for change notification. Mutation delivery is
// synchronous with respect to the mutating call.
use std::sync::{Arc, RwLock};

use chrono::Utc;
use tokio::sync::watch;

use crate::credentials::{CredentialError, CredentialStore};
use crate::types::{Credential, Group, Quiz, Role, StudentRef};

#[derive(Debug, Clone, PartialEq)]
pub struct SliceState<T> {
    pub value: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
    /// Epoch milliseconds of the last successful `set`
    pub last_fetched: Option<i64>,
}

impl<T> Default for SliceState<T> {
    fn default() -> Self {
        Self {
            value: None,
            loading: false,
            error: None,
            last_fetched: None,
        }
    }
}

pub struct Slice<T: Clone> {
    name: &'static str,
    state: RwLock<SliceState<T>>,
    version: watch::Sender<u64>,
}

impl<T: Clone> Slice<T> {
    pub fn new(name: &'static str) -> Self {
        let (version, _) = watch::channel(0);
        Self {
            name,
            state: RwLock::new(SliceState::default()),
            version,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Commit a value: clears loading and error, stamps `last_fetched`
    pub fn set(&self, value: T) {
        {
            let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
            state.value = Some(value);
            state.loading = false;
            state.error = None;
            state.last_fetched = Some(Utc::now().timestamp_millis());
        }
        self.bump();
    }

    /// Entering the loading state clears a stale error; leaving it does not
    /// touch the rest of the state.
    pub fn set_loading(&self, loading: bool) {
        {
            let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
            state.loading = loading;
            if loading {
                state.error = None;
            }
        }
        self.bump();
    }

    pub fn set_error(&self, message: impl Into<String>) {
        {
            let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
            state.error = Some(message.into());
            state.loading = false;
        }
        self.bump();
    }

    pub fn clear(&self) {
        {
            let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
            state.value = None;
            state.error = None;
            state.last_fetched = None;
        }
        self.bump();
    }

    pub fn snapshot(&self) -> SliceState<T> {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Version channel that ticks on every mutation. Subscribers re-read the
    /// snapshot when it changes; no payloads travel on the channel itself.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    fn bump(&self) {
        self.version.send_modify(|v| *v += 1);
    }
}

/// The auth slice: same shape as the data slices, but every mutation is
/// mirrored into the durable credential store.
pub struct AuthSlice {
    slice: Slice<Credential>,
    credentials: Arc<CredentialStore>,
}

impl AuthSlice {
    fn new(credentials: Arc<CredentialStore>) -> Self {
        Self {
            slice: Slice::new("auth"),
            credentials,
        }
    }

    /// Populate from durable storage at process start
    pub fn hydrate(&self) {
        if let Some(cred) = self.credentials.load() {
            self.slice.set(cred);
        }
    }

    /// Adopt a freshly issued credential: state updates unconditionally,
    /// persistence errors are reported but do not lose the session.
    pub fn set_credential(&self, credential: Credential) -> Result<(), CredentialError> {
        self.slice.set(credential.clone());
        self.credentials.save(&credential)
    }

    /// Drop the session: durable record first, then state
    pub fn log_out(&self) {
        self.credentials.clear();
        self.slice.clear();
    }

    pub fn set_loading(&self, loading: bool) {
        self.slice.set_loading(loading);
    }

    pub fn set_error(&self, message: impl Into<String>) {
        self.slice.set_error(message);
    }

    pub fn credential(&self) -> Option<Credential> {
        self.slice.snapshot().value
    }

    pub fn role(&self) -> Option<Role> {
        self.credential().map(|c| c.profile.role)
    }

    pub fn is_authed(&self) -> bool {
        self.credential().is_some()
    }

    pub fn snapshot(&self) -> SliceState<Credential> {
        self.slice.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.slice.subscribe()
    }
}

pub struct SessionStore {
    pub auth: AuthSlice,
    pub groups: Slice<Vec<Group>>,
    pub students: Slice<Vec<StudentRef>>,
    pub incoming_quizzes: Slice<Vec<Quiz>>,
    pub completed_quizzes: Slice<Vec<Quiz>>,
}

impl SessionStore {
    /// Build the store and hydrate the auth slice from durable storage
    pub fn new(credentials: Arc<CredentialStore>) -> Self {
        let store = Self {
            auth: AuthSlice::new(credentials),
            groups: Slice::new("groups"),
            students: Slice::new("students"),
            incoming_quizzes: Slice::new("incomingQuizzes"),
            completed_quizzes: Slice::new("completedQuizzes"),
        };
        store.auth.hydrate();
        store
    }

    /// Full logout: auth slice plus every data slice
    pub fn log_out(&self) {
        self.auth.log_out();
        self.groups.clear();
        self.students.clear();
        self.incoming_quizzes.clear();
        self.completed_quizzes.clear();
    }
}
