// Route gate
//
// Declarative access check in front of a protected route. The credential
// check resolves before anything renders; the role-appropriate data loads
// are kicked off in the background and their failures surface through the
// error subsystem, not through the gate decision.
use std::sync::Arc;

use crate::credentials::CredentialStore;
use crate::global;
use crate::host::Navigator;
use crate::orchestrator::Orchestrator;
use crate::types::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Render the protected children
    Allowed,
    /// The visitor was sent to the login route
    Redirected,
}

pub struct RouteGate {
    credentials: Arc<CredentialStore>,
    orchestrator: Arc<Orchestrator>,
    navigator: Arc<dyn Navigator>,
}

impl RouteGate {
    pub fn new(
        credentials: Arc<CredentialStore>,
        orchestrator: Arc<Orchestrator>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            credentials,
            orchestrator,
            navigator,
        }
    }

    /// Gate for routes restricted to one role. A missing token or a role
    /// mismatch redirects to /login; otherwise the role's data loads start
    /// and the children may render immediately.
    pub async fn require_authenticated(&self, role: Role) -> GateDecision {
        match self.credentials.get() {
            Some(cred) if cred.profile.role == role => {
                self.dispatch_loads(role);
                GateDecision::Allowed
            }
            _ => {
                self.navigator.navigate("/login");
                GateDecision::Redirected
            }
        }
    }

    /// Gate for the student area
    pub async fn require_student(&self) -> GateDecision {
        self.require_authenticated(Role::Student).await
    }

    fn dispatch_loads(&self, role: Role) {
        let orchestrator = Arc::clone(&self.orchestrator);
        global::spawn_captured("route-gate-loads", async move {
            orchestrator.fetch_for_role(role).await
        });
    }
}
