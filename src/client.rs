// Client facade
//
// Wires the credential store, request pipeline, session store, orchestrator
// and route gate together with the process-wide error subsystem. Hosts
// construct one of these at startup and hang on to it for the life of the
// process.
use std::path::PathBuf;
use std::sync::Arc;

use crate::api::Api;
use crate::config;
use crate::credentials::CredentialStore;
use crate::error::AppError;
use crate::gate::RouteGate;
use crate::global;
use crate::host::{ConnectivityProbe, Navigator, NoopNavigator, NotificationSink, ReportingSink};
use crate::http::ApiClient;
use crate::logger::logger;
use crate::orchestrator::Orchestrator;
use crate::store::SessionStore;

/// Construction-time overrides; `Default` follows the global configuration
#[derive(Default)]
pub struct ClientOptions {
    /// Credential storage directory (defaults to the user config dir)
    pub config_dir: Option<PathBuf>,
    /// Request origin (defaults to the configured base url)
    pub base_url: Option<String>,
    pub timeout_ms: Option<u64>,
    pub navigator: Option<Arc<dyn Navigator>>,
}

pub struct QuizhubClient {
    credentials: Arc<CredentialStore>,
    http: Arc<ApiClient>,
    store: Arc<SessionStore>,
    orchestrator: Arc<Orchestrator>,
    gate: RouteGate,
}

impl QuizhubClient {
    pub fn new() -> Result<Self, AppError> {
        Self::with_options(ClientOptions::default())
    }

    pub fn with_options(options: ClientOptions) -> Result<Self, AppError> {
        let credentials = match options.config_dir {
            Some(dir) => Arc::new(CredentialStore::at(dir)),
            None => Arc::new(CredentialStore::open().map_err(|e| {
                AppError::unexpected(format!("failed to open credential store: {}", e))
            })?),
        };

        let cfg = config::config();
        let base_url = options.base_url.unwrap_or(cfg.base_url);
        let timeout_ms = options.timeout_ms.unwrap_or(cfg.request_timeout_ms);
        let navigator = options
            .navigator
            .unwrap_or_else(|| Arc::new(NoopNavigator));

        // Process-wide capture first, so everything below reports into it
        global::handler().install();
        global::handler().set_navigator(navigator.clone());

        let http = Arc::new(ApiClient::with_base_url(
            credentials.clone(),
            &base_url,
            timeout_ms,
        )?);
        let store = Arc::new(SessionStore::new(credentials.clone()));

        // A 401 clears the durable credential inside the pipeline; this hook
        // drops the in-memory session so views stop rendering stale data.
        // The login redirect itself comes from the auth recovery policy.
        {
            let store = store.clone();
            http.set_on_unauthorized(Arc::new(move || {
                store.log_out();
            }));
        }

        let orchestrator = Arc::new(Orchestrator::new(Api::new(http.clone()), store.clone()));
        orchestrator.set_navigator(navigator.clone());

        let gate = RouteGate::new(credentials.clone(), orchestrator.clone(), navigator);

        logger().info("quizhub client initialized");

        Ok(Self {
            credentials,
            http,
            store,
            orchestrator,
            gate,
        })
    }

    pub fn set_notification_sink(&self, sink: Arc<dyn NotificationSink>) {
        global::handler().set_notification_sink(sink.clone());
        self.orchestrator.set_notification_sink(sink);
    }

    pub fn set_reporting_sink(&self, sink: Arc<dyn ReportingSink>) {
        logger().set_reporting_sink(sink);
    }

    pub fn set_connectivity_probe(&self, probe: Arc<dyn ConnectivityProbe>) {
        global::handler().set_connectivity_probe(probe);
    }

    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    pub fn http(&self) -> &Arc<ApiClient> {
        &self.http
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn orchestrator(&self) -> &Arc<Orchestrator> {
        &self.orchestrator
    }

    pub fn api(&self) -> &Api {
        self.orchestrator.api()
    }

    pub fn gate(&self) -> &RouteGate {
        &self.gate
    }

    /// Teardown for the process-wide pieces; mainly matters for tests
    pub fn shutdown(&self) {
        global::handler().uninstall();
    }
}
