//! Integration test harness for the TaskHub client
//! Wires the real transport and auth server client against a mockito server.

use std::sync::{Arc, Once};
use std::time::Duration;

use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use taskhub_client::{
    AuthenticatedClient, ClientConfig, HttpAuthServer, Logout, MemoryTokenStore, ReqwestTransport,
    TokenKey, TokenStore,
};

static TRACING: Once = Once::new();

/// Initialize structured logging for the test binary.
///
/// Honors `RUST_LOG` when set; defaults to debug output for the crate under
/// test so a failing run shows the refresh protocol's decisions.
fn init_tracing() {
    TRACING.call_once(|| {
        tracing_subscriber::registry()
            .with(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "taskhub_client=debug,warn".into()),
            )
            .with(tracing_subscriber::fmt::layer().with_target(true).with_test_writer())
            .init();
    });
}

/// Test environment backed by a mockito server
pub struct TestEnvironment {
    /// Mock backend server
    pub server: mockito::ServerGuard,
    /// Client under test, wired to the mock backend
    pub client: AuthenticatedClient,
    /// Token store shared with the client and terminator
    pub store: Arc<MemoryTokenStore>,
}

impl TestEnvironment {
    /// Create an environment with the given initial token pair.
    pub async fn new(access_token: &str, refresh_token: &str) -> Self {
        init_tracing();

        let server = mockito::Server::new_async().await;

        let config =
            ClientConfig::new(server.url()).with_refresh_timeout(Duration::from_secs(2));

        let store = Arc::new(MemoryTokenStore::with_tokens(access_token, refresh_token));
        let transport =
            Arc::new(ReqwestTransport::new(Duration::from_secs(5)).expect("transport"));
        let auth_server = Arc::new(HttpAuthServer::new(&config).expect("auth server"));
        let terminator = Arc::new(Logout::new(store.clone()));

        let client = AuthenticatedClient::new(
            transport,
            store.clone(),
            auth_server,
            terminator,
            config.refresh_timeout(),
        );

        Self {
            server,
            client,
            store,
        }
    }

    /// Full URL for a backend path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.server.url(), path)
    }

    /// Current stored value for a token.
    pub fn stored(&self, key: TokenKey) -> Option<String> {
        self.store.get(key)
    }
}
