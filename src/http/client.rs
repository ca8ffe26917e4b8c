use std::mem;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use http::header::{HeaderValue, AUTHORIZATION};
use http::StatusCode;
use serde::Serialize;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::auth::server::AuthServerClient;
use crate::auth::session::SessionTerminator;
use crate::auth::store::TokenStore;
use crate::auth::token::{SessionTokens, TokenKey};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::http::transport::{HttpTransport, ReqwestTransport, RequestDescriptor, TransportResponse};

/// A request parked while a refresh exchange is in flight.
///
/// Holds the original descriptor and a completion handle; the draining logic
/// settles the handle exactly once, with either the replayed response or the
/// refresh failure.
struct PendingRequest {
    request: RequestDescriptor,
    completion: oneshot::Sender<Result<TransportResponse>>,
}

/// Refresh protocol state: Idle (`refreshing == false`) or Refreshing.
///
/// Guarded by a synchronous mutex so the check-and-set that elects the one
/// request allowed to run the exchange happens in a single critical section
/// with no await point in between. The lock is never held across an await.
#[derive(Default)]
struct RefreshState {
    refreshing: bool,
    pending: Vec<PendingRequest>,
}

/// HTTP client that authenticates every request and transparently survives
/// access-token expiry.
///
/// Each outgoing request carries the stored access token as a bearer header.
/// When a request comes back 401, the client refreshes the token pair once,
/// replays the request, and returns the replayed response; concurrent 401s
/// during the exchange are queued and replayed in arrival order once it
/// settles. A request is retried at most once: a second 401 after the replay
/// is returned to the caller as-is. If the refresh itself fails, or no
/// refresh token is stored, the session is terminated and the affected calls
/// are rejected.
///
/// All collaborators are injected, so tests can run against fresh instances
/// with in-memory doubles.
pub struct AuthenticatedClient {
    transport: Arc<dyn HttpTransport>,
    store: Arc<dyn TokenStore>,
    auth_server: Arc<dyn AuthServerClient>,
    terminator: Arc<dyn SessionTerminator>,
    refresh_timeout: Duration,
    state: Mutex<RefreshState>,
}

impl AuthenticatedClient {
    /// Create a client from its collaborators.
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        store: Arc<dyn TokenStore>,
        auth_server: Arc<dyn AuthServerClient>,
        terminator: Arc<dyn SessionTerminator>,
        refresh_timeout: Duration,
    ) -> Self {
        Self {
            transport,
            store,
            auth_server,
            terminator,
            refresh_timeout,
            state: Mutex::new(RefreshState::default()),
        }
    }

    /// Wire up the default reqwest transport, HTTP auth server, and logout
    /// terminator for the configured backend.
    pub fn for_backend(config: &ClientConfig, store: Arc<dyn TokenStore>) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(config.request_timeout())?);
        let auth_server = Arc::new(crate::auth::server::HttpAuthServer::new(config)?);
        let terminator = Arc::new(crate::auth::session::Logout::new(store.clone()));

        Ok(Self::new(
            transport,
            store,
            auth_server,
            terminator,
            config.refresh_timeout(),
        ))
    }

    /// Send a request through the authenticated pipeline.
    ///
    /// The returned response may carry any HTTP status; only connection
    /// failures and unrecoverable refresh failures are errors.
    pub async fn execute(&self, request: RequestDescriptor) -> Result<TransportResponse> {
        let request_id = Uuid::new_v4();

        // The original descriptor is kept untouched for a potential replay;
        // the token goes on a clone.
        let mut outgoing = request.clone();
        self.attach_stored_token(&mut outgoing);

        let response = self.transport.send(outgoing).await?;
        if response.status != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        debug!(%request_id, url = %request.url, "Request was rejected as unauthorized");
        self.recover_from_unauthorized(request, request_id).await
    }

    /// Convenience: GET a URL.
    pub async fn get(&self, url: impl Into<String>) -> Result<TransportResponse> {
        self.execute(RequestDescriptor::get(url)).await
    }

    /// Convenience: POST a JSON body.
    pub async fn post_json<T: Serialize>(
        &self,
        url: impl Into<String>,
        body: &T,
    ) -> Result<TransportResponse> {
        self.execute(RequestDescriptor::post(url).with_json(body)?)
            .await
    }

    /// Convenience: PUT a JSON body.
    pub async fn put_json<T: Serialize>(
        &self,
        url: impl Into<String>,
        body: &T,
    ) -> Result<TransportResponse> {
        self.execute(RequestDescriptor::put(url).with_json(body)?)
            .await
    }

    /// Convenience: DELETE a URL.
    pub async fn delete(&self, url: impl Into<String>) -> Result<TransportResponse> {
        self.execute(RequestDescriptor::delete(url)).await
    }

    /// The refresh protocol, entered exactly once per request.
    ///
    /// The replay after a successful refresh is a direct resend, so a
    /// request can never trigger a second refresh cycle for itself.
    async fn recover_from_unauthorized(
        &self,
        request: RequestDescriptor,
        request_id: Uuid,
    ) -> Result<TransportResponse> {
        let Some(refresh_token) = self.store.get(TokenKey::RefreshToken) else {
            warn!(%request_id, "No refresh token stored, terminating session");
            self.terminator.terminate();
            return Err(ClientError::NoRefreshToken);
        };

        // Elect a leader or join the queue, atomically.
        let waiter = {
            let mut state = self.lock_state();
            if state.refreshing {
                let (tx, rx) = oneshot::channel();
                state.pending.push(PendingRequest {
                    request: request.clone(),
                    completion: tx,
                });
                Some(rx)
            } else {
                state.refreshing = true;
                None
            }
        };

        if let Some(rx) = waiter {
            debug!(%request_id, "Refresh already in flight, queueing request");
            return match rx.await {
                Ok(result) => result,
                // The leader was dropped mid-cycle without settling us.
                Err(_) => Err(ClientError::refresh_failed(
                    "refresh cycle ended without settling queued request",
                )),
            };
        }

        match self.run_refresh_exchange(&refresh_token).await {
            Ok(tokens) => {
                self.store.set(TokenKey::AccessToken, &tokens.access_token);
                self.store.set(TokenKey::RefreshToken, &tokens.refresh_token);

                let pending = self.settle_refresh_state();
                info!(
                    %request_id,
                    queued = pending.len(),
                    "Token refresh succeeded, replaying requests"
                );

                // Drain in arrival order before replaying the trigger.
                for entry in pending {
                    let result = self.resend(entry.request, &tokens.access_token).await;
                    // Receiver may have been dropped by a cancelled caller.
                    let _ = entry.completion.send(result);
                }

                self.resend(request, &tokens.access_token).await
            }
            Err(err) => {
                let pending = self.settle_refresh_state();
                error!(
                    %request_id,
                    queued = pending.len(),
                    error = %err,
                    "Token refresh failed, rejecting dependent requests"
                );

                let reason = err.to_string();
                for entry in pending {
                    let _ = entry
                        .completion
                        .send(Err(ClientError::refresh_failed(reason.clone())));
                }

                self.terminator.terminate();
                Err(err)
            }
        }
    }

    /// Run the refresh exchange under the configured timeout.
    async fn run_refresh_exchange(&self, refresh_token: &str) -> Result<SessionTokens> {
        match tokio::time::timeout(self.refresh_timeout, self.auth_server.refresh(refresh_token))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(ClientError::refresh_failed(format!(
                "refresh exchange timed out after {:?}",
                self.refresh_timeout
            ))),
        }
    }

    /// Leave the Refreshing state and take ownership of the queue, in one
    /// critical section. Runs unconditionally when the exchange settles,
    /// success or failure, so a later 401 can start a fresh cycle.
    fn settle_refresh_state(&self) -> Vec<PendingRequest> {
        let mut state = self.lock_state();
        state.refreshing = false;
        mem::take(&mut state.pending)
    }

    /// Direct resend with an explicit token. Does not re-enter the refresh
    /// protocol: whatever status comes back is final for this request.
    async fn resend(
        &self,
        mut request: RequestDescriptor,
        access_token: &str,
    ) -> Result<TransportResponse> {
        Self::set_bearer(&mut request, access_token);
        self.transport.send(request).await
    }

    /// Attach the stored access token, if any. A missing token is not an
    /// error: the request goes out unauthenticated and the server decides.
    fn attach_stored_token(&self, request: &mut RequestDescriptor) {
        if let Some(token) = self.store.get(TokenKey::AccessToken) {
            Self::set_bearer(request, &token);
        }
    }

    fn set_bearer(request: &mut RequestDescriptor, token: &str) {
        match HeaderValue::from_str(&format!("Bearer {}", token)) {
            Ok(value) => {
                request.headers.insert(AUTHORIZATION, value);
            }
            Err(e) => {
                // Token contains bytes that cannot go in a header; send
                // without it and let the server reject the call.
                warn!(error = %e, "Stored access token is not a valid header value");
            }
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, RefreshState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
