use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;

use crate::auth::store::TokenStore;
use crate::auth::token::TokenKey;

/// Ends the local session after an unrecoverable authorization failure.
///
/// `terminate` must be idempotent: overlapping failure paths (a failed
/// refresh and a missing refresh token racing each other) may all call it.
pub trait SessionTerminator: Send + Sync {
    /// Clear stored credentials and send the user back to the
    /// unauthenticated entry point.
    fn terminate(&self);
}

/// Default [`SessionTerminator`]: clears both tokens from the store and
/// fires a navigation hook at most once per session.
///
/// Clearing the store is naturally idempotent and repeated on every call;
/// the hook (typically a redirect to the login screen) is guarded so a burst
/// of concurrent failures triggers a single navigation.
pub struct Logout {
    store: Arc<dyn TokenStore>,
    on_logout: Option<Box<dyn Fn() + Send + Sync>>,
    hook_fired: AtomicBool,
}

impl Logout {
    /// Create a terminator that only clears the token store.
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self {
            store,
            on_logout: None,
            hook_fired: AtomicBool::new(false),
        }
    }

    /// Attach a hook invoked once on the first termination, e.g. to
    /// navigate to the login screen.
    pub fn with_hook(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_logout = Some(Box::new(hook));
        self
    }
}

impl SessionTerminator for Logout {
    fn terminate(&self) {
        self.store.remove(TokenKey::AccessToken);
        self.store.remove(TokenKey::RefreshToken);

        // swap, not store: only the first caller fires the hook
        if !self.hook_fired.swap(true, Ordering::SeqCst) {
            info!("Session terminated, returning to login");
            if let Some(hook) = &self.on_logout {
                hook();
            }
        }
    }
}
