pub mod auth;
pub mod config;
pub mod error;
pub mod http;

// Re-export core components
pub use crate::auth::{
    AuthServerClient, FileTokenStore, HttpAuthServer, Logout, MemoryTokenStore, SessionTerminator,
    SessionTokens, TokenKey, TokenStore,
};
pub use crate::config::ClientConfig;
pub use crate::error::{ClientError, Result};
pub use crate::http::{
    AuthenticatedClient, HttpTransport, ReqwestTransport, RequestDescriptor, TransportResponse,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
