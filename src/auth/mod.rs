pub mod server;
pub mod session;
pub mod store;
pub mod token;

pub use server::{AuthServerClient, HttpAuthServer};
pub use session::{Logout, SessionTerminator};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use token::{SessionTokens, TokenKey};
