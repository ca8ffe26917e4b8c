pub mod client;
pub mod transport;

pub use client::AuthenticatedClient;
pub use transport::{HttpTransport, ReqwestTransport, RequestDescriptor, TransportResponse};
