//! Integration tests for the TaskHub client
//! These tests exercise the real reqwest transport and auth server client
//! against mock HTTP endpoints rather than in-process doubles.

pub mod test_harness;

pub mod auth_server_test;
pub mod refresh_flow_test;
