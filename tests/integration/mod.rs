//! End-to-end tests of the connector, assistant and session.

pub mod assistant_test;
pub mod common;
pub mod connection_test;
pub mod session_test;
