//! UI tests that run the binary in headless mode.

pub mod common;
pub mod headless_test;
