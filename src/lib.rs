//! db-chat: ask questions about a SQL database in plain language.
//!
//! A question is turned into SQL by a language model, run against the
//! connected database, and the result is narrated back as an answer.

pub mod app;
pub mod assistant;
pub mod cli;
pub mod config;
pub mod connection;
pub mod db;
pub mod error;
pub mod llm;
pub mod logging;
pub mod session;
pub mod tui;
