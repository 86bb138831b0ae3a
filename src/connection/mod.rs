//! Connection management for db-chat.
//!
//! Turns the five connection fields into a live database handle.

pub mod connector;

pub use connector::{Connector, DatabaseHandle};
