//! Integration test utilities for the chat relay
//!
//! This crate provides helpers for running end-to-end tests against
//! a live relay over real WebSocket connections.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
