//! Shared test utilities for the extman workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`host`]: [`TestHost`] temporary host with extension source fixtures

pub mod host;

pub use host::{ExtensionFixture, TestHost};
