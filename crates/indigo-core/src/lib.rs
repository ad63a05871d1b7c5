//! # indigo-core
//!
//! Core types and utilities for working with the WebArena Indigo API.
//!
//! This crate provides error handling, client configuration, the shared HTTP
//! transport and per-call cancellation used by the endpoint crates.
//!
//! ## Modules
//!
//! - [`error`] - Error types, stage labels and HTTP error mapping
//! - [`config`] - Serializable, validated client configuration
//! - [`client`] - HTTP client settings and the authenticated transport helper
//! - [`context`] - Per-call cancellation and deadlines

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod context;
pub mod error;

// Re-export commonly used types
pub use context::{CancelHandle, RequestContext};
pub use error::{Error, Result, Stage};
