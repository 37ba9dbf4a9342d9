//! # nectar-core
//!
//! Generic resource/manager framework for the Nectar allocation API.
//!
//! This crate provides the data-marshalling layer shared by every typed
//! allocation API surface: an HTTP transport contract, lazily-hydrated
//! resources, CRUD manager helpers with pagination and client-side find,
//! and request-identifier tracking on every returned value.
//!
//! ## Modules
//!
//! - [`error`] - Error types and codes
//! - [`transport`] - The [`transport::Transport`] contract and the
//!   reqwest-backed implementation
//! - [`meta`] - Request-id tracking and metadata-bearing wrappers
//! - [`resource`] - The lazy attribute-bag [`resource::Resource`]
//! - [`manager`] - CRUD helpers, find/findall and the basic layout manager
//! - [`params`] - Query parameter and `key=value` helpers
//! - [`config`] - Client configuration

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod manager;
pub mod meta;
pub mod params;
pub mod resource;
pub mod transport;

// Re-export commonly used types
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use manager::{BasicManager, Findable, Listing, Manager, Updated};
pub use meta::{ListWithMeta, RawBody, RequestIds, WithMeta};
pub use resource::{Fetch, Resource, ToResourceId};
pub use transport::{HttpTransport, HttpTransportBuilder, ResponseMeta, Transport};
