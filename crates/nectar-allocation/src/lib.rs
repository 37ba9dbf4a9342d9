//! Typed client for the Nectar allocation API.
//!
//! The allocation API tracks research cloud allocations: who requested
//! them, whether they were approved and which quotas they carry. This
//! crate layers typed wrappers and managers over the generic resource
//! machinery in [`nectar_core`].
//!
//! # Example
//!
//! ```no_run
//! use nectar_allocation::Client;
//!
//! # async fn run() -> nectar_allocation::Result<()> {
//! let client = Client::builder("https://allocations.example.com/rest/api")
//!     .with_project_id("my-project")
//!     .build()?;
//!
//! let allocation = client
//!     .allocations
//!     .get_current(&[("project_id".to_string(), "abc123".to_string())])
//!     .await?;
//! println!("{allocation}");
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod allocations;
pub mod bundles;
pub mod chief_investigators;
pub mod client;
pub mod grants;
pub mod institutions;
pub mod organisations;
pub mod publications;
pub mod quotas;
pub mod service_types;
pub mod states;
pub mod zones;

pub use allocations::{Allocation, AllocationManager, CreateAllocationRequest};
pub use bundles::{Bundle, BundleManager};
pub use chief_investigators::{
    ChiefInvestigator, ChiefInvestigatorManager, CreateChiefInvestigatorRequest,
};
pub use client::{Client, ClientBuilder};
pub use grants::{CreateGrantRequest, Grant, GrantManager};
pub use institutions::{Institution, InstitutionManager};
pub use organisations::{CreateOrganisationRequest, Organisation, OrganisationManager};
pub use publications::{Publication, PublicationManager};
pub use service_types::{ServiceType, ServiceTypeManager};
pub use nectar_core::config::ClientConfig;
pub use nectar_core::error::Error;
pub use nectar_core::manager::Updated;
pub use nectar_core::meta::{ListWithMeta, RawBody, RequestIds, WithMeta};
pub use nectar_core::resource::{Resource, ToResourceId};
pub use nectar_core::transport::{HttpTransport, Transport};
pub use quotas::{Quota, QuotaListParams, QuotaManager};
pub use zones::{Zone, ZoneManager};

/// Specialized result type for allocation client operations.
pub type Result<T> = nectar_core::error::Result<T>;
