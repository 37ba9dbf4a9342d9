//! Top-level client bundling one manager per API collection.

use crate::allocations::AllocationManager;
use crate::bundles::BundleManager;
use crate::chief_investigators::ChiefInvestigatorManager;
use crate::grants::GrantManager;
use crate::institutions::InstitutionManager;
use crate::organisations::OrganisationManager;
use crate::publications::PublicationManager;
use crate::quotas::QuotaManager;
use crate::service_types::ServiceTypeManager;
use crate::zones::ZoneManager;
use crate::Result;
use nectar_core::config::ClientConfig;
use nectar_core::transport::{HttpTransport, HttpTransportBuilder, Transport};
use std::sync::Arc;
use std::time::Duration;

/// Client for the Nectar allocation API.
///
/// All managers share one transport; the client is cheap to clone.
#[derive(Clone)]
pub struct Client {
    /// Allocation request operations.
    pub allocations: AllocationManager,
    /// Quota operations.
    pub quotas: QuotaManager,
    /// Availability zone operations.
    pub zones: ZoneManager,
    /// Grant operations.
    pub grants: GrantManager,
    /// Quota bundle operations.
    pub bundles: BundleManager,
    /// Service type operations.
    pub service_types: ServiceTypeManager,
    /// Organisation operations.
    pub organisations: OrganisationManager,
    /// Supported institution operations.
    pub institutions: InstitutionManager,
    /// Publication operations.
    pub publications: PublicationManager,
    /// Chief investigator operations.
    pub chief_investigators: ChiefInvestigatorManager,
}

impl Client {
    /// Create a client over an existing transport.
    #[must_use]
    pub fn new(api: Arc<dyn Transport>) -> Self {
        Self {
            allocations: AllocationManager::new(api.clone()),
            quotas: QuotaManager::new(api.clone()),
            zones: ZoneManager::new(api.clone()),
            grants: GrantManager::new(api.clone()),
            bundles: BundleManager::new(api.clone()),
            service_types: ServiceTypeManager::new(api.clone()),
            organisations: OrganisationManager::new(api.clone()),
            institutions: InstitutionManager::new(api.clone()),
            publications: PublicationManager::new(api.clone()),
            chief_investigators: ChiefInvestigatorManager::new(api),
        }
    }

    /// Create a client from a validated configuration.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let transport = HttpTransport::from_config(config)?;
        Ok(Self::new(Arc::new(transport)))
    }

    /// Start building a client for the given endpoint.
    #[must_use]
    pub fn builder(endpoint: impl Into<String>) -> ClientBuilder {
        ClientBuilder {
            inner: HttpTransportBuilder::new(endpoint),
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").finish_non_exhaustive()
    }
}

/// Builder for [`Client`], wrapping the transport builder.
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    inner: HttpTransportBuilder,
}

impl ClientBuilder {
    /// Override the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.inner = self.inner.with_timeout(timeout);
        self
    }

    /// Scope every request to a project.
    #[must_use]
    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.inner = self.inner.with_project_id(project_id);
        self
    }

    /// Attach a pre-issued auth token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.inner = self.inner.with_token(token);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<Client> {
        let transport = self.inner.build()?;
        Ok(Client::new(Arc::new(transport)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_produces_a_client() {
        let client = Client::builder("http://api.example.com/rest/api")
            .with_project_id("proj-1")
            .with_timeout(Duration::from_secs(10))
            .build()
            .unwrap();
        // The managers are live and share the transport.
        let _ = client.clone();
    }

    #[test]
    fn builder_rejects_garbage_endpoints() {
        assert!(Client::builder("not a url").build().is_err());
    }

    #[test]
    fn from_config_wires_the_transport() {
        let config = ClientConfig::new("https://allocations.example.com/rest/api").unwrap();
        assert!(Client::from_config(&config).is_ok());
    }
}
