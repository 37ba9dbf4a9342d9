//! Allocation resources and their manager.
//!
//! An allocation is the central record of the API: a project's request
//! for cloud resources, its approval state and its granted quotas. The
//! raw `quotas` field of the server payload is re-modelled as constructed
//! [`Quota`] sub-resources; the flattened `to_dict` view still reflects
//! the payload as received.

use crate::quotas::Quota;
use crate::states;
use crate::Result;
use nectar_core::error::Error;
use nectar_core::manager::{BasicManager, Updated};
use nectar_core::meta::{ListWithMeta, RawBody, RequestIds, WithMeta};
use nectar_core::params::QueryParams;
use nectar_core::resource::{Resource, ToResourceId};
use nectar_core::transport::Transport;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// One allocation record.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    resource: Resource,
    /// Granted quotas, constructed from the raw payload.
    pub quotas: Vec<Quota>,
}

impl Allocation {
    /// Wrap a raw resource as an allocation, constructing its quota
    /// sub-resources.
    #[must_use]
    pub fn from_resource(resource: Resource) -> Self {
        let quotas = resource
            .get("quotas")
            .and_then(Value::as_array)
            .map(|raw| {
                raw.iter()
                    .filter_map(|item| {
                        Resource::from_value("Quota", item.clone(), false).ok()
                    })
                    .map(Quota::from_resource)
                    .collect()
            })
            .unwrap_or_default();
        Self { resource, quotas }
    }

    /// The underlying attribute bag.
    #[must_use]
    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    /// Allocation id.
    #[must_use]
    pub fn id(&self) -> Option<i64> {
        self.resource.id().and_then(Value::as_i64)
    }

    /// Project name.
    #[must_use]
    pub fn project_name(&self) -> Option<&str> {
        self.resource.get("project_name").and_then(Value::as_str)
    }

    /// Status code; see [`crate::states`].
    #[must_use]
    pub fn status(&self) -> Option<&str> {
        self.resource.get("status").and_then(Value::as_str)
    }

    /// Whether the allocation is currently approved.
    #[must_use]
    pub fn is_approved(&self) -> bool {
        self.status() == Some(states::APPROVED)
    }

    /// Read any attribute without triggering a lazy load.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.resource.get(name)
    }

    /// Read an attribute, hydrating the allocation first if it was built
    /// from a partial payload.
    pub async fn attr(&mut self, name: &str) -> Result<Value> {
        self.resource.attr(name).await
    }

    /// Identifiers of the responses that produced this allocation.
    #[must_use]
    pub fn request_ids(&self) -> &RequestIds {
        self.resource.request_ids()
    }

    /// Flattened attribute mapping, as received from the server.
    #[must_use]
    pub fn to_dict(&self) -> Map<String, Value> {
        self.resource.to_dict()
    }

    /// Quotas granted for one service type.
    #[must_use]
    pub fn quotas_for_service_type(&self, service_type: &str) -> Vec<&Quota> {
        self.quotas
            .iter()
            .filter(|quota| quota.service_type() == Some(service_type))
            .collect()
    }

    /// Granted amounts for one service type, keyed by resource suffix.
    #[must_use]
    pub fn allocated_quota(&self, service_type: &str) -> BTreeMap<String, i64> {
        let mut amounts = BTreeMap::new();
        for quota in self.quotas_for_service_type(service_type) {
            if let (Some(suffix), Some(amount)) = (quota.resource_suffix(), quota.quota()) {
                amounts.insert(suffix.to_string(), amount);
            }
        }
        amounts
    }

    /// Compute quota amounts ready to hand to a compute service.
    ///
    /// Empty unless both cores and instances were granted. A missing or
    /// zero RAM grant defaults to four gigabytes per core, or unlimited
    /// when cores are unlimited.
    #[must_use]
    pub fn allocated_compute_quota(&self) -> BTreeMap<String, i64> {
        let mut amounts = self.allocated_quota("compute");
        let cores = amounts.get("cores").copied().unwrap_or(0);
        let instances = amounts.get("instances").copied().unwrap_or(0);
        if cores == 0 || instances == 0 {
            return BTreeMap::new();
        }
        if amounts.get("ram").copied().unwrap_or(0) == 0 {
            let ram = if cores == -1 { -1 } else { cores * 4 };
            amounts.insert("ram".to_string(), ram);
        }
        amounts
    }

    /// Rating quota amounts for a cloudkitty-style service, keyed by
    /// resource suffix.
    #[must_use]
    pub fn allocated_rating_quota(&self) -> BTreeMap<String, i64> {
        self.allocated_quota("rating")
    }

    /// Database quota amounts for a trove-style service.
    ///
    /// A missing or zero RAM grant defaults to eight gigabytes; a missing
    /// volume grant defaults to five gigabytes per gigabyte of RAM.
    #[must_use]
    pub fn allocated_database_quota(&self) -> BTreeMap<String, i64> {
        let mut amounts = self.allocated_quota("database");
        if amounts.is_empty() {
            return amounts;
        }
        let ram = match amounts.get("ram").copied() {
            Some(ram) if ram != 0 => ram,
            _ => {
                amounts.insert("ram".to_string(), 8);
                8
            }
        };
        amounts.entry("volumes".to_string()).or_insert(ram * 5);
        amounts
    }

    /// Share quota amounts for a manila-style service, per zone and in
    /// total. The totals are always present, zeroed when nothing was
    /// granted.
    #[must_use]
    pub fn allocated_share_quota(&self) -> BTreeMap<String, i64> {
        let mut amounts = BTreeMap::new();
        for key in ["shares", "gigabytes", "snapshots", "snapshot_gigabytes"] {
            amounts.insert(key.to_string(), 0);
        }
        for quota in self.quotas_for_service_type("share") {
            let (Some(suffix), Some(zone), Some(amount)) =
                (quota.resource_suffix(), quota.zone(), quota.quota())
            else {
                continue;
            };
            amounts.insert(format!("{suffix}_{zone}"), amount);
            if let Some(total) = amounts.get_mut(suffix) {
                *total += amount;
            }
        }
        amounts
    }

    /// Network quota amounts for a neutron-style service.
    ///
    /// Subnets are granted implicitly alongside networks, and the load
    /// balancer grant belongs to [`Allocation::allocated_load_balancer_quota`].
    #[must_use]
    pub fn allocated_network_quota(&self) -> BTreeMap<String, i64> {
        let mut amounts = self.allocated_quota("network");
        if amounts.is_empty() {
            return amounts;
        }
        if let Some(network) = amounts.get("network").copied() {
            amounts.insert("subnet".to_string(), network);
        }
        amounts.remove("loadbalancer");
        amounts
    }

    /// Load balancer quota for an octavia-style service. The grant lives
    /// in the network group.
    #[must_use]
    pub fn allocated_load_balancer_quota(&self) -> BTreeMap<String, i64> {
        let mut amounts = BTreeMap::new();
        for quota in self.quotas_for_service_type("network") {
            if quota.resource_suffix() != Some("loadbalancer") {
                continue;
            }
            if let Some(amount) = quota.quota() {
                amounts.insert("load_balancers".to_string(), amount);
            }
        }
        amounts
    }

    /// Container orchestration quota amounts for a magnum-style service,
    /// keyed by resource suffix.
    #[must_use]
    pub fn allocated_container_infra_quota(&self) -> BTreeMap<String, i64> {
        self.allocated_quota("container-infra")
    }

    /// Reservation quota amounts. A day grant also yields its hour
    /// equivalent, which is what the reservation service consumes.
    #[must_use]
    pub fn allocated_reservation_quota(&self) -> BTreeMap<String, i64> {
        let mut amounts = self.allocated_quota("nectar-reservation");
        if let Some(days) = amounts.get("days").copied() {
            amounts.insert("hours".to_string(), days * 24);
        }
        amounts
    }

    /// Object storage quota amount, keyed for a swift-style service.
    #[must_use]
    pub fn allocated_object_storage_quota(&self) -> BTreeMap<String, i64> {
        let mut amounts = BTreeMap::new();
        for quota in self.quotas_for_service_type("object") {
            if let Some(amount) = quota.quota() {
                amounts.insert("object".to_string(), amount);
            }
        }
        amounts
    }

    /// Volume quota amounts, per zone and in total.
    #[must_use]
    pub fn allocated_volume_quota(&self) -> BTreeMap<String, i64> {
        let quotas = self.quotas_for_service_type("volume");
        if quotas.is_empty() {
            return BTreeMap::new();
        }
        let mut amounts = BTreeMap::new();
        let mut total = 0;
        for quota in quotas {
            let (Some(zone), Some(amount)) = (quota.zone(), quota.quota()) else {
                continue;
            };
            amounts.insert(format!("volumes_{zone}"), amount);
            amounts.insert(format!("gigabytes_{zone}"), amount);
            amounts.insert(format!("snapshots_{zone}"), amount);
            total += amount;
        }
        amounts.insert("volumes".to_string(), total);
        amounts.insert("gigabytes".to_string(), total);
        amounts.insert("snapshots".to_string(), total);
        amounts
    }
}

impl ToResourceId for Allocation {
    fn resource_id(&self) -> Value {
        self.resource.resource_id()
    }
}

impl fmt::Display for Allocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Allocation {} ({})>",
            self.id().map_or_else(|| "?".to_string(), |id| id.to_string()),
            self.project_name().unwrap_or("?"),
        )
    }
}

/// Payload for creating an allocation request.
///
/// All fields are sent explicitly; the server applies no client-side
/// hidden defaults beyond the ones baked into [`CreateAllocationRequest::new`].
#[derive(Debug, Clone, Serialize)]
pub struct CreateAllocationRequest {
    /// Requested project name.
    pub project_name: String,
    /// Human-readable project description.
    pub project_description: String,
    /// Justification for the request; must not be empty.
    pub use_case: String,
    /// Expected number of users.
    pub estimated_number_users: u32,
    /// Expected duration in months.
    pub estimated_project_duration: u32,
    /// Convert an existing trial project instead of creating a new one.
    pub convert_trial_project: bool,
    /// Site the allocation is associated with.
    pub associated_site: Option<String>,
    /// Whether the allocation is nationally funded.
    pub national: bool,
    /// Primary field-of-research code.
    pub field_of_research_1: Option<String>,
    /// Secondary field-of-research code.
    pub field_of_research_2: Option<String>,
    /// Tertiary field-of-research code.
    pub field_of_research_3: Option<String>,
    /// Percentage attributed to the primary FoR code.
    pub for_percentage_1: u32,
    /// Percentage attributed to the secondary FoR code.
    pub for_percentage_2: u32,
    /// Percentage attributed to the tertiary FoR code.
    pub for_percentage_3: u32,
    /// Geographic placement requirements.
    pub geographic_requirements: String,
    /// NCRIS facilities supporting the project.
    pub ncris_support: String,
    /// Nectar programs supporting the project.
    pub nectar_support: String,
    /// Expected usage patterns.
    pub usage_patterns: String,
    /// Whether to send notification emails.
    pub notifications: bool,
    /// Whether the allocation is managed through the standard workflow.
    pub managed: bool,
}

impl CreateAllocationRequest {
    /// Create a request with the standard defaults.
    #[must_use]
    pub fn new(
        project_name: impl Into<String>,
        project_description: impl Into<String>,
        use_case: impl Into<String>,
    ) -> Self {
        Self {
            project_name: project_name.into(),
            project_description: project_description.into(),
            use_case: use_case.into(),
            estimated_number_users: 1,
            estimated_project_duration: 3,
            convert_trial_project: false,
            associated_site: None,
            national: false,
            field_of_research_1: None,
            field_of_research_2: None,
            field_of_research_3: None,
            for_percentage_1: 0,
            for_percentage_2: 0,
            for_percentage_3: 0,
            geographic_requirements: String::new(),
            ncris_support: String::new(),
            nectar_support: String::new(),
            usage_patterns: String::new(),
            notifications: true,
            managed: true,
        }
    }
}

/// Manager for `/allocations/`.
#[derive(Debug, Clone)]
pub struct AllocationManager {
    basic: BasicManager,
}

impl AllocationManager {
    /// Create an allocation manager over the given transport.
    #[must_use]
    pub fn new(api: Arc<dyn Transport>) -> Self {
        Self {
            basic: BasicManager::new(api, "Allocation", "allocations"),
        }
    }

    /// List allocations matching the filter parameters.
    pub async fn list(&self, params: &[(String, String)]) -> Result<ListWithMeta<Allocation>> {
        let listed = self.basic.list(params).await?;
        let request_ids = listed.request_ids().clone();
        let allocations = listed
            .into_inner()
            .into_iter()
            .map(Allocation::from_resource)
            .collect();
        Ok(WithMeta::with_request_ids(allocations, request_ids))
    }

    /// Fetch one allocation by id.
    pub async fn get(&self, id: impl ToResourceId) -> Result<Allocation> {
        Ok(Allocation::from_resource(self.basic.get(id).await?))
    }

    /// The current (non-amendment) allocation matching the filters.
    ///
    /// Adds `parent_request__isnull=true` so amendment records are
    /// excluded, and requires exactly one match.
    pub async fn get_current(
        &self,
        params: &[(String, String)],
    ) -> Result<Allocation> {
        let mut query = QueryParams::new();
        for (key, value) in params {
            query.push(key.clone(), value);
        }
        query.push("parent_request__isnull", "true");

        let mut allocations = self.list(&query.into_pairs()).await?.into_inner();
        match allocations.len() {
            1 => Ok(allocations.remove(0)),
            0 => Err(Error::not_found("Allocation", render_params(params))),
            _ => Err(Error::NoUniqueMatch {
                resource: "Allocation".to_string(),
                filters: render_params(params),
            }),
        }
    }

    /// The most recent approved allocation matching the filters.
    pub async fn get_last_approved(
        &self,
        params: &[(String, String)],
    ) -> Result<Allocation> {
        let mut query = QueryParams::new();
        for (key, value) in params {
            query.push(key.clone(), value);
        }
        query.push("status", states::APPROVED);

        let mut allocations = self.list(&query.into_pairs()).await?.into_inner();
        if allocations.is_empty() {
            return Err(Error::not_found("Allocation", render_params(params)));
        }
        Ok(allocations.remove(0))
    }

    /// Submit a new allocation request.
    pub async fn create(&self, request: &CreateAllocationRequest) -> Result<Allocation> {
        if request.use_case.is_empty() {
            return Err(Error::InvalidRequest(
                "a non-empty use_case is mandatory".to_string(),
            ));
        }
        let data = serde_json::to_value(request)?;
        let created = self
            .basic
            .manager()
            .create(&self.basic.collection_url(), Some(&data), None, None)
            .await?;
        Ok(Allocation::from_resource(created))
    }

    /// Update allocation fields.
    ///
    /// The server may acknowledge without a body, in which case the
    /// outcome is [`Updated::NoContent`]; a body-bearing outcome converts
    /// with [`Allocation::from_resource`].
    pub async fn update(&self, id: impl ToResourceId, data: Value) -> Result<Updated> {
        let id = id.resource_id();
        self.basic
            .manager()
            .update(&self.basic.member_url(&id), &data, None, None)
            .await
    }

    /// Approve an allocation request.
    pub async fn approve(&self, id: impl ToResourceId) -> Result<Allocation> {
        self.action(id, "approve").await
    }

    /// Open an amendment for an approved allocation.
    pub async fn amend(&self, id: impl ToResourceId) -> Result<Allocation> {
        self.action(id, "amend").await
    }

    /// Mark an allocation as deleted. This is a state transition on the
    /// server, issued as a POST action, not an HTTP DELETE.
    pub async fn delete(&self, id: impl ToResourceId) -> Result<Allocation> {
        let id = id.resource_id();
        tracing::debug!(id = %id, "requesting allocation deletion");
        self.action(id, "delete").await
    }

    /// Approver-facing summary for an allocation, passed through verbatim.
    pub async fn get_approver_info(
        &self,
        id: impl ToResourceId,
    ) -> Result<WithMeta<RawBody>> {
        let id = id.resource_id();
        let url = format!("{}approver_info/", self.basic.member_url(&id));
        self.basic.manager().get_raw(&url, None, None).await
    }

    async fn action(&self, id: impl ToResourceId, action: &str) -> Result<Allocation> {
        let id = id.resource_id();
        let url = format!("{}{action}/", self.basic.member_url(&id));
        let created = self.basic.manager().create(&url, None, None, None).await?;
        Ok(Allocation::from_resource(created))
    }
}

fn render_params(params: &[(String, String)]) -> String {
    let rendered: Vec<String> = params
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect();
    rendered.join(", ")
}
