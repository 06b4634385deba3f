//! Read-only service lookups by natural key.

use cloudsvc_core::ServiceId;
use cloudsvc_schema::{ResourceKind, ResourceSchema};
use tracing::instrument;

use crate::error::ProviderResult;
use crate::lifecycle::ServiceResource;
use crate::record::ServiceRecord;

/// Attributes a lookup is keyed on.
pub const LOOKUP_KEYS: [&str; 2] = ["project", "service_name"];

#[derive(Clone)]
pub struct ServiceDataSource {
    resource: ServiceResource,
    schema: ResourceSchema,
}

impl ServiceDataSource {
    pub fn new(resource: ServiceResource) -> Self {
        let schema = resource
            .registry()
            .datasource_schema(resource.kind(), &LOOKUP_KEYS);
        Self { resource, schema }
    }

    pub fn kind(&self) -> ResourceKind {
        self.resource.kind()
    }

    /// Every attribute is computed except the lookup keys.
    pub fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    /// Reads an existing service.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the service does not exist.
    #[instrument(skip(self), fields(kind = %self.resource.kind()))]
    pub async fn read(&self, project: &str, service_name: &str) -> ProviderResult<ServiceRecord> {
        let id = ServiceId::new(project, service_name);
        self.resource.lookup(&id).await
    }
}
