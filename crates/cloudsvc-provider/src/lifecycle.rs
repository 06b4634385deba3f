//! Resource lifecycle controller.
//!
//! [`ServiceResource`] implements create, read, update, delete and import
//! for one resource kind. Everything it holds is immutable and shared, so a
//! single controller can serve concurrent calls for different services.

use std::sync::Arc;

use cloudsvc_api::{
    CreateServiceRequest, NewServiceIntegration, RemoteMaintenance, RemoteService,
    ServiceApi, UpdateServiceRequest,
};
use cloudsvc_core::{ServiceId, ServiceType, VpcId};
use cloudsvc_schema::{
    ResourceKind, ResourceSchema, SchemaRegistry, carry_write_only, from_remote, prepare_update,
    to_remote,
};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::config::{ProviderConfig, TimeoutConfig};
use crate::error::{ProviderError, ProviderResult};
use crate::projection;
use crate::record::{Component, ServiceRecord};
use crate::waiter::{ChangeWaiter, Clock, Operation, TokioClock};

/// Result of a read.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    Present(ServiceRecord),
    /// The remote no longer knows the service; drop the local record.
    Gone,
}

impl ReadOutcome {
    pub fn into_record(self) -> Option<ServiceRecord> {
        match self {
            Self::Present(record) => Some(record),
            Self::Gone => None,
        }
    }
}

const INTEGRATIONS_CREATE_ONLY: &str =
    "service_integrations field can only be set during creation of a service";

#[derive(Clone)]
pub struct ServiceResource {
    kind: ResourceKind,
    schema: ResourceSchema,
    registry: Arc<SchemaRegistry>,
    api: Arc<dyn ServiceApi>,
    waiter: ChangeWaiter,
    timeouts: TimeoutConfig,
}

impl ServiceResource {
    pub fn new(
        kind: ResourceKind,
        registry: Arc<SchemaRegistry>,
        api: Arc<dyn ServiceApi>,
        config: &ProviderConfig,
    ) -> Self {
        Self::with_clock(kind, registry, api, Arc::new(TokioClock), config)
    }

    /// Controller whose change waiter uses `clock` instead of wall time.
    pub fn with_clock(
        kind: ResourceKind,
        registry: Arc<SchemaRegistry>,
        api: Arc<dyn ServiceApi>,
        clock: Arc<dyn Clock>,
        config: &ProviderConfig,
    ) -> Self {
        let waiter = ChangeWaiter::new(api.clone(), clock, config.polling.policy());
        Self {
            kind,
            schema: registry.resource_schema(kind),
            registry,
            api,
            waiter,
            timeouts: config.timeouts.clone(),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Decodes a declarative document for this resource kind.
    pub fn decode(&self, input: &Value) -> ProviderResult<ServiceRecord> {
        ServiceRecord::from_declarative(&self.registry, self.kind, input)
    }

    /// Creates the service and waits until it is running.
    #[instrument(skip_all, fields(kind = %self.kind, project = %planned.project, service = %planned.service_name))]
    pub async fn create(
        &self,
        planned: &ServiceRecord,
        cancel: &CancellationToken,
    ) -> ProviderResult<ServiceRecord> {
        let ty = self.service_type_of(planned)?;
        require("project", &planned.project)?;
        require("service_name", &planned.service_name)?;
        let maintenance = planned.maintenance()?.map(|m| RemoteMaintenance {
            dow: m.dow,
            time: m.time,
        });
        let vpc = parse_vpc(planned)?;
        let user_config = to_remote(self.registry.user_config(ty), &planned.user_config, true)?;

        let request = CreateServiceRequest {
            service_name: planned.service_name.clone(),
            service_type: ty.as_str().to_string(),
            cloud: planned.cloud_name.clone(),
            plan: planned.plan.clone(),
            maintenance,
            project_vpc_id: vpc.map(|v| v.vpc_id),
            termination_protection: planned.termination_protection,
            user_config,
            service_integrations: planned
                .service_integrations
                .iter()
                .map(|i| NewServiceIntegration {
                    integration_type: i.integration_type.as_str().to_string(),
                    source_service: i.source_service_name.clone(),
                })
                .collect(),
        };

        info!(service_type = %ty, "Creating service");
        let submitted = self.api.create(&planned.project, &request).await?;
        debug!(state = %submitted.state, "Create accepted");

        let id = ServiceId::new(&planned.project, &planned.service_name);
        let remote = self
            .waiter
            .wait(&id, Operation::Create, self.timeouts.create(), cancel)
            .await?;

        let mut record = planned.clone();
        record.id = Some(id);
        record.connection_blocks.seed_empty(&self.kind.block_types());
        self.copy_from_remote(&mut record, &remote, planned)?;
        info!("Service created");
        Ok(record)
    }

    /// Refreshes `current` from the remote. Never mutates the remote.
    #[instrument(skip_all, fields(kind = %self.kind))]
    pub async fn read(&self, current: &ServiceRecord) -> ProviderResult<ReadOutcome> {
        let id = current.service_id()?;
        let remote = match self.api.get(&id.project, &id.service_name).await {
            Ok(remote) => remote,
            Err(e) if e.is_not_found() => {
                info!(service = %id, "Service no longer exists remotely");
                return Ok(ReadOutcome::Gone);
            }
            Err(e) => return Err(e.into()),
        };

        let mut record = current.clone();
        record.id = Some(id);
        record.connection_blocks.seed_empty(&self.kind.block_types());
        self.copy_from_remote(&mut record, &remote, current)?;
        Ok(ReadOutcome::Present(record))
    }

    /// Applies `planned` over `prior` and waits until the service is running
    /// again.
    ///
    /// Integration changes and create-only changes are rejected before any
    /// remote call.
    #[instrument(skip_all, fields(kind = %self.kind, project = %prior.project, service = %prior.service_name))]
    pub async fn update(
        &self,
        prior: &ServiceRecord,
        planned: &ServiceRecord,
        cancel: &CancellationToken,
    ) -> ProviderResult<ServiceRecord> {
        let id = prior.service_id()?;
        let ty = self.service_type_of(planned)?;

        if planned.service_integrations != prior.service_integrations
            && !planned.service_integrations.is_empty()
        {
            return Err(ProviderError::validation(
                "service_integrations",
                INTEGRATIONS_CREATE_ONLY,
            ));
        }
        self.check_create_only(prior, planned)?;

        let shape = self.registry.user_config(ty);
        let changes = prepare_update(shape, &prior.user_config, &planned.user_config)?;
        let user_config = to_remote(shape, &changes, false)?;
        let maintenance = planned.maintenance()?.map(|m| RemoteMaintenance {
            dow: m.dow,
            time: m.time,
        });
        let vpc = parse_vpc(planned)?;

        let request = UpdateServiceRequest {
            cloud: planned.cloud_name.clone(),
            plan: planned.plan.clone(),
            maintenance,
            project_vpc_id: vpc.map(|v| v.vpc_id),
            termination_protection: planned.termination_protection,
            powered: true,
            user_config,
        };

        info!("Updating service");
        self.api.update(&id.project, &id.service_name, &request).await?;
        let remote = self
            .waiter
            .wait(&id, Operation::Update, self.timeouts.update(), cancel)
            .await?;

        let mut record = planned.clone();
        record.id = Some(id);
        record.connection_blocks.seed_empty(&self.kind.block_types());
        self.copy_from_remote(&mut record, &remote, planned)?;
        info!("Service updated");
        Ok(record)
    }

    /// Deletes the service. A service that is already gone is not an error.
    #[instrument(skip_all, fields(kind = %self.kind))]
    pub async fn delete(&self, current: &ServiceRecord) -> ProviderResult<()> {
        let id = current.service_id()?;
        if current.termination_protection {
            warn!(service = %id, "Service has termination protection enabled, the remote will refuse to delete it");
        }
        match self.api.delete(&id.project, &id.service_name).await {
            Ok(()) => {
                info!(service = %id, "Service deleted");
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                debug!(service = %id, "Service was already deleted");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Builds a full record from an identity string alone.
    #[instrument(skip_all, fields(kind = %self.kind, id = %id))]
    pub async fn import(&self, id: &str) -> ProviderResult<ServiceRecord> {
        let id: ServiceId = id.parse()?;
        self.lookup(&id).await
    }

    /// Reads a service that has no local record. Not-found is an error.
    pub(crate) async fn lookup(&self, id: &ServiceId) -> ProviderResult<ServiceRecord> {
        let seeded = self.seeded_record(id);
        self.read(&seeded)
            .await?
            .into_record()
            .ok_or_else(|| ProviderError::not_found(id.encode()))
    }

    /// Empty record for `id` with every connection-info slot cleared.
    pub fn seeded_record(&self, id: &ServiceId) -> ServiceRecord {
        let mut record = ServiceRecord {
            id: Some(id.clone()),
            project: id.project.clone(),
            service_name: id.service_name.clone(),
            ..ServiceRecord::default()
        };
        if let ResourceKind::Typed(ty) = self.kind {
            record.service_type = Some(ty);
        }
        record.connection_blocks.seed_empty(&self.kind.block_types());
        record
    }

    fn service_type_of(&self, record: &ServiceRecord) -> ProviderResult<ServiceType> {
        match (self.kind, record.service_type) {
            (ResourceKind::Typed(ty), None) => Ok(ty),
            (ResourceKind::Typed(ty), Some(declared)) if declared == ty => Ok(ty),
            (ResourceKind::Typed(ty), Some(declared)) => Err(ProviderError::validation(
                "service_type",
                format!("{ty} resource cannot manage a {declared} service"),
            )),
            (ResourceKind::Service, Some(declared)) => Ok(declared),
            (ResourceKind::Service, None) => Err(ProviderError::validation(
                "service_type",
                "required field is missing",
            )),
        }
    }

    /// Rejects changes to any attribute the schema marks create-only.
    fn check_create_only(&self, prior: &ServiceRecord, planned: &ServiceRecord) -> ProviderResult<()> {
        let render = |record: &ServiceRecord| {
            serde_json::to_value(record)
                .map_err(|e| ProviderError::validation("service", e.to_string()))
        };
        let before = render(prior)?;
        let after = render(planned)?;
        for attr in self.schema.create_only() {
            if before.get(&attr.name) != after.get(&attr.name) {
                return Err(ProviderError::validation(
                    attr.name.clone(),
                    "cannot be changed after the service is created",
                ));
            }
        }
        Ok(())
    }

    /// Copies every field the remote owns from `remote` into `record`.
    ///
    /// Write-only user-config fields are never returned by the remote; their
    /// declared values are carried over from `declared`.
    fn copy_from_remote(
        &self,
        record: &mut ServiceRecord,
        remote: &RemoteService,
        declared: &ServiceRecord,
    ) -> ProviderResult<()> {
        let ty: ServiceType = remote.service_type.parse()?;
        if let ResourceKind::Typed(expected) = self.kind
            && expected != ty
        {
            return Err(ProviderError::validation(
                "service_type",
                format!("remote service is {ty}, this resource manages {expected}"),
            ));
        }
        let project = record.project.clone();

        record.service_name = remote.service_name.clone();
        record.service_type = Some(ty);
        record.cloud_name = Some(remote.cloud_name.clone());
        record.plan = Some(remote.plan.clone());
        record.state = Some(remote.state);
        record.termination_protection = remote.termination_protection;
        record.set_maintenance(remote.maintenance.as_ref());
        record.service_uri = remote.service_uri.clone();
        record.project_vpc_id = remote
            .project_vpc_id
            .as_ref()
            .map(|vpc| VpcId::new(&project, vpc).encode());

        let shape = self.registry.user_config(ty);
        let mut user_config = from_remote(shape, &remote.user_config);
        if declared.service_type == Some(ty) {
            carry_write_only(shape, &declared.user_config, &mut user_config);
        }
        record.user_config = user_config;

        record.service_host = remote.uri_param("host");
        record.service_port = remote.uri_param("port").map(|p| p.parse().unwrap_or(0));
        if let Some(user) = remote.uri_param("user") {
            record.service_username = Some(user);
        }
        if let Some(password) = remote.uri_param("password") {
            record.service_password = Some(password);
        }

        record.components = remote.components.iter().map(Component::from).collect();
        record
            .connection_blocks
            .set(ty, projection::project(ty, &remote.connection_info));
        Ok(())
    }
}

fn require(field: &str, value: &str) -> ProviderResult<()> {
    if value.is_empty() {
        return Err(ProviderError::validation(field, "required field is missing"));
    }
    Ok(())
}

fn parse_vpc(record: &ServiceRecord) -> ProviderResult<Option<VpcId>> {
    match record.project_vpc_id.as_deref() {
        None | Some("") => Ok(None),
        Some(raw) => Ok(Some(raw.parse()?)),
    }
}
