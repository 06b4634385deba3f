//! The remote API capability consumed by the lifecycle controller.

use async_trait::async_trait;

use crate::error::ApiResult;
use crate::types::{CreateServiceRequest, RemoteService, UpdateServiceRequest};

/// Service operations of the remote control plane.
///
/// Implementations must be thread-safe (`Send + Sync`); the controller shares
/// one handle across concurrent resource operations.
///
/// # Example
///
/// ```ignore
/// use cloudsvc_api::{ApiError, ServiceApi};
///
/// async fn exists(api: &dyn ServiceApi, project: &str, name: &str) -> Result<bool, ApiError> {
///     match api.get(project, name).await {
///         Ok(_) => Ok(true),
///         Err(e) if e.is_not_found() => Ok(false),
///         Err(e) => Err(e),
///     }
/// }
/// ```
#[async_trait]
pub trait ServiceApi: Send + Sync {
    /// Submits a new service. The remote provisions it asynchronously.
    async fn create(
        &self,
        project: &str,
        request: &CreateServiceRequest,
    ) -> ApiResult<RemoteService>;

    /// Fetches a service.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the service does not exist.
    async fn get(&self, project: &str, service_name: &str) -> ApiResult<RemoteService>;

    /// Submits a change to an existing service.
    async fn update(
        &self,
        project: &str,
        service_name: &str,
        request: &UpdateServiceRequest,
    ) -> ApiResult<RemoteService>;

    /// Deletes a service.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the service does not exist.
    async fn delete(&self, project: &str, service_name: &str) -> ApiResult<()>;
}
