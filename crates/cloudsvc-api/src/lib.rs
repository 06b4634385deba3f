//! Remote control-plane API for cloudsvc.
//!
//! The lifecycle controller talks to the remote exclusively through the
//! [`ServiceApi`] trait. Two implementations ship with this crate:
//!
//! - [`HttpServiceApi`]: the real REST API over reqwest.
//! - [`InMemoryServiceApi`]: an in-process map with scriptable state
//!   sequences, used in tests and dry runs.

pub mod error;
pub mod http;
pub mod memory;
pub mod traits;
pub mod types;

pub use error::{ApiError, ApiResult};
pub use http::HttpServiceApi;
pub use memory::{CallCounts, InMemoryServiceApi, ScriptStep};
pub use traits::ServiceApi;
pub use types::{
    CreateServiceRequest, NewServiceIntegration, PgParams, RemoteComponent, RemoteConnectionInfo,
    RemoteMaintenance, RemoteService, UpdateServiceRequest,
};
