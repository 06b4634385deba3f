//! Service lifecycle reconciliation for cloudsvc.
//!
//! - [`ServiceResource`]: create, read, update, delete and import of one
//!   resource kind.
//! - [`ChangeWaiter`]: polls a submitted change until the service settles.
//! - [`ServiceDataSource`]: read-only lookups by project and service name.
//! - [`ProviderConfig`]: settings loaded by [`config::loader::load_config`].

pub mod config;
pub mod datasource;
pub mod error;
pub mod lifecycle;
pub mod observability;
pub mod projection;
pub mod record;
pub mod waiter;

pub use config::{ConfigError, ProviderConfig, Secret};
pub use datasource::{LOOKUP_KEYS, ServiceDataSource};
pub use error::{ErrorCategory, ProviderError, ProviderResult};
pub use lifecycle::{ReadOutcome, ServiceResource};
pub use projection::{ConnectionInfo, KafkaConnection, PgConnection, project};
pub use record::{Component, ConnectionBlocks, ServiceIntegration, ServiceRecord};
pub use waiter::{
    ChangeWaiter, Classification, Clock, Operation, PollPolicy, TokioClock, classify,
};
