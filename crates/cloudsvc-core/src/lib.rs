//! Shared building blocks for cloudsvc: composite identities, the closed
//! service enumerations and the errors raised while parsing them.

pub mod error;
pub mod id;
pub mod service;

pub use error::{CoreError, ErrorCategory, Result};
pub use id::{ServiceId, VpcId, decode, decode_parts, encode};
pub use service::{IntegrationType, MaintenanceWindow, ServiceState, ServiceType};
