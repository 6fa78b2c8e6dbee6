pub mod client;
pub mod executor;
pub mod oc;

pub use client::{ApiError, ConfigMap, OcClient, OpenShiftApi};
pub use executor::{OcExecutor, RealExecutor};
