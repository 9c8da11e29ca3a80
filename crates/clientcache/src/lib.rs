//! Orka clientcache: per-type resource handles resolved through the dynamic
//! REST mapper and a pluggable transport factory.

#![forbid(unsafe_code)]

pub mod cache;
pub mod error;
pub mod handle;
pub mod object;
pub mod transport;

pub use cache::TypeResourceCache;
pub use error::{CacheError, CacheResult};
pub use handle::{ObjectHandle, ResourceHandle};
pub use object::TypedObject;
pub use transport::TransportFactory;

// Re-exported so callers implementing `TypedObject` do not need their own
// k8s-openapi dependency.
pub use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
