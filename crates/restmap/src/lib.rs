//! Orka restmap: discovery-backed GVK <-> GVR mapping with on-demand,
//! rate-limited refresh.

#![forbid(unsafe_code)]

pub mod config;
pub mod gate;
pub mod mapper;
pub mod snapshot;
pub mod source;

pub use config::RestMapConfig;
pub use gate::RateGate;
pub use mapper::{DynamicTypeMapper, MapperOptions};
pub use snapshot::{DirectorySnapshot, MappingEntry};
pub use source::{DirectorySource, FnSource};
