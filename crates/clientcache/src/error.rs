use std::time::Duration;

use orka_core::{Gvk, MapError};

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("object has no complete apiVersion/kind")]
    MissingTypeInfo,
    #[error("object of type {gvk} exposes no object metadata")]
    MissingObjectMeta { gvk: Gvk },
    #[error(transparent)]
    Mapping(#[from] MapError),
    /// Failure reported by the transport factory, unchanged.
    #[error(transparent)]
    Transport(anyhow::Error),
}

impl CacheError {
    pub fn rate_limit_delay(&self) -> Option<Duration> {
        match self {
            CacheError::Mapping(e) => e.rate_limit_delay(),
            _ => None,
        }
    }
}

pub type CacheResult<T> = Result<T, CacheError>;
