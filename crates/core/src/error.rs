use std::sync::Arc;
use std::time::Duration;

use crate::{GroupKind, Gvr};

/// Errors returned by REST mapping lookups.
///
/// Cloneable so a single outcome can be handed to every caller waiting on the
/// same directory fetch.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MapError {
    #[error("no matches for kind {group_kind} in versions {versions:?}")]
    NoKindMatch { group_kind: GroupKind, versions: Vec<String> },
    #[error("no matches for resource {resource}")]
    NoResourceMatch { resource: Gvr },
    #[error("too many API calls to the REST mapper within a timeframe (retry in {delay:?})")]
    RateLimited { delay: Duration },
    /// Failure reported by the directory source, unchanged.
    #[error("{0}")]
    Source(Arc<anyhow::Error>),
}

impl MapError {
    pub fn source_error(err: anyhow::Error) -> Self {
        MapError::Source(Arc::new(err))
    }

    /// True for the outcomes that justify a directory refresh.
    pub fn is_not_found(&self) -> bool {
        matches!(self, MapError::NoKindMatch { .. } | MapError::NoResourceMatch { .. })
    }

    /// Delay until the next refresh is allowed, if this is a rate-limit error.
    pub fn rate_limit_delay(&self) -> Option<Duration> {
        match self {
            MapError::RateLimited { delay } => Some(*delay),
            _ => None,
        }
    }
}
