use anyhow::Result;
use orka_core::DiscoveredResource;

/// Fetches a complete, current listing of served resources.
///
/// Results must be in server priority order: groups in discovery order and,
/// within a group, versions from most to least preferred.
#[async_trait::async_trait]
pub trait DirectorySource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<DiscoveredResource>>;
}

/// Directory source backed by a plain closure, mostly for test doubles.
pub struct FnSource<F>(pub F);

#[async_trait::async_trait]
impl<F> DirectorySource for FnSource<F>
where
    F: Fn() -> Result<Vec<DiscoveredResource>> + Send + Sync,
{
    async fn fetch(&self) -> Result<Vec<DiscoveredResource>> {
        (self.0)()
    }
}

#[async_trait::async_trait]
impl<S: DirectorySource + ?Sized> DirectorySource for std::sync::Arc<S> {
    async fn fetch(&self) -> Result<Vec<DiscoveredResource>> {
        (**self).fetch().await
    }
}
