use anyhow::Result;
use orka_core::Gvk;

/// Builds the request handle used to talk to the API server for one type.
///
/// `Config` is the connection/credential bundle; the cache passes it through
/// untouched.
#[async_trait::async_trait]
pub trait TransportFactory: Send + Sync {
    type Config: Send + Sync;
    type Transport: Send + Sync;

    async fn transport_for(&self, gvk: &Gvk, config: &Self::Config) -> Result<Self::Transport>;
}

#[async_trait::async_trait]
impl<F: TransportFactory + ?Sized> TransportFactory for std::sync::Arc<F> {
    type Config = F::Config;
    type Transport = F::Transport;

    async fn transport_for(&self, gvk: &Gvk, config: &Self::Config) -> Result<Self::Transport> {
        (**self).transport_for(gvk, config).await
    }
}
