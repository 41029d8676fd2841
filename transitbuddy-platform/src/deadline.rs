use std::sync::Arc;
use transitbuddy_core::geo::{GeoPosition, GeolocationFailure, GeolocationOptions};
use transitbuddy_engine::traits::GeolocationGateway;

/// Enforces `options.timeout` on a source that does not honour it itself.
pub struct DeadlineGeolocation {
    inner: Arc<dyn GeolocationGateway>,
}

impl DeadlineGeolocation {
    pub fn new(inner: Arc<dyn GeolocationGateway>) -> Self {
        Self { inner }
    }
}

#[async_trait::async_trait]
impl GeolocationGateway for DeadlineGeolocation {
    async fn resolve_position(
        &self,
        options: &GeolocationOptions,
    ) -> Result<GeoPosition, GeolocationFailure> {
        match tokio::time::timeout(options.timeout, self.inner.resolve_position(options)).await {
            Ok(res) => res,
            Err(_) => {
                log::warn!("position lookup exceeded {:?}", options.timeout);
                Err(GeolocationFailure::Timeout)
            }
        }
    }
}
