use std::sync::Arc;
use transitbuddy_core::geo::{GeoPosition, GeolocationFailure, GeolocationOptions};
use transitbuddy_engine::traits::GeolocationGateway;

/// Reports a configured position, e.g. from `--lat/--lon` on a terminal host.
#[derive(Debug, Clone, Copy)]
pub struct FixedPositionGeolocation {
    position: GeoPosition,
}

impl FixedPositionGeolocation {
    pub fn new(position: GeoPosition) -> Self {
        Self { position }
    }

    pub fn boxed(self) -> Arc<dyn GeolocationGateway> {
        Arc::new(self)
    }
}

#[async_trait::async_trait]
impl GeolocationGateway for FixedPositionGeolocation {
    async fn resolve_position(
        &self,
        _options: &GeolocationOptions,
    ) -> Result<GeoPosition, GeolocationFailure> {
        if !self.position.is_valid() {
            log::warn!(
                "configured position out of range: {},{}",
                self.position.latitude,
                self.position.longitude
            );
            return Err(GeolocationFailure::PositionUnavailable);
        }
        Ok(self.position)
    }
}

/// Host has no way to locate itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedGeolocation;

#[async_trait::async_trait]
impl GeolocationGateway for UnsupportedGeolocation {
    async fn resolve_position(
        &self,
        _options: &GeolocationOptions,
    ) -> Result<GeoPosition, GeolocationFailure> {
        Err(GeolocationFailure::Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixed_position_is_returned_as_is() {
        let geo = FixedPositionGeolocation::new(GeoPosition::new(1.3521, 103.8198));
        let p = geo
            .resolve_position(&GeolocationOptions::default())
            .await
            .unwrap();
        assert_eq!(p, GeoPosition::new(1.3521, 103.8198));
    }

    #[tokio::test]
    async fn out_of_range_position_is_unavailable() {
        let geo = FixedPositionGeolocation::new(GeoPosition::new(120.0, 0.0));
        let err = geo
            .resolve_position(&GeolocationOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err, GeolocationFailure::PositionUnavailable);
    }

    #[tokio::test]
    async fn unsupported_always_fails() {
        let err = UnsupportedGeolocation
            .resolve_position(&GeolocationOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err, GeolocationFailure::Unsupported);
    }
}
