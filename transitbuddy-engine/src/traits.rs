use async_trait::async_trait;
use serde_json::Value;
use transitbuddy_core::geo::{GeoPosition, GeolocationFailure, GeolocationOptions};
use transitbuddy_core::types::SessionId;

/// Remote transit assistant.
///
/// Implementations return the decoded JSON reply as-is; shape detection is the
/// classifier's job. An `Err` means the round-trip itself failed.
#[async_trait]
pub trait TransitApi: Send + Sync {
    async fn send_message(&self, session: &SessionId, message: &str) -> anyhow::Result<Value>;

    async fn fetch_arrivals(&self, session: &SessionId, stop_code: &str) -> anyhow::Result<Value>;

    async fn fetch_nearby_stops(
        &self,
        session: &SessionId,
        position: GeoPosition,
    ) -> anyhow::Result<Value>;
}

/// Device position lookup. Resolves once per call and never retries.
#[async_trait]
pub trait GeolocationGateway: Send + Sync {
    async fn resolve_position(
        &self,
        options: &GeolocationOptions,
    ) -> Result<GeoPosition, GeolocationFailure>;
}
