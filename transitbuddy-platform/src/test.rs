use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use transitbuddy_core::geo::{GeoPosition, GeolocationFailure, GeolocationOptions};
use transitbuddy_engine::traits::GeolocationGateway;

/// Hands out queued results in order, then reports `PositionUnavailable`.
#[derive(Debug, Default)]
pub struct ScriptedGeolocation {
    results: Mutex<VecDeque<Result<GeoPosition, GeolocationFailure>>>,
    calls: AtomicUsize,
}

impl ScriptedGeolocation {
    pub fn new(results: Vec<Result<GeoPosition, GeolocationFailure>>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl GeolocationGateway for ScriptedGeolocation {
    async fn resolve_position(
        &self,
        _options: &GeolocationOptions,
    ) -> Result<GeoPosition, GeolocationFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.results
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .pop_front()
            .unwrap_or(Err(GeolocationFailure::PositionUnavailable))
    }
}

/// Never resolves.
#[derive(Debug, Default)]
pub struct PendingGeolocation;

#[async_trait::async_trait]
impl GeolocationGateway for PendingGeolocation {
    async fn resolve_position(
        &self,
        _options: &GeolocationOptions,
    ) -> Result<GeoPosition, GeolocationFailure> {
        std::future::pending().await
    }
}
