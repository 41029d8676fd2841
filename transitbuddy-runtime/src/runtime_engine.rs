use std::sync::Arc;
use std::time::Duration;

use transitbuddy_core::config::AppConfig;
use transitbuddy_core::types::ChatSession;
use transitbuddy_engine::engine::{ConversationConfig, ConversationOrchestrator};
use transitbuddy_engine::traits::GeolocationGateway;
use transitbuddy_platform::{DeadlineGeolocation, FixedPositionGeolocation, UnsupportedGeolocation};
use transitbuddy_providers::runtime::HttpTimeouts;
use transitbuddy_providers::transit_api::TransitApiConfig;

use crate::api::HttpTransitApi;

/// Picks the position source the config describes.
pub fn geolocation_from_config(cfg: &AppConfig) -> Arc<dyn GeolocationGateway> {
    match cfg.geolocation.fixed_position {
        Some(position) => Arc::new(DeadlineGeolocation::new(
            FixedPositionGeolocation::new(position).boxed(),
        )),
        None => Arc::new(UnsupportedGeolocation),
    }
}

/// Build a conversation for a fresh session from config.
///
/// `geo` overrides the configured position source (hosts with their own
/// location service pass it here).
pub fn build_orchestrator_from_config(
    cfg: &AppConfig,
    geo: Option<Arc<dyn GeolocationGateway>>,
) -> anyhow::Result<ConversationOrchestrator> {
    let api = HttpTransitApi::new(
        TransitApiConfig {
            base_url: cfg.api_base_url.clone(),
        },
        HttpTimeouts {
            connect: Duration::from_secs(cfg.connect_timeout_secs),
            request: Duration::from_secs(cfg.request_timeout_secs),
        },
    )?;

    let geo = geo.unwrap_or_else(|| geolocation_from_config(cfg));
    let session = ChatSession::start();
    log::info!(
        "starting session {} against {}",
        session.id(),
        cfg.api_base_url
    );

    Ok(ConversationOrchestrator::new(
        ConversationConfig {
            geolocation: cfg.geolocation.options(),
            route_home_prompt: cfg.route_home_prompt.clone(),
            suggested_prompts: cfg.suggested_prompts.clone(),
        },
        session,
        Arc::new(api),
        geo,
    ))
}
