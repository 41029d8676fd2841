use serde_json::Value;
use transitbuddy_core::geo::GeoPosition;
use transitbuddy_core::types::SessionId;
use transitbuddy_engine::traits::TransitApi;
use transitbuddy_providers::parse::parse_json_payload;
use transitbuddy_providers::request::HttpRequest;
use transitbuddy_providers::runtime::{HttpTimeouts, build_client, execute_with};
use transitbuddy_providers::transit_api::{
    TransitApiConfig, build_arrivals_request, build_nearby_stops_request,
    build_send_message_request,
};

/// Talks to the chatbot backend over HTTP, reusing one connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransitApi {
    cfg: TransitApiConfig,
    client: reqwest::Client,
}

impl HttpTransitApi {
    pub fn new(cfg: TransitApiConfig, timeouts: HttpTimeouts) -> anyhow::Result<Self> {
        Ok(Self {
            cfg,
            client: build_client(timeouts)?,
        })
    }

    async fn round_trip(&self, req: HttpRequest) -> anyhow::Result<Value> {
        log::debug!("{} {}", req.method, req.url);
        let resp = execute_with(&self.client, &req).await?;
        if !resp.is_success() {
            log::warn!("{} {} returned status {}", req.method, req.url, resp.status);
        }
        parse_json_payload(&resp)
    }
}

#[async_trait::async_trait]
impl TransitApi for HttpTransitApi {
    async fn send_message(&self, session: &SessionId, message: &str) -> anyhow::Result<Value> {
        self.round_trip(build_send_message_request(&self.cfg, session, message))
            .await
    }

    async fn fetch_arrivals(&self, session: &SessionId, stop_code: &str) -> anyhow::Result<Value> {
        self.round_trip(build_arrivals_request(&self.cfg, session, stop_code)?)
            .await
    }

    async fn fetch_nearby_stops(
        &self,
        session: &SessionId,
        position: GeoPosition,
    ) -> anyhow::Result<Value> {
        self.round_trip(build_nearby_stops_request(&self.cfg, session, position))
            .await
    }
}
