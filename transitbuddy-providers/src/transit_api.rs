//! Request builders for the transit assistant backend.
//!
//! - `POST {base}/message`       `{message, sessionId}`
//! - `GET  {base}/arrivals/{code}?sessionId=`
//! - `POST {base}/nearby-stops`  `{latitude, longitude, sessionId}`

use crate::request::HttpRequest;
use anyhow::{Context, anyhow};
use serde_json::json;
use transitbuddy_core::geo::GeoPosition;
use transitbuddy_core::types::SessionId;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitApiConfig {
    pub base_url: String,
}

pub fn build_send_message_request(
    cfg: &TransitApiConfig,
    session: &SessionId,
    message: &str,
) -> HttpRequest {
    let payload = json!({
        "message": message,
        "sessionId": session.as_str(),
    });
    HttpRequest::post_json(join_url(&cfg.base_url, "/message"), &payload)
}

pub fn build_arrivals_request(
    cfg: &TransitApiConfig,
    session: &SessionId,
    stop_code: &str,
) -> anyhow::Result<HttpRequest> {
    let code = stop_code.trim();
    if code.is_empty() {
        return Err(anyhow!("bus stop code is empty"));
    }

    let mut url = Url::parse(&join_url(&cfg.base_url, "/arrivals"))
        .with_context(|| format!("invalid base url: {}", cfg.base_url))?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("base url cannot carry a path: {}", cfg.base_url))?
        .push(code);
    url.query_pairs_mut()
        .append_pair("sessionId", session.as_str());

    Ok(HttpRequest::get(url.to_string()))
}

pub fn build_nearby_stops_request(
    cfg: &TransitApiConfig,
    session: &SessionId,
    position: GeoPosition,
) -> HttpRequest {
    let payload = json!({
        "latitude": position.latitude,
        "longitude": position.longitude,
        "sessionId": session.as_str(),
    });
    HttpRequest::post_json(join_url(&cfg.base_url, "/nearby-stops"), &payload)
}

fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{}/{}", base, path)
}
