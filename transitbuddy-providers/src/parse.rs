use crate::runtime::HttpResponse;
use anyhow::{Context, anyhow};
use serde_json::Value;

/// Decodes a backend reply into a JSON object.
///
/// Error statuses still carry `{error: ...}` bodies worth showing, so any
/// status with a JSON object body is accepted. Everything else is a transport
/// failure.
pub fn parse_json_payload(resp: &HttpResponse) -> anyhow::Result<Value> {
    match serde_json::from_slice::<Value>(&resp.body) {
        Ok(v @ Value::Object(_)) => Ok(v),
        _ if !resp.is_success() => Err(anyhow!(
            "request failed: status={} body={}",
            resp.status,
            String::from_utf8_lossy(&resp.body)
        )),
        Ok(_) => Err(anyhow!("expected a JSON object in reply")),
        Err(e) => Err(e).context("decode reply JSON"),
    }
}
