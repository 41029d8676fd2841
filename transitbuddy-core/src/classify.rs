//! Reply classification.
//!
//! The backend does not tag its replies with a single discriminant, so the
//! shape is inferred from which fields are present. Rules are evaluated in a
//! fixed order and the first text-ish match wins; structured stop/arrival data
//! is looked up independently so a reply can yield an intro sentence *and* a
//! structured block.

use crate::transit::{ArrivalBoard, BusStop, LocationWithStop, RouteOption, RoutePlan};
use serde::de::DeserializeOwned;
use serde_json::Value;

const TYPE_NEARBY_STOPS: &str = "nearby_stops";
const TYPE_MULTIPLE_STOPS: &str = "multiple_stops";
const TYPE_MULTIPLE_MATCHES: &str = "multiple_matches";
const TYPE_ARRIVALS: &str = "arrivals";
const TYPE_REQUEST_LOCATION: &str = "request_location";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyError {
    /// The backend said what went wrong; shown verbatim.
    Server(String),
    /// Nothing we know how to render.
    Malformed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BotReply {
    /// One entry per reply fragment, each rendered as its own message.
    PlainText(Vec<String>),
    RoutePlan(RoutePlan),
    StopList(Vec<BusStop>),
    ArrivalBoard(ArrivalBoard),
    Error(ReplyError),
}

impl BotReply {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PlainText(_) => "plain_text",
            Self::RoutePlan(_) => "route_plan",
            Self::StopList(_) => "stop_list",
            Self::ArrivalBoard(_) => "arrival_board",
            Self::Error(_) => "error",
        }
    }
}

/// Everything a single `/message` reply asks the client to show, in display order.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedReply {
    pub replies: Vec<BotReply>,
    /// The assistant wants the device position before it can answer.
    pub location_requested: bool,
}

impl ClassifiedReply {
    fn only(reply: BotReply) -> Self {
        Self {
            replies: vec![reply],
            location_requested: false,
        }
    }

    pub fn error(&self) -> Option<&ReplyError> {
        self.replies.iter().find_map(|r| match r {
            BotReply::Error(e) => Some(e),
            _ => None,
        })
    }
}

/// Classifies a conversational reply.
pub fn classify_reply(payload: &Value) -> ClassifiedReply {
    if let Some(msg) = error_message(payload) {
        return ClassifiedReply::only(BotReply::Error(ReplyError::Server(msg)));
    }

    let mut replies = Vec::new();

    if let Some(plan) = route_plan(payload) {
        replies.push(BotReply::RoutePlan(plan));
    } else if let Some(fragments) = text_fragments(payload) {
        replies.push(BotReply::PlainText(fragments));
    } else if let Some(text) = single_text(payload) {
        replies.push(BotReply::PlainText(vec![text]));
    }

    if let Some(structured) = structured_data(payload) {
        replies.push(structured);
    }

    let location_requested = type_tag(payload) == Some(TYPE_REQUEST_LOCATION);

    if replies.is_empty() && !location_requested {
        return ClassifiedReply::only(BotReply::Error(ReplyError::Malformed));
    }

    ClassifiedReply {
        replies,
        location_requested,
    }
}

/// Classifies the reply of a direct arrivals lookup.
pub fn classify_arrivals(payload: &Value) -> BotReply {
    if let Some(msg) = error_message(payload) {
        return BotReply::Error(ReplyError::Server(msg));
    }
    payload
        .get("arrivals")
        .and_then(decode::<ArrivalBoard>)
        .map(BotReply::ArrivalBoard)
        .unwrap_or(BotReply::Error(ReplyError::Malformed))
}

/// Classifies the reply of a nearby-stops lookup. An empty list is a valid answer.
pub fn classify_nearby(payload: &Value) -> BotReply {
    if let Some(msg) = error_message(payload) {
        return BotReply::Error(ReplyError::Server(msg));
    }
    payload
        .get("stops")
        .and_then(decode_stops)
        .map(BotReply::StopList)
        .unwrap_or(BotReply::Error(ReplyError::Malformed))
}

/// Only a truthy `error` counts: `""`, `false`, `0` and `null` are ignored.
fn error_message(payload: &Value) -> Option<String> {
    match payload.get("error")? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) => Some(s.trim()).filter(|t| !t.is_empty()).map(str::to_string),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}

fn type_tag(payload: &Value) -> Option<&str> {
    payload.get("type").and_then(Value::as_str)
}

fn decode<T: DeserializeOwned>(v: &Value) -> Option<T> {
    serde_json::from_value(v.clone()).ok()
}

fn non_empty_str(v: Option<&Value>) -> Option<String> {
    v.and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn route_plan(payload: &Value) -> Option<RoutePlan> {
    let origin: LocationWithStop = payload.get("origin").and_then(decode)?;
    let destination: LocationWithStop = payload.get("destination").and_then(decode)?;
    let routes: Vec<RouteOption> = payload
        .get("routes")?
        .as_array()?
        .iter()
        .filter_map(decode::<RouteOption>)
        .filter(|r| !r.legs.is_empty())
        .collect();
    if routes.is_empty() {
        return None;
    }
    let summary = non_empty_str(payload.get("message"))
        .or_else(|| non_empty_str(payload.get("response")));
    Some(RoutePlan {
        origin,
        destination,
        routes,
        summary,
    })
}

fn text_fragments(payload: &Value) -> Option<Vec<String>> {
    let fragments: Vec<String> = payload
        .get("messages")?
        .as_array()?
        .iter()
        .filter_map(|m| match m {
            Value::String(_) => non_empty_str(Some(m)),
            Value::Object(_) => non_empty_str(m.get("content")),
            _ => None,
        })
        .collect();
    (!fragments.is_empty()).then_some(fragments)
}

fn single_text(payload: &Value) -> Option<String> {
    non_empty_str(payload.get("response")).or_else(|| non_empty_str(payload.get("message")))
}

fn decode_stops(v: &Value) -> Option<Vec<BusStop>> {
    Some(v.as_array()?.iter().filter_map(decode::<BusStop>).collect())
}

fn structured_data(payload: &Value) -> Option<BotReply> {
    stop_list(payload).or_else(|| arrival_board(payload))
}

fn stop_list(payload: &Value) -> Option<BotReply> {
    let data = payload.get("data").filter(|d| d.is_object());
    let source = match (data.and_then(type_tag), type_tag(payload)) {
        (Some(TYPE_NEARBY_STOPS | TYPE_MULTIPLE_STOPS), _) => data?,
        (_, Some(TYPE_MULTIPLE_MATCHES | TYPE_NEARBY_STOPS)) => payload,
        _ => return None,
    };
    let stops = source.get("stops").and_then(decode_stops)?;
    (!stops.is_empty()).then_some(BotReply::StopList(stops))
}

fn arrival_board(payload: &Value) -> Option<BotReply> {
    let data = payload.get("data")?;
    if type_tag(data) != Some(TYPE_ARRIVALS) {
        return None;
    }
    data.get("arrivals")
        .and_then(decode::<ArrivalBoard>)
        .map(BotReply::ArrivalBoard)
}
