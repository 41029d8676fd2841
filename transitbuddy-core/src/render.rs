//! Pure mapping from classified replies to render descriptions.
//!
//! Nothing here touches the network or any state; front-ends turn a [`View`]
//! into widgets, HTML or terminal text.

use crate::classify::{BotReply, ReplyError};
use crate::text::{Paragraph, format_paragraphs, pluralize};
use crate::transit::{
    ArrivalBoard, BusInstance, BusStop, DeckType, LoadLevel, LocationWithStop, RouteOption,
    RoutePlan, ServiceArrival,
};
use serde::{Deserialize, Serialize};

pub const ETA_FALLBACK: &str = "~15";
pub const NO_BUSES_MESSAGE: &str = "No buses available at this stop.";
pub const NO_ESTIMATE_MESSAGE: &str = "No arrival estimates for this service.";
pub const MALFORMED_REPLY_MESSAGE: &str = "Sorry, I couldn't understand the reply. Please try again.";
pub const ARRIVING_LABEL: &str = "Arriving";

const ARRIVING_MAX_MINUTES: i64 = 1;
const SOON_MAX_MINUTES: i64 = 5;

/// Tapping a card resolves to a follow-up message submitted on the user's behalf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickAction {
    pub label: String,
    pub message: String,
}

impl QuickAction {
    pub fn select_stop(code: &str) -> Self {
        Self {
            label: format!("Arrivals at {code}"),
            message: format!("Bus arrivals at {code}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextView {
    pub paragraphs: Vec<Paragraph>,
}

impl TextView {
    pub fn new(text: &str) -> Self {
        Self {
            paragraphs: format_paragraphs(text),
        }
    }

    pub fn plain_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(Paragraph::plain_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationCard {
    pub title: String,
    pub address: Option<String>,
    pub stop_name: String,
    pub stop_code: String,
    pub distance_label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegView {
    /// Set on every leg after the first.
    pub transfer_before: bool,
    pub service: String,
    pub stops_label: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteOptionView {
    pub title: String,
    pub transfers: usize,
    pub total_stops: u32,
    pub eta_label: String,
    pub legs: Vec<LegView>,
    pub total_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutePlanView {
    pub heading: Option<String>,
    pub origin: LocationCard,
    pub destination: LocationCard,
    pub options_heading: String,
    pub options: Vec<RouteOptionView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopCard {
    pub code: String,
    pub description: String,
    pub road: Option<String>,
    pub distance_label: Option<String>,
    pub action: QuickAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopListView {
    pub cards: Vec<StopCard>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimingTier {
    Arriving,
    Soon,
    Later,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusTimingView {
    pub tier: TimingTier,
    pub label: String,
    pub load: LoadLevel,
    pub load_label: String,
    pub deck_label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCard {
    pub heading: String,
    pub buses: Vec<BusTimingView>,
    /// Shown in place of the timings when the service has none.
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrivalBoardView {
    pub services: Vec<ServiceCard>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum View {
    Text(TextView),
    RoutePlan(RoutePlanView),
    StopList(StopListView),
    ArrivalBoard(ArrivalBoardView),
}

impl View {
    pub fn text(text: &str) -> Self {
        Self::Text(TextView::new(text))
    }

    pub fn as_text(&self) -> Option<&TextView> {
        match self {
            Self::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_structured(&self) -> bool {
        !matches!(self, Self::Text(_))
    }
}

/// Renders one classified reply. A multi-fragment text reply yields one view per fragment.
pub fn render_reply(reply: &BotReply) -> Vec<View> {
    match reply {
        BotReply::PlainText(fragments) => fragments.iter().map(|f| View::text(f)).collect(),
        BotReply::RoutePlan(plan) => vec![render_route_plan(plan)],
        BotReply::StopList(stops) => vec![render_stop_list(stops)],
        BotReply::ArrivalBoard(board) => vec![render_arrival_board(board)],
        BotReply::Error(ReplyError::Server(msg)) => vec![View::text(msg)],
        BotReply::Error(ReplyError::Malformed) => vec![View::text(MALFORMED_REPLY_MESSAGE)],
    }
}

pub fn render_route_plan(plan: &RoutePlan) -> View {
    let n = plan.routes.len();
    let options_heading = if n == 1 {
        "Suggested Routes (1 option)".to_string()
    } else {
        format!("Suggested Routes ({n} options)")
    };

    View::RoutePlan(RoutePlanView {
        heading: plan.summary.clone(),
        origin: location_card("From", &plan.origin),
        destination: location_card("To", &plan.destination),
        options_heading,
        options: plan
            .routes
            .iter()
            .enumerate()
            .map(|(i, r)| route_option_view(i + 1, r))
            .collect(),
    })
}

fn location_card(prefix: &str, loc: &LocationWithStop) -> LocationCard {
    LocationCard {
        title: format!("{prefix}: {}", loc.name),
        address: loc.address.clone().filter(|a| !a.trim().is_empty()),
        stop_name: loc.bus_stop.name.clone(),
        stop_code: loc.bus_stop.code.clone(),
        distance_label: loc.bus_stop.distance_m.map(distance_label),
    }
}

fn route_option_view(number: usize, route: &RouteOption) -> RouteOptionView {
    let transfers = route.transfers();
    let total_stops = route.total_stops();
    let kind = if transfers == 0 {
        "(Direct)".to_string()
    } else {
        format!("({})", pluralize(transfers, "transfer"))
    };
    let eta = route
        .estimated_minutes
        .filter(|m| *m > 0.0)
        .map(format_minutes)
        .unwrap_or_else(|| ETA_FALLBACK.to_string());

    RouteOptionView {
        title: format!("Option {number} {kind}"),
        transfers,
        total_stops,
        eta_label: format!("{eta} min"),
        legs: route
            .legs
            .iter()
            .enumerate()
            .map(|(i, leg)| LegView {
                transfer_before: i > 0,
                service: leg.service.clone(),
                stops_label: pluralize(leg.stop_count.unwrap_or(0) as usize, "stop"),
                path: format!("{} → {}", leg.from, leg.to),
            })
            .collect(),
        total_label: format!("Total: {}", pluralize(total_stops as usize, "stop")),
    }
}

pub fn render_stop_list(stops: &[BusStop]) -> View {
    View::StopList(StopListView {
        cards: stops
            .iter()
            .map(|s| StopCard {
                code: s.code.clone(),
                description: s.description.clone(),
                road: s.road.clone().filter(|r| !r.trim().is_empty()),
                distance_label: s.distance_m.map(distance_label),
                action: QuickAction::select_stop(&s.code),
            })
            .collect(),
    })
}

/// A board with no bus instances at all collapses to a single text message.
pub fn render_arrival_board(board: &ArrivalBoard) -> View {
    if board.services.iter().all(|s| s.buses.is_empty()) {
        let msg = board
            .message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(NO_BUSES_MESSAGE);
        return View::text(msg);
    }

    View::ArrivalBoard(ArrivalBoardView {
        services: board.services.iter().map(service_card).collect(),
    })
}

fn service_card(service: &ServiceArrival) -> ServiceCard {
    let buses: Vec<BusTimingView> = service.buses.iter().map(bus_timing).collect();
    let note = buses
        .is_empty()
        .then(|| NO_ESTIMATE_MESSAGE.to_string());
    ServiceCard {
        heading: format!("Service {}", service.service_number),
        buses,
        note,
    }
}

/// `Arriving` at one minute or less, `Soon` up to five, otherwise `N min`.
pub fn timing(minutes_away: Option<i64>) -> (TimingTier, String) {
    match minutes_away {
        None => (TimingTier::Unknown, "No estimate".to_string()),
        Some(m) if m <= ARRIVING_MAX_MINUTES => (TimingTier::Arriving, ARRIVING_LABEL.to_string()),
        Some(m) if m <= SOON_MAX_MINUTES => (TimingTier::Soon, format!("{m} min")),
        Some(m) => (TimingTier::Later, format!("{m} min")),
    }
}

fn bus_timing(bus: &BusInstance) -> BusTimingView {
    let (tier, label) = timing(bus.minutes_away);
    // Unrecognised load codes are shown as seats available.
    let load = bus.load.unwrap_or(LoadLevel::SeatsAvailable);
    BusTimingView {
        tier,
        label,
        load,
        load_label: load.label().to_string(),
        deck_label: bus.deck.map(DeckType::label).map(str::to_string),
    }
}

/// `22` for whole minutes, `7.5` otherwise.
fn format_minutes(m: f64) -> String {
    if m.fract() == 0.0 {
        format!("{}", m as i64)
    } else {
        format!("{m:.1}")
    }
}

fn distance_label(meters: f64) -> String {
    format!("{}m away", meters.round() as i64)
}
