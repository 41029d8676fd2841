//! Terminal rendering of transcript messages.

use transitbuddy_core::render::{
    ArrivalBoardView, LocationCard, RoutePlanView, StopListView, TextView, View,
};
use transitbuddy_core::text::Span;
use transitbuddy_engine::session::Message;

const BOLD_ON: &str = "\x1b[1m";
const BOLD_OFF: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, Default)]
pub struct Style {
    /// Emit ANSI bold for `**bold**` spans.
    pub ansi: bool,
}

pub fn render_message(msg: &Message, style: Style) -> String {
    let prefix = if msg.is_user() { "you> " } else { "bot> " };
    let body = render_view(&msg.view, style);
    let mut out = String::new();
    for (i, line) in body.lines().enumerate() {
        if i == 0 {
            out.push_str(prefix);
        } else {
            out.push_str("     ");
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}

pub fn render_view(view: &View, style: Style) -> String {
    match view {
        View::Text(t) => render_text(t, style),
        View::RoutePlan(p) => render_route_plan(p),
        View::StopList(s) => render_stop_list(s),
        View::ArrivalBoard(b) => render_arrival_board(b),
    }
}

fn render_text(t: &TextView, style: Style) -> String {
    t.paragraphs
        .iter()
        .map(|p| {
            p.spans
                .iter()
                .map(|s| match s {
                    Span::Plain(text) => text.clone(),
                    Span::Bold(text) if style.ansi => format!("{BOLD_ON}{text}{BOLD_OFF}"),
                    Span::Bold(text) => text.clone(),
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_location(card: &LocationCard, out: &mut Vec<String>) {
    out.push(card.title.clone());
    if let Some(addr) = &card.address {
        out.push(format!("  {addr}"));
    }
    let mut stop = format!("  Stop: {} ({})", card.stop_name, card.stop_code);
    if let Some(d) = &card.distance_label {
        stop.push_str(&format!(", {d}"));
    }
    out.push(stop);
}

fn render_route_plan(p: &RoutePlanView) -> String {
    let mut out = Vec::new();
    if let Some(h) = &p.heading {
        out.push(h.clone());
    }
    render_location(&p.origin, &mut out);
    render_location(&p.destination, &mut out);
    out.push(p.options_heading.clone());
    for opt in &p.options {
        out.push(format!("{}  ~ {}", opt.title, opt.eta_label));
        for leg in &opt.legs {
            if leg.transfer_before {
                out.push("    Transfer here".into());
            }
            out.push(format!(
                "    Bus {}  {}  ({})",
                leg.service, leg.path, leg.stops_label
            ));
        }
        out.push(format!("    {}", opt.total_label));
    }
    out.join("\n")
}

fn render_stop_list(s: &StopListView) -> String {
    s.cards
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let mut line = format!("[{}] {} {}", i + 1, c.code, c.description);
            if let Some(road) = &c.road {
                line.push_str(&format!(", {road}"));
            }
            if let Some(d) = &c.distance_label {
                line.push_str(&format!(" ({d})"));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_arrival_board(b: &ArrivalBoardView) -> String {
    let mut out = Vec::new();
    for svc in &b.services {
        out.push(svc.heading.clone());
        if let Some(note) = &svc.note {
            out.push(format!("  {note}"));
        }
        for bus in &svc.buses {
            let mut line = format!("  {:<9} {}", bus.label, bus.load_label);
            if let Some(deck) = &bus.deck_label {
                line.push_str(&format!(", {deck}"));
            }
            out.push(line);
        }
    }
    out.join("\n")
}

/// Stop codes of the most recent stop list, in display order.
pub fn latest_stop_codes(messages: &[Message]) -> Vec<String> {
    messages
        .iter()
        .rev()
        .find_map(|m| match &m.view {
            View::StopList(s) => Some(s.cards.iter().map(|c| c.code.clone()).collect()),
            _ => None,
        })
        .unwrap_or_default()
}
