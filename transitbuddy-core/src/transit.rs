use serde::{Deserialize, Deserializer, Serialize};

/// A boardable stop. `distance_m` is only present for proximity searches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusStop {
    #[serde(deserialize_with = "string_or_number")]
    pub code: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub road: Option<String>,
    #[serde(default, rename = "distance")]
    pub distance_m: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearestStop {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub code: String,
    #[serde(default, rename = "distance")]
    pub distance_m: Option<f64>,
}

/// A named place paired with the stop a rider would board or alight at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationWithStop {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    pub bus_stop: NearestStop,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteLeg {
    #[serde(default, deserialize_with = "string_or_number")]
    pub service: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(default, rename = "stops", deserialize_with = "lenient_count")]
    pub stop_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteOption {
    #[serde(default)]
    pub legs: Vec<RouteLeg>,
    /// Fractional values are common (`7.5`).
    #[serde(default, rename = "estimated_time_min", deserialize_with = "lenient_number")]
    pub estimated_minutes: Option<f64>,
}

impl RouteOption {
    pub fn transfers(&self) -> usize {
        self.legs.len().saturating_sub(1)
    }

    pub fn total_stops(&self) -> u32 {
        self.legs.iter().map(|l| l.stop_count.unwrap_or(0)).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePlan {
    pub origin: LocationWithStop,
    pub destination: LocationWithStop,
    /// Every option carries at least one leg; the classifier drops empty ones.
    pub routes: Vec<RouteOption>,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadLevel {
    SeatsAvailable,
    StandingAvailable,
    LimitedStanding,
}

impl LoadLevel {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "SEA" => Some(Self::SeatsAvailable),
            "SDA" => Some(Self::StandingAvailable),
            "LSD" => Some(Self::LimitedStanding),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::SeatsAvailable => "Seats Available",
            Self::StandingAvailable => "Standing Available",
            Self::LimitedStanding => "Limited Standing",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeckType {
    Single,
    Double,
    Bendy,
}

impl DeckType {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "SD" => Some(Self::Single),
            "DD" => Some(Self::Double),
            "BD" => Some(Self::Bendy),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Single => "Single Deck",
            Self::Double => "Double Deck",
            Self::Bendy => "Bendy",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusInstance {
    /// Zero or negative means the bus is already at the stop.
    #[serde(default, deserialize_with = "lenient_minutes")]
    pub minutes_away: Option<i64>,
    /// `None` when the backend sent a code we don't recognise.
    #[serde(default, deserialize_with = "lenient_load")]
    pub load: Option<LoadLevel>,
    #[serde(default, rename = "type", deserialize_with = "lenient_deck")]
    pub deck: Option<DeckType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceArrival {
    #[serde(rename = "service_no", deserialize_with = "string_or_number")]
    pub service_number: String,
    #[serde(default)]
    pub buses: Vec<BusInstance>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArrivalBoard {
    #[serde(default)]
    pub services: Vec<ServiceArrival>,
    /// Backend note shown when there is nothing to list.
    #[serde(default)]
    pub message: Option<String>,
}

fn string_or_number<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(d)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

/// Integers, floats and numeric strings; anything else is `None`.
fn lenient_number<'de, D>(d: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let n = match serde_json::Value::deserialize(d)? {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(n.filter(|v| v.is_finite()))
}

fn lenient_count<'de, D>(d: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_number(d)?
        .filter(|v| *v >= 0.0 && *v <= f64::from(u32::MAX))
        .map(|v| v.round() as u32))
}

/// Whole minutes, rounded down; `3.4` means the bus is 3 minutes out.
fn lenient_minutes<'de, D>(d: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_number(d)?
        .filter(|v| v.abs() < 1e12)
        .map(|v| v.floor() as i64))
}

fn lenient_code<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(d)? {
        serde_json::Value::String(s) => Some(s),
        _ => None,
    })
}

fn lenient_load<'de, D>(d: D) -> Result<Option<LoadLevel>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_code(d)?.as_deref().and_then(LoadLevel::from_code))
}

fn lenient_deck<'de, D>(d: D) -> Result<Option<DeckType>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_code(d)?.as_deref().and_then(DeckType::from_code))
}
