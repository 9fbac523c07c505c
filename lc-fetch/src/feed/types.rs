//! Wire types for connections feed documents.
//!
//! Field names follow the linked-connections vocabulary the feeds publish
//! (hydra pagination, schema.org geo coordinates). Timestamps are still
//! strings here; [`convert`](super::convert) turns them into instants
//! before anything leaves the feed layer.

use serde::Deserialize;
use serde_json::{Map, Value};

/// One page of a paginated connections feed, as served.
#[derive(Debug, Clone, Deserialize)]
pub struct PageDocument {
    /// Identifier of this page.
    #[serde(rename = "@id")]
    pub id: Option<String>,

    /// URL of the next page. Absence marks the last page.
    #[serde(rename = "hydra:nextPage", alias = "hydra:next")]
    pub next_page: Option<String>,

    /// Connection records in server order.
    #[serde(rename = "@graph", default)]
    pub graph: Vec<WireConnection>,
}

/// A connection record as it appears on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct WireConnection {
    /// Departure stop identifier.
    #[serde(rename = "departureStop")]
    pub departure_stop: String,

    /// Arrival stop identifier.
    #[serde(rename = "arrivalStop")]
    pub arrival_stop: String,

    /// Departure timestamp, RFC 3339 wire format.
    #[serde(rename = "departureTime")]
    pub departure_time: String,

    /// Arrival timestamp, RFC 3339 wire format.
    #[serde(rename = "arrivalTime")]
    pub arrival_time: String,

    /// Departure stop coordinates, when the feed provides them.
    #[serde(rename = "locationDepartureStop")]
    pub departure_location: Option<WireLocation>,

    /// Arrival stop coordinates, when the feed provides them.
    #[serde(rename = "locationArrivalStop")]
    pub arrival_location: Option<WireLocation>,

    /// Count of directly reachable stops from the arrival stop.
    #[serde(rename = "countDirectStopsArrivalStop")]
    pub direct_stops_arrival: Option<u32>,

    /// Fields this crate does not interpret (route, trip, operator tags).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Geo coordinates as served.
#[derive(Debug, Clone, Deserialize)]
pub struct WireLocation {
    /// Longitude in degrees.
    pub longitude: f64,
    /// Latitude in degrees.
    pub latitude: f64,
}

/// An entry point index document.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexDocument {
    /// The search description, when the feed publishes one.
    #[serde(rename = "hydra:search")]
    pub search: Option<HydraSearch>,
}

/// A hydra search description: a URI template addressing feed pages.
#[derive(Debug, Clone, Deserialize)]
pub struct HydraSearch {
    /// URI template with `departureTime` (and optionally `stop`) variables.
    #[serde(rename = "hydra:template")]
    pub template: Option<String>,
}
