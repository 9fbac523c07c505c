//! Connection records.

use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value};

use super::geo::GeoPoint;
use super::stop::StopId;

/// Error returned when constructing a connection that departs after it
/// arrives.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid connection: arrival time precedes departure time")]
pub struct InvalidConnection;

/// One scheduled vehicle hop between two stops.
///
/// Timestamps are absolute instants; wire-format strings never cross this
/// boundary. Departure is guaranteed not to be after arrival.
#[derive(Debug, Clone)]
pub struct Connection {
    /// Stop the vehicle departs from.
    pub departure_stop: StopId,
    /// Stop the vehicle arrives at.
    pub arrival_stop: StopId,
    /// Departure instant.
    pub departure_time: DateTime<Utc>,
    /// Arrival instant.
    pub arrival_time: DateTime<Utc>,
    /// Coordinates of the departure stop, when the feed provides them.
    pub departure_location: Option<GeoPoint>,
    /// Coordinates of the arrival stop, when the feed provides them.
    pub arrival_location: Option<GeoPoint>,
    /// Count of directly reachable stops from the arrival stop, an
    /// importance proxy used by heuristic scoring.
    pub direct_stops_from_arrival: Option<u32>,
    /// Feed-specific fields passed through untouched (route, trip,
    /// operator tags and the like).
    pub metadata: Map<String, Value>,
}

impl Connection {
    /// Create a connection, enforcing that departure is not after arrival.
    pub fn new(
        departure_stop: StopId,
        arrival_stop: StopId,
        departure_time: DateTime<Utc>,
        arrival_time: DateTime<Utc>,
    ) -> Result<Self, InvalidConnection> {
        if arrival_time < departure_time {
            return Err(InvalidConnection);
        }

        Ok(Self {
            departure_stop,
            arrival_stop,
            departure_time,
            arrival_time,
            departure_location: None,
            arrival_location: None,
            direct_stops_from_arrival: None,
            metadata: Map::new(),
        })
    }

    /// Set the departure stop coordinates.
    pub fn with_departure_location(mut self, location: GeoPoint) -> Self {
        self.departure_location = Some(location);
        self
    }

    /// Set the arrival stop coordinates.
    pub fn with_arrival_location(mut self, location: GeoPoint) -> Self {
        self.arrival_location = Some(location);
        self
    }

    /// Set the direct-reachability count of the arrival stop.
    pub fn with_direct_stops_from_arrival(mut self, count: u32) -> Self {
        self.direct_stops_from_arrival = Some(count);
        self
    }

    /// Attach opaque feed metadata.
    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Time spent travelling. Zero for same-instant hops.
    pub fn travel_time(&self) -> Duration {
        self.arrival_time - self.departure_time
    }
}
