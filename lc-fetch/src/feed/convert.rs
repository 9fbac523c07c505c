//! Conversion from wire documents to domain records.

use chrono::{DateTime, Utc};
use url::Url;

use crate::domain::{Connection, GeoPoint, StopId};

use super::error::DecodeError;
use super::types::{PageDocument, WireConnection};

/// Longest body snippet kept in decode errors.
const BODY_SNIPPET_CHARS: usize = 500;

/// A decoded feed page: typed records plus the pagination link to follow.
#[derive(Debug, Clone)]
pub struct Page {
    /// Records in server order, timestamps already converted to instants.
    pub connections: Vec<Connection>,
    /// URL of the next page; `None` on the last page.
    pub next: Option<Url>,
}

/// Decode one raw page body into typed records.
pub fn decode_page(body: &str) -> Result<Page, DecodeError> {
    let document: PageDocument = serde_json::from_str(body).map_err(|e| DecodeError::Json {
        message: e.to_string(),
        body: Some(body.chars().take(BODY_SNIPPET_CHARS).collect()),
    })?;

    let next = match document.next_page.as_deref() {
        Some(raw) => Some(Url::parse(raw).map_err(|e| DecodeError::Record {
            message: format!("next page link {raw:?} is not a URL: {e}"),
        })?),
        None => None,
    };

    let connections = document
        .graph
        .into_iter()
        .map(convert_connection)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Page { connections, next })
}

fn convert_connection(wire: WireConnection) -> Result<Connection, DecodeError> {
    let departure_stop = StopId::parse(&wire.departure_stop).map_err(|e| DecodeError::Record {
        message: format!("departure stop: {e}"),
    })?;
    let arrival_stop = StopId::parse(&wire.arrival_stop).map_err(|e| DecodeError::Record {
        message: format!("arrival stop: {e}"),
    })?;

    let departure_time = parse_instant(&wire.departure_time)?;
    let arrival_time = parse_instant(&wire.arrival_time)?;

    let mut connection = Connection::new(departure_stop, arrival_stop, departure_time, arrival_time)
        .map_err(|e| DecodeError::Record {
            message: e.to_string(),
        })?;

    if let Some(location) = wire.departure_location {
        connection =
            connection.with_departure_location(GeoPoint::new(location.longitude, location.latitude));
    }
    if let Some(location) = wire.arrival_location {
        connection =
            connection.with_arrival_location(GeoPoint::new(location.longitude, location.latitude));
    }
    if let Some(count) = wire.direct_stops_arrival {
        connection = connection.with_direct_stops_from_arrival(count);
    }

    Ok(connection.with_metadata(wire.extra))
}

/// Parse a wire timestamp into an absolute instant.
fn parse_instant(raw: &str) -> Result<DateTime<Utc>, DecodeError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| DecodeError::Record {
            message: format!("timestamp {raw:?}: {e}"),
        })
}
