//! Domain types for the connections fetch layer.
//!
//! These types represent validated feed data. Invariants are enforced at
//! construction time, so code receiving them can trust their validity:
//! stop ids are well-formed and a connection never arrives before it
//! departs.

mod connection;
mod geo;
mod stop;

pub use connection::{Connection, InvalidConnection};
pub use geo::{GeoPoint, directional_fit, haversine_distance};
pub use stop::{InvalidStopId, StopId};
