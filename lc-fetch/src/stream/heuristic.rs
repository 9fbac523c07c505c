//! Composite desirability scoring for candidate stops.
//!
//! Scores are only comparable within one stream: each factor is normalized
//! by a per-stream running maximum learned online from the first records
//! of every fetched page, so exploration works before any global feed
//! statistics exist.

use crate::domain::{Connection, GeoPoint, directional_fit, haversine_distance};

/// Priority of the seed candidate, and of any record whose score cannot
/// be computed. Above every normalized score in practice, so the origin
/// stop is always served first.
pub const SEED_PRIORITY: f64 = 3.0;

/// Records sampled per page when updating the running maxima. Keeps the
/// maxima responsive without rescanning unbounded data.
const BOOTSTRAP_SAMPLE: usize = 1000;

/// Importance counts above this value...
const IMPORTANCE_KNEE: f64 = 150.0;

/// ...are replaced by this ceiling, so one hub stop cannot dominate
/// scoring.
const IMPORTANCE_CEILING: f64 = 175.0;

/// Weights of the composite score.
#[derive(Debug, Clone)]
pub struct HeuristicWeights {
    /// Weight of normalized connection speed.
    pub speed: f64,
    /// Weight of normalized remaining distance to the goal. Negative by
    /// default: ending up farther from the goal is worse.
    pub distance: f64,
    /// Weight of normalized directional alignment with the goal.
    pub direction: f64,
    /// Weight of normalized arrival-stop importance.
    pub importance: f64,
}

impl Default for HeuristicWeights {
    fn default() -> Self {
        Self {
            speed: 1.0,
            distance: -1.0,
            direction: 1.0,
            importance: 1.0,
        }
    }
}

/// Raw factor values for one connection.
struct Factors {
    speed: f64,
    remaining: f64,
    alignment: f64,
    importance: f64,
}

/// Compute the raw factors, or `None` when the record lacks coordinates.
fn factors(connection: &Connection, goal: GeoPoint) -> Option<Factors> {
    let from = connection.departure_location?;
    let to = connection.arrival_location?;

    let distance = haversine_distance(from, to);
    let seconds = connection.travel_time().num_seconds() as f64;
    let speed = if seconds == 0.0 { 0.0 } else { distance / seconds };

    let mut importance = f64::from(connection.direct_stops_from_arrival.unwrap_or(0));
    if importance > IMPORTANCE_KNEE {
        importance = IMPORTANCE_CEILING;
    }

    Some(Factors {
        speed,
        remaining: haversine_distance(to, goal),
        alignment: directional_fit(to, goal),
        importance,
    })
}

/// Per-stream running maxima used to normalize raw factors.
///
/// Maxima only ever grow. They start at zero; until a factor has been
/// observed, its normalization denominator is treated as 1, so no
/// division can produce NaN.
#[derive(Debug, Default)]
pub struct NormalizationState {
    max_speed: f64,
    max_remaining: f64,
    max_alignment: f64,
    max_importance: f64,
}

impl NormalizationState {
    /// Create an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Update the maxima from freshly fetched records. Only a bootstrap
    /// sample (the first 1000 records) is examined; records without
    /// coordinates are skipped.
    pub fn observe(&mut self, connections: &[Connection], goal: GeoPoint) {
        for connection in connections.iter().take(BOOTSTRAP_SAMPLE) {
            let Some(f) = factors(connection, goal) else {
                continue;
            };

            if f.speed > self.max_speed {
                self.max_speed = f.speed;
            }
            if f.remaining > self.max_remaining {
                self.max_remaining = f.remaining;
            }
            if f.alignment > self.max_alignment {
                self.max_alignment = f.alignment;
            }
            if f.importance > self.max_importance {
                self.max_importance = f.importance;
            }
        }
    }

    /// Composite score for the connection's arrival stop.
    ///
    /// Non-finite results collapse to [`SEED_PRIORITY`], as does any
    /// record that cannot be scored for lack of coordinates.
    pub fn score(
        &self,
        connection: &Connection,
        goal: GeoPoint,
        weights: &HeuristicWeights,
    ) -> f64 {
        let Some(f) = factors(connection, goal) else {
            return SEED_PRIORITY;
        };

        let score = weights.speed * norm(f.speed, self.max_speed)
            + weights.distance * norm(f.remaining, self.max_remaining)
            + weights.direction * norm(f.alignment, self.max_alignment)
            + weights.importance * norm(f.importance, self.max_importance);

        if score.is_finite() { score } else { SEED_PRIORITY }
    }
}

/// Normalize against a running maximum; an unset maximum leaves the value
/// untouched (denominator 1).
fn norm(value: f64, max: f64) -> f64 {
    if max > 0.0 { value / max } else { value }
}
