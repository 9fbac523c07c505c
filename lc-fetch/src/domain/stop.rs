//! Stop identifier type.

use std::fmt;

/// Error returned when parsing an invalid stop id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid stop id: {reason}")]
pub struct InvalidStopId {
    reason: &'static str,
}

/// A stop identifier as published by a connections feed.
///
/// Feeds identify stops by URI (or any other opaque token); this type only
/// guarantees the id is non-empty and free of whitespace, so it can be
/// embedded in page URLs without further checks.
///
/// # Examples
///
/// ```
/// use lc_fetch::domain::StopId;
///
/// let stop = StopId::parse("http://stops.example/8892007").unwrap();
/// assert_eq!(stop.as_str(), "http://stops.example/8892007");
///
/// assert!(StopId::parse("").is_err());
/// assert!(StopId::parse("two words").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct StopId(String);

impl StopId {
    /// Parse a stop id from a string.
    pub fn parse(s: &str) -> Result<Self, InvalidStopId> {
        if s.is_empty() {
            return Err(InvalidStopId {
                reason: "must not be empty",
            });
        }

        if s.chars().any(char::is_whitespace) {
            return Err(InvalidStopId {
                reason: "must not contain whitespace",
            });
        }

        Ok(StopId(s.to_string()))
    }

    /// Returns the stop id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StopId({})", self.0)
    }
}

impl fmt::Display for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_ids() {
        assert!(StopId::parse("http://stops.example/8892007").is_ok());
        assert!(StopId::parse("NMBS:008892007").is_ok());
        assert!(StopId::parse("X").is_ok());
    }

    #[test]
    fn reject_empty() {
        assert!(StopId::parse("").is_err());
    }

    #[test]
    fn reject_whitespace() {
        assert!(StopId::parse("two words").is_err());
        assert!(StopId::parse(" leading").is_err());
        assert!(StopId::parse("trailing ").is_err());
        assert!(StopId::parse("tab\tsep").is_err());
    }

    #[test]
    fn as_str_roundtrip() {
        let stop = StopId::parse("http://stops.example/1").unwrap();
        assert_eq!(stop.as_str(), "http://stops.example/1");
    }

    #[test]
    fn display_and_debug() {
        let stop = StopId::parse("abc").unwrap();
        assert_eq!(format!("{}", stop), "abc");
        assert_eq!(format!("{:?}", stop), "StopId(abc)");
    }

    #[test]
    fn equality_and_hash() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(StopId::parse("a").unwrap());
        assert!(set.contains(&StopId::parse("a").unwrap()));
        assert!(!set.contains(&StopId::parse("b").unwrap()));
    }
}
