//! Common types and utilities shared across domain models

use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp in milliseconds since Unix epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp for the current moment
    ///
    /// A system clock set before UNIX_EPOCH yields timestamp 0 rather than a panic.
    pub fn now() -> Self {
        Self(
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_else(|_| std::time::Duration::from_secs(0))
                .as_millis() as i64,
        )
    }

    /// Creates a timestamp from milliseconds since Unix epoch
    pub fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as milliseconds since Unix epoch
    pub fn as_millis(&self) -> i64 {
        self.0
    }

    /// Returns the timestamp as seconds since Unix epoch
    pub fn as_seconds(&self) -> i64 {
        self.0 / 1000
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Duration in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Duration(u64);

impl Duration {
    /// Zero duration constant
    pub const ZERO: Self = Self(0);

    /// Creates a duration from milliseconds
    pub fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Creates a duration from seconds
    pub fn from_seconds(seconds: u64) -> Self {
        Self(seconds.saturating_mul(1000))
    }

    /// Returns the duration in milliseconds
    pub fn as_millis(&self) -> u64 {
        self.0
    }

    /// Returns the duration in seconds
    pub fn as_seconds(&self) -> u64 {
        self.0 / 1000
    }

    /// Returns true if the duration is zero
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Formats as `M:SS`, the sleep timer countdown format
    pub fn as_countdown(&self) -> String {
        let total_seconds = self.as_seconds();
        format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
    }

    /// Formats as `MM:SS`, the recording elapsed-time format
    pub fn as_elapsed(&self) -> String {
        let total_seconds = self.as_seconds();
        format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_countdown())
    }
}

impl From<std::time::Duration> for Duration {
    fn from(d: std::time::Duration) -> Self {
        Self(d.as_millis() as u64)
    }
}

/// Trait for types that can validate themselves
pub trait Validator {
    /// Validates the instance and returns errors if invalid
    fn validate(&self) -> Result<(), Vec<String>>;

    /// Returns true if the instance is valid
    fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_from_millis() {
        let t = Timestamp::from_millis(1234567890123);
        assert_eq!(t.as_millis(), 1234567890123);
        assert_eq!(t.as_seconds(), 1234567890);
    }

    #[test]
    fn test_timestamp_ordering() {
        let t1 = Timestamp::from_millis(1000);
        let t2 = Timestamp::from_millis(2000);
        assert!(t1 < t2);
    }

    #[test]
    fn test_duration_from_seconds() {
        let d = Duration::from_seconds(300);
        assert_eq!(d.as_seconds(), 300);
        assert_eq!(d.as_millis(), 300_000);
        assert!(!d.is_zero());
        assert!(Duration::ZERO.is_zero());
    }

    #[test]
    fn test_countdown_format() {
        assert_eq!(Duration::from_seconds(300).as_countdown(), "5:00");
        assert_eq!(Duration::from_seconds(59).as_countdown(), "0:59");
        assert_eq!(Duration::from_seconds(3605).as_countdown(), "60:05");
        assert_eq!(Duration::from_seconds(125).to_string(), "2:05");
    }

    #[test]
    fn test_elapsed_format() {
        assert_eq!(Duration::from_seconds(0).as_elapsed(), "00:00");
        assert_eq!(Duration::from_seconds(12).as_elapsed(), "00:12");
        assert_eq!(Duration::from_seconds(754).as_elapsed(), "12:34");
    }

    #[test]
    fn test_duration_from_std_duration() {
        let d: Duration = std::time::Duration::from_secs(42).into();
        assert_eq!(d.as_seconds(), 42);
    }

    #[test]
    fn test_validator_default_is_valid() {
        struct Positive(i32);

        impl Validator for Positive {
            fn validate(&self) -> Result<(), Vec<String>> {
                if self.0 < 0 {
                    Err(vec!["Value must be positive".to_string()])
                } else {
                    Ok(())
                }
            }
        }

        assert!(Positive(10).is_valid());
        assert!(!Positive(-5).is_valid());
    }
}
