// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use derive_more::Display;

/// Severity of a log line, using syslog numbering.
///
/// A lower number is more severe. The level never decides whether a line is
/// shipped; it only drives the local echo configured by `print_level`.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Level {
    #[display("critical")]
    Critical = 2,
    #[display("error")]
    Error = 3,
    #[display("warning")]
    Warning = 4,
    #[display("notice")]
    Notice = 5,
    #[display("info")]
    Info = 6,
    #[display("debug")]
    Debug = 7,
}

impl Level {
    /// Whether `self` is as severe as `threshold` or more.
    #[must_use]
    pub fn is_at_least(self, threshold: Level) -> bool {
        (self as u8) <= (threshold as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_at_least() {
        assert!(Level::Critical.is_at_least(Level::Warning));
        assert!(Level::Warning.is_at_least(Level::Warning));
        assert!(!Level::Info.is_at_least(Level::Warning));
        assert!(Level::Debug.is_at_least(Level::Debug));
    }

    #[test]
    fn test_display() {
        assert_eq!(Level::Warning.to_string(), "warning");
        assert_eq!(Level::Critical.to_string(), "critical");
    }
}
