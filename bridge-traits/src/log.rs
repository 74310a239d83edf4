//! Log Levels
//!
//! The numeric verbosity scale shared with the scripting runtime. Log lines
//! forwarded across the boundary are prefixed with [`LogLevel::as_number`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{BridgeError, Result};

/// Log level
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum LogLevel {
    Debug = 0,
    #[default]
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl LogLevel {
    /// Numeric value used on the wire.
    pub fn as_number(self) -> u8 {
        self as u8
    }

    /// Parse a wire value, rejecting anything outside `0..=3`.
    pub fn from_number(value: i64) -> Result<Self> {
        match value {
            0 => Ok(Self::Debug),
            1 => Ok(Self::Info),
            2 => Ok(Self::Warn),
            3 => Ok(Self::Error),
            other => Err(BridgeError::OperationFailed(format!(
                "Log level out of range: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_are_ordered() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
    }

    #[test]
    fn test_from_number() {
        assert_eq!(LogLevel::from_number(2).unwrap(), LogLevel::Warn);
        assert_eq!(LogLevel::Error.as_number(), 3);
        assert!(LogLevel::from_number(4).is_err());
        assert!(LogLevel::from_number(-1).is_err());
    }
}
