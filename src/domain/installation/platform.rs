//! The closed set of supported chat platforms.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Supported external chat platforms.
///
/// Closed set: adapter dispatch is resolved once per installation from
/// this enum, never from free-form strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Slack workspace, channels and message threads.
    Slack,
    /// Discord guild, channels and threads.
    Discord,
    /// Telegram supergroup with forum topics.
    Telegram,
}

impl Platform {
    /// Stable lowercase name used in storage and wire formats.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Slack => "slack",
            Platform::Discord => "discord",
            Platform::Telegram => "telegram",
        }
    }

    /// All supported platforms.
    pub fn all() -> [Platform; 3] {
        [Platform::Slack, Platform::Discord, Platform::Telegram]
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Platform {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "slack" => Ok(Platform::Slack),
            "discord" => Ok(Platform::Discord),
            "telegram" => Ok(Platform::Telegram),
            other => Err(ValidationError::invalid_format(
                "platform",
                format!("unknown platform '{}'", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_str() {
        for platform in Platform::all() {
            let parsed: Platform = platform.as_str().parse().unwrap();
            assert_eq!(parsed, platform);
        }
    }

    #[test]
    fn rejects_unknown_platform() {
        assert!("msteams".parse::<Platform>().is_err());
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&Platform::Telegram).unwrap();
        assert_eq!(json, r#""telegram""#);
    }
}
