//! Serde helpers for human-readable durations in configuration files

use serde::de::{self, Visitor};
use serde::{Deserializer, Serializer};
use std::{fmt, time::Duration};

/// Accepts either whole seconds or a humantime string such as `"30s"`
pub mod duration {
    use super::*;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let duration_str = humantime::format_duration(*duration).to_string();
        serializer.serialize_str(&duration_str)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DurationVisitor;

        impl<'de> Visitor<'de> for DurationVisitor {
            type Value = Duration;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a duration as seconds (number) or human-readable string (e.g. '30s', '1m')")
            }

            fn visit_u64<E>(self, seconds: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Duration::from_secs(seconds))
            }

            fn visit_i64<E>(self, seconds: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                u64::try_from(seconds)
                    .map(Duration::from_secs)
                    .map_err(|_| de::Error::custom(format!("Negative duration: {seconds}")))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                humantime::parse_duration(value)
                    .map_err(|e| de::Error::custom(format!("Invalid duration '{value}': {e}")))
            }
        }

        deserializer.deserialize_any(DurationVisitor)
    }
}
