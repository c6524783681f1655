//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ValidationError;

/// Unique identifier for one generation run (a "cycle").
///
/// Cycle ids are supplied by callers and end up inside store keys and
/// pub/sub channel names, so they are validated on construction:
/// 1 to [`CycleId::MAX_LEN`] characters drawn from ASCII alphanumerics,
/// `-`, `_` and `.`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CycleId(String);

impl CycleId {
    /// Maximum accepted length.
    pub const MAX_LEN: usize = 128;

    /// Creates a new random CycleId.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Validates and wraps a caller-supplied identifier.
    pub fn parse(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();

        if value.is_empty() {
            return Err(ValidationError::empty_field("cycle_id"));
        }
        if value.len() > Self::MAX_LEN {
            return Err(ValidationError::too_long("cycle_id", Self::MAX_LEN));
        }
        if let Some(c) = value.chars().find(|c| !is_allowed(*c)) {
            return Err(ValidationError::invalid_format(
                "cycle_id",
                format!("unexpected character {:?}", c),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}

impl Default for CycleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CycleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CycleId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for CycleId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn new_generates_valid_uuid_ids() {
        let id = CycleId::new();
        assert!(Uuid::parse_str(id.as_str()).is_ok());
        assert_ne!(CycleId::new(), id);
    }

    #[test]
    fn parse_accepts_simple_ids() {
        assert_eq!(CycleId::parse("c1").unwrap().as_str(), "c1");
        assert!("cycle_2024-01.a".parse::<CycleId>().is_ok());
    }

    #[test]
    fn parse_rejects_empty() {
        assert_eq!(
            CycleId::parse(""),
            Err(ValidationError::empty_field("cycle_id"))
        );
    }

    #[test]
    fn parse_rejects_key_separators_and_whitespace() {
        assert!(CycleId::parse("channel:c1").is_err());
        assert!(CycleId::parse("c 1").is_err());
        assert!(CycleId::parse("c1*").is_err());
        assert!(CycleId::parse("../c1").is_err());
    }

    #[test]
    fn parse_rejects_overlong_ids() {
        let long = "a".repeat(CycleId::MAX_LEN + 1);
        assert!(matches!(
            CycleId::parse(long),
            Err(ValidationError::TooLong { .. })
        ));
        assert!(CycleId::parse("a".repeat(CycleId::MAX_LEN)).is_ok());
    }

    #[test]
    fn deserialize_validates() {
        let ok: Result<CycleId, _> = serde_json::from_str("\"abc\"");
        assert!(ok.is_ok());

        let bad: Result<CycleId, _> = serde_json::from_str("\"a:b\"");
        assert!(bad.is_err());
    }

    proptest! {
        #[test]
        fn any_id_from_allowed_alphabet_parses(s in "[A-Za-z0-9._-]{1,128}") {
            let id = CycleId::parse(s.clone()).unwrap();
            prop_assert_eq!(id.as_str(), s.as_str());
        }

        #[test]
        fn ids_containing_a_disallowed_char_are_rejected(
            prefix in "[a-z0-9]{0,10}",
            bad in "[:/ *?\\[\\]{}]",
            suffix in "[a-z0-9]{0,10}",
        ) {
            let candidate = format!("{}{}{}", prefix, bad, suffix);
            prop_assert!(CycleId::parse(candidate).is_err());
        }
    }
}
