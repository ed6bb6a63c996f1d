//
//  api_level.rs
//  ApexVariants
//
//  Created by hak (tharun)
//

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

use crate::error::{ApexError, Result};

/// Numeric stand-in for every unfinalized level.
pub const FUTURE_API_LEVEL_INT: i32 = 10_000;

/// Preview codenames are numbered from here so they sort after every
/// finalized level and before "current".
const PREVIEW_API_LEVEL_BASE: i32 = 9_000;

/// Codenames that have been finalized and map onto a release number.
const FINALIZED_CODENAMES: &[(&str, i32)] = &[
    ("G", 9),
    ("I", 14),
    ("J", 16),
    ("J-MR1", 17),
    ("J-MR2", 18),
    ("K", 19),
    ("L", 21),
    ("L-MR1", 22),
    ("M", 23),
    ("N", 24),
    ("N-MR1", 25),
    ("O", 26),
    ("O-MR1", 27),
    ("P", 28),
    ("Q", 29),
    ("R", 30),
    ("S", 31),
    ("Sv2", 32),
    ("Tiramisu", 33),
];

/// A platform API level: either a finalized release number or an
/// unfinalized preview ("current" or an active codename).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ApiLevel {
    value: String,
    number: i32,
    is_preview: bool,
}

impl ApiLevel {
    /// A finalized level.
    pub fn finalized(number: i32) -> Self {
        Self {
            value: number.to_string(),
            number,
            is_preview: false,
        }
    }

    /// The "current" level, newer than anything finalized.
    pub fn current() -> Self {
        Self {
            value: "current".to_string(),
            number: FUTURE_API_LEVEL_INT,
            is_preview: true,
        }
    }

    /// Parse a level as a user would write it in a build definition.
    pub fn from_user(raw: &str, active_codenames: &[String]) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ApexError::InvalidApiLevel(raw.to_string()));
        }
        if raw == "current" {
            return Ok(Self::current());
        }
        if let Some(pos) = active_codenames.iter().position(|c| c == raw) {
            return Ok(Self {
                value: raw.to_string(),
                number: PREVIEW_API_LEVEL_BASE + pos as i32,
                is_preview: true,
            });
        }
        if let Some(&(_, number)) = FINALIZED_CODENAMES.iter().find(|(name, _)| *name == raw) {
            return Ok(Self::finalized(number));
        }
        raw.parse::<i32>()
            .map(Self::finalized)
            .map_err(|_| ApexError::InvalidApiLevel(raw.to_string()))
    }

    /// Parse without any active codenames.
    pub fn parse(raw: &str) -> Result<Self> {
        Self::from_user(raw, &[])
    }

    /// The release number, or [`FUTURE_API_LEVEL_INT`] for previews.
    pub fn final_or_future_int(&self) -> i32 {
        if self.is_preview {
            FUTURE_API_LEVEL_INT
        } else {
            self.number
        }
    }

    /// True for every level that has not been finalized yet.
    pub fn is_current(&self) -> bool {
        self.is_preview
    }

    pub fn is_preview(&self) -> bool {
        self.is_preview
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl PartialOrd for ApiLevel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ApiLevel {
    fn cmp(&self, other: &Self) -> Ordering {
        self.number
            .cmp(&other.number)
            .then_with(|| self.value.cmp(&other.value))
    }
}

impl fmt::Display for ApiLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl Serialize for ApiLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.value)
    }
}

/// Serialized levels carry no list of active codenames, so any codename
/// that is not finalized reads back as a preview ranked with the first one.
impl<'de> Deserialize<'de> for ApiLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match ApiLevel::parse(&raw) {
            Ok(level) => Ok(level),
            Err(_) if is_codename(&raw) => Ok(Self {
                value: raw,
                number: PREVIEW_API_LEVEL_BASE,
                is_preview: true,
            }),
            Err(err) => Err(serde::de::Error::custom(err)),
        }
    }
}

fn is_codename(raw: &str) -> bool {
    raw.starts_with(|c: char| c.is_ascii_uppercase())
        && raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}
