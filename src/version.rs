//! Host protocol versions such as `6.0`, `6.1` or `6.1.33`.

use std::{cmp::Ordering, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::Precondition;

/// Dotted numeric version negotiated with the host.
///
/// Comparison is part-by-part; a missing part counts as `0`, so `6` and
/// `6.0` are equal. Non-numeric parts compare by their leading digits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(String);

impl Version {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` when `self >= required`.
    pub fn is_at_least(&self, required: &str) -> bool {
        compare_versions(&self.0, required) != Ordering::Less
    }

    /// Gate for methods introduced in host version `required`.
    pub fn require(&self, required: &str) -> Result<(), Precondition> {
        if self.is_at_least(required) {
            return Ok(());
        }
        Err(Precondition::VersionTooLow {
            required: Version::new(required),
            current: self.clone(),
        })
    }
}

/// Compares two dotted versions.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let a_parts: Vec<&str> = a.split('.').collect();
    let b_parts: Vec<&str> = b.split('.').collect();
    let len = a_parts.len().max(b_parts.len());

    for i in 0..len {
        let a_val = part_value(a_parts.get(i).copied());
        let b_val = part_value(b_parts.get(i).copied());
        match a_val.cmp(&b_val) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

fn part_value(part: Option<&str>) -> u64 {
    let Some(part) = part else { return 0 };
    // Saturates so that an absurdly long part still outranks any real one.
    part.trim()
        .chars()
        .map_while(|c| c.to_digit(10))
        .fold(0u64, |acc, d| acc.saturating_mul(10).saturating_add(u64::from(d)))
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_versions(&self.0, &other.0)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Version {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl FromStr for Version {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::new("6.0")
    }
}
