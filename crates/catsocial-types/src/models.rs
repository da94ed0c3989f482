use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a stored or submitted value is not one of the known
/// variants of a closed enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {value:?}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

// -- Race --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Race {
    Persian,
    #[serde(rename = "Maine Coon")]
    MaineCoon,
    Siamese,
    Ragdoll,
    Bengal,
    Sphynx,
    #[serde(rename = "British Shorthair")]
    BritishShorthair,
    Abyssinian,
    #[serde(rename = "Scottish Fold")]
    ScottishFold,
    Birman,
}

impl Race {
    pub const ALL: [Race; 10] = [
        Race::Persian,
        Race::MaineCoon,
        Race::Siamese,
        Race::Ragdoll,
        Race::Bengal,
        Race::Sphynx,
        Race::BritishShorthair,
        Race::Abyssinian,
        Race::ScottishFold,
        Race::Birman,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Race::Persian => "Persian",
            Race::MaineCoon => "Maine Coon",
            Race::Siamese => "Siamese",
            Race::Ragdoll => "Ragdoll",
            Race::Bengal => "Bengal",
            Race::Sphynx => "Sphynx",
            Race::BritishShorthair => "British Shorthair",
            Race::Abyssinian => "Abyssinian",
            Race::ScottishFold => "Scottish Fold",
            Race::Birman => "Birman",
        }
    }
}

impl FromStr for Race {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Race::ALL
            .into_iter()
            .find(|race| race.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("race", s))
    }
}

impl fmt::Display for Race {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// -- Sex --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }
}

impl FromStr for Sex {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Sex::Male),
            "female" => Ok(Sex::Female),
            other => Err(ParseEnumError::new("sex", other)),
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// -- Match status --

/// Lifecycle of a match proposal. `Approved` and `Removed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Pending,
    Approved,
    Removed,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Pending => "pending",
            MatchStatus::Approved => "approved",
            MatchStatus::Removed => "removed",
        }
    }

    pub fn is_closed(&self) -> bool {
        !matches!(self, MatchStatus::Pending)
    }
}

impl FromStr for MatchStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(MatchStatus::Pending),
            "approved" => Ok(MatchStatus::Approved),
            "removed" => Ok(MatchStatus::Removed),
            other => Err(ParseEnumError::new("match status", other)),
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// -- Age filter --

/// Comparison used by the `ageInMonth` list filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeComparison {
    Equal(i64),
    AtMost(i64),
    AtLeast(i64),
}

impl AgeComparison {
    pub fn months(&self) -> i64 {
        match *self {
            AgeComparison::Equal(m) | AgeComparison::AtMost(m) | AgeComparison::AtLeast(m) => m,
        }
    }
}

/// Accepts `N`, `=N`, `<N`, `<=N`, `>N`, `>=N`. `<` and `>` are inclusive.
impl FromStr for AgeComparison {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let (ctor, rest): (fn(i64) -> AgeComparison, &str) =
            if let Some(rest) = raw.strip_prefix(">=").or_else(|| raw.strip_prefix('>')) {
                (AgeComparison::AtLeast, rest)
            } else if let Some(rest) = raw.strip_prefix("<=").or_else(|| raw.strip_prefix('<')) {
                (AgeComparison::AtMost, rest)
            } else {
                (AgeComparison::Equal, raw.strip_prefix('=').unwrap_or(raw))
            };

        rest.trim()
            .parse::<i64>()
            .map(ctor)
            .map_err(|_| ParseEnumError::new("age comparison", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn race_names_round_trip_through_display() {
        for race in Race::ALL {
            assert_eq!(race.to_string().parse::<Race>().unwrap(), race);
        }
        assert!("maine coon".parse::<Race>().is_err());
        assert!("Tabby".parse::<Race>().is_err());
    }

    #[test]
    fn race_serializes_with_spaces() {
        let json = serde_json::to_string(&Race::BritishShorthair).unwrap();
        assert_eq!(json, "\"British Shorthair\"");
    }

    #[test]
    fn sex_is_lowercase_only() {
        assert_eq!("female".parse::<Sex>().unwrap(), Sex::Female);
        assert!("Male".parse::<Sex>().is_err());
    }

    #[test]
    fn only_pending_is_open() {
        assert!(!MatchStatus::Pending.is_closed());
        assert!(MatchStatus::Approved.is_closed());
        assert!(MatchStatus::Removed.is_closed());
    }

    #[test]
    fn age_comparison_operators() {
        assert_eq!("4".parse::<AgeComparison>().unwrap(), AgeComparison::Equal(4));
        assert_eq!("=4".parse::<AgeComparison>().unwrap(), AgeComparison::Equal(4));
        assert_eq!(">4".parse::<AgeComparison>().unwrap(), AgeComparison::AtLeast(4));
        assert_eq!(">=12".parse::<AgeComparison>().unwrap(), AgeComparison::AtLeast(12));
        assert_eq!("<4".parse::<AgeComparison>().unwrap(), AgeComparison::AtMost(4));
        assert_eq!("<=7".parse::<AgeComparison>().unwrap(), AgeComparison::AtMost(7));
        assert_eq!(AgeComparison::AtMost(7).months(), 7);
    }

    #[test]
    fn age_comparison_rejects_garbage() {
        assert!("".parse::<AgeComparison>().is_err());
        assert!(">".parse::<AgeComparison>().is_err());
        assert!("4 OR 1=1".parse::<AgeComparison>().is_err());
        assert!("=>4".parse::<AgeComparison>().is_err());
    }
}
